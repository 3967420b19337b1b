use std::path::Path;

use imreg_features::MatcherParams;
use imreg_geometry::{RansacParams, MIN_CORRESPONDENCES};
use imreg_imgproc::interpolation::InterpolationMode;
use serde::{Deserialize, Serialize};

use crate::RegistrationError;

/// Settings for one registration call.
///
/// Every field has a default, so a JSON configuration only needs the values
/// it overrides:
///
/// ```
/// use imreg::RegistrationConfig;
///
/// let config = RegistrationConfig::from_json_str(
///     r#"{ "matcher": { "ratio": 0.8 }, "ransac": { "threshold": 3.0 } }"#,
/// ).unwrap();
///
/// assert_eq!(config.matcher.ratio, 0.8);
/// assert_eq!(config.ransac.threshold, 3.0);
/// assert_eq!(config.ransac.max_iterations, 2000);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Ratio-test matcher settings.
    pub matcher: MatcherParams,
    /// RANSAC settings.
    pub ransac: RansacParams,
    /// Minimum number of ratio-test matches before RANSAC runs, never below four.
    pub min_correspondences: usize,
    /// Interpolation used by the warp.
    pub interpolation: InterpolationMode,
    /// Value written where the warped image has no source pixel.
    pub fill_value: f32,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherParams::default(),
            ransac: RansacParams::default(),
            min_correspondences: MIN_CORRESPONDENCES,
            interpolation: InterpolationMode::Bilinear,
            fill_value: 0.0,
        }
    }
}

impl RegistrationConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self, RegistrationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistrationError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize the configuration to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, RegistrationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The effective correspondence floor.
    pub fn required_correspondences(&self) -> usize {
        self.min_correspondences.max(MIN_CORRESPONDENCES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imreg_features::{LshParams, SearchMethod};

    #[test]
    fn defaults() {
        let config = RegistrationConfig::default();
        assert_eq!(config.matcher.ratio, 0.75);
        assert_eq!(config.matcher.search, SearchMethod::BruteForce);
        assert_eq!(config.ransac.threshold, 5.0);
        assert_eq!(config.ransac.max_iterations, 2000);
        assert_eq!(config.ransac.confidence, 0.995);
        assert_eq!(config.ransac.min_inlier_ratio, 0.25);
        assert_eq!(config.ransac.random_seed, Some(0));
        assert!(config.ransac.parallel);
        assert_eq!(config.min_correspondences, 4);
        assert_eq!(config.interpolation, InterpolationMode::Bilinear);
        assert_eq!(config.fill_value, 0.0);
    }

    #[test]
    fn json_overrides() -> Result<(), RegistrationError> {
        let config = RegistrationConfig::from_json_str(
            r#"{
                "matcher": { "search": { "lsh": { "table_number": 4 } } },
                "ransac": { "random_seed": 7, "parallel": false },
                "min_correspondences": 2,
                "interpolation": "nearest"
            }"#,
        )?;

        assert_eq!(
            config.matcher.search,
            SearchMethod::Lsh(LshParams {
                table_number: 4,
                ..Default::default()
            })
        );
        assert_eq!(config.matcher.ratio, 0.75);
        assert_eq!(config.ransac.random_seed, Some(7));
        assert!(!config.ransac.parallel);
        assert_eq!(config.interpolation, InterpolationMode::Nearest);
        assert_eq!(config.required_correspondences(), 4);
        Ok(())
    }

    #[test]
    fn json_file_roundtrip() -> Result<(), RegistrationError> {
        let mut config = RegistrationConfig::default();
        config.ransac.threshold = 2.5;
        config.fill_value = 0.5;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, config.to_json_string()?)?;

        assert_eq!(RegistrationConfig::from_json_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn invalid_json() {
        assert!(matches!(
            RegistrationConfig::from_json_str(r#"{ "matcher": { "ratio": "high" } }"#),
            Err(RegistrationError::Config(_))
        ));
    }
}
