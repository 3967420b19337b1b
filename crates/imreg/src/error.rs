use imreg_features::FeatureError;
use imreg_image::ImageError;

/// Faults that prevent a registration from running at all.
///
/// Alignment outcomes, including failures to align, are reported through
/// [`crate::RegistrationResult`] instead.
#[derive(thiserror::Error, Debug)]
pub enum RegistrationError {
    /// Image conversion or warping failed.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The descriptor source failed.
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// Failed to read a configuration file.
    #[error("Failed to read configuration. {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration.
    #[error("Failed to parse configuration. {0}")]
    Config(#[from] serde_json::Error),
}
