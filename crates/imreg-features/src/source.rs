use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use imreg_image::Image;

use crate::{Feature, FeatureError};

/// Anything that can turn a grayscale image into keypoints with descriptors.
///
/// Implemented for closures so that an external detector can be plugged in
/// without a wrapper type.
///
/// # Example
///
/// ```
/// use imreg_features::{Descriptor, DescriptorSource, Feature, FeatureError, Keypoint};
/// use imreg_image::{Image, ImageSize};
///
/// let source = |_: &Image<f32, 1>| -> Result<Vec<Feature>, FeatureError> {
///     Ok(vec![Feature::new(
///         Keypoint::new(1.0, 2.0),
///         Descriptor::Binary(vec![0; 32]),
///     )])
/// };
///
/// let image = Image::<f32, 1>::from_size_val(ImageSize { width: 4, height: 4 }, 0.0).unwrap();
/// let features = source.extract(&image).unwrap();
/// assert_eq!(features.len(), 1);
/// ```
pub trait DescriptorSource {
    /// Detect keypoints and compute their descriptors.
    fn extract(&self, image: &Image<f32, 1>) -> Result<Vec<Feature>, FeatureError>;
}

impl<F> DescriptorSource for F
where
    F: Fn(&Image<f32, 1>) -> Result<Vec<Feature>, FeatureError>,
{
    fn extract(&self, image: &Image<f32, 1>) -> Result<Vec<Feature>, FeatureError> {
        self(image)
    }
}

/// A source that replays recorded feature sets instead of detecting.
///
/// The n-th call to [`DescriptorSource::extract`] returns the n-th recorded
/// set, wrapping around after the last one. Registering a pair therefore
/// takes the sets of image A and image B in that order.
pub struct PrecomputedSource {
    sets: Vec<Vec<Feature>>,
    calls: AtomicUsize,
}

impl PrecomputedSource {
    /// Create a source replaying `sets` in order.
    pub fn new(sets: Vec<Vec<Feature>>) -> Self {
        Self {
            sets,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a source for one image pair.
    pub fn from_pair(features_a: Vec<Feature>, features_b: Vec<Feature>) -> Self {
        Self::new(vec![features_a, features_b])
    }
}

impl DescriptorSource for PrecomputedSource {
    fn extract(&self, _image: &Image<f32, 1>) -> Result<Vec<Feature>, FeatureError> {
        if self.sets.is_empty() {
            return Err(FeatureError::Extraction(
                "no recorded feature sets".to_string(),
            ));
        }
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.sets[call % self.sets.len()].clone())
    }
}

/// Parse features from a JSON array of `{"keypoint": .., "descriptor": ..}`.
pub fn features_from_json_str(json: &str) -> Result<Vec<Feature>, FeatureError> {
    Ok(serde_json::from_str(json)?)
}

/// Read precomputed features from a JSON file.
///
/// # Example
///
/// ```no_run
/// let features = imreg_features::load_features_json("features_a.json").unwrap();
/// println!("loaded {} features", features.len());
/// ```
pub fn load_features_json(path: impl AsRef<Path>) -> Result<Vec<Feature>, FeatureError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let features = features_from_json_str(&contents)?;
    log::debug!("loaded {} features from {}", features.len(), path.display());
    Ok(features)
}

/// Write features to a JSON file.
pub fn save_features_json(
    path: impl AsRef<Path>,
    features: &[Feature],
) -> Result<(), FeatureError> {
    let contents = serde_json::to_string(features)?;
    std::fs::write(path, contents)?;
    Ok(())
}
