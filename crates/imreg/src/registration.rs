use imreg_features::{match_features, Correspondence, DescriptorSource, Feature, MatchError};
use imreg_geometry::{ransac_homography, Homography, HomographyError};
use imreg_image::Image;
use imreg_imgproc::{color::to_gray, warp::warp_perspective};
use serde::{Deserialize, Serialize};

use crate::{RegistrationConfig, RegistrationError};

/// Why a registration could not produce an alignment.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Fewer ratio-test matches than the configured floor.
    #[error("insufficient_correspondences")]
    InsufficientCorrespondences,
    /// No hypothesis gathered enough inliers.
    #[error("no_consensus")]
    NoConsensus,
    /// Every sampled hypothesis was degenerate.
    #[error("degenerate_geometry")]
    DegenerateGeometry,
    /// A feature set was empty or mixed descriptor kinds or lengths.
    #[error("invalid_descriptor_set")]
    InvalidDescriptorSet,
}

impl From<MatchError> for FailureReason {
    fn from(_: MatchError) -> Self {
        FailureReason::InvalidDescriptorSet
    }
}

impl From<HomographyError> for FailureReason {
    fn from(err: HomographyError) -> Self {
        match err {
            HomographyError::InsufficientCorrespondences { .. } => {
                FailureReason::InsufficientCorrespondences
            }
            HomographyError::NoConsensus { .. } => FailureReason::NoConsensus,
            HomographyError::DegenerateGeometry | HomographyError::Degenerate(_) => {
                FailureReason::DegenerateGeometry
            }
            // non-finite keypoint coordinates
            HomographyError::InvalidInput(_) => FailureReason::InvalidDescriptorSet,
        }
    }
}

/// The geometric part of a successful registration.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    /// Homography mapping image A onto image B.
    pub homography: Homography,
    /// Inlier flag per correspondence.
    pub inlier_mask: Vec<bool>,
    /// Ratio-test matches with their inlier flags set.
    pub correspondences: Vec<Correspondence>,
    /// Number of inliers.
    pub inlier_count: usize,
    /// Mean reprojection error over the inliers, in pixels.
    pub mean_error: f64,
}

/// Outcome of registering image A onto image B.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistrationResult<const C: usize> {
    /// Image A was aligned onto image B.
    Aligned {
        /// Homography mapping image A onto image B.
        homography: Homography,
        /// Inlier flag per correspondence.
        inlier_mask: Vec<bool>,
        /// Ratio-test matches with their inlier flags set.
        correspondences: Vec<Correspondence>,
        /// Image A resampled onto a canvas of image B's size.
        warped_image: Image<f32, C>,
    },
    /// No alignment was found.
    Failed {
        /// The failure tag.
        reason: FailureReason,
    },
}

impl<const C: usize> RegistrationResult<C> {
    /// Whether an alignment was found.
    pub fn is_aligned(&self) -> bool {
        matches!(self, RegistrationResult::Aligned { .. })
    }

    /// The estimated homography, if any.
    pub fn homography(&self) -> Option<&Homography> {
        match self {
            RegistrationResult::Aligned { homography, .. } => Some(homography),
            RegistrationResult::Failed { .. } => None,
        }
    }

    /// The failure tag, if any.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            RegistrationResult::Aligned { .. } => None,
            RegistrationResult::Failed { reason } => Some(*reason),
        }
    }
}

/// Estimate the homography between two feature sets.
///
/// Matches the descriptors of `features_a` against `features_b` with the
/// ratio test, then runs RANSAC over the matched keypoint locations.
///
/// # Errors
///
/// * [`FailureReason::InvalidDescriptorSet`] if a set is empty or mixes
///   descriptor layouts.
/// * [`FailureReason::InsufficientCorrespondences`] if fewer matches than
///   [`RegistrationConfig::required_correspondences`] survive.
/// * [`FailureReason::NoConsensus`] or [`FailureReason::DegenerateGeometry`]
///   from the estimator.
pub fn register_features(
    features_a: &[Feature],
    features_b: &[Feature],
    config: &RegistrationConfig,
) -> Result<Alignment, FailureReason> {
    if features_a.is_empty() || features_b.is_empty() {
        log::debug!(
            "empty feature set ({} in A, {} in B)",
            features_a.len(),
            features_b.len()
        );
        return Err(FailureReason::InvalidDescriptorSet);
    }

    let mut correspondences = match_features(features_a, features_b, &config.matcher)
        .inspect_err(|err| log::debug!("matching failed: {err}"))?;

    let required = config.required_correspondences();
    if correspondences.len() < required {
        log::debug!(
            "{} correspondences after the ratio test, need {required}",
            correspondences.len()
        );
        return Err(FailureReason::InsufficientCorrespondences);
    }

    let (src, dst): (Vec<[f64; 2]>, Vec<[f64; 2]>) = correspondences
        .iter()
        .map(|c| {
            (
                features_a[c.query_idx].keypoint.xy(),
                features_b[c.train_idx].keypoint.xy(),
            )
        })
        .unzip();

    let ransac = ransac_homography(&src, &dst, &config.ransac)
        .inspect_err(|err| log::debug!("homography estimation failed: {err}"))?;

    for (c, &inlier) in correspondences.iter_mut().zip(ransac.inliers.iter()) {
        c.inlier = inlier;
    }

    Ok(Alignment {
        homography: ransac.homography,
        inlier_mask: ransac.inliers,
        correspondences,
        inlier_count: ransac.inlier_count,
        mean_error: ransac.mean_error,
    })
}

/// Register image A onto image B from precomputed features.
///
/// On success image A is warped onto a canvas of image B's size.
///
/// # Errors
///
/// Returns [`RegistrationError::Image`] if the warp fails. Alignment
/// failures are returned as [`RegistrationResult::Failed`].
pub fn register_with_features<const C: usize>(
    image_a: &Image<f32, C>,
    image_b: &Image<f32, C>,
    features_a: &[Feature],
    features_b: &[Feature],
    config: &RegistrationConfig,
) -> Result<RegistrationResult<C>, RegistrationError> {
    let alignment = match register_features(features_a, features_b, config) {
        Ok(alignment) => alignment,
        Err(reason) => {
            log::debug!("registration failed: {reason}");
            return Ok(RegistrationResult::Failed { reason });
        }
    };

    let mut warped_image = Image::from_size_val(image_b.size(), config.fill_value)?;
    warp_perspective(
        image_a,
        &mut warped_image,
        &alignment.homography.to_row_major(),
        config.interpolation,
        [config.fill_value; C],
    )?;

    log::debug!(
        "aligned with {} of {} correspondences as inliers",
        alignment.inlier_count,
        alignment.correspondences.len()
    );

    Ok(RegistrationResult::Aligned {
        homography: alignment.homography,
        inlier_mask: alignment.inlier_mask,
        correspondences: alignment.correspondences,
        warped_image,
    })
}

/// Register image A onto image B.
///
/// Both images are converted to grayscale and passed to `source` (image A
/// first), the features are matched and a homography is estimated with
/// RANSAC. On success image A, with all its channels, is warped onto a canvas
/// of image B's size.
///
/// # Arguments
///
/// * `image_a` - The image to align.
/// * `image_b` - The reference image.
/// * `source` - The keypoint detector and descriptor extractor.
/// * `config` - The registration settings.
///
/// # Errors
///
/// Returns [`RegistrationError`] if grayscale conversion, extraction or the
/// warp fail. Alignment failures are returned as
/// [`RegistrationResult::Failed`].
pub fn register_images<const C: usize, S>(
    image_a: &Image<f32, C>,
    image_b: &Image<f32, C>,
    source: &S,
    config: &RegistrationConfig,
) -> Result<RegistrationResult<C>, RegistrationError>
where
    S: DescriptorSource + ?Sized,
{
    let gray_a = to_gray(image_a)?;
    let gray_b = to_gray(image_b)?;

    let features_a = source.extract(&gray_a)?;
    let features_b = source.extract(&gray_b)?;
    log::debug!(
        "extracted {} features from A and {} from B",
        features_a.len(),
        features_b.len()
    );

    register_with_features(image_a, image_b, &features_a, &features_b, config)
}
