use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{homography_4pt2d, homography_dlt, Homography, HomographyError, MIN_CORRESPONDENCES};

const SAMPLE_SIZE: usize = 4;

/// Parameters for RANSAC homography estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Inlier threshold on the reprojection error, in pixels.
    pub threshold: f64,
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Probability of drawing at least one outlier-free sample.
    pub confidence: f64,
    /// Assumed lower bound of the inlier ratio used to size the iteration budget.
    pub min_inlier_ratio: f64,
    /// Minimum number of inliers required for acceptance, never below four.
    pub min_inliers: usize,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
    /// Evaluate hypotheses on the rayon pool.
    pub parallel: bool,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            max_iterations: 2000,
            confidence: 0.995,
            min_inlier_ratio: 0.25,
            min_inliers: MIN_CORRESPONDENCES,
            random_seed: Some(0),
            parallel: true,
        }
    }
}

/// Result of a RANSAC homography fit.
#[derive(Clone, Debug, PartialEq)]
pub struct RansacResult {
    /// Estimated homography, mapping source onto destination points.
    pub homography: Homography,
    /// Per-correspondence inlier mask.
    pub inliers: Vec<bool>,
    /// Total inlier count.
    pub inlier_count: usize,
    /// Mean reprojection error over the inliers.
    pub mean_error: f64,
    /// Number of hypotheses drawn.
    pub iterations: usize,
    /// Whether the least squares refit over the inliers was returned.
    pub refined: bool,
}

/// Number of iterations needed to draw one all-inlier sample with the given
/// confidence, capped at `max_iterations`.
///
/// # Example
///
/// ```
/// use imreg_geometry::ransac_iterations;
///
/// assert_eq!(ransac_iterations(0.995, 0.25, 4, 2000), 1354);
/// assert_eq!(ransac_iterations(0.995, 0.25, 4, 500), 500);
/// assert_eq!(ransac_iterations(0.995, 1.0, 4, 500), 1);
/// ```
pub fn ransac_iterations(
    confidence: f64,
    inlier_ratio: f64,
    sample_size: usize,
    max_iterations: usize,
) -> usize {
    if max_iterations == 0 {
        return 0;
    }
    if inlier_ratio >= 1.0 || confidence <= 0.0 {
        return 1;
    }
    if inlier_ratio <= 0.0 || confidence >= 1.0 {
        return max_iterations;
    }

    let p_good = inlier_ratio.powi(sample_size as i32);
    let denom = (1.0 - p_good).ln();
    if denom >= 0.0 || !denom.is_finite() {
        return max_iterations;
    }

    let k = ((1.0 - confidence).ln() / denom).ceil();
    if !k.is_finite() || k >= max_iterations as f64 {
        max_iterations
    } else {
        (k as usize).max(1)
    }
}

/// A scored hypothesis.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    iteration: usize,
    homography: Homography,
    count: usize,
    mean_error: f64,
}

impl Candidate {
    /// More inliers, then lower mean error, then earlier iteration.
    fn beats(&self, other: &Candidate) -> bool {
        other
            .count
            .cmp(&self.count)
            .then(self.mean_error.total_cmp(&other.mean_error))
            .then(self.iteration.cmp(&other.iteration))
            .is_lt()
    }
}

fn pick_best(a: Candidate, b: Candidate) -> Candidate {
    if b.beats(&a) {
        b
    } else {
        a
    }
}

/// Inlier count and mean inlier error of `h`.
fn score(h: &Homography, src: &[[f64; 2]], dst: &[[f64; 2]], threshold: f64) -> (usize, f64) {
    let (count, sum) = src
        .iter()
        .zip(dst.iter())
        .map(|(&p, &q)| h.reprojection_error(p, q))
        .filter(|&err| err < threshold)
        .fold((0usize, 0.0f64), |(count, sum), err| (count + 1, sum + err));
    let mean = if count == 0 {
        f64::INFINITY
    } else {
        sum / count as f64
    };
    (count, mean)
}

fn inlier_mask(h: &Homography, src: &[[f64; 2]], dst: &[[f64; 2]], threshold: f64) -> Vec<bool> {
    src.iter()
        .zip(dst.iter())
        .map(|(&p, &q)| h.reprojection_error(p, q) < threshold)
        .collect()
}

fn evaluate(
    iteration: usize,
    sample: &[usize; SAMPLE_SIZE],
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    threshold: f64,
) -> Option<Candidate> {
    let s1 = sample.map(|i| src[i]);
    let s2 = sample.map(|i| dst[i]);
    let homography = homography_4pt2d(&s1, &s2).ok()?;
    let (count, mean_error) = score(&homography, src, dst, threshold);
    Some(Candidate {
        iteration,
        homography,
        count,
        mean_error,
    })
}

/// Refit `best` by least squares over its inliers.
///
/// The refit and its own mask are returned unless the refit is degenerate
/// or falls below `required` inliers, in which case the sample model and its
/// mask are kept.
fn refine(
    best: &Candidate,
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    threshold: f64,
    required: usize,
    iterations: usize,
) -> RansacResult {
    let mask = inlier_mask(&best.homography, src, dst, threshold);
    let (inlier_src, inlier_dst): (Vec<[f64; 2]>, Vec<[f64; 2]>) = mask
        .iter()
        .zip(src.iter().zip(dst.iter()))
        .filter(|(inlier, _)| **inlier)
        .map(|(_, (&p, &q))| (p, q))
        .unzip();

    match homography_dlt(&inlier_src, &inlier_dst) {
        Ok(homography) => {
            let (inlier_count, mean_error) = score(&homography, src, dst, threshold);
            if inlier_count >= required {
                if inlier_count < best.count {
                    log::warn!(
                        "refit lost inliers ({inlier_count} vs {} for the sample model)",
                        best.count
                    );
                }
                return RansacResult {
                    homography,
                    inliers: inlier_mask(&homography, src, dst, threshold),
                    inlier_count,
                    mean_error,
                    iterations,
                    refined: true,
                };
            }
            log::warn!("refit keeps {inlier_count} inliers, need {required}, using the sample");
        }
        Err(err) => log::warn!("refit failed ({err}), using the sample model"),
    }

    RansacResult {
        homography: best.homography,
        inliers: mask,
        inlier_count: best.count,
        mean_error: best.mean_error,
        iterations,
        refined: false,
    }
}

/// Robustly estimate the homography mapping `src` onto `dst`.
///
/// Draws minimal samples of four correspondences from a seeded generator,
/// skips samples where three points of either side are collinear, fits each
/// remaining sample exactly and keeps the hypothesis with the most inliers
/// (ties go to the lower mean error, then to the earlier iteration). The
/// winner is refit by least squares over its inliers and the refit is
/// returned with its own inlier mask. The sample model is kept only when the
/// refit is degenerate or drops below `min_inliers`.
///
/// With a fixed seed the result is identical whether hypotheses are evaluated
/// serially or in parallel.
///
/// # Arguments
///
/// * `src` - Points in image A.
/// * `dst` - Matching points in image B.
/// * `params` - The RANSAC parameters.
///
/// # Errors
///
/// * [`HomographyError::InvalidInput`] for mismatched lengths or non-finite points.
/// * [`HomographyError::InsufficientCorrespondences`] for fewer than four points.
/// * [`HomographyError::DegenerateGeometry`] when every sample was degenerate.
/// * [`HomographyError::NoConsensus`] when the best model has too few inliers.
pub fn ransac_homography(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    params: &RansacParams,
) -> Result<RansacResult, HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::InvalidInput(format!(
            "{} source points and {} destination points",
            src.len(),
            dst.len()
        )));
    }
    if src.iter().chain(dst.iter()).flatten().any(|v| !v.is_finite()) {
        return Err(HomographyError::InvalidInput(
            "non-finite point coordinates".to_string(),
        ));
    }

    let n = src.len();
    if n < MIN_CORRESPONDENCES {
        return Err(HomographyError::InsufficientCorrespondences {
            required: MIN_CORRESPONDENCES,
            actual: n,
        });
    }

    let iterations = ransac_iterations(
        params.confidence,
        params.min_inlier_ratio,
        SAMPLE_SIZE,
        params.max_iterations,
    );

    let mut rng = match params.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let mut tr = rand::rng();
            StdRng::from_rng(&mut tr)
        }
    };

    let samples: Vec<[usize; SAMPLE_SIZE]> = (0..iterations)
        .map(|_| {
            let idx = rand::seq::index::sample(&mut rng, n, SAMPLE_SIZE);
            [idx.index(0), idx.index(1), idx.index(2), idx.index(3)]
        })
        .collect();

    log::debug!(
        "ransac: {} correspondences, {} iterations, threshold {}",
        n,
        iterations,
        params.threshold
    );

    let best = if params.parallel {
        samples
            .par_iter()
            .enumerate()
            .filter_map(|(i, s)| evaluate(i, s, src, dst, params.threshold))
            .reduce_with(pick_best)
    } else {
        samples
            .iter()
            .enumerate()
            .filter_map(|(i, s)| evaluate(i, s, src, dst, params.threshold))
            .reduce(pick_best)
    };

    let Some(best) = best else {
        return Err(HomographyError::DegenerateGeometry);
    };

    let required = params.min_inliers.max(MIN_CORRESPONDENCES);
    if best.count < required {
        return Err(HomographyError::NoConsensus {
            inliers: best.count,
            required,
        });
    }

    let result = refine(&best, src, dst, params.threshold, required, iterations);
    log::debug!(
        "ransac: {} of {} inliers, mean error {:.4} px (best sample at iteration {})",
        result.inlier_count,
        n,
        result.mean_error,
        best.iteration
    );

    Ok(result)
}
