/// Errors raised while estimating a homography.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HomographyError {
    /// Source and destination point sets differ in length or hold non-finite values.
    #[error("Invalid correspondences: {0}")]
    InvalidInput(String),

    /// Fewer correspondences than the model needs.
    #[error("Need at least {required} correspondences, got {actual}")]
    InsufficientCorrespondences {
        /// Minimum number of correspondences.
        required: usize,
        /// Number of correspondences supplied.
        actual: usize,
    },

    /// The best hypothesis was supported by too few inliers.
    #[error("No consensus: best model has {inliers} inliers, need {required}")]
    NoConsensus {
        /// Inliers of the best hypothesis.
        inliers: usize,
        /// Minimum number of inliers.
        required: usize,
    },

    /// Every sampled hypothesis was degenerate.
    #[error("Degenerate geometry: no sample produced a valid homography")]
    DegenerateGeometry,

    /// A fit produced a rank deficient or non-normalizable matrix.
    #[error("Degenerate homography: {0}")]
    Degenerate(&'static str),
}
