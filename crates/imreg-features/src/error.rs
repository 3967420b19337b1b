/// Errors raised while matching descriptors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// The descriptors mix kinds or lengths, or cannot be indexed.
    #[error("Invalid descriptor set: {0}")]
    InvalidDescriptorSet(String),

    /// The search parameters are out of range.
    #[error("Invalid search parameters: {0}")]
    InvalidParams(String),
}

/// Errors raised by descriptor sources.
#[derive(thiserror::Error, Debug)]
pub enum FeatureError {
    /// The external extractor failed.
    #[error("Feature extraction failed: {0}")]
    Extraction(String),

    /// Failed to read a feature file.
    #[error("Failed to read features. {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a feature file.
    #[error("Failed to parse features. {0}")]
    Json(#[from] serde_json::Error),
}
