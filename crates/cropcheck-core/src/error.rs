//! Error types for CropCheck

/// Result type alias using CropCheck's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for CropCheck operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied something unusable (missing/corrupt image, bad area)
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// A required runtime resource (the classifier) is not available
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Classifier output and reference data disagree in shape
    #[error("data mismatch at {stage}: {detail}")]
    DataMismatch {
        /// Pipeline stage that detected the mismatch
        stage: &'static str,
        /// Human readable description, including the offending sizes
        detail: String,
    },

    /// Reference table has no entry for the given canonical key
    #[error("no entry for '{0}'")]
    NotFound(String),

    /// Classifier execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Configuration and reference-data loading errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new input validation error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::InputValidation(msg.into())
    }

    /// Create a new resource-unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ResourceUnavailable(msg.into())
    }

    /// Create a new data mismatch error for the given stage
    pub fn mismatch(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::DataMismatch {
            stage,
            detail: detail.into(),
        }
    }

    /// Create a new lookup-miss error
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller is at fault (maps to a 400-class response)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InputValidation(_))
    }

    /// Whether this is a reference-table miss rather than a failure
    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
