//! Error types for reviewsense

/// Result type alias using reviewsense's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for reviewsense operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A corpus record lacks a required field; the record is skipped
    #[error("missing field: {0}")]
    MissingField(String),

    /// A corpus record carries a field that cannot be parsed
    #[error("invalid value for field {field}: {value:?}")]
    InvalidField { field: String, value: String },

    /// The label codec was asked to encode a label it was never fitted on
    #[error("unseen label: {0}")]
    UnseenLabel(String),

    /// The persisted artifact set is missing a piece or is inconsistent
    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// Training could not proceed with the given corpus
    #[error("training error: {0}")]
    Training(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited corpus errors
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new missing-field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create a new invalid-field error
    pub fn invalid_field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a new unseen-label error
    pub fn unseen_label(label: impl Into<String>) -> Self {
        Self::UnseenLabel(label.into())
    }

    /// Create a new corrupt-artifact error
    pub fn corrupt_artifact(msg: impl Into<String>) -> Self {
        Self::CorruptArtifact(msg.into())
    }

    /// Create a new training error
    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a corpus loader may skip the offending record and continue
    pub fn is_record_level(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidField { .. })
    }
}
