use thiserror::Error;

pub type Result<T> = std::result::Result<T, RendezError>;

#[derive(Debug, Error)]
pub enum RendezError {
    /// The event source could not be read at all. Fatal to
    /// initialization; never retried automatically.
    #[error("Event source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single event record is missing a required descriptive field.
    /// The record is skipped; ingestion of other records continues.
    #[error("Malformed event record: {reason}")]
    MalformedRecord { reason: String },

    /// The encoder failed for the single operation being performed.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// An embedding's length does not match the collection dimension.
    /// Fatal: partial ingestion with mixed dimensions would silently
    /// break every future similarity comparison.
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
