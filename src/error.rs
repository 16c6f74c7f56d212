//! Error types for Sorrel.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SorrelError>;

/// The error type for all Sorrel operations.
#[derive(Debug, Error)]
pub enum SorrelError {
    /// Invalid field or store configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A flush was attempted while a transaction is in progress.
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// No document exists with the given id.
    #[error("Document not found: {0}")]
    DocNotFound(u32),

    /// The document is not attached to a store.
    #[error("Document is not attached to a store")]
    DocNotSet,

    /// A numeric value cannot be represented by the value codec.
    #[error("Value out of bounds: {0}")]
    ValueOutOfBounds(String),

    /// No stemmer or stopper data exists for a language.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A field value could not be converted to its declared type.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A query string could not be parsed.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Stored bytes could not be decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Failure reported by the index engine.
    #[error("Engine error: {0}")]
    Engine(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SorrelError {
    pub fn config(msg: impl Into<String>) -> Self {
        SorrelError::Config(msg.into())
    }

    pub fn concurrency(msg: impl Into<String>) -> Self {
        SorrelError::Concurrency(msg.into())
    }

    pub fn value_out_of_bounds(msg: impl Into<String>) -> Self {
        SorrelError::ValueOutOfBounds(msg.into())
    }

    pub fn unsupported_language(language: impl Into<String>) -> Self {
        SorrelError::UnsupportedLanguage(language.into())
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        SorrelError::TypeMismatch(msg.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        SorrelError::InvalidQuery(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        SorrelError::InvalidArgument(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        SorrelError::InvalidOperation(msg.into())
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        SorrelError::Codec(msg.into())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        SorrelError::Engine(msg.into())
    }
}
