use thiserror::Error;

/// Top-level error type for the pensionbot service.
///
/// Subsystem crates define their own error types and convert into
/// `PensionbotError` where they cross into the composition root, so that the
/// `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PensionbotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for PensionbotError {
    fn from(err: toml::de::Error) -> Self {
        PensionbotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PensionbotError {
    fn from(err: toml::ser::Error) -> Self {
        PensionbotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PensionbotError {
    fn from(err: serde_json::Error) -> Self {
        PensionbotError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for pensionbot operations.
pub type Result<T> = std::result::Result<T, PensionbotError>;
