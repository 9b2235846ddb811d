//! Common error types and handling for Careline

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Careline workspace
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
