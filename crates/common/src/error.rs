use thiserror::Error;

/// Unified error type for Igloo crates.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures a caller may retry against the store.
    pub fn is_store(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}
