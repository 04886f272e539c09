//! Error types for the warden gateway.

use thiserror::Error;

/// Main error type for warden operations.
#[derive(Error, Debug)]
pub enum WardenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for warden operations.
pub type Result<T> = std::result::Result<T, WardenError>;
