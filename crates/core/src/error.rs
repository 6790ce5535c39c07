//! Core error types

use thiserror::Error;

/// Core error type for TwoKey
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration value could not be applied
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
