//! Error types for dapi-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Data length invalid: expected 32 bytes, got {0}")]
    DataLengthInvalid(usize),

    #[error("Value out of range")]
    ValueOutOfRange,

    #[error("Incorrect parameter length: expected {expected}, got {actual}")]
    IncorrectParameterLength { expected: usize, actual: usize },

    #[error("dAPI name too long: {0} bytes")]
    DapiNameTooLong(usize),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
