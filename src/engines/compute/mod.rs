//! Compute primitives for sequence text
//!
//! Byte and string helpers shared by the parsers and formatters.

pub mod string_ops;

/// Compute operation result type
pub type ComputeResult<T> = Result<T, ComputeError>;

/// Error types for compute operations
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("Invalid input data: {0}")]
    InvalidInput(String),

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),
}
