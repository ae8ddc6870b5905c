//! Low-level engines shared by the format modules
//!
//! `core` holds file I/O and memory mapping, `storage` the residue storage
//! backends and the FASTQ index cache, `compute` the byte-level string
//! primitives used by the parsers and formatters.

pub mod core;
pub mod compute;
pub mod storage;

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Error types for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage range {start}..{end} for storage of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    #[error("Index cache error: {0}")]
    IndexCache(String),
}
