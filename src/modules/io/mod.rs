//! File format support
//!
//! FASTQ and GenBank readers and writers, sharing one error type.

pub mod error;
pub mod fastq;
pub mod genbank;

pub use error::{ErrorKind, ParseError, ParseResult};
