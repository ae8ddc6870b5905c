//! FASTQ reads
//!
//! Parsing with per-record quality format detection, on-demand access to
//! large files through record offsets, and formatting back to text.

pub mod formatter;
pub mod parser;
pub mod virtualized;

/// Convenience re-exports
pub use formatter::FastqFormatter;
pub use parser::FastqParser;
pub use virtualized::{SequencePointer, VirtualFastq};
