//! Core I/O engine
//!
//! Buffered readers and writers plus read-only memory mapping.

pub mod io;
pub mod memory;

pub use io::{FastReader, FastWriter, LineCursor, RawLine};
pub use memory::MemoryMapped;
