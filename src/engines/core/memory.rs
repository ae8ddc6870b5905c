//! Memory mapping primitives
//!
//! Read-only memory maps used by the zero-copy and on-demand FASTQ modes.

use std::fs::File;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

/// Read-only memory-mapped file
///
/// Zero-length files cannot be mapped on every platform, so an empty file
/// is represented without a map and behaves as an empty slice.
#[derive(Debug)]
pub struct MemoryMapped {
    mmap: Option<Mmap>,
    len: usize,
}

impl MemoryMapped {
    /// Map a file read-only
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len() as usize;

        let mmap = if len == 0 {
            None
        } else {
            // The map is only ever read; callers must not truncate the file while it is open.
            Some(unsafe { MmapOptions::new().map(&file)? })
        };

        Ok(Self { mmap, len })
    }

    /// Get a reference to the underlying memory-mapped data
    pub fn as_slice(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..self.len],
            None => &[],
        }
    }

    /// Get the length of the memory-mapped data
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the memory-mapped data is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get a slice of the memory-mapped data, clamped to the mapped length
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        let data = self.as_slice();
        let end = end.min(self.len);
        &data[start.min(end)..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_memory_mapped_slices() -> std::io::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("mapped.txt");
        {
            let mut file = File::create(&file_path)?;
            file.write_all(b"@read1\nACGT\n")?;
        }

        let mapped = MemoryMapped::open(&file_path)?;
        assert_eq!(mapped.len(), 12);
        assert_eq!(mapped.slice(7, 11), b"ACGT");
        // Out-of-range requests are clamped rather than panicking
        assert_eq!(mapped.slice(10, 100), b"T\n");

        Ok(())
    }

    #[test]
    fn test_empty_file_maps_to_empty_slice() -> std::io::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("empty.txt");
        File::create(&file_path)?;

        let mapped = MemoryMapped::open(&file_path)?;
        assert!(mapped.is_empty());
        assert!(mapped.as_slice().is_empty());

        Ok(())
    }
}
