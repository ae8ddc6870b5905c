//! Residue storage backends
//!
//! Sequences keep their residues behind [`StorableSequence`] so that a parse
//! can either copy bytes into memory or point straight into a memory-mapped
//! source file.

pub mod index_cache;

use std::fmt;
use std::sync::Arc;

use crate::engines::core::memory::MemoryMapped;
use crate::engines::{EngineError, EngineResult};

/// Storage mode for parsed sequence data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// In-memory storage (full sequence loaded in RAM)
    #[default]
    InMemory,
    /// Memory-mapped storage (residues read straight from the mapped file, read-only)
    MemoryMapped,
    /// On-demand loading (only record offsets are kept until a record is requested)
    OnDemand,
}

/// Trait for storable sequence data
pub trait StorableSequence: fmt::Debug + Send + Sync {
    /// Get the length of the sequence
    fn len(&self) -> usize;

    /// Check if the sequence is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a subsequence as a vector (0-based, half-open)
    fn subsequence(&self, start: usize, end: usize) -> EngineResult<Vec<u8>> {
        match self.as_slice() {
            Some(slice) if start <= end && end <= slice.len() => Ok(slice[start..end].to_vec()),
            Some(slice) => Err(EngineError::InvalidRange {
                start,
                end,
                len: slice.len(),
            }),
            None => Err(EngineError::UnsupportedOperation(
                "storage does not expose a contiguous slice".to_string(),
            )),
        }
    }

    /// Get a slice of the sequence
    fn as_slice(&self) -> Option<&[u8]>;

    /// Get the storage mode
    fn storage_mode(&self) -> StorageMode;
}

/// In-memory sequence storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryStorage {
    data: Vec<u8>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl StorableSequence for InMemoryStorage {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(&self.data)
    }

    fn storage_mode(&self) -> StorageMode {
        StorageMode::InMemory
    }
}

/// A byte range of a memory-mapped file used as sequence storage
///
/// Several sequences share one map; nothing is copied until a caller asks
/// for an owned subsequence.
#[derive(Debug, Clone)]
pub struct MappedSliceStorage {
    mmap: Arc<MemoryMapped>,
    start: usize,
    end: usize,
}

impl MappedSliceStorage {
    /// Create storage over `mmap[start..end]`
    pub fn new(mmap: Arc<MemoryMapped>, start: usize, end: usize) -> EngineResult<Self> {
        if start > end || end > mmap.len() {
            return Err(EngineError::InvalidRange {
                start,
                end,
                len: mmap.len(),
            });
        }

        Ok(Self { mmap, start, end })
    }
}

impl StorableSequence for MappedSliceStorage {
    fn len(&self) -> usize {
        self.end - self.start
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(self.mmap.slice(self.start, self.end))
    }

    fn storage_mode(&self) -> StorageMode {
        StorageMode::MemoryMapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_in_memory_storage() {
        let data = b"ACGTACGTACGT".to_vec();
        let storage = InMemoryStorage::new(data.clone());

        assert_eq!(storage.len(), data.len());
        assert_eq!(storage.subsequence(4, 8).unwrap(), b"ACGT");
        assert_eq!(storage.as_slice().unwrap(), data.as_slice());
        assert_eq!(storage.storage_mode(), StorageMode::InMemory);

        assert!(matches!(
            storage.subsequence(8, 20),
            Err(EngineError::InvalidRange { start: 8, end: 20, len: 12 })
        ));
    }

    #[test]
    fn test_mapped_slice_storage() -> std::io::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.seq");
        {
            let mut file = std::fs::File::create(&file_path)?;
            file.write_all(b"@r\nGGGACGTTT\n")?;
        }

        let mmap = Arc::new(MemoryMapped::open(&file_path)?);
        let storage = MappedSliceStorage::new(Arc::clone(&mmap), 3, 12).unwrap();

        assert_eq!(storage.len(), 9);
        assert_eq!(storage.as_slice().unwrap(), b"GGGACGTTT");
        assert_eq!(storage.subsequence(3, 7).unwrap(), b"ACGT");
        assert_eq!(storage.storage_mode(), StorageMode::MemoryMapped);

        assert!(MappedSliceStorage::new(mmap, 10, 40).is_err());

        Ok(())
    }
}
