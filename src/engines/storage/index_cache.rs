//! On-disk record index sidecar (`<source>.isc`)
//!
//! The layout is implementation-defined, little-endian:
//!
//! ```text
//! magic           6 bytes  b"BFISC\x01"
//! source length   u64
//! source mtime    u64      seconds since the Unix epoch, 0 if unknown
//! record count    u64
//! records         count x (start u64, end u64, sequence length u64)
//! ```
//!
//! A cache is only trusted when the recorded length and mtime still match
//! the source file. Writers go through a temporary file that is renamed into
//! place, so a reader never observes a half-written sidecar.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info, warn};
use parking_lot::{const_mutex, Mutex};

use crate::engines::{EngineError, EngineResult};

const MAGIC: &[u8; 6] = b"BFISC\x01";

/// File extension appended to the source path
pub const INDEX_CACHE_EXTENSION: &str = "isc";

// Serializes sidecar writes within the process; the rename handles other processes.
static CACHE_WRITE_LOCK: Mutex<()> = const_mutex(());

/// Offsets of one record in the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub start: u64,
    pub end: u64,
    pub sequence_length: u64,
}

/// Record index for one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCache {
    source_len: u64,
    source_mtime: u64,
    entries: Vec<IndexEntry>,
}

/// Path of the sidecar for `source`
pub fn cache_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(".");
    name.push(INDEX_CACHE_EXTENSION);
    PathBuf::from(name)
}

fn source_stamp(source: &Path) -> io::Result<(u64, u64)> {
    let metadata = fs::metadata(source)?;
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs())
        .unwrap_or(0);
    Ok((metadata.len(), mtime))
}

/// Removes the temporary file unless it was renamed into place
struct TempFileGuard {
    path: PathBuf,
    persisted: bool,
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl IndexCache {
    /// Build a cache for `source` from freshly scanned entries
    pub fn for_source(source: &Path, entries: Vec<IndexEntry>) -> EngineResult<Self> {
        let (source_len, source_mtime) = source_stamp(source)?;
        Ok(Self {
            source_len,
            source_mtime,
            entries,
        })
    }

    /// Indexed records
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Load the sidecar of `source`
    ///
    /// Returns `Ok(None)` when there is no sidecar or when it no longer
    /// matches the source file.
    pub fn load(source: &Path) -> EngineResult<Option<Self>> {
        let path = cache_path(source);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let cache = Self::read_from(&mut BufReader::new(file))?;
        let (source_len, source_mtime) = source_stamp(source)?;
        if cache.source_len != source_len || cache.source_mtime != source_mtime {
            warn!(
                "ignoring stale index cache {} (source changed)",
                path.display()
            );
            return Ok(None);
        }

        debug!(
            "loaded {} record offsets from {}",
            cache.entries.len(),
            path.display()
        );
        Ok(Some(cache))
    }

    /// Write the sidecar next to `source`
    pub fn store(&self, source: &Path) -> EngineResult<()> {
        let _lock = CACHE_WRITE_LOCK.lock();

        let path = cache_path(source);
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(format!(".tmp{}", std::process::id()));
        let mut guard = TempFileGuard {
            path: PathBuf::from(temp_name),
            persisted: false,
        };

        {
            let mut writer = BufWriter::new(File::create(&guard.path)?);
            self.write_to(&mut writer)?;
            writer.flush()?;
        }

        fs::rename(&guard.path, &path)?;
        guard.persisted = true;

        info!(
            "wrote index cache {} ({} records)",
            path.display(),
            self.entries.len()
        );
        Ok(())
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_u64::<LittleEndian>(self.source_len)?;
        writer.write_u64::<LittleEndian>(self.source_mtime)?;
        writer.write_u64::<LittleEndian>(self.entries.len() as u64)?;
        for entry in &self.entries {
            writer.write_u64::<LittleEndian>(entry.start)?;
            writer.write_u64::<LittleEndian>(entry.end)?;
            writer.write_u64::<LittleEndian>(entry.sequence_length)?;
        }
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> EngineResult<Self> {
        let mut magic = [0u8; 6];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(EngineError::IndexCache("bad magic bytes".to_string()));
        }

        let source_len = reader.read_u64::<LittleEndian>()?;
        let source_mtime = reader.read_u64::<LittleEndian>()?;
        let count = reader.read_u64::<LittleEndian>()?;

        let mut entries = Vec::new();
        for _ in 0..count {
            let start = reader.read_u64::<LittleEndian>()?;
            let end = reader.read_u64::<LittleEndian>()?;
            let sequence_length = reader.read_u64::<LittleEndian>()?;
            if start > end || end > source_len {
                return Err(EngineError::IndexCache(format!(
                    "record offsets {}..{} outside source of length {}",
                    start, end, source_len
                )));
            }
            entries.push(IndexEntry {
                start,
                end,
                sequence_length,
            });
        }

        Ok(Self {
            source_len,
            source_mtime,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_source(path: &Path, content: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(content)
    }

    #[test]
    fn test_cache_path_appends_extension() {
        let path = cache_path(Path::new("/data/reads.fastq"));
        assert_eq!(path, PathBuf::from("/data/reads.fastq.isc"));
    }

    #[test]
    fn test_store_and_load() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("reads.fastq");
        write_source(&source, b"@r1\nACGT\n+\nIIII\n")?;

        let entries = vec![IndexEntry {
            start: 0,
            end: 16,
            sequence_length: 4,
        }];
        let cache = IndexCache::for_source(&source, entries.clone())?;
        cache.store(&source)?;

        assert!(cache_path(&source).exists());
        let loaded = IndexCache::load(&source)?.expect("cache should be valid");
        assert_eq!(loaded.entries(), entries.as_slice());
        assert_eq!(loaded, cache);

        // No temporary files are left behind
        let leftovers = fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        Ok(())
    }

    #[test]
    fn test_concurrent_stores() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("reads.fastq");
        write_source(&source, b"@r1\nACGT\n+\nIIII\n@r2\nAC\n+\nII\n")?;

        // Writer i stores i + 1 entries, so any complete sidecar is recognizable
        let candidates: Vec<Vec<IndexEntry>> = (0..8u64)
            .map(|i| {
                (0..=i)
                    .map(|j| IndexEntry {
                        start: j,
                        end: j + 1,
                        sequence_length: i,
                    })
                    .collect()
            })
            .collect();

        std::thread::scope(|scope| {
            for entries in &candidates {
                let source = &source;
                scope.spawn(move || {
                    IndexCache::for_source(source, entries.clone())
                        .and_then(|cache| cache.store(source))
                        .unwrap();
                });
            }
        });

        let loaded = IndexCache::load(&source)?.expect("a writer should have won");
        assert!(candidates.iter().any(|entries| loaded.entries() == entries.as_slice()));

        let leftovers = fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        Ok(())
    }

    #[test]
    fn test_missing_and_stale_cache() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("reads.fastq");
        write_source(&source, b"@r1\nACGT\n+\nIIII\n")?;

        assert!(IndexCache::load(&source)?.is_none());

        let cache = IndexCache::for_source(&source, Vec::new())?;
        cache.store(&source)?;

        // Changing the source length invalidates the sidecar
        write_source(&source, b"@r1\nACGTA\n+\nIIIII\n")?;
        assert!(IndexCache::load(&source)?.is_none());

        Ok(())
    }

    #[test]
    fn test_corrupt_cache_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("reads.fastq");
        write_source(&source, b"@r1\nACGT\n+\nIIII\n")?;
        write_source(&cache_path(&source), b"not a cache")?;

        assert!(IndexCache::load(&source).is_err());
        Ok(())
    }
}
