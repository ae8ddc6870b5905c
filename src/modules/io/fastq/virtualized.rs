//! On-demand FASTQ access
//!
//! Opening a file keeps only the byte offsets of its records. Residues and
//! qualities are read from disk when a record is requested. The offsets can
//! be persisted in a `<path>.isc` sidecar so a later open skips the scan.

use std::path::{Path, PathBuf};

use log::{debug, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::parser::{scan_record, FastqParser, RecordSpan};
use crate::engines::core::{FastReader, LineCursor, MemoryMapped};
use crate::engines::storage::index_cache::{IndexCache, IndexEntry};
use crate::modules::io::error::{ParseError, ParseResult};
use crate::modules::seq::{detect_alphabet, QualitativeSequence};

/// Location of one record in its source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePointer {
    /// Position of the record in the file
    pub index: usize,
    /// Offset of the `@` line
    pub start: u64,
    /// Offset just past the last quality line
    pub end: u64,
    pub sequence_length: u64,
    /// Alphabet detected while scanning; unknown when offsets came from the cache
    pub alphabet_name: Option<&'static str>,
}

impl SequencePointer {
    fn from_span(index: usize, span: &RecordSpan, data: &[u8]) -> Self {
        let residues: Vec<u8> = span
            .residues
            .iter()
            .flat_map(|r| data[r.clone()].iter().copied())
            .collect();
        Self {
            index,
            start: span.start as u64,
            end: span.end as u64,
            sequence_length: span.sequence_length as u64,
            alphabet_name: detect_alphabet(&residues).map(|a| a.name()),
        }
    }

    fn from_entry(index: usize, entry: &IndexEntry) -> Self {
        Self {
            index,
            start: entry.start,
            end: entry.end,
            sequence_length: entry.sequence_length,
            alphabet_name: None,
        }
    }

    fn to_entry(self) -> IndexEntry {
        IndexEntry {
            start: self.start,
            end: self.end,
            sequence_length: self.sequence_length,
        }
    }

    fn byte_len(&self) -> ParseResult<usize> {
        usize::try_from(self.end - self.start).map_err(|_| {
            ParseError::Range(format!("record {} is too large to load", self.index))
        })
    }
}

/// A FASTQ file opened for on-demand reads
#[derive(Debug, Clone)]
pub struct VirtualFastq {
    path: PathBuf,
    parser: FastqParser,
    pointers: Vec<SequencePointer>,
}

impl VirtualFastq {
    pub(crate) fn open(parser: FastqParser, path: &Path) -> ParseResult<Self> {
        let cached = if parser.index_cache_enabled() {
            match IndexCache::load(path) {
                Ok(cache) => cache,
                Err(e) => {
                    warn!("ignoring unreadable index cache for {}: {}", path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        let pointers = match cached {
            Some(cache) => cache
                .entries()
                .iter()
                .enumerate()
                .map(|(index, entry)| SequencePointer::from_entry(index, entry))
                .collect(),
            None => {
                let pointers = Self::scan(path)?;
                if parser.index_cache_enabled() && !pointers.is_empty() {
                    let entries = pointers.iter().map(|p| p.to_entry()).collect();
                    if let Err(e) = IndexCache::for_source(path, entries).and_then(|c| c.store(path)) {
                        warn!("could not write index cache for {}: {}", path.display(), e);
                    }
                }
                pointers
            }
        };

        if pointers.is_empty() {
            return Err(ParseError::Format(format!(
                "no FASTQ records found in {}",
                path.display()
            )));
        }
        debug!("Indexed {} FASTQ records in {}", pointers.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            parser,
            pointers,
        })
    }

    fn scan(path: &Path) -> ParseResult<Vec<SequencePointer>> {
        let mmap = MemoryMapped::open(path)?;
        let data = mmap.as_slice();
        let mut cursor = LineCursor::new(data);
        let mut pointers = Vec::new();
        while let Some(span) = scan_record(&mut cursor)? {
            pointers.push(SequencePointer::from_span(pointers.len(), &span, data));
        }
        Ok(pointers)
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pointers(&self) -> &[SequencePointer] {
        &self.pointers
    }

    /// Load record `index`
    pub fn get(&self, index: usize) -> ParseResult<QualitativeSequence> {
        let pointer = self.pointers.get(index).ok_or_else(|| {
            ParseError::Range(format!(
                "record {} requested from a file of {} records",
                index,
                self.pointers.len()
            ))
        })?;
        self.materialize(pointer)
    }

    /// Read the record bytes behind `pointer` and locate the record in them
    fn read_span(&self, pointer: &SequencePointer) -> ParseResult<(Vec<u8>, RecordSpan)> {
        let mut reader = FastReader::new(&self.path, None)?;
        let data = reader.read_at(pointer.start, pointer.byte_len()?)?;
        let span = scan_record(&mut LineCursor::new(&data))?.ok_or_else(|| {
            ParseError::Format(format!(
                "no record at offset {} of {}",
                pointer.start,
                self.path.display()
            ))
        })?;
        if span.sequence_length as u64 != pointer.sequence_length {
            return Err(ParseError::Format(format!(
                "record {} changed length on disk",
                pointer.index
            )));
        }
        Ok((data, span))
    }

    /// Load the record behind `pointer`
    pub fn materialize(&self, pointer: &SequencePointer) -> ParseResult<QualitativeSequence> {
        let (data, span) = self.read_span(pointer)?;
        self.parser.build_record(&span, &data, None)
    }

    /// Identifier of the record behind `pointer`
    pub fn get_sequence_id(&self, pointer: &SequencePointer) -> ParseResult<String> {
        let (_, span) = self.read_span(pointer)?;
        Ok(span.id)
    }

    /// Residues and qualities `start_index..start_index + count` of one record
    pub fn parse_range(
        &self,
        start_index: usize,
        count: usize,
        pointer: &SequencePointer,
    ) -> ParseResult<QualitativeSequence> {
        let end = start_index
            .checked_add(count)
            .filter(|&end| end as u64 <= pointer.sequence_length)
            .ok_or_else(|| {
                ParseError::Range(format!(
                    "range {}+{} exceeds record {} of length {}",
                    start_index, count, pointer.index, pointer.sequence_length
                ))
            })?;
        let record = self.materialize(pointer)?;
        Ok(record.subsequence(start_index, end)?)
    }

    /// Load records one at a time
    pub fn iter(&self) -> impl Iterator<Item = ParseResult<QualitativeSequence>> + '_ {
        self.pointers.iter().map(move |pointer| self.materialize(pointer))
    }

    /// Load every record
    #[cfg(not(feature = "parallel"))]
    pub fn materialize_all(&self) -> ParseResult<Vec<QualitativeSequence>> {
        self.iter().collect()
    }

    /// Load every record
    #[cfg(feature = "parallel")]
    pub fn materialize_all(&self) -> ParseResult<Vec<QualitativeSequence>> {
        self.pointers
            .par_iter()
            .map(|pointer| self.materialize(pointer))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::storage::index_cache::cache_path;
    use crate::engines::storage::StorageMode;
    use crate::modules::io::error::ErrorKind;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    const READS: &str = "@read1\nACGTACGTAC\n+\nIIIIIHHHHH\n\n@read2\nGGCC\nTTAA\n+read2\n!!!!\n####\n";

    fn write_reads(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("reads.fastq");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(READS.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_pointers() {
        let dir = TempDir::new().unwrap();
        let path = write_reads(&dir);
        let reads = FastqParser::new().with_index_cache(false).open_virtual(&path).unwrap();

        assert_eq!(reads.len(), 2);
        assert_eq!(reads.path(), path.as_path());
        let first = reads.pointers()[0];
        assert_eq!((first.index, first.start, first.sequence_length), (0, 0, 10));
        assert_eq!(first.alphabet_name, Some("DNA"));
        assert_eq!(first.end as usize, "@read1\nACGTACGTAC\n+\nIIIIIHHHHH\n".len());
        assert_eq!(reads.pointers()[1].sequence_length, 8);
        assert!(!cache_path(&path).exists());
    }

    #[test]
    fn test_materialize_matches_full_parse() {
        let dir = TempDir::new().unwrap();
        let path = write_reads(&dir);
        let reads = FastqParser::new().open_virtual(&path).unwrap();

        let loaded: Vec<_> = reads.iter().collect::<ParseResult<_>>().unwrap();
        let parsed = FastqParser::new().parse_file(&path).unwrap();
        assert_eq!(loaded, parsed);
        assert_eq!(reads.materialize_all().unwrap(), parsed);

        assert_eq!(reads.get(1).unwrap().as_string(), "GGCCTTAA");
        assert_eq!(reads.get(2).unwrap_err().kind(), ErrorKind::Range);

        let on_demand = FastqParser::new()
            .with_storage_mode(StorageMode::OnDemand)
            .parse_file(&path)
            .unwrap();
        assert_eq!(on_demand, parsed);
    }

    #[test]
    fn test_index_cache_created_and_reused() {
        let dir = TempDir::new().unwrap();
        let path = write_reads(&dir);

        let first = FastqParser::new().open_virtual(&path).unwrap();
        assert!(cache_path(&path).exists());

        let second = FastqParser::new().open_virtual(&path).unwrap();
        // Offsets loaded from the sidecar carry no alphabet
        assert_eq!(second.pointers()[0].alphabet_name, None);
        assert_eq!(second.pointers()[0].start, first.pointers()[0].start);
        assert_eq!(second.pointers()[1].end, first.pointers()[1].end);
        assert_eq!(second.get(0).unwrap(), first.get(0).unwrap());
    }

    #[test]
    fn test_corrupt_cache_is_rebuilt() {
        let dir = TempDir::new().unwrap();
        let path = write_reads(&dir);
        fs::write(cache_path(&path), b"not a cache").unwrap();

        let reads = FastqParser::new().open_virtual(&path).unwrap();
        assert_eq!(reads.len(), 2);
        assert_eq!(reads.pointers()[0].alphabet_name, Some("DNA"));
    }

    #[test]
    fn test_sequence_id_and_range() {
        let dir = TempDir::new().unwrap();
        let path = write_reads(&dir);
        let reads = FastqParser::new().with_index_cache(false).open_virtual(&path).unwrap();
        let pointer = reads.pointers()[1];

        assert_eq!(reads.get_sequence_id(&pointer).unwrap(), "read2");

        let part = reads.parse_range(2, 4, &pointer).unwrap();
        assert_eq!(part.as_string(), "CCTT");
        assert_eq!(part.quality_bytes().as_ref(), b"!!##");

        assert_eq!(reads.parse_range(0, 8, &pointer).unwrap().len(), 8);
        assert_eq!(reads.parse_range(5, 4, &pointer).unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(
            reads.parse_range(usize::MAX, 2, &pointer).unwrap_err().kind(),
            ErrorKind::Range
        );
    }

    #[test]
    fn test_empty_and_invalid_files() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.fastq");
        fs::write(&empty, b"").unwrap();
        let err = FastqParser::new().open_virtual(&empty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(!cache_path(&empty).exists());

        let blank = dir.path().join("blank.fastq");
        fs::write(&blank, b"\n\n").unwrap();
        assert!(FastqParser::new().open_virtual(&blank).is_err());
        assert!(!cache_path(&blank).exists());

        let bad = dir.path().join("bad.fastq");
        fs::write(&bad, b"read1\nACGT\n+\nIIII\n").unwrap();
        let err = FastqParser::new().open_virtual(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(!cache_path(&bad).exists());
    }
}
