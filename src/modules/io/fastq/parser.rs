//! FASTQ parser
//!
//! A record is a `@id` header, one or more residue lines, a `+` line that
//! is empty or repeats the id, and as many quality characters (possibly
//! over several lines) as there are residues.

use std::borrow::Cow;
use std::ops::Range;
use std::path::Path;
use std::str;
use std::sync::Arc;

use log::debug;

use super::virtualized::VirtualFastq;
use crate::engines::core::{FastReader, LineCursor, MemoryMapped};
use crate::engines::storage::{MappedSliceStorage, StorageMode};
use crate::modules::io::error::{require_path, ParseError, ParseResult};
use crate::modules::seq::{
    detect_alphabet, Alphabet, FastqFormat, QualitativeSequence, Sequence, SequenceError,
};

const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024; // 1MB

/// Byte layout of one record inside a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordSpan {
    /// Offset of the `@`
    pub start: usize,
    /// Offset just past the last quality line
    pub end: usize,
    pub id: String,
    pub residues: Vec<Range<usize>>,
    pub quality: Vec<Range<usize>>,
    pub sequence_length: usize,
}

impl RecordSpan {
    /// Residues or quality bytes, borrowed when they sit on a single line
    fn gather<'a>(data: &'a [u8], ranges: &[Range<usize>]) -> Cow<'a, [u8]> {
        match ranges {
            [single] => Cow::Borrowed(&data[single.clone()]),
            _ => Cow::Owned(ranges.iter().flat_map(|r| data[r.clone()].iter().copied()).collect()),
        }
    }
}

fn trim_end(text: &[u8]) -> &[u8] {
    let len = text
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &text[..len]
}

fn is_blank(text: &[u8]) -> bool {
    text.iter().all(|b| b.is_ascii_whitespace())
}

/// Locate the next record, skipping blank lines before it
pub(crate) fn scan_record(cursor: &mut LineCursor) -> ParseResult<Option<RecordSpan>> {
    while matches!(cursor.peek_line(), Some(line) if is_blank(line.text)) {
        cursor.next_line();
    }

    let header = match cursor.next_line() {
        Some(line) => line,
        None => return Ok(None),
    };
    if header.text.first() != Some(&b'@') {
        return Err(ParseError::Format(format!(
            "invalid sequence id: header at byte {} does not start with '@'",
            header.start
        )));
    }
    let id = str::from_utf8(&header.text[1..])
        .map_err(|_| {
            ParseError::Format(format!("invalid sequence id: header at byte {} is not UTF-8", header.start))
        })?
        .trim()
        .to_string();
    if id.is_empty() {
        return Err(ParseError::Format(format!(
            "invalid sequence id: empty header at byte {}",
            header.start
        )));
    }

    let mut residues = Vec::new();
    let mut sequence_length = 0;
    let plus = loop {
        let line = cursor.next_line().ok_or_else(|| {
            ParseError::Format(format!("record '{}' ends before its '+' line", id))
        })?;
        if line.text.first() == Some(&b'+') {
            break line;
        }
        let text = trim_end(line.text);
        residues.push(line.start..line.start + text.len());
        sequence_length += text.len();
    };

    let repeated = trim_end(&plus.text[1..]);
    if !repeated.is_empty() && repeated != id.as_bytes() {
        return Err(ParseError::Format(format!(
            "'+' line names '{}' but the record is '{}'",
            String::from_utf8_lossy(repeated),
            id
        )));
    }

    let mut quality = Vec::new();
    let mut quality_length = 0;
    let mut end = plus.next;
    while quality_length < sequence_length {
        let line = cursor.next_line().ok_or_else(|| {
            ParseError::Format(format!(
                "record '{}' has {} quality scores for {} residues",
                id, quality_length, sequence_length
            ))
        })?;
        let text = trim_end(line.text);
        if text.is_empty() {
            return Err(ParseError::Format(format!(
                "record '{}' has an empty quality line",
                id
            )));
        }
        quality.push(line.start..line.start + text.len());
        quality_length += text.len();
        end = line.next;
    }

    if quality_length != sequence_length {
        return Err(ParseError::Format(format!(
            "record '{}' has {} quality scores for {} residues",
            id, quality_length, sequence_length
        )));
    }

    Ok(Some(RecordSpan {
        start: header.start,
        end,
        id,
        residues,
        quality,
        sequence_length,
    }))
}

/// Parser for FASTQ files
#[derive(Debug, Clone)]
pub struct FastqParser {
    auto_detect: bool,
    format: FastqFormat,
    storage_mode: StorageMode,
    index_cache: bool,
    alphabet: Option<&'static Alphabet>,
    buffer_size: usize,
}

impl FastqParser {
    /// Create a parser that detects the quality format of every record
    pub fn new() -> Self {
        Self {
            auto_detect: true,
            format: FastqFormat::Sanger,
            storage_mode: StorageMode::default(),
            index_cache: true,
            alphabet: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Detect the quality format per record from its byte range
    pub fn with_auto_detect(mut self, auto_detect: bool) -> Self {
        self.auto_detect = auto_detect;
        self
    }

    /// Quality format used when detection is off or a record has no scores
    pub fn with_format(mut self, format: FastqFormat) -> Self {
        self.format = format;
        self
    }

    /// Where parsed residues live
    pub fn with_storage_mode(mut self, storage_mode: StorageMode) -> Self {
        self.storage_mode = storage_mode;
        self
    }

    /// Read and write the `.isc` sidecar when virtualizing
    pub fn with_index_cache(mut self, enabled: bool) -> Self {
        self.index_cache = enabled;
        self
    }

    /// Use `alphabet` instead of detecting one per record
    pub fn with_alphabet(mut self, alphabet: &'static Alphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    /// Set the buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    pub(crate) fn index_cache_enabled(&self) -> bool {
        self.index_cache
    }

    /// Parse every record in a file
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> ParseResult<Vec<QualitativeSequence>> {
        let path = require_path(path.as_ref())?;
        match self.storage_mode {
            StorageMode::InMemory => {
                let data = FastReader::new(path, Some(self.buffer_size))?.read_all()?;
                self.parse_bytes(&data, None)
            }
            StorageMode::MemoryMapped => {
                let mmap = Arc::new(MemoryMapped::open(path)?);
                self.parse_bytes(mmap.as_slice(), Some(&mmap))
            }
            StorageMode::OnDemand => self.open_virtual(path)?.materialize_all(),
        }
    }

    /// Parse every record as read-only sequences over the mapped file
    pub fn parse_read_only<P: AsRef<Path>>(&self, path: P) -> ParseResult<Vec<QualitativeSequence>> {
        self.clone()
            .with_storage_mode(StorageMode::MemoryMapped)
            .parse_file(path)
    }

    /// Parse the first record of a file
    pub fn parse_one<P: AsRef<Path>>(&self, path: P) -> ParseResult<QualitativeSequence> {
        let path = require_path(path.as_ref())?;
        let data = FastReader::new(path, Some(self.buffer_size))?.read_all()?;
        self.parse_one_bytes(&data)
    }

    /// Parse every record in `text`
    pub fn parse_str(&self, text: &str) -> ParseResult<Vec<QualitativeSequence>> {
        self.parse_bytes(text.as_bytes(), None)
    }

    /// Parse the first record in `text`
    pub fn parse_one_str(&self, text: &str) -> ParseResult<QualitativeSequence> {
        self.parse_one_bytes(text.as_bytes())
    }

    /// Record offsets only; residues are read when a record is requested
    pub fn open_virtual<P: AsRef<Path>>(&self, path: P) -> ParseResult<VirtualFastq> {
        VirtualFastq::open(self.clone(), require_path(path.as_ref())?)
    }

    fn parse_one_bytes(&self, data: &[u8]) -> ParseResult<QualitativeSequence> {
        let mut cursor = LineCursor::new(data);
        match scan_record(&mut cursor)? {
            Some(span) => self.build_record(&span, data, None),
            None => Err(ParseError::Format("no FASTQ records found".to_string())),
        }
    }

    fn parse_bytes(
        &self,
        data: &[u8],
        mapped: Option<&Arc<MemoryMapped>>,
    ) -> ParseResult<Vec<QualitativeSequence>> {
        let mut cursor = LineCursor::new(data);
        let mut records = Vec::new();
        while let Some(span) = scan_record(&mut cursor)? {
            records.push(self.build_record(&span, data, mapped)?);
        }

        if records.is_empty() {
            return Err(ParseError::Format("no FASTQ records found".to_string()));
        }
        debug!("Parsed {} FASTQ records", records.len());
        Ok(records)
    }

    fn resolve_format(&self, id: &str, quality: &[u8]) -> ParseResult<FastqFormat> {
        if !self.auto_detect {
            return Ok(self.format);
        }
        let detected = FastqFormat::detect(quality)
            .map_err(|e| ParseError::Format(format!("record '{}': invalid quality score: {}", id, e)))?;
        Ok(detected.unwrap_or(self.format))
    }

    fn resolve_alphabet(&self, id: &str, residues: &[u8]) -> ParseResult<&'static Alphabet> {
        match self.alphabet {
            Some(alphabet) => Ok(alphabet),
            None => detect_alphabet(residues).ok_or_else(|| {
                ParseError::Format(format!("record '{}': residues fit no known alphabet", id))
            }),
        }
    }

    /// Turn a located record into a sequence
    ///
    /// With a mapped source and single-line residues and qualities the
    /// sequence points into the map instead of copying.
    pub(crate) fn build_record(
        &self,
        span: &RecordSpan,
        data: &[u8],
        mapped: Option<&Arc<MemoryMapped>>,
    ) -> ParseResult<QualitativeSequence> {
        let residues = RecordSpan::gather(data, &span.residues);
        let quality = RecordSpan::gather(data, &span.quality);
        let alphabet = self.resolve_alphabet(&span.id, &residues)?;
        let format = self.resolve_format(&span.id, &quality)?;
        let invalid = |e: SequenceError| ParseError::Format(format!("record '{}': {}", span.id, e));

        match (mapped, span.residues.as_slice(), span.quality.as_slice()) {
            (Some(mmap), [residue_range], [quality_range]) => {
                let residue_storage =
                    MappedSliceStorage::new(Arc::clone(mmap), residue_range.start, residue_range.end)?;
                let quality_storage =
                    MappedSliceStorage::new(Arc::clone(mmap), quality_range.start, quality_range.end)?;
                let sequence = Sequence::from_storage(alphabet, Arc::new(residue_storage))
                    .map_err(invalid)?
                    .with_id(span.id.clone())
                    .into_read_only();
                QualitativeSequence::from_storage(sequence, Arc::new(quality_storage), format)
                    .map_err(invalid)
            }
            _ => {
                let mut sequence = Sequence::with_alphabet(alphabet, &residues)
                    .map_err(invalid)?
                    .with_id(span.id.clone());
                if mapped.is_some() {
                    sequence = sequence.into_read_only();
                }
                QualitativeSequence::new(sequence, quality.into_owned(), format).map_err(invalid)
            }
        }
    }
}

impl Default for FastqParser {
    fn default() -> Self {
        Self::new()
    }
}
