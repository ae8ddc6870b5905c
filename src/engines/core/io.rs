//! Buffered I/O operations
//!
//! This module provides the buffered readers and writers used by the format
//! parsers and formatters, and a line cursor over an in-memory byte buffer
//! that keeps track of byte offsets.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

// Default buffer sizes
const DEFAULT_READ_BUFFER_SIZE: usize = 1024 * 1024; // 1MB
const DEFAULT_WRITE_BUFFER_SIZE: usize = 1024 * 1024; // 1MB

/// Buffered file reader
pub struct FastReader {
    reader: BufReader<File>,
}

impl FastReader {
    /// Create a new fast reader for the given file path
    pub fn new<P: AsRef<Path>>(path: P, buffer_size: Option<usize>) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let buf_size = buffer_size.unwrap_or(DEFAULT_READ_BUFFER_SIZE);
        let reader = BufReader::with_capacity(buf_size, file);

        Ok(Self { reader })
    }

    /// Read the entire file into a vector
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.reader.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Read `len` bytes starting at byte `offset`
    pub fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}

/// Buffered file writer
///
/// Dropping the writer flushes what it can, but callers should call
/// [`FastWriter::flush`] to observe write errors.
pub struct FastWriter {
    writer: BufWriter<File>,
    path: String,
}

impl FastWriter {
    /// Create a new fast writer for the given file path, truncating it
    pub fn new<P: AsRef<Path>>(path: P, buffer_size: Option<usize>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;

        let buf_size = buffer_size.unwrap_or(DEFAULT_WRITE_BUFFER_SIZE);
        let writer = BufWriter::with_capacity(buf_size, file);

        Ok(Self {
            writer,
            path: path.as_ref().to_string_lossy().to_string(),
        })
    }

    /// Get the path of the file being written
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Write for FastWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A line located inside a byte buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLine<'a> {
    /// Line content without the terminator
    pub text: &'a [u8],
    /// Offset of the first byte of the line
    pub start: usize,
    /// Offset just past the line terminator
    pub next: usize,
}

/// Line cursor over an in-memory buffer that tracks byte offsets
///
/// Both `\n` and `\r\n` terminators are accepted; the final line does not
/// need a terminator.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> LineCursor<'a> {
    /// Create a cursor positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Check if we've reached the end of the buffer
    pub fn is_eof(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Look at the next line without consuming it
    pub fn peek_line(&self) -> Option<RawLine<'a>> {
        if self.is_eof() {
            return None;
        }

        let rest = &self.data[self.position..];
        let (len, terminator) = match rest.iter().position(|&b| b == b'\n') {
            Some(idx) => (idx, 1),
            None => (rest.len(), 0),
        };

        let mut text = &rest[..len];
        if text.last() == Some(&b'\r') {
            text = &text[..text.len() - 1];
        }

        Some(RawLine {
            text,
            start: self.position,
            next: self.position + len + terminator,
        })
    }

    /// Consume and return the next line
    pub fn next_line(&mut self) -> Option<RawLine<'a>> {
        let line = self.peek_line()?;
        self.position = line.next;
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fast_reader_writer() -> io::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.txt");

        {
            let mut writer = FastWriter::new(&file_path, None)?;
            writer.write_all(b"Line 1\nLine 2\n")?;
            writer.write_all(b"Line 3")?;
            assert_eq!(writer.path(), file_path.to_string_lossy());
            writer.flush()?;
        }

        let mut reader = FastReader::new(&file_path, None)?;
        let data = reader.read_all()?;
        assert_eq!(data, b"Line 1\nLine 2\nLine 3");

        assert_eq!(reader.read_at(7, 6)?, b"Line 2");
        assert_eq!(reader.read_at(0, 4)?, b"Line");
        assert!(reader.read_at(14, 10).is_err());

        Ok(())
    }

    #[test]
    fn test_line_cursor_offsets() {
        let data = b"@r1\r\nACGT\n+\nIIII";
        let mut cursor = LineCursor::new(data);

        let header = cursor.next_line().unwrap();
        assert_eq!(header.text, b"@r1");
        assert_eq!(header.start, 0);
        assert_eq!(header.next, 5);

        let peeked = cursor.peek_line().unwrap();
        assert_eq!(peeked.text, b"ACGT");
        assert_eq!(peeked.start, 5);

        cursor.next_line();
        cursor.next_line();
        let quality = cursor.next_line().unwrap();
        assert_eq!(quality.text, b"IIII");
        assert_eq!(quality.next, data.len());
        assert!(cursor.is_eof());
        assert!(cursor.next_line().is_none());
    }
}
