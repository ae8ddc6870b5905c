//! Errors raised by the format parsers, formatters and the location engine

use std::path::Path;

use thiserror::Error;

use crate::engines::EngineError;
use crate::modules::seq::SequenceError;

/// Result type for parsing and formatting
pub type ParseResult<T> = Result<T, ParseError>;

/// Error type for parsing and formatting
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid location '{text}': {reason}")]
    LocationFormat { text: String, reason: String },

    #[error("Location out of range: {0}")]
    LocationRange(String),

    #[error("Index out of range: {0}")]
    Range(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reject an empty path before touching the filesystem
pub(crate) fn require_path(path: &Path) -> ParseResult<&Path> {
    if path.as_os_str().is_empty() {
        return Err(ParseError::Argument("path is empty".to_string()));
    }
    Ok(path)
}

/// Coarse error category callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Range,
    Argument,
    UnsupportedOperation,
    Io,
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Format(_) | ParseError::LocationFormat { .. } => ErrorKind::Format,
            ParseError::LocationRange(_) | ParseError::Range(_) => ErrorKind::Range,
            ParseError::Argument(_) => ErrorKind::Argument,
            ParseError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            ParseError::Io(_) => ErrorKind::Io,
            ParseError::Sequence(e) => match e {
                SequenceError::IndexOutOfBounds(_) => ErrorKind::Range,
                SequenceError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
                SequenceError::InvalidAlphabet(_) => ErrorKind::Argument,
                SequenceError::EngineError(inner) => engine_kind(inner),
                _ => ErrorKind::Format,
            },
            ParseError::Engine(e) => engine_kind(e),
        }
    }
}

fn engine_kind(error: &EngineError) -> ErrorKind {
    match error {
        EngineError::Io(_) => ErrorKind::Io,
        EngineError::InvalidRange { .. } => ErrorKind::Range,
        EngineError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
        EngineError::IndexCache(_) => ErrorKind::Format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::io::fastq::FastqParser;
    use crate::modules::io::genbank::GenBankParser;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ParseError::Format("x".into()).kind(), ErrorKind::Format);
        assert_eq!(
            ParseError::LocationFormat {
                text: "join(".into(),
                reason: "unbalanced".into()
            }
            .kind(),
            ErrorKind::Format
        );
        assert_eq!(ParseError::LocationRange("x".into()).kind(), ErrorKind::Range);
        assert_eq!(
            ParseError::from(SequenceError::UnsupportedOperation("x".into())).kind(),
            ErrorKind::UnsupportedOperation
        );
        assert_eq!(
            ParseError::from(SequenceError::InvalidQuality("x".into())).kind(),
            ErrorKind::Format
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(ParseError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_empty_paths_are_rejected() {
        assert_eq!(
            require_path(Path::new("")).unwrap_err().kind(),
            ErrorKind::Argument
        );
        assert!(require_path(Path::new("reads.fastq")).is_ok());

        assert_eq!(FastqParser::new().parse_file("").unwrap_err().kind(), ErrorKind::Argument);
        assert_eq!(FastqParser::new().open_virtual("").unwrap_err().kind(), ErrorKind::Argument);
        assert_eq!(GenBankParser::new().parse_file("").unwrap_err().kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_location_error_message() {
        let err = ParseError::LocationFormat {
            text: "join(1..2".into(),
            reason: "expected ')'".into(),
        };
        assert_eq!(err.to_string(), "Invalid location 'join(1..2': expected ')'");
    }
}
