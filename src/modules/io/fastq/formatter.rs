//! FASTQ writer

use std::io::Write;
use std::path::Path;

use log::debug;

use crate::engines::core::FastWriter;
use crate::modules::io::error::{require_path, ParseError, ParseResult};
use crate::modules::seq::{FastqFormat, QualitativeSequence};

/// Writes records as `@id`, residues, a bare `+` and the quality line
#[derive(Debug, Clone, Default)]
pub struct FastqFormatter {
    format: Option<FastqFormat>,
}

impl FastqFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-encode qualities in `format`; `None` keeps each record's own encoding
    pub fn with_format(mut self, format: Option<FastqFormat>) -> Self {
        self.format = format;
        self
    }

    /// Write one record
    pub fn format<W: Write>(&self, record: &QualitativeSequence, sink: &mut W) -> ParseResult<()> {
        if record.id().is_empty() {
            return Err(ParseError::Argument(
                "cannot write a FASTQ record without an id".to_string(),
            ));
        }

        let quality = match self.format {
            Some(target) if target != record.format() => {
                FastqFormat::convert(&record.quality_bytes(), record.format(), target)?
            }
            _ => record.quality_bytes().into_owned(),
        };

        sink.write_all(b"@")?;
        sink.write_all(record.id().as_bytes())?;
        sink.write_all(b"\n")?;
        sink.write_all(&record.as_bytes())?;
        sink.write_all(b"\n+\n")?;
        sink.write_all(&quality)?;
        sink.write_all(b"\n")?;
        Ok(())
    }

    /// Write records in order
    pub fn format_all<'a, W, I>(&self, records: I, sink: &mut W) -> ParseResult<()>
    where
        W: Write,
        I: IntoIterator<Item = &'a QualitativeSequence>,
    {
        for record in records {
            self.format(record, sink)?;
        }
        Ok(())
    }

    /// Render one record as text
    pub fn format_string(&self, record: &QualitativeSequence) -> ParseResult<String> {
        let mut buffer = Vec::new();
        self.format(record, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| ParseError::Format(format!("record is not valid UTF-8: {}", e)))
    }

    /// Write records to a file, replacing its contents
    pub fn format_to_path<P: AsRef<Path>>(
        &self,
        records: &[QualitativeSequence],
        path: P,
    ) -> ParseResult<()> {
        let mut writer = FastWriter::new(require_path(path.as_ref())?, None)?;
        self.format_all(records, &mut writer)?;
        writer.flush()?;
        debug!("Wrote {} FASTQ records to {}", records.len(), writer.path());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::io::error::ErrorKind;
    use crate::modules::io::fastq::FastqParser;
    use crate::modules::seq::Sequence;
    use proptest::prelude::*;
    use tempfile::NamedTempFile;

    fn record(id: &str, residues: &str, quality: &str, format: FastqFormat) -> QualitativeSequence {
        let sequence = Sequence::new_dna(residues.as_bytes()).unwrap().with_id(id);
        QualitativeSequence::new(sequence, quality.as_bytes().to_vec(), format).unwrap()
    }

    #[test]
    fn test_format_string() {
        let text = FastqFormatter::new()
            .format_string(&record("read1", "ACGT", "II#!", FastqFormat::Sanger))
            .unwrap();
        assert_eq!(text, "@read1\nACGT\n+\nII#!\n");
    }

    #[test]
    fn test_wrapped_input_is_written_on_one_line() {
        let parsed = FastqParser::new()
            .parse_str("@r1\nACG\nTAC\n+r1\nIII\nIII\n")
            .unwrap();
        let text = FastqFormatter::new().format_string(&parsed[0]).unwrap();
        assert_eq!(text, "@r1\nACGTAC\n+\nIIIIII\n");
    }

    #[test]
    fn test_format_conversion() {
        let sanger = record("r", "ACG", "!+I", FastqFormat::Sanger);
        let text = FastqFormatter::new()
            .with_format(Some(FastqFormat::Illumina))
            .format_string(&sanger)
            .unwrap();
        assert_eq!(text, "@r\nACG\n+\n@Jh\n");

        let same = FastqFormatter::new()
            .with_format(Some(FastqFormat::Sanger))
            .format_string(&sanger)
            .unwrap();
        assert_eq!(same, "@r\nACG\n+\n!+I\n");
    }

    #[test]
    fn test_missing_id() {
        let anonymous = record("", "AC", "II", FastqFormat::Sanger);
        let err = FastqFormatter::new().format_string(&anonymous).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_format_to_path() {
        let records = vec![
            record("a", "ACGT", "II5!", FastqFormat::Sanger),
            record("b", "GG", "#!", FastqFormat::Sanger),
        ];
        let file = NamedTempFile::new().unwrap();
        FastqFormatter::new().format_to_path(&records, file.path()).unwrap();

        let reparsed = FastqParser::new().parse_file(file.path()).unwrap();
        assert_eq!(reparsed, records);
    }

    proptest! {
        #[test]
        fn prop_parse_format_round_trip(
            reads in prop::collection::vec(
                ("[A-Za-z0-9_.:-]{1,12}", prop::collection::vec((0usize..4, 33u8..=126), 1..40)),
                1..5,
            )
        ) {
            let mut text = String::new();
            for (id, residues) in &reads {
                let bases: String = residues.iter().map(|(b, _)| ['A', 'C', 'G', 'T'][*b]).collect();
                let quality: String = residues.iter().map(|(_, q)| *q as char).collect();
                text.push_str(&format!("@{}\n{}\n+\n{}\n", id, bases, quality));
            }

            let parsed = FastqParser::new().parse_str(&text).unwrap();
            let mut written = Vec::new();
            FastqFormatter::new().format_all(&parsed, &mut written).unwrap();
            prop_assert_eq!(String::from_utf8(written).unwrap(), text);
        }
    }
}
