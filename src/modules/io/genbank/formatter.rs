//! GenBank flat-file formatter

use std::io::Write;
use std::path::Path;

use itertools::Itertools;
use log::debug;

use super::features::FeatureItem;
use super::metadata::{format_locus_date, GenBankMetadata, Locus, StrandTopology};
use super::parser::{FEATURE_INDENT, HEADER_INDENT};
use crate::engines::compute::string_ops;
use crate::engines::core::FastWriter;
use crate::modules::io::error::{require_path, ParseError, ParseResult};
use crate::modules::seq::{MoleculeType, Sequence};

const DEFAULT_LINE_WIDTH: usize = 79;
const RESIDUES_PER_LINE: usize = 60;
const RESIDUES_PER_BLOCK: usize = 10;

/// Qualifiers whose numeric values are written without quotes
const NUMERIC_QUALIFIERS: &[&str] = &["codon_start", "transl_table", "number", "estimated_length"];

/// Writer for GenBank flat files
#[derive(Debug, Clone)]
pub struct GenBankFormatter {
    line_width: usize,
}

impl GenBankFormatter {
    pub fn new() -> Self {
        Self {
            line_width: DEFAULT_LINE_WIDTH,
        }
    }

    /// Maximum line length used when wrapping header text and qualifiers
    pub fn with_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width;
        self
    }

    /// Write one record
    pub fn format<W: Write>(&self, sequence: &Sequence, writer: &mut W) -> ParseResult<()> {
        let text = self.render(sequence)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Write records one after another
    pub fn format_all<W: Write>(&self, sequences: &[Sequence], writer: &mut W) -> ParseResult<()> {
        for sequence in sequences {
            self.format(sequence, writer)?;
        }
        Ok(())
    }

    /// Render one record as a string
    pub fn format_string(&self, sequence: &Sequence) -> ParseResult<String> {
        self.render(sequence)
    }

    /// Write records to a file, replacing its contents
    pub fn format_to_path<P: AsRef<Path>>(&self, sequences: &[Sequence], path: P) -> ParseResult<()> {
        let mut writer = FastWriter::new(require_path(path.as_ref())?, None)?;
        self.format_all(sequences, &mut writer)?;
        writer.flush()?;
        debug!("Wrote {} GenBank records to {}", sequences.len(), writer.path());
        Ok(())
    }

    fn render(&self, sequence: &Sequence) -> ParseResult<String> {
        if self.line_width <= FEATURE_INDENT {
            return Err(ParseError::Argument(format!(
                "line width {} leaves no room for feature text",
                self.line_width
            )));
        }

        let synthesized;
        let metadata = match sequence.genbank_metadata() {
            Some(metadata) => metadata,
            None => {
                synthesized = GenBankMetadata::default();
                &synthesized
            }
        };
        let locus = match &metadata.locus {
            Some(locus) => locus.clone(),
            None => synthesize_locus(sequence)?,
        };

        let mut out = String::new();
        out.push_str(&locus_line(&locus, sequence));
        out.push('\n');
        self.write_header(&mut out, metadata)?;

        out.push_str("FEATURES             Location/Qualifiers\n");
        for feature in metadata.features.iter() {
            self.write_feature(&mut out, feature)?;
        }

        if let Some(base_count) = &metadata.base_count {
            self.write_block(&mut out, "BASE COUNT", base_count, false)?;
        }
        if let Some(contig) = &metadata.contig {
            self.write_block(&mut out, "CONTIG", contig, true)?;
        }

        match &metadata.origin {
            Some(origin) => out.push_str(&format!("{:<12}{}\n", "ORIGIN", origin)),
            None => out.push_str("ORIGIN\n"),
        }
        write_residues(&mut out, &sequence.as_bytes());
        out.push_str("//\n");

        Ok(out)
    }

    fn write_header(&self, out: &mut String, metadata: &GenBankMetadata) -> ParseResult<()> {
        if let Some(definition) = &metadata.definition {
            self.write_block(out, "DEFINITION", definition, false)?;
        }
        if let Some(accession) = &metadata.accession {
            self.write_block(out, "ACCESSION", &accession.to_string(), false)?;
        }
        if let Some(version) = &metadata.version {
            self.write_block(out, "VERSION", &version.to_string(), false)?;
        }
        if let Some(project) = &metadata.project {
            self.write_block(out, "PROJECT", project, false)?;
        }
        if let Some(db_link) = &metadata.db_link {
            self.write_lines(out, "DBLINK", db_link)?;
        }
        if let Some(db_source) = &metadata.db_source {
            self.write_lines(out, "DBSOURCE", db_source)?;
        }
        if let Some(keywords) = &metadata.keywords {
            self.write_block(out, "KEYWORDS", keywords, false)?;
        }
        if let Some(segment) = &metadata.segment {
            self.write_block(out, "SEGMENT", segment, false)?;
        }

        if let Some(source) = &metadata.source {
            self.write_block(out, "SOURCE", &source.common_name, false)?;
            // A wrapped name would be read back as the start of the lineage
            out.push_str(format!("{:<12}{}", "  ORGANISM", source.organism.genus_species).trim_end());
            out.push('\n');
            if !source.organism.class_levels.is_empty() {
                for line in self.wrap(&source.organism.class_levels, HEADER_INDENT, false)? {
                    out.push_str(&format!("{:12}{}\n", "", line));
                }
            }
        }

        for reference in &metadata.references {
            let header = match &reference.location {
                Some(location) => format!("{}  {}", reference.number, location),
                None => reference.number.to_string(),
            };
            self.write_block(out, "REFERENCE", &header, false)?;

            let fields = [
                ("AUTHORS", &reference.authors),
                ("CONSRTM", &reference.consortiums),
                ("TITLE", &reference.title),
                ("JOURNAL", &reference.journal),
                ("MEDLINE", &reference.medline),
                ("PUBMED", &reference.pubmed),
                ("REMARK", &reference.remarks),
            ];
            for (keyword, value) in fields {
                if let Some(value) = value {
                    self.write_block(out, &format!("  {}", keyword), value, false)?;
                }
            }
        }

        for comment in &metadata.comments {
            self.write_lines(out, "COMMENT", comment)?;
        }
        if let Some(primary) = &metadata.primary {
            self.write_lines(out, "PRIMARY", primary)?;
        }
        Ok(())
    }

    /// Readers trim GenBank lines, so a run of spaces that lands on a
    /// line break comes back as a single space
    fn wrap(&self, text: &str, indent: usize, break_anywhere: bool) -> ParseResult<Vec<String>> {
        string_ops::wrap_text(text, self.line_width - indent, break_anywhere)
            .map_err(|e| ParseError::Argument(e.to_string()))
    }

    /// Keyword in the first twelve columns, wrapped text after it
    fn write_block(&self, out: &mut String, keyword: &str, text: &str, break_anywhere: bool) -> ParseResult<()> {
        for (i, line) in self.wrap(text, HEADER_INDENT, break_anywhere)?.iter().enumerate() {
            let prefix = if i == 0 { keyword } else { "" };
            out.push_str(format!("{:<12}{}", prefix, line).trim_end());
            out.push('\n');
        }
        Ok(())
    }

    /// Like `write_block`, keeping the line structure of `text`
    fn write_lines(&self, out: &mut String, keyword: &str, text: &str) -> ParseResult<()> {
        let mut first = true;
        for paragraph in text.split('\n') {
            for line in self.wrap(paragraph, HEADER_INDENT, false)? {
                let prefix = if first { keyword } else { "" };
                out.push_str(format!("{:<12}{}", prefix, line).trim_end());
                out.push('\n');
                first = false;
            }
        }
        Ok(())
    }

    fn write_feature(&self, out: &mut String, feature: &FeatureItem) -> ParseResult<()> {
        let location = feature.location().to_string();
        for (i, line) in self.wrap(&location, FEATURE_INDENT, true)?.iter().enumerate() {
            if i == 0 {
                out.push_str(&format!("     {:<15} {}\n", feature.key(), line));
            } else {
                out.push_str(&format!("{:21}{}\n", "", line));
            }
        }

        for (name, value) in feature.qualifiers() {
            let text = qualifier_text(name, value);
            for line in self.wrap(&text, FEATURE_INDENT, name == "translation")? {
                out.push_str(&format!("{:21}{}\n", "", line));
            }
        }
        Ok(())
    }
}

impl Default for GenBankFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn synthesize_locus(sequence: &Sequence) -> ParseResult<Locus> {
    if sequence.id().is_empty() {
        return Err(ParseError::Argument(
            "a sequence without GenBank metadata needs an id".to_string(),
        ));
    }

    let molecule_type = sequence.molecule_type();
    Ok(Locus {
        name: sequence.id().to_string(),
        sequence_length: sequence.len(),
        sequence_type: if molecule_type == MoleculeType::Protein { "aa" } else { "bp" }.to_string(),
        molecule_type: match molecule_type {
            MoleculeType::Dna => Some("DNA".to_string()),
            MoleculeType::Rna => Some("RNA".to_string()),
            MoleculeType::Protein => None,
        },
        topology: StrandTopology::Linear,
        ..Default::default()
    })
}

/// The fixed-column LOCUS line; the length always reflects `sequence`
fn locus_line(locus: &Locus, sequence: &Sequence) -> String {
    let date = locus.date.as_ref().map(format_locus_date).unwrap_or_default();
    format!(
        "LOCUS       {:<16} {:>11} {} {:>3}{:<6}  {:<8} {} {}",
        locus.name,
        sequence.len(),
        locus.sequence_type,
        locus.strand.code(),
        locus.molecule_type.as_deref().unwrap_or(""),
        locus.topology.as_str(),
        locus.division_code.as_deref().unwrap_or(""),
        date
    )
    .trim_end()
    .to_string()
}

/// `/name`, `/name=value` or `/name="value"`
fn qualifier_text(name: &str, value: &str) -> String {
    let numeric = NUMERIC_QUALIFIERS.contains(&name)
        && !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_digit());
    let bracketed = value.starts_with('[') && value.ends_with(']') && !value.contains(' ');

    if value.is_empty() {
        format!("/{}", name)
    } else if numeric || bracketed {
        format!("/{}={}", name, value)
    } else {
        format!("/{}=\"{}\"", name, string_ops::escape_quotes(value))
    }
}

fn write_residues(out: &mut String, residues: &[u8]) {
    for (line, chunk) in residues.chunks(RESIDUES_PER_LINE).enumerate() {
        let blocks = chunk
            .chunks(RESIDUES_PER_BLOCK)
            .map(|block| String::from_utf8_lossy(block).to_ascii_lowercase())
            .join(" ");
        out.push_str(&format!("{:>9} {}\n", line * RESIDUES_PER_LINE + 1, blocks));
    }
}
