//! GenBank flat-file parser
//!
//! Records are read line by line. Header keywords occupy columns 1-12,
//! sub-keywords (ORGANISM, AUTHORS, ...) are indented by two or three
//! spaces, and continuation lines leave the keyword columns blank. The
//! feature table puts keys at column 6 and locations and qualifiers at
//! column 22. `//` ends a record.

use std::path::Path;

use log::{debug, warn};

use super::features::{FeatureItem, SequenceFeatures};
use super::location::Location;
use super::metadata::{
    parse_locus_date, CitationReference, GenBankAccession, GenBankMetadata, GenBankVersion,
    Locus, OrganismInfo, SequenceSource, StrandTopology, StrandType, LOCUS_MOLECULE_TYPES,
};
use crate::engines::compute::string_ops;
use crate::engines::core::FastReader;
use crate::modules::io::error::{require_path, ParseError, ParseResult};
use crate::modules::seq::{alphabet_for, detect_alphabet, Alphabet, Sequence};

/// Width of the header keyword columns
pub(crate) const HEADER_INDENT: usize = 12;
/// Column where feature locations and qualifiers start
pub(crate) const FEATURE_INDENT: usize = 21;

/// Split `line` after its first `at` characters
fn split_columns(line: &str, at: usize) -> (&str, &str) {
    match line.char_indices().nth(at) {
        Some((index, _)) => line.split_at(index),
        None => (line, ""),
    }
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// A line whose keyword columns are blank
fn is_continuation(line: &str) -> bool {
    let (keyword, value) = split_columns(line, HEADER_INDENT);
    keyword.trim().is_empty() && !value.trim().is_empty()
}

/// Lines of the input with a read position
struct LineSource<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineSource<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    /// 1-based number of the next line
    fn line_number(&self) -> usize {
        self.pos + 1
    }

    fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(line) if is_blank(line)) {
            self.pos += 1;
        }
    }

    /// Value columns of the current line plus any continuation lines
    fn take_block(&mut self) -> (String, Vec<&'a str>) {
        let first = self.advance().unwrap_or_default();
        let (keyword, value) = split_columns(first, HEADER_INDENT);
        let mut values = vec![value.trim()];
        while let Some(line) = self.peek() {
            if !is_continuation(line) {
                break;
            }
            values.push(split_columns(line, HEADER_INDENT).1.trim());
            self.pos += 1;
        }
        (keyword.trim().to_string(), values)
    }
}

/// Parser for GenBank flat files
#[derive(Debug, Clone)]
pub struct GenBankParser {
    lenient_headers: bool,
    alphabet: Option<&'static Alphabet>,
}

impl GenBankParser {
    pub fn new() -> Self {
        Self {
            lenient_headers: true,
            alphabet: None,
        }
    }

    /// Skip unknown header keywords with a warning instead of failing
    pub fn with_lenient_headers(mut self, lenient: bool) -> Self {
        self.lenient_headers = lenient;
        self
    }

    /// Use `alphabet` instead of the one implied by the LOCUS line
    pub fn with_alphabet(mut self, alphabet: &'static Alphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    /// Parse every record in a file
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> ParseResult<Vec<Sequence>> {
        let text = read_text(path.as_ref())?;
        self.parse_str(&text)
    }

    /// Parse the first record in a file
    pub fn parse_one<P: AsRef<Path>>(&self, path: P) -> ParseResult<Sequence> {
        let text = read_text(path.as_ref())?;
        self.parse_one_str(&text)
    }

    /// Parse every record in `text`
    pub fn parse_str(&self, text: &str) -> ParseResult<Vec<Sequence>> {
        let mut lines = LineSource::new(text);
        let mut records = Vec::new();

        loop {
            lines.skip_blank();
            if lines.peek().is_none() {
                break;
            }
            records.push(self.parse_record(&mut lines)?);
        }

        if records.is_empty() {
            return Err(ParseError::Format("no GenBank records found".to_string()));
        }
        Ok(records)
    }

    /// Parse the first record in `text`
    pub fn parse_one_str(&self, text: &str) -> ParseResult<Sequence> {
        let mut lines = LineSource::new(text);
        lines.skip_blank();
        if lines.peek().is_none() {
            return Err(ParseError::Format("no GenBank records found".to_string()));
        }
        self.parse_record(&mut lines)
    }

    fn parse_record(&self, lines: &mut LineSource) -> ParseResult<Sequence> {
        let line_number = lines.line_number();
        let first = lines.advance().unwrap_or_default();
        if !first.starts_with("LOCUS") {
            return Err(ParseError::Format(format!(
                "line {}: expected LOCUS, found '{}'",
                line_number,
                first.trim()
            )));
        }

        let locus = parse_locus(first)?;
        let mut metadata = GenBankMetadata::default();
        let mut residues = Vec::new();

        loop {
            let line = match lines.peek() {
                Some(line) => line,
                None => {
                    return Err(ParseError::Format(format!(
                        "record '{}' is not terminated by //",
                        locus.name
                    )))
                }
            };

            if is_blank(line) {
                lines.advance();
                continue;
            }
            if line.starts_with("//") {
                lines.advance();
                break;
            }
            if line.starts_with(' ') {
                self.unknown_header(lines, "indented line outside any block")?;
                continue;
            }

            let keyword = split_columns(line, HEADER_INDENT).0.trim();
            match keyword {
                "DEFINITION" => metadata.definition = Some(joined(lines)),
                "ACCESSION" => {
                    let text = joined(lines);
                    let mut tokens = text.split_whitespace().map(str::to_string);
                    metadata.accession = Some(GenBankAccession {
                        primary: tokens.next().unwrap_or_default(),
                        secondary: tokens.collect(),
                    });
                }
                "VERSION" => metadata.version = Some(GenBankVersion::parse(&joined(lines))?),
                "PROJECT" => metadata.project = Some(joined(lines)),
                "DBLINK" => metadata.db_link = Some(joined_lines(lines)),
                "DBSOURCE" => metadata.db_source = Some(joined_lines(lines)),
                "KEYWORDS" => metadata.keywords = Some(joined(lines)),
                "SEGMENT" => metadata.segment = Some(joined(lines)),
                "SOURCE" => metadata.source = Some(self.parse_source(lines)?),
                "REFERENCE" => metadata.references.push(self.parse_reference(lines)?),
                "COMMENT" => metadata.comments.push(joined_lines(lines)),
                "PRIMARY" => metadata.primary = Some(joined_lines(lines)),
                "BASE COUNT" => metadata.base_count = Some(joined(lines)),
                "CONTIG" => {
                    let (_, values) = lines.take_block();
                    metadata.contig = Some(values.concat());
                }
                "FEATURES" => {
                    lines.advance();
                    metadata.features = parse_features(lines)?;
                }
                "ORIGIN" => {
                    let origin = split_columns(line, HEADER_INDENT).1.trim().to_string();
                    lines.advance();
                    if !origin.is_empty() {
                        metadata.origin = Some(origin);
                    }
                    parse_origin(lines, &locus.name, &mut residues)?;
                }
                _ => self.unknown_header(lines, keyword)?,
            }
        }

        if locus.sequence_length != residues.len() {
            warn!(
                "LOCUS {} declares {} residues but ORIGIN holds {}",
                locus.name,
                locus.sequence_length,
                residues.len()
            );
        }

        let alphabet = self
            .alphabet
            .unwrap_or_else(|| residue_alphabet(&locus, &residues));
        let id = locus.name.clone();
        let mut sequence = Sequence::with_alphabet(alphabet, &residues)
            .map_err(|e| ParseError::Format(format!("record '{}': {}", id, e)))?
            .with_id(id);

        debug!(
            "Parsed GenBank record {} ({} residues, {} features)",
            locus.name,
            residues.len(),
            metadata.features.len()
        );

        metadata.locus = Some(locus);
        sequence.set_genbank_metadata(metadata);
        Ok(sequence)
    }

    fn unknown_header(&self, lines: &mut LineSource, keyword: &str) -> ParseResult<()> {
        let line_number = lines.line_number();
        if !self.lenient_headers {
            return Err(ParseError::Format(format!(
                "line {}: unknown header '{}'",
                line_number, keyword
            )));
        }
        warn!("Skipping unknown GenBank header '{}' at line {}", keyword, line_number);
        lines.take_block();
        Ok(())
    }

    fn parse_source(&self, lines: &mut LineSource) -> ParseResult<SequenceSource> {
        let (_, values) = lines.take_block();
        let mut source = SequenceSource {
            common_name: values.join(" "),
            organism: OrganismInfo::default(),
        };

        while let Some(line) = lines.peek() {
            if !line.starts_with(' ') || is_blank(line) {
                break;
            }
            let (keyword, values) = lines.take_block();
            match keyword.as_str() {
                "ORGANISM" => {
                    source.organism.genus_species = values[0].to_string();
                    source.organism.class_levels = values[1..].join(" ");
                }
                other => self.unknown_sub_keyword(other, "SOURCE")?,
            }
        }
        Ok(source)
    }

    fn parse_reference(&self, lines: &mut LineSource) -> ParseResult<CitationReference> {
        let (_, values) = lines.take_block();
        let header = values.join(" ");
        let (number, location) = match header.split_once(char::is_whitespace) {
            Some((number, rest)) => (number, Some(rest.trim().to_string())),
            None => (header.as_str(), None),
        };
        let mut reference = CitationReference {
            number: number.parse().map_err(|_| {
                ParseError::Format(format!("reference number '{}' is not an integer", number))
            })?,
            location: location.filter(|l| !l.is_empty()),
            ..Default::default()
        };

        while let Some(line) = lines.peek() {
            if !line.starts_with(' ') || is_blank(line) {
                break;
            }
            let (keyword, values) = lines.take_block();
            let text = Some(values.join(" "));
            match keyword.as_str() {
                "AUTHORS" => reference.authors = text,
                "CONSRTM" => reference.consortiums = text,
                "TITLE" => reference.title = text,
                "JOURNAL" => reference.journal = text,
                "MEDLINE" => reference.medline = text,
                "PUBMED" => reference.pubmed = text,
                "REMARK" => reference.remarks = text,
                other => self.unknown_sub_keyword(other, "REFERENCE")?,
            }
        }
        Ok(reference)
    }

    fn unknown_sub_keyword(&self, keyword: &str, parent: &str) -> ParseResult<()> {
        if !self.lenient_headers {
            return Err(ParseError::Format(format!(
                "unknown {} sub-keyword '{}'",
                parent, keyword
            )));
        }
        warn!("Skipping unknown {} sub-keyword '{}'", parent, keyword);
        Ok(())
    }
}

impl Default for GenBankParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Alphabet for ORIGIN residues
///
/// The LOCUS molecule type wins when it accepts the residues. NCBI writes
/// mRNA and rRNA records with `t`, so otherwise the residues decide.
fn residue_alphabet(locus: &Locus, residues: &[u8]) -> &'static Alphabet {
    let declared = alphabet_for(locus.sequence_molecule_type());
    if declared.is_valid_sequence(residues) {
        return declared;
    }
    match detect_alphabet(residues) {
        Some(detected) => {
            debug!(
                "LOCUS {} declares {} but its residues are {}",
                locus.name,
                declared.name(),
                detected.name()
            );
            detected
        }
        None => declared,
    }
}

fn read_text(path: &Path) -> ParseResult<String> {
    let mut reader = FastReader::new(require_path(path)?, None)?;
    let bytes = reader.read_all()?;
    String::from_utf8(bytes)
        .map_err(|e| ParseError::Format(format!("{} is not valid UTF-8: {}", path.display(), e)))
}

/// Block value with continuation lines joined by spaces
fn joined(lines: &mut LineSource) -> String {
    lines.take_block().1.join(" ").trim().to_string()
}

/// Block value keeping its line structure
fn joined_lines(lines: &mut LineSource) -> String {
    lines.take_block().1.join("\n")
}

/// Parse the tokens of a LOCUS line
///
/// Only the name is mandatory. The remaining tokens are recognized by shape
/// since old files omit some of them.
pub(crate) fn parse_locus(line: &str) -> ParseResult<Locus> {
    let mut tokens = line.split_whitespace().skip(1);
    let name = tokens
        .next()
        .ok_or_else(|| ParseError::Format("LOCUS line has no name".to_string()))?;

    let mut locus = Locus {
        name: name.to_string(),
        sequence_type: "bp".to_string(),
        ..Default::default()
    };

    let rest: Vec<&str> = tokens.collect();
    let mut index = 0;
    if let Some(length) = rest.first() {
        locus.sequence_length = length.parse().map_err(|_| {
            ParseError::Format(format!("LOCUS length '{}' is not an integer", length))
        })?;
        index = 1;
        if let Some(unit) = rest.get(1).filter(|u| matches!(**u, "bp" | "aa" | "rc")) {
            locus.sequence_type = unit.to_string();
            index = 2;
        }
    }

    for token in &rest[index..] {
        let (strand, molecule) = StrandType::split_code(token);
        if locus.topology == StrandTopology::None {
            if let Ok(topology) = token.parse::<StrandTopology>() {
                locus.topology = topology;
                continue;
            }
        }
        if locus.molecule_type.is_none()
            && locus.division_code.is_none()
            && LOCUS_MOLECULE_TYPES.contains(&molecule)
        {
            locus.strand = strand;
            locus.molecule_type = Some(molecule.to_string());
        } else if locus.date.is_none() && token.len() == 11 && token.matches('-').count() == 2 {
            locus.date = Some(parse_locus_date(token)?);
        } else if locus.division_code.is_none() {
            locus.division_code = Some(token.to_string());
        } else {
            warn!("Ignoring unexpected LOCUS token '{}' for {}", token, locus.name);
        }
    }

    Ok(locus)
}

/// Qualifier value being assembled from one or more lines
struct PendingQualifier {
    name: String,
    value: String,
    quoted: bool,
}

impl PendingQualifier {
    fn start(text: &str) -> Self {
        let (name, value) = match text.split_once('=') {
            Some((name, value)) => (name.trim(), value),
            None => (text.trim(), ""),
        };
        let quoted = value.starts_with('"');
        Self {
            name: name.to_string(),
            value: if quoted { value[1..].to_string() } else { value.to_string() },
            quoted,
        }
    }

    fn is_complete(&self) -> bool {
        !self.quoted || string_ops::closes_quoted_value(&self.value)
    }

    fn extend(&mut self, text: &str) {
        if self.name != "translation" && !self.value.is_empty() {
            self.value.push(' ');
        }
        self.value.push_str(text);
    }

    fn finish(mut self) -> (String, String) {
        if self.quoted {
            self.value.pop();
            self.value = string_ops::unescape_quotes(&self.value);
        }
        (self.name, self.value)
    }
}

/// Feature being assembled
struct PendingFeature {
    key: String,
    location: String,
    qualifiers: Vec<(String, String)>,
    open: Option<PendingQualifier>,
}

impl PendingFeature {
    fn close_qualifier(&mut self) -> ParseResult<()> {
        if let Some(qualifier) = self.open.take() {
            if !qualifier.is_complete() {
                return Err(ParseError::Format(format!(
                    "unterminated /{} value in {} feature",
                    qualifier.name, self.key
                )));
            }
            self.qualifiers.push(qualifier.finish());
        }
        Ok(())
    }

    fn finish(mut self) -> ParseResult<FeatureItem> {
        self.close_qualifier()?;
        let location = Location::parse(&self.location)?;
        let mut feature = FeatureItem::new(self.key, location);
        for (name, value) in self.qualifiers {
            feature.add_qualifier(name, value);
        }
        Ok(feature)
    }
}

/// Parse the feature table up to the next top-level keyword
fn parse_features(lines: &mut LineSource) -> ParseResult<SequenceFeatures> {
    let mut features = SequenceFeatures::new();
    let mut current: Option<PendingFeature> = None;

    while let Some(line) = lines.peek() {
        if is_blank(line) {
            lines.advance();
            continue;
        }

        let indent = indentation(line);
        if indent == 0 {
            break;
        }
        lines.advance();
        let content = line.trim();

        if indent < FEATURE_INDENT {
            if let Some(feature) = current.take() {
                features.push(feature.finish()?);
            }
            let (key, location) = content
                .split_once(char::is_whitespace)
                .unwrap_or((content, ""));
            current = Some(PendingFeature {
                key: key.to_string(),
                location: location.trim().to_string(),
                qualifiers: Vec::new(),
                open: None,
            });
            continue;
        }

        let feature = current.as_mut().ok_or_else(|| {
            ParseError::Format(format!(
                "line {}: qualifier before any feature key",
                lines.line_number() - 1
            ))
        })?;

        let continues_quoted = feature
            .open
            .as_ref()
            .map_or(false, |q| !q.is_complete());

        if continues_quoted {
            if let Some(open) = feature.open.as_mut() {
                open.extend(content);
            }
        } else if let Some(text) = content.strip_prefix('/') {
            feature.close_qualifier()?;
            feature.open = Some(PendingQualifier::start(text));
        } else if feature.open.is_none() && feature.qualifiers.is_empty() {
            feature.location.push_str(content);
        } else if let Some(open) = feature.open.as_mut() {
            open.extend(content);
        }
    }

    if let Some(feature) = current.take() {
        features.push(feature.finish()?);
    }
    Ok(features)
}

/// Read numbered residue lines up to (not including) the terminator
fn parse_origin(lines: &mut LineSource, name: &str, residues: &mut Vec<u8>) -> ParseResult<()> {
    while let Some(line) = lines.peek() {
        if line.starts_with("//") {
            return Ok(());
        }
        if !line.starts_with(' ') && !is_blank(line) {
            return Err(ParseError::Format(format!(
                "line {}: record '{}' is not terminated by //",
                lines.line_number(),
                name
            )));
        }
        string_ops::strip_numbered_line(line, residues);
        lines.advance();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::io::error::ErrorKind;
    use crate::modules::io::genbank::SAMPLE_RECORDS;
    use crate::modules::seq::MoleculeType;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(text: &str) -> ParseResult<Vec<Sequence>> {
        GenBankParser::new().parse_str(text)
    }

    #[test]
    fn test_parse_header() {
        let records = parse(SAMPLE_RECORDS).unwrap();
        assert_eq!(records.len(), 2);

        let record = &records[0];
        assert_eq!(record.id(), "SCU49845");
        assert_eq!(record.len(), 120);
        assert_eq!(record.molecule_type(), MoleculeType::Dna);
        assert!(record.as_string().starts_with("GATCCTCCAT"));

        let metadata = record.genbank_metadata().unwrap();
        let locus = metadata.locus.as_ref().unwrap();
        assert_eq!(locus.sequence_length, 120);
        assert_eq!(locus.molecule_type.as_deref(), Some("DNA"));
        assert_eq!(locus.topology, StrandTopology::Linear);
        assert_eq!(locus.division_code.as_deref(), Some("PLN"));
        assert_eq!(locus.date, NaiveDate::from_ymd_opt(1999, 6, 21));

        assert_eq!(
            metadata.definition.as_deref(),
            Some("Saccharomyces cerevisiae TCP1-beta gene, partial cds; and Axl2p (AXL2) genes, complete cds.")
        );
        assert_eq!(metadata.primary_accession(), Some("U49845"));
        let version = metadata.version.as_ref().unwrap();
        assert_eq!(version.version, Some(1));
        assert_eq!(version.gi_number, Some(1293613));

        let source = metadata.source.as_ref().unwrap();
        assert_eq!(source.common_name, "Saccharomyces cerevisiae (baker's yeast)");
        assert_eq!(source.organism.genus_species, "Saccharomyces cerevisiae");
        assert!(source.organism.class_levels.starts_with("Eukaryota; Fungi;"));
        assert!(source.organism.class_levels.ends_with("Saccharomyces."));

        assert_eq!(metadata.references.len(), 2);
        let first = &metadata.references[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.location.as_deref(), Some("(bases 1 to 120)"));
        assert_eq!(first.pubmed.as_deref(), Some("7871890"));
        assert!(first.title.as_deref().unwrap().contains("required for DNA damage-induced"));
        assert_eq!(metadata.comments, vec!["Test record trimmed to 120 bases.".to_string()]);
    }

    #[test]
    fn test_parse_features() {
        let records = parse(SAMPLE_RECORDS).unwrap();
        let features = &records[0].genbank_metadata().unwrap().features;

        let keys: Vec<&str> = features.iter().map(|f| f.key()).collect();
        assert_eq!(keys, vec!["source", "gene", "CDS", "gene", "mRNA"]);

        let cds = features.coding_sequences()[0];
        assert_eq!(cds.location().to_string(), "<1..>60");
        assert_eq!(cds.codon_start(), Some(3));
        assert_eq!(cds.citation_numbers(), vec![2]);
        assert_eq!(
            cds.note(),
            vec!["a \"quoted\" note that is long enough to wrap onto a second line"]
        );
        assert_eq!(
            cds.translation(),
            Some("SSIYNGISTSGLDLNNGTIADMRQLGIVESYKLKRAVVSSASEAAEVLLRVDNIIRARPRTANRQHM")
        );

        let rev7 = features.genes()[1];
        assert_eq!(rev7.location().to_string(), "complement(70..>120)");
        assert!(rev7.is_pseudo());
        assert_eq!(rev7.first_qualifier("pseudo"), Some(""));

        let mrna = features.messenger_rnas()[0];
        assert_eq!(mrna.location().to_string(), "join(70..80,90..>120)");
    }

    #[test]
    fn test_protein_record() {
        let records = parse(SAMPLE_RECORDS).unwrap();
        let protein = &records[1];
        assert_eq!(protein.id(), "TESTPROT");
        assert_eq!(protein.molecule_type(), MoleculeType::Protein);
        assert_eq!(protein.as_string(), "MKVLAAGIWRST");

        let locus = protein.genbank_metadata().unwrap().locus.clone().unwrap();
        assert_eq!(locus.sequence_type, "aa");
        assert_eq!(locus.molecule_type, None);
        assert_eq!(locus.division_code.as_deref(), Some("BCT"));
    }

    #[test]
    fn test_parse_one_and_files() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_RECORDS.as_bytes()).unwrap();
        file.flush().unwrap();

        let parser = GenBankParser::new();
        assert_eq!(parser.parse_file(file.path()).unwrap().len(), 2);
        assert_eq!(parser.parse_one(file.path()).unwrap().id(), "SCU49845");

        let empty = NamedTempFile::new().unwrap();
        let err = parser.parse_one(empty.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_structural_failures() {
        let no_locus = "DEFINITION  nothing here.\n//\n";
        assert_eq!(parse(no_locus).unwrap_err().kind(), ErrorKind::Format);

        let unterminated = "LOCUS       X1                         4 bp    DNA     linear   UNA\nORIGIN\n        1 acgt\n";
        assert_eq!(parse(unterminated).unwrap_err().kind(), ErrorKind::Format);

        let runs_into_next = "LOCUS       X1 4 bp DNA\nORIGIN\n        1 acgt\nLOCUS       X2 4 bp DNA\nORIGIN\n        1 acgt\n//\n";
        assert_eq!(parse(runs_into_next).unwrap_err().kind(), ErrorKind::Format);

        assert_eq!(parse("\n\n").unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_numeric_fields_must_be_integers() {
        let bad_version = "LOCUS       X1 4 bp DNA\nVERSION     X1.one\nORIGIN\n        1 acgt\n//\n";
        assert!(matches!(parse(bad_version), Err(ParseError::Format(_))));

        let bad_gi = "LOCUS       X1 4 bp DNA\nVERSION     X1.1  GI:12a\nORIGIN\n        1 acgt\n//\n";
        assert!(matches!(parse(bad_gi), Err(ParseError::Format(_))));

        let bad_length = "LOCUS       X1 four bp DNA\n//\n";
        assert!(matches!(parse(bad_length), Err(ParseError::Format(_))));
    }

    #[test]
    fn test_unknown_headers() {
        let text = "LOCUS       X1 4 bp DNA\nNONSENSE    something\n            more\nORIGIN\n        1 acgt\n//\n";
        let record = GenBankParser::new().parse_one_str(text).unwrap();
        assert_eq!(record.as_string(), "ACGT");

        let strict = GenBankParser::new().with_lenient_headers(false);
        assert_eq!(strict.parse_one_str(text).unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_bad_feature_location() {
        let text = "LOCUS       X1 4 bp DNA\nFEATURES             Location/Qualifiers\n     gene            join(1..2\nORIGIN\n        1 acgt\n//\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, ParseError::LocationFormat { .. }));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_invalid_residues() {
        let text = "LOCUS       X1 4 bp DNA\nORIGIN\n        1 ac*t\n//\n";
        assert!(matches!(parse(text), Err(ParseError::Format(_))));
    }

    #[test]
    fn test_rna_records_written_with_thymine() {
        let text = "LOCUS       NM_000001                 12 bp    mRNA    linear   PRI 01-JAN-2020\n\
                    ORIGIN\n        1 atggcctttt aa\n//\n";
        let record = parse(text).unwrap().remove(0);
        assert_eq!(record.as_string(), "ATGGCCTTTTAA");
        assert_eq!(record.molecule_type(), MoleculeType::Dna);
        let locus = record.genbank_metadata().unwrap().locus.as_ref().unwrap();
        assert_eq!(locus.molecule_type.as_deref(), Some("mRNA"));

        let uracil = "LOCUS       R1 4 bp mRNA\nORIGIN\n        1 augc\n//\n";
        assert_eq!(parse(uracil).unwrap()[0].molecule_type(), MoleculeType::Rna);

        // Short protein residues are also valid IUPAC nucleotides
        let protein = "LOCUS       P1 3 aa\nORIGIN\n        1 mkv\n//\n";
        assert_eq!(parse(protein).unwrap()[0].molecule_type(), MoleculeType::Protein);
    }

    #[test]
    fn test_locus_tokens() {
        let locus = parse_locus("LOCUS       pBR322   4361 bp ds-DNA     circular SYN 30-SEP-2008").unwrap();
        assert_eq!(locus.strand, StrandType::Double);
        assert_eq!(locus.molecule_type.as_deref(), Some("DNA"));
        assert_eq!(locus.topology, StrandTopology::Circular);
        assert_eq!(locus.division_code.as_deref(), Some("SYN"));

        let minimal = parse_locus("LOCUS       ABC").unwrap();
        assert_eq!(minimal.sequence_length, 0);
        assert_eq!(minimal.date, None);
    }
}
