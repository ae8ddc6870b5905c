//! GenBank header annotations

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::features::SequenceFeatures;
use crate::modules::io::error::{ParseError, ParseResult};
use crate::modules::seq::MoleculeType;

/// Format of LOCUS dates, e.g. `21-JUN-1999`
const LOCUS_DATE_FORMAT: &str = "%d-%b-%Y";

/// Parse a `DD-MON-YYYY` date
pub fn parse_locus_date(text: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), LOCUS_DATE_FORMAT)
        .map_err(|e| ParseError::Format(format!("invalid LOCUS date '{}': {}", text.trim(), e)))
}

/// Print a date as `DD-MON-YYYY` with an upper-case month
pub fn format_locus_date(date: &NaiveDate) -> String {
    date.format(LOCUS_DATE_FORMAT).to_string().to_uppercase()
}

/// Strandedness code of the LOCUS line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StrandType {
    #[default]
    None,
    Single,
    Double,
    Mixed,
}

impl StrandType {
    /// Prefix used in front of the molecule type, e.g. `ds-`
    pub fn code(self) -> &'static str {
        match self {
            StrandType::None => "",
            StrandType::Single => "ss-",
            StrandType::Double => "ds-",
            StrandType::Mixed => "ms-",
        }
    }

    /// Split a `ds-DNA` style token into strand and molecule
    pub fn split_code(token: &str) -> (Self, &str) {
        for strand in [StrandType::Single, StrandType::Double, StrandType::Mixed] {
            if let Some(rest) = token.strip_prefix(strand.code()) {
                return (strand, rest);
            }
        }
        (StrandType::None, token)
    }
}

/// Topology of the LOCUS line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StrandTopology {
    #[default]
    None,
    Linear,
    Circular,
}

impl StrandTopology {
    pub fn as_str(self) -> &'static str {
        match self {
            StrandTopology::None => "",
            StrandTopology::Linear => "linear",
            StrandTopology::Circular => "circular",
        }
    }
}

impl FromStr for StrandTopology {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(StrandTopology::Linear),
            "circular" => Ok(StrandTopology::Circular),
            _ => Err(ParseError::Format(format!("unknown topology '{}'", s))),
        }
    }
}

/// Molecule types allowed after the unit on a LOCUS line
pub const LOCUS_MOLECULE_TYPES: &[&str] = &[
    "NA", "DNA", "RNA", "tRNA", "rRNA", "mRNA", "uRNA", "snRNA", "snoRNA", "scRNA", "cRNA",
    "PROTEIN",
];

/// Contents of the LOCUS line
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Locus {
    pub name: String,
    pub sequence_length: usize,
    /// `bp` or `aa`
    pub sequence_type: String,
    pub strand: StrandType,
    /// Raw molecule type, e.g. `DNA` or `mRNA`
    pub molecule_type: Option<String>,
    pub topology: StrandTopology,
    pub division_code: Option<String>,
    pub date: Option<NaiveDate>,
}

impl Locus {
    /// Alphabet family implied by the unit and molecule type
    pub fn sequence_molecule_type(&self) -> MoleculeType {
        if self.sequence_type.eq_ignore_ascii_case("aa") {
            return MoleculeType::Protein;
        }
        match &self.molecule_type {
            Some(molecule) if molecule.eq_ignore_ascii_case("PROTEIN") => MoleculeType::Protein,
            Some(molecule) if molecule.contains("RNA") => MoleculeType::Rna,
            _ => MoleculeType::Dna,
        }
    }
}

/// ACCESSION line: the primary accession and any secondary ones
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenBankAccession {
    pub primary: String,
    pub secondary: Vec<String>,
}

impl fmt::Display for GenBankAccession {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.primary)?;
        for secondary in &self.secondary {
            write!(f, " {}", secondary)?;
        }
        Ok(())
    }
}

/// VERSION line: `ACCESSION.version  GI:number`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenBankVersion {
    pub accession: String,
    pub version: Option<u32>,
    pub gi_number: Option<u64>,
}

impl GenBankVersion {
    /// Parse the text after the VERSION keyword
    pub fn parse(text: &str) -> ParseResult<Self> {
        let mut tokens = text.split_whitespace();
        let compound = tokens
            .next()
            .ok_or_else(|| ParseError::Format("empty VERSION line".to_string()))?;

        let (accession, version) = match compound.rsplit_once('.') {
            Some((accession, number)) => {
                let version = number.parse::<u32>().map_err(|_| {
                    ParseError::Format(format!("version number '{}' is not an integer", number))
                })?;
                (accession.to_string(), Some(version))
            }
            None => (compound.to_string(), None),
        };

        let gi_number = match tokens.next() {
            Some(token) => {
                let digits = token.strip_prefix("GI:").ok_or_else(|| {
                    ParseError::Format(format!("unexpected VERSION token '{}'", token))
                })?;
                Some(digits.parse::<u64>().map_err(|_| {
                    ParseError::Format(format!("GI number '{}' is not an integer", digits))
                })?)
            }
            None => None,
        };

        Ok(Self {
            accession,
            version,
            gi_number,
        })
    }

    /// Accession with its version suffix, e.g. `U49845.1`
    pub fn compound_accession(&self) -> String {
        match self.version {
            Some(version) => format!("{}.{}", self.accession, version),
            None => self.accession.clone(),
        }
    }
}

impl fmt::Display for GenBankVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.compound_accession())?;
        if let Some(gi) = self.gi_number {
            write!(f, "  GI:{}", gi)?;
        }
        Ok(())
    }
}

/// ORGANISM sub-block: the name and its lineage
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrganismInfo {
    pub genus_species: String,
    pub class_levels: String,
}

/// SOURCE block
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequenceSource {
    pub common_name: String,
    pub organism: OrganismInfo,
}

/// One REFERENCE block
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CitationReference {
    pub number: u32,
    /// Text after the number, e.g. `(bases 1 to 5028)`
    pub location: Option<String>,
    pub authors: Option<String>,
    pub consortiums: Option<String>,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub medline: Option<String>,
    pub pubmed: Option<String>,
    pub remarks: Option<String>,
}

/// Everything a GenBank record says about its sequence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenBankMetadata {
    pub locus: Option<Locus>,
    pub definition: Option<String>,
    pub accession: Option<GenBankAccession>,
    pub version: Option<GenBankVersion>,
    pub project: Option<String>,
    pub db_link: Option<String>,
    pub db_source: Option<String>,
    pub keywords: Option<String>,
    pub segment: Option<String>,
    pub source: Option<SequenceSource>,
    pub references: Vec<CitationReference>,
    pub comments: Vec<String>,
    pub primary: Option<String>,
    pub features: SequenceFeatures,
    pub base_count: Option<String>,
    pub contig: Option<String>,
    /// Text following the ORIGIN keyword
    pub origin: Option<String>,
}

impl GenBankMetadata {
    /// Reference block with the given number
    pub fn reference(&self, number: u32) -> Option<&CitationReference> {
        self.references.iter().find(|r| r.number == number)
    }

    /// Accession used to qualify locations on this record
    pub fn primary_accession(&self) -> Option<&str> {
        self.accession.as_ref().map(|a| a.primary.as_str())
    }
}
