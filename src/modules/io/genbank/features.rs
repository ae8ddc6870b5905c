//! Feature table entries

use serde::{Deserialize, Serialize};

use super::location::{Location, LocationRange};
use super::metadata::{CitationReference, GenBankMetadata};
use crate::modules::io::error::ParseResult;
use crate::modules::seq::Sequence;

/// Standard feature keys of the INSDC feature table
pub mod standard_feature_keys {
    pub const CODING_SEQUENCE: &str = "CDS";
    pub const GENE: &str = "gene";
    pub const EXON: &str = "exon";
    pub const INTRON: &str = "intron";
    pub const MESSENGER_RNA: &str = "mRNA";
    pub const TRANSFER_RNA: &str = "tRNA";
    pub const RIBOSOMAL_RNA: &str = "rRNA";
    pub const MISC_RNA: &str = "misc_RNA";
    pub const NON_CODING_RNA: &str = "ncRNA";
    pub const PROMOTER: &str = "promoter";
    pub const REGULATORY: &str = "regulatory";
    pub const REPEAT_REGION: &str = "repeat_region";
    pub const MISC_FEATURE: &str = "misc_feature";
    pub const SOURCE: &str = "source";
    pub const FIVE_PRIME_UTR: &str = "5'UTR";
    pub const THREE_PRIME_UTR: &str = "3'UTR";
    pub const POLY_A_SIGNAL: &str = "polyA_signal";
    pub const SIGNAL_PEPTIDE: &str = "sig_peptide";
    pub const MATURE_PEPTIDE: &str = "mat_peptide";
    pub const VARIATION: &str = "variation";

    pub const ALL: &[&str] = &[
        CODING_SEQUENCE,
        GENE,
        EXON,
        INTRON,
        MESSENGER_RNA,
        TRANSFER_RNA,
        RIBOSOMAL_RNA,
        MISC_RNA,
        NON_CODING_RNA,
        PROMOTER,
        REGULATORY,
        REPEAT_REGION,
        MISC_FEATURE,
        SOURCE,
        FIVE_PRIME_UTR,
        THREE_PRIME_UTR,
        POLY_A_SIGNAL,
        SIGNAL_PEPTIDE,
        MATURE_PEPTIDE,
        VARIATION,
    ];

    pub fn is_standard(key: &str) -> bool {
        ALL.contains(&key)
    }
}

use standard_feature_keys as keys;

/// A feature: key, location and qualifiers in file order
///
/// Qualifier names may repeat. A flag qualifier such as `/pseudo` has an
/// empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureItem {
    key: String,
    location: Location,
    qualifiers: Vec<(String, String)>,
}

impl FeatureItem {
    pub fn new(key: impl Into<String>, location: Location) -> Self {
        Self {
            key: key.into(),
            location,
            qualifiers: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut Location {
        &mut self.location
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// All qualifiers as (name, value) pairs
    pub fn qualifiers(&self) -> &[(String, String)] {
        &self.qualifiers
    }

    pub fn add_qualifier(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.qualifiers.push((name.into(), value.into()));
    }

    /// Builder form of [`FeatureItem::add_qualifier`]
    pub fn with_qualifier(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_qualifier(name, value);
        self
    }

    /// Values of `name` in insertion order
    pub fn qualifier_values(&self, name: &str) -> Vec<&str> {
        self.qualifiers
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn first_qualifier(&self, name: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_qualifier(&self, name: &str) -> bool {
        self.qualifiers.iter().any(|(n, _)| n == name)
    }

    /// Distinct qualifier names in first-appearance order
    pub fn qualifier_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.qualifiers {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// Remove every value of `name`, returning them
    pub fn remove_qualifier(&mut self, name: &str) -> Vec<String> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .qualifiers
            .drain(..)
            .partition(|(n, _)| n == name);
        self.qualifiers = kept;
        removed.into_iter().map(|(_, v)| v).collect()
    }

    pub fn gene_symbol(&self) -> Option<&str> {
        self.first_qualifier("gene")
    }

    pub fn locus_tag(&self) -> Option<&str> {
        self.first_qualifier("locus_tag")
    }

    pub fn product(&self) -> Option<&str> {
        self.first_qualifier("product")
    }

    pub fn note(&self) -> Vec<&str> {
        self.qualifier_values("note")
    }

    pub fn translation(&self) -> Option<&str> {
        self.first_qualifier("translation")
    }

    /// Reading frame offset (1, 2 or 3) of a coding feature
    pub fn codon_start(&self) -> Option<u8> {
        self.first_qualifier("codon_start")
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn db_xrefs(&self) -> Vec<&str> {
        self.qualifier_values("db_xref")
    }

    pub fn protein_id(&self) -> Option<&str> {
        self.first_qualifier("protein_id")
    }

    pub fn is_pseudo(&self) -> bool {
        self.has_qualifier("pseudo") || self.has_qualifier("pseudogene")
    }

    /// Reference numbers named by `/citation=[n]`
    pub fn citation_numbers(&self) -> Vec<u32> {
        self.qualifier_values("citation")
            .iter()
            .filter_map(|v| v.trim().trim_start_matches('[').trim_end_matches(']').parse().ok())
            .collect()
    }

    /// Residues this feature covers in `source`
    pub fn sub_sequence(&self, source: &Sequence) -> ParseResult<Sequence> {
        self.location.sub_sequence(source)
    }
}

/// Feature table of one record, in file order
///
/// The key-specific accessors are filters over [`SequenceFeatures::all`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequenceFeatures {
    all: Vec<FeatureItem>,
}

impl SequenceFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[FeatureItem] {
        &self.all
    }

    pub fn all_mut(&mut self) -> &mut Vec<FeatureItem> {
        &mut self.all
    }

    pub fn push(&mut self, feature: FeatureItem) {
        self.all.push(feature);
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureItem> {
        self.all.iter()
    }

    /// Features whose key equals `key`
    pub fn with_key(&self, key: &str) -> Vec<&FeatureItem> {
        self.all.iter().filter(|f| f.key == key).collect()
    }

    pub fn coding_sequences(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::CODING_SEQUENCE)
    }

    pub fn genes(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::GENE)
    }

    pub fn exons(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::EXON)
    }

    pub fn introns(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::INTRON)
    }

    pub fn messenger_rnas(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::MESSENGER_RNA)
    }

    pub fn transfer_rnas(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::TRANSFER_RNA)
    }

    pub fn ribosomal_rnas(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::RIBOSOMAL_RNA)
    }

    pub fn promoters(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::PROMOTER)
    }

    pub fn repeat_regions(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::REPEAT_REGION)
    }

    pub fn misc_features(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::MISC_FEATURE)
    }

    pub fn sources(&self) -> Vec<&FeatureItem> {
        self.with_key(keys::SOURCE)
    }

    /// Features overlapping `range`
    ///
    /// Features located on another entry only match when their accession
    /// equals the range's accession.
    pub fn features_in_range(&self, range: &LocationRange) -> Vec<&FeatureItem> {
        self.all
            .iter()
            .filter(|f| f.location.accession().map_or(true, |acc| acc == range.accession))
            .filter(|f| range.overlaps(&f.location))
            .collect()
    }

    /// Features overlapping `start..=end` on this record
    pub fn features_between(&self, start: usize, end: usize) -> Vec<&FeatureItem> {
        let range = LocationRange::new("", start, end);
        self.all
            .iter()
            .filter(|f| f.location.accession().is_none())
            .filter(|f| range.overlaps(&f.location))
            .collect()
    }

    /// References cited by any feature through `/citation=[n]`
    pub fn citations_referred<'a>(&self, metadata: &'a GenBankMetadata) -> Vec<&'a CitationReference> {
        let mut numbers: Vec<u32> = self.all.iter().flat_map(|f| f.citation_numbers()).collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
            .into_iter()
            .filter_map(|n| metadata.reference(n))
            .collect()
    }
}

impl<'a> IntoIterator for &'a SequenceFeatures {
    type Item = &'a FeatureItem;
    type IntoIter = std::slice::Iter<'a, FeatureItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.all.iter()
    }
}

impl FromIterator<FeatureItem> for SequenceFeatures {
    fn from_iter<I: IntoIterator<Item = FeatureItem>>(iter: I) -> Self {
        Self {
            all: iter.into_iter().collect(),
        }
    }
}
