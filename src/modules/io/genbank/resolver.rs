//! Evaluating locations against sequences

use std::collections::HashMap;

use log::debug;

use super::location::{Location, PositionMarker, Separator};
use crate::modules::io::error::{ParseError, ParseResult};
use crate::modules::seq::Sequence;

impl Location {
    /// Whether `position` can be the start of this location
    ///
    /// A `<` start accepts anything at or before it.
    pub fn is_in_start(&self, position: usize) -> bool {
        match self.start_position() {
            Some(start) if start.marker == Some(PositionMarker::Before) => position <= start.value,
            Some(start) => position == start.value,
            None => false,
        }
    }

    /// Whether `position` can be the end of this location
    ///
    /// A `>` end accepts anything at or after it.
    pub fn is_in_end(&self, position: usize) -> bool {
        match self.end_position() {
            Some(end) if end.marker == Some(PositionMarker::After) => position >= end.value,
            Some(end) => position == end.value,
            None => false,
        }
    }

    /// Whether any leaf covers `position` (bounds inclusive)
    pub fn is_in_range(&self, position: usize) -> bool {
        self.leaf_locations()
            .iter()
            .filter_map(|leaf| leaf.leaf_bounds())
            .any(|(start, end)| start.value <= position && position <= end.value)
    }

    /// Points and ranges of the tree, depth-first left to right
    pub fn leaf_locations(&self) -> Vec<&Location> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a Location>) {
        if self.is_leaf() {
            leaves.push(self);
            return;
        }
        for child in self.sub_locations() {
            child.collect_leaves(leaves);
        }
    }

    /// Extract the residues this location describes from `source`
    ///
    /// Coordinates are 1-based and inclusive. Locations on other entries
    /// only resolve when their accession names `source` itself.
    pub fn sub_sequence(&self, source: &Sequence) -> ParseResult<Sequence> {
        self.resolve(source, None)
    }

    /// Like [`Location::sub_sequence`], looking up other entries in `references`
    pub fn sub_sequence_with_references(
        &self,
        source: &Sequence,
        references: &HashMap<String, Sequence>,
    ) -> ParseResult<Sequence> {
        self.resolve(source, Some(references))
    }

    fn resolve(
        &self,
        source: &Sequence,
        references: Option<&HashMap<String, Sequence>>,
    ) -> ParseResult<Sequence> {
        match self {
            Location::Point(p) => slice(source, p.value, p.value),
            Location::Range {
                start,
                end,
                separator: Separator::Between,
            } => {
                check_bounds(source, start.value, start.value)?;
                check_bounds(source, end.value, end.value)?;
                Ok(source.subsequence(start.value, start.value)?)
            }
            Location::Range { start, end, .. } => slice(source, start.value, end.value),
            Location::Complement(inner) => {
                if !source.molecule_type().is_nucleotide() {
                    return Err(ParseError::UnsupportedOperation(format!(
                        "complement of a {} sequence",
                        source.alphabet().name()
                    )));
                }
                Ok(inner.resolve(source, references)?.reverse_complement()?)
            }
            Location::Join(children) | Location::Order(children) | Location::Bond(children) => {
                let mut residues = Vec::new();
                for child in children {
                    residues.extend_from_slice(&child.resolve(source, references)?.as_bytes());
                }
                Ok(Sequence::with_alphabet(source.alphabet(), &residues)?.with_id(source.id()))
            }
            Location::External { accession, location } => {
                if let Some(referred) = references.and_then(|map| map.get(accession)) {
                    debug!("Resolving {} against referenced entry {}", self, accession);
                    return location.resolve(referred, references);
                }
                if accession == source.id() {
                    return location.resolve(source, references);
                }
                match references {
                    Some(_) => Err(ParseError::Argument(format!(
                        "no referenced sequence for accession '{}'",
                        accession
                    ))),
                    None => Err(ParseError::UnsupportedOperation(format!(
                        "location on another entry '{}' needs referenced sequences",
                        accession
                    ))),
                }
            }
        }
    }
}

fn check_bounds(source: &Sequence, start: usize, end: usize) -> ParseResult<()> {
    if start == 0 || start > end || end > source.len() {
        return Err(ParseError::LocationRange(format!(
            "{}..{} outside sequence '{}' of length {}",
            start,
            end,
            source.id(),
            source.len()
        )));
    }
    Ok(())
}

fn slice(source: &Sequence, start: usize, end: usize) -> ParseResult<Sequence> {
    check_bounds(source, start, end)?;
    Ok(source.subsequence(start - 1, end)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::io::error::ErrorKind;

    fn dna(id: &str, residues: &[u8]) -> Sequence {
        Sequence::new_dna(residues).unwrap().with_id(id)
    }

    fn resolve(location: &str, source: &Sequence) -> ParseResult<String> {
        Location::parse(location)?
            .sub_sequence(source)
            .map(|s| s.as_string())
    }

    #[test]
    fn test_start_end_membership() {
        let exact = Location::parse("5..10").unwrap();
        assert!(exact.is_in_start(5));
        assert!(!exact.is_in_start(4));
        assert!(exact.is_in_end(10));
        assert!(!exact.is_in_end(11));

        let fuzzy = Location::parse("<5..>10").unwrap();
        assert!(fuzzy.is_in_start(1));
        assert!(fuzzy.is_in_start(5));
        assert!(!fuzzy.is_in_start(6));
        assert!(fuzzy.is_in_end(10));
        assert!(fuzzy.is_in_end(1000));
        assert!(!fuzzy.is_in_end(9));
    }

    #[test]
    fn test_range_membership() {
        let location = Location::parse("join(1..5,complement(10..15))").unwrap();
        assert!(location.is_in_range(1));
        assert!(location.is_in_range(5));
        assert!(!location.is_in_range(7));
        assert!(location.is_in_range(15));
        assert!(!location.is_in_range(16));
    }

    #[test]
    fn test_leaf_flattening() {
        let location =
            Location::parse("join(1..5,complement(10..15),order(20..22,25..26))").unwrap();
        let leaves: Vec<String> = location.leaf_locations().iter().map(|l| l.to_string()).collect();
        assert_eq!(leaves, vec!["1..5", "10..15", "20..22", "25..26"]);
    }

    #[test]
    fn test_sub_sequence() {
        let source = dna("S1", b"ACGTACGTTT");
        assert_eq!(resolve("1..4", &source).unwrap(), "ACGT");
        assert_eq!(resolve("3", &source).unwrap(), "G");
        assert_eq!(resolve("complement(1..4)", &source).unwrap(), "ACGT");
        assert_eq!(resolve("complement(8..10)", &source).unwrap(), "AAA");
        assert_eq!(resolve("join(1..2,9..10)", &source).unwrap(), "ACTT");
        assert_eq!(resolve("order(1..2,9..10)", &source).unwrap(), "ACTT");
        assert_eq!(resolve("complement(join(1..2,9..10))", &source).unwrap(), "AAGT");
        assert_eq!(resolve("2^3", &source).unwrap(), "");
        assert_eq!(resolve("2.4", &source).unwrap(), "CGT");
        assert_eq!(resolve("S1:1..3", &source).unwrap(), "ACG");
    }

    #[test]
    fn test_sub_sequence_bounds() {
        let source = dna("S1", b"ACGTACGT");
        assert_eq!(resolve("1..8", &source).unwrap(), "ACGTACGT");
        for bad in ["0..4", "5..9", "6..3", "9"] {
            let err = resolve(bad, &source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Range, "{}", bad);
        }
    }

    #[test]
    fn test_complement_of_protein_fails() {
        let source = Sequence::new_protein(b"MKVLA").unwrap();
        let err = resolve("complement(1..3)", &source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn test_external_locations() {
        let source = dna("S1", b"ACGTACGT");
        let other = dna("X2.1", b"TTTTGGGG");

        let location = Location::parse("join(1..2,X2.1:5..6)").unwrap();
        let err = location.sub_sequence(&source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

        let mut references = HashMap::new();
        references.insert("X2.1".to_string(), other);
        let resolved = location.sub_sequence_with_references(&source, &references).unwrap();
        assert_eq!(resolved.as_string(), "ACGG");
        assert_eq!(resolved.id(), "S1");

        let missing = Location::parse("Y9.1:1..2").unwrap();
        let err = missing
            .sub_sequence_with_references(&source, &references)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }
}
