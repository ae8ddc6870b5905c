//! Residue alphabets
//!
//! Static lookup tables for the DNA, RNA and protein alphabets, including
//! the IUPAC ambiguity codes, the gap symbol and (for proteins) the
//! termination symbol. Lookups are case-insensitive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::sequence::{SequenceError, SequenceResult};

/// Molecule type of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoleculeType {
    Dna,
    Rna,
    Protein,
}

impl MoleculeType {
    /// Whether residues of this molecule type can be complemented
    pub fn is_nucleotide(self) -> bool {
        matches!(self, MoleculeType::Dna | MoleculeType::Rna)
    }
}

impl fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            MoleculeType::Dna => "DNA",
            MoleculeType::Rna => "RNA",
            MoleculeType::Protein => "Protein",
        };
        f.write_str(name)
    }
}

impl FromStr for MoleculeType {
    type Err = SequenceError;

    fn from_str(s: &str) -> SequenceResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dna" => Ok(MoleculeType::Dna),
            "rna" => Ok(MoleculeType::Rna),
            "protein" | "aa" => Ok(MoleculeType::Protein),
            _ => Err(SequenceError::InvalidAlphabet(s.to_string())),
        }
    }
}

/// A typed residue symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidueItem {
    /// Upper-case symbol
    pub symbol: u8,
    /// Residue name
    pub name: &'static str,
    pub is_ambiguous: bool,
    pub is_gap: bool,
    pub is_termination: bool,
}

#[derive(Clone, Copy)]
enum Kind {
    Basic,
    Ambiguous,
    Gap,
    Termination,
}

const fn residue(symbol: u8, name: &'static str, kind: Kind) -> ResidueItem {
    ResidueItem {
        symbol,
        name,
        is_ambiguous: matches!(kind, Kind::Ambiguous),
        is_gap: matches!(kind, Kind::Gap),
        is_termination: matches!(kind, Kind::Termination),
    }
}

const DNA_RESIDUES: &[ResidueItem] = &[
    residue(b'A', "Adenine", Kind::Basic),
    residue(b'C', "Cytosine", Kind::Basic),
    residue(b'G', "Guanine", Kind::Basic),
    residue(b'T', "Thymine", Kind::Basic),
    residue(b'N', "Any", Kind::Ambiguous),
    residue(b'R', "Purine", Kind::Ambiguous),
    residue(b'Y', "Pyrimidine", Kind::Ambiguous),
    residue(b'K', "Keto", Kind::Ambiguous),
    residue(b'M', "Amino", Kind::Ambiguous),
    residue(b'S', "Strong", Kind::Ambiguous),
    residue(b'W', "Weak", Kind::Ambiguous),
    residue(b'B', "Not A", Kind::Ambiguous),
    residue(b'D', "Not C", Kind::Ambiguous),
    residue(b'H', "Not G", Kind::Ambiguous),
    residue(b'V', "Not T", Kind::Ambiguous),
    residue(b'-', "Gap", Kind::Gap),
];

const RNA_RESIDUES: &[ResidueItem] = &[
    residue(b'A', "Adenine", Kind::Basic),
    residue(b'C', "Cytosine", Kind::Basic),
    residue(b'G', "Guanine", Kind::Basic),
    residue(b'U', "Uracil", Kind::Basic),
    residue(b'N', "Any", Kind::Ambiguous),
    residue(b'R', "Purine", Kind::Ambiguous),
    residue(b'Y', "Pyrimidine", Kind::Ambiguous),
    residue(b'K', "Keto", Kind::Ambiguous),
    residue(b'M', "Amino", Kind::Ambiguous),
    residue(b'S', "Strong", Kind::Ambiguous),
    residue(b'W', "Weak", Kind::Ambiguous),
    residue(b'B', "Not A", Kind::Ambiguous),
    residue(b'D', "Not C", Kind::Ambiguous),
    residue(b'H', "Not G", Kind::Ambiguous),
    residue(b'V', "Not U", Kind::Ambiguous),
    residue(b'-', "Gap", Kind::Gap),
];

const PROTEIN_RESIDUES: &[ResidueItem] = &[
    residue(b'A', "Alanine", Kind::Basic),
    residue(b'C', "Cysteine", Kind::Basic),
    residue(b'D', "Aspartic acid", Kind::Basic),
    residue(b'E', "Glutamic acid", Kind::Basic),
    residue(b'F', "Phenylalanine", Kind::Basic),
    residue(b'G', "Glycine", Kind::Basic),
    residue(b'H', "Histidine", Kind::Basic),
    residue(b'I', "Isoleucine", Kind::Basic),
    residue(b'K', "Lysine", Kind::Basic),
    residue(b'L', "Leucine", Kind::Basic),
    residue(b'M', "Methionine", Kind::Basic),
    residue(b'N', "Asparagine", Kind::Basic),
    residue(b'O', "Pyrrolysine", Kind::Basic),
    residue(b'P', "Proline", Kind::Basic),
    residue(b'Q', "Glutamine", Kind::Basic),
    residue(b'R', "Arginine", Kind::Basic),
    residue(b'S', "Serine", Kind::Basic),
    residue(b'T', "Threonine", Kind::Basic),
    residue(b'U', "Selenocysteine", Kind::Basic),
    residue(b'V', "Valine", Kind::Basic),
    residue(b'W', "Tryptophan", Kind::Basic),
    residue(b'Y', "Tyrosine", Kind::Basic),
    residue(b'B', "Asparagine or aspartic acid", Kind::Ambiguous),
    residue(b'Z', "Glutamine or glutamic acid", Kind::Ambiguous),
    residue(b'J', "Leucine or isoleucine", Kind::Ambiguous),
    residue(b'X', "Any", Kind::Ambiguous),
    residue(b'-', "Gap", Kind::Gap),
    residue(b'*', "Termination", Kind::Termination),
];

const DNA_COMPLEMENTS: &[(u8, u8)] = &[
    (b'A', b'T'),
    (b'T', b'A'),
    (b'C', b'G'),
    (b'G', b'C'),
    (b'N', b'N'),
    (b'R', b'Y'),
    (b'Y', b'R'),
    (b'K', b'M'),
    (b'M', b'K'),
    (b'S', b'S'),
    (b'W', b'W'),
    (b'B', b'V'),
    (b'V', b'B'),
    (b'D', b'H'),
    (b'H', b'D'),
    (b'-', b'-'),
];

const RNA_COMPLEMENTS: &[(u8, u8)] = &[
    (b'A', b'U'),
    (b'U', b'A'),
    (b'C', b'G'),
    (b'G', b'C'),
    (b'N', b'N'),
    (b'R', b'Y'),
    (b'Y', b'R'),
    (b'K', b'M'),
    (b'M', b'K'),
    (b'S', b'S'),
    (b'W', b'W'),
    (b'B', b'V'),
    (b'V', b'B'),
    (b'D', b'H'),
    (b'H', b'D'),
    (b'-', b'-'),
];

/// A fixed residue alphabet
#[derive(Debug, PartialEq, Eq)]
pub struct Alphabet {
    name: &'static str,
    molecule_type: MoleculeType,
    residues: &'static [ResidueItem],
    complements: &'static [(u8, u8)],
}

pub static DNA: Alphabet = Alphabet {
    name: "DNA",
    molecule_type: MoleculeType::Dna,
    residues: DNA_RESIDUES,
    complements: DNA_COMPLEMENTS,
};

pub static RNA: Alphabet = Alphabet {
    name: "RNA",
    molecule_type: MoleculeType::Rna,
    residues: RNA_RESIDUES,
    complements: RNA_COMPLEMENTS,
};

pub static PROTEIN: Alphabet = Alphabet {
    name: "Protein",
    molecule_type: MoleculeType::Protein,
    residues: PROTEIN_RESIDUES,
    complements: &[],
};

impl Alphabet {
    /// Name of the alphabet ("DNA", "RNA" or "Protein")
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn molecule_type(&self) -> MoleculeType {
        self.molecule_type
    }

    /// Whether `symbol` belongs to the alphabet
    pub fn contains(&self, symbol: u8) -> bool {
        let upper = symbol.to_ascii_uppercase();
        self.residues.iter().any(|r| r.symbol == upper)
    }

    /// Typed residue for `symbol`
    pub fn lookup(&self, symbol: u8) -> SequenceResult<ResidueItem> {
        let upper = symbol.to_ascii_uppercase();
        self.residues
            .iter()
            .find(|r| r.symbol == upper)
            .copied()
            .ok_or(SequenceError::InvalidSymbol {
                symbol: symbol as char,
                alphabet: self.name,
            })
    }

    /// All residues of the alphabet
    pub fn residues(&self) -> &'static [ResidueItem] {
        self.residues
    }

    /// Complement of a nucleotide symbol, preserving case
    ///
    /// Always `None` for protein.
    pub fn complement(&self, symbol: u8) -> Option<u8> {
        let upper = symbol.to_ascii_uppercase();
        let (_, complement) = self.complements.iter().find(|(from, _)| *from == upper)?;
        if symbol.is_ascii_lowercase() {
            Some(complement.to_ascii_lowercase())
        } else {
            Some(*complement)
        }
    }

    /// Check whether every byte of `data` belongs to the alphabet
    pub fn is_valid_sequence(&self, data: &[u8]) -> bool {
        data.iter().all(|&b| self.contains(b))
    }

    /// Position and value of the first byte outside the alphabet
    pub fn first_invalid(&self, data: &[u8]) -> Option<(usize, u8)> {
        data.iter()
            .enumerate()
            .find(|&(_, &b)| !self.contains(b))
            .map(|(i, &b)| (i, b))
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Resolve an alphabet by name
pub fn resolve_alphabet(name: &str) -> SequenceResult<&'static Alphabet> {
    match name.trim().to_ascii_lowercase().as_str() {
        "dna" | "ambiguousdna" => Ok(&DNA),
        "rna" | "ambiguousrna" => Ok(&RNA),
        "protein" | "ambiguousprotein" => Ok(&PROTEIN),
        _ => Err(SequenceError::InvalidAlphabet(name.to_string())),
    }
}

/// Alphabet for a molecule type
pub fn alphabet_for(molecule_type: MoleculeType) -> &'static Alphabet {
    match molecule_type {
        MoleculeType::Dna => &DNA,
        MoleculeType::Rna => &RNA,
        MoleculeType::Protein => &PROTEIN,
    }
}

/// Detect the narrowest alphabet that accepts `data` (DNA, then RNA, then protein)
pub fn detect_alphabet(data: &[u8]) -> Option<&'static Alphabet> {
    [&DNA, &RNA, &PROTEIN]
        .into_iter()
        .find(|alphabet| alphabet.is_valid_sequence(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_alphabet() {
        assert_eq!(resolve_alphabet("DNA").unwrap().name(), "DNA");
        assert_eq!(resolve_alphabet("rna").unwrap().molecule_type(), MoleculeType::Rna);
        assert_eq!(resolve_alphabet("AmbiguousProtein").unwrap(), &PROTEIN);
        assert!(matches!(
            resolve_alphabet("Klingon"),
            Err(SequenceError::InvalidAlphabet(name)) if name == "Klingon"
        ));
    }

    #[test]
    fn test_contains_and_lookup() {
        assert!(DNA.contains(b'A'));
        assert!(DNA.contains(b'n'));
        assert!(!DNA.contains(b'U'));
        assert!(RNA.contains(b'u'));
        assert!(PROTEIN.contains(b'*'));

        let gap = DNA.lookup(b'-').unwrap();
        assert!(gap.is_gap);
        let any = PROTEIN.lookup(b'x').unwrap();
        assert_eq!(any.symbol, b'X');
        assert!(any.is_ambiguous);
        assert!(PROTEIN.lookup(b'*').unwrap().is_termination);

        assert!(matches!(
            DNA.lookup(b'E'),
            Err(SequenceError::InvalidSymbol { symbol: 'E', alphabet: "DNA" })
        ));
    }

    #[test]
    fn test_complement_preserves_case() {
        assert_eq!(DNA.complement(b'A'), Some(b'T'));
        assert_eq!(DNA.complement(b'g'), Some(b'c'));
        assert_eq!(DNA.complement(b'R'), Some(b'Y'));
        assert_eq!(RNA.complement(b'A'), Some(b'U'));
        assert_eq!(PROTEIN.complement(b'A'), None);
    }

    #[test]
    fn test_detect_alphabet() {
        assert_eq!(detect_alphabet(b"ACGTN").unwrap().name(), "DNA");
        assert_eq!(detect_alphabet(b"ACGU").unwrap().name(), "RNA");
        assert_eq!(detect_alphabet(b"MKVLE*").unwrap().name(), "Protein");
        assert!(detect_alphabet(b"AC1T").is_none());
        assert_eq!(DNA.first_invalid(b"ACXT"), Some((2, b'X')));
    }

    #[test]
    fn test_molecule_type_parsing() {
        assert_eq!("dna".parse::<MoleculeType>().unwrap(), MoleculeType::Dna);
        assert_eq!("aa".parse::<MoleculeType>().unwrap(), MoleculeType::Protein);
        assert!("lipid".parse::<MoleculeType>().is_err());
        assert_eq!(MoleculeType::Rna.to_string(), "RNA");
        assert!(!MoleculeType::Protein.is_nucleotide());
    }
}
