//! Sequence module
//!
//! This module provides sequence types, residue alphabets and quality
//! score encodings.

pub mod alphabet;
pub mod qualitative;
pub mod quality;
pub mod sequence;

/// Convenience re-exports
pub use alphabet::{
    alphabet_for, detect_alphabet, resolve_alphabet, Alphabet, MoleculeType, ResidueItem, DNA,
    PROTEIN, RNA,
};
pub use qualitative::QualitativeSequence;
pub use quality::FastqFormat;
pub use sequence::{Metadata, Sequence, SequenceError, SequenceResult, GENBANK_METADATA_KEY};
