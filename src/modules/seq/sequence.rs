//! Core sequence type
//!
//! A [`Sequence`] is an identifier, an alphabet, residue storage and a map
//! of format-specific metadata.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::alphabet::{self, Alphabet, MoleculeType, DNA, PROTEIN, RNA};
use crate::engines::compute::string_ops;
use crate::engines::storage::{InMemoryStorage, StorableSequence, StorageMode};
use crate::modules::io::genbank::GenBankMetadata;

/// Metadata key under which GenBank annotations are stored
pub const GENBANK_METADATA_KEY: &str = "GenBank";

/// Error type for sequence operations
#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("Invalid symbol '{symbol}' for {alphabet} alphabet")]
    InvalidSymbol { symbol: char, alphabet: &'static str },

    #[error("Unknown alphabet: {0}")]
    InvalidAlphabet(String),

    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(String),

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid quality scores: {0}")]
    InvalidQuality(String),

    #[error("Engine error: {0}")]
    EngineError(#[from] crate::engines::EngineError),
}

/// Result type for sequence operations
pub type SequenceResult<T> = Result<T, SequenceError>;

/// Format-specific metadata attached to a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Metadata {
    GenBank(Box<GenBankMetadata>),
    Text(String),
}

/// Common sequence type for all biological sequences
#[derive(Clone)]
pub struct Sequence {
    data: Arc<dyn StorableSequence>,
    alphabet: &'static Alphabet,
    id: String,
    read_only: bool,
    metadata: BTreeMap<String, Metadata>,
}

impl Sequence {
    /// Create a new sequence, detecting the alphabet
    pub fn new(data: &[u8]) -> SequenceResult<Self> {
        let alphabet = alphabet::detect_alphabet(data).ok_or_else(|| {
            SequenceError::InvalidSequence("Could not detect alphabet for sequence".to_string())
        })?;

        Ok(Self::from_validated(
            Arc::new(InMemoryStorage::new(data.to_vec())),
            alphabet,
        ))
    }

    /// Create a new sequence with a specific alphabet
    pub fn with_alphabet(alphabet: &'static Alphabet, data: &[u8]) -> SequenceResult<Self> {
        Self::from_storage(alphabet, Arc::new(InMemoryStorage::new(data.to_vec())))
    }

    /// Create a sequence over existing storage, validating every residue
    pub fn from_storage(
        alphabet: &'static Alphabet,
        storage: Arc<dyn StorableSequence>,
    ) -> SequenceResult<Self> {
        let invalid = match storage.as_slice() {
            Some(slice) => alphabet.first_invalid(slice),
            None => alphabet.first_invalid(&storage.subsequence(0, storage.len())?),
        };

        if let Some((_, symbol)) = invalid {
            return Err(SequenceError::InvalidSymbol {
                symbol: symbol as char,
                alphabet: alphabet.name(),
            });
        }

        Ok(Self::from_validated(storage, alphabet))
    }

    fn from_validated(data: Arc<dyn StorableSequence>, alphabet: &'static Alphabet) -> Self {
        Self {
            data,
            alphabet,
            id: String::new(),
            read_only: false,
            metadata: BTreeMap::new(),
        }
    }

    /// Create a new DNA sequence
    pub fn new_dna(data: &[u8]) -> SequenceResult<Self> {
        Self::with_alphabet(&DNA, data)
    }

    /// Create a new RNA sequence
    pub fn new_rna(data: &[u8]) -> SequenceResult<Self> {
        Self::with_alphabet(&RNA, data)
    }

    /// Create a new protein sequence
    pub fn new_protein(data: &[u8]) -> SequenceResult<Self> {
        Self::with_alphabet(&PROTEIN, data)
    }

    /// Set the sequence identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Flag the sequence as read-only
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Get the sequence length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the sequence as bytes
    pub fn as_bytes(&self) -> Cow<'_, [u8]> {
        match self.data.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(self.data.subsequence(0, self.len()).unwrap_or_default()),
        }
    }

    /// Get the sequence as a string
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.as_bytes()).into_owned()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn alphabet(&self) -> &'static Alphabet {
        self.alphabet
    }

    pub fn molecule_type(&self) -> MoleculeType {
        self.alphabet.molecule_type()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Storage backend holding the residues
    pub fn storage_mode(&self) -> StorageMode {
        self.data.storage_mode()
    }

    /// Get a subsequence (0-based, half-open); metadata is not carried over
    pub fn subsequence(&self, start: usize, end: usize) -> SequenceResult<Self> {
        if start > end || end > self.len() {
            return Err(SequenceError::IndexOutOfBounds(format!(
                "Invalid range {}..{} for sequence of length {}",
                start,
                end,
                self.len()
            )));
        }

        let subseq = self.data.subsequence(start, end)?;
        Ok(Self::from_validated(Arc::new(InMemoryStorage::new(subseq)), self.alphabet)
            .with_id(self.id.clone()))
    }

    /// Get the reverse complement of the sequence (for DNA/RNA)
    pub fn reverse_complement(&self) -> SequenceResult<Self> {
        if !self.molecule_type().is_nucleotide() {
            return Err(SequenceError::UnsupportedOperation(format!(
                "Complement operation not supported for {} alphabet",
                self.alphabet.name()
            )));
        }

        let alphabet = self.alphabet;
        let reversed =
            string_ops::reverse_complement_with(&self.as_bytes(), |b| alphabet.complement(b))
                .map_err(|e| SequenceError::UnsupportedOperation(e.to_string()))?;

        Ok(Self::from_validated(Arc::new(InMemoryStorage::new(reversed)), alphabet)
            .with_id(self.id.clone()))
    }

    /// Concatenate with another sequence of the same alphabet
    pub fn concatenate(&self, other: &Self) -> SequenceResult<Self> {
        if self.alphabet != other.alphabet {
            return Err(SequenceError::InvalidAlphabet(format!(
                "Cannot concatenate sequences with different alphabets: {} and {}",
                self.alphabet.name(),
                other.alphabet.name()
            )));
        }

        let mut combined = self.as_bytes().into_owned();
        combined.extend_from_slice(&other.as_bytes());

        let id = if self.id.is_empty() { other.id.clone() } else { self.id.clone() };
        Ok(Self::from_validated(Arc::new(InMemoryStorage::new(combined)), self.alphabet).with_id(id))
    }

    /// All attached metadata, keyed by format name
    pub fn metadata(&self) -> &BTreeMap<String, Metadata> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Metadata) {
        self.metadata.insert(key.into(), value);
    }

    pub fn remove_metadata(&mut self, key: &str) -> Option<Metadata> {
        self.metadata.remove(key)
    }

    /// GenBank annotations, if any
    pub fn genbank_metadata(&self) -> Option<&GenBankMetadata> {
        match self.metadata.get(GENBANK_METADATA_KEY) {
            Some(Metadata::GenBank(metadata)) => Some(metadata),
            _ => None,
        }
    }

    pub fn genbank_metadata_mut(&mut self) -> Option<&mut GenBankMetadata> {
        match self.metadata.get_mut(GENBANK_METADATA_KEY) {
            Some(Metadata::GenBank(metadata)) => Some(metadata),
            _ => None,
        }
    }

    pub fn set_genbank_metadata(&mut self, metadata: GenBankMetadata) {
        self.set_metadata(GENBANK_METADATA_KEY, Metadata::GenBank(Box::new(metadata)));
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.alphabet == other.alphabet
            && self.as_bytes() == other.as_bytes()
            && self.metadata == other.metadata
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("id", &self.id)
            .field("alphabet", &self.alphabet.name())
            .field("len", &self.len())
            .field("read_only", &self.read_only)
            .field("storage", &self.data.storage_mode())
            .field("metadata", &self.metadata.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}
