//! Sequences with per-residue quality scores

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::quality::FastqFormat;
use super::sequence::{Sequence, SequenceError, SequenceResult};
use crate::engines::storage::{InMemoryStorage, StorableSequence};

/// A sequence plus encoded quality bytes and their encoding
///
/// The quality bytes are kept exactly as read so that formatting them
/// again reproduces the input byte for byte.
#[derive(Clone)]
pub struct QualitativeSequence {
    sequence: Sequence,
    quality: Arc<dyn StorableSequence>,
    format: FastqFormat,
}

impl QualitativeSequence {
    /// Create from encoded quality bytes
    pub fn new(sequence: Sequence, quality: Vec<u8>, format: FastqFormat) -> SequenceResult<Self> {
        Self::from_storage(sequence, Arc::new(InMemoryStorage::new(quality)), format)
    }

    /// Create over existing quality storage
    pub fn from_storage(
        sequence: Sequence,
        quality: Arc<dyn StorableSequence>,
        format: FastqFormat,
    ) -> SequenceResult<Self> {
        if quality.len() != sequence.len() {
            return Err(SequenceError::InvalidQuality(format!(
                "{} quality scores for {} residues in '{}'",
                quality.len(),
                sequence.len(),
                sequence.id()
            )));
        }

        match quality.as_slice() {
            Some(bytes) => format.validate(bytes)?,
            None => format.validate(&quality.subsequence(0, quality.len())?)?,
        }

        Ok(Self {
            sequence,
            quality,
            format,
        })
    }

    /// Create from decoded scores
    pub fn from_scores(sequence: Sequence, scores: &[i8], format: FastqFormat) -> SequenceResult<Self> {
        let quality = scores
            .iter()
            .map(|&score| format.encode(score))
            .collect::<SequenceResult<Vec<u8>>>()?;
        Self::new(sequence, quality, format)
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn into_sequence(self) -> Sequence {
        self.sequence
    }

    pub fn format(&self) -> FastqFormat {
        self.format
    }

    /// Encoded quality bytes
    pub fn quality_bytes(&self) -> Cow<'_, [u8]> {
        match self.quality.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(self.quality.subsequence(0, self.quality.len()).unwrap_or_default()),
        }
    }

    /// Decoded quality scores
    pub fn scores(&self) -> Vec<i8> {
        self.quality_bytes()
            .iter()
            .map(|&b| self.format.decode(b))
            .collect()
    }

    /// Residues and scores of `start..end` (0-based, half-open)
    pub fn subsequence(&self, start: usize, end: usize) -> SequenceResult<Self> {
        let sequence = self.sequence.subsequence(start, end)?;
        let quality = self.quality.subsequence(start, end)?;
        Self::new(sequence, quality, self.format)
    }

    /// Copy with the quality bytes re-encoded in another format
    pub fn to_format(&self, format: FastqFormat) -> SequenceResult<Self> {
        let quality = FastqFormat::convert(&self.quality_bytes(), self.format, format)?;
        Self::new(self.sequence.clone(), quality, format)
    }
}

impl Deref for QualitativeSequence {
    type Target = Sequence;

    fn deref(&self) -> &Sequence {
        &self.sequence
    }
}

impl PartialEq for QualitativeSequence {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.sequence == other.sequence
            && self.quality_bytes() == other.quality_bytes()
    }
}

impl fmt::Debug for QualitativeSequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("QualitativeSequence")
            .field("sequence", &self.sequence)
            .field("format", &self.format)
            .finish()
    }
}
