//! FASTQ quality score encodings
//!
//! | Format   | ASCII offset | Valid bytes | Scores   |
//! |----------|--------------|-------------|----------|
//! | Sanger   | 33           | 33-126      | 0..=93   |
//! | Solexa   | 64           | 59-126      | -5..=62  |
//! | Illumina | 64           | 64-126      | 0..=62   |

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::sequence::{SequenceError, SequenceResult};

/// Quality score encoding of a FASTQ file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FastqFormat {
    /// Phred+33
    Sanger,
    /// Solexa log-odds scores, +64
    Solexa,
    /// Phred+64 (Illumina 1.3 to 1.7)
    Illumina,
}

impl FastqFormat {
    /// ASCII offset subtracted from each quality byte
    pub fn offset(self) -> u8 {
        match self {
            FastqFormat::Sanger => 33,
            FastqFormat::Solexa | FastqFormat::Illumina => 64,
        }
    }

    /// Raw byte values allowed in a quality line
    pub fn valid_range(self) -> RangeInclusive<u8> {
        match self {
            FastqFormat::Sanger => 33..=126,
            FastqFormat::Solexa => 59..=126,
            FastqFormat::Illumina => 64..=126,
        }
    }

    pub fn min_score(self) -> i8 {
        (*self.valid_range().start() as i16 - self.offset() as i16) as i8
    }

    pub fn max_score(self) -> i8 {
        (*self.valid_range().end() as i16 - self.offset() as i16) as i8
    }

    /// Pick the most specific format whose range holds every byte
    ///
    /// Illumina is checked before Solexa, so data that fits both is
    /// reported as Illumina. Returns `Ok(None)` for empty input.
    pub fn detect(bytes: &[u8]) -> SequenceResult<Option<Self>> {
        let (min, max) = match (bytes.iter().min(), bytes.iter().max()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => return Ok(None),
        };

        [FastqFormat::Illumina, FastqFormat::Solexa, FastqFormat::Sanger]
            .into_iter()
            .find(|format| format.valid_range().contains(&min) && format.valid_range().contains(&max))
            .map(Some)
            .ok_or_else(|| {
                SequenceError::InvalidQuality(format!(
                    "quality bytes {}..={} do not fit any FASTQ format",
                    min, max
                ))
            })
    }

    /// Check that every byte lies in this format's range
    pub fn validate(self, bytes: &[u8]) -> SequenceResult<()> {
        let range = self.valid_range();
        match bytes.iter().position(|b| !range.contains(b)) {
            Some(pos) => Err(SequenceError::InvalidQuality(format!(
                "quality byte {} at position {} is outside the {} range {}..={}",
                bytes[pos],
                pos,
                self,
                range.start(),
                range.end()
            ))),
            None => Ok(()),
        }
    }

    /// Decode one quality byte (assumed valid) to its score
    pub fn decode(self, byte: u8) -> i8 {
        (byte as i16 - self.offset() as i16) as i8
    }

    /// Encode a score, failing when it is outside this format's score range
    pub fn encode(self, score: i8) -> SequenceResult<u8> {
        if score < self.min_score() || score > self.max_score() {
            return Err(SequenceError::InvalidQuality(format!(
                "score {} outside the {} range {}..={}",
                score,
                self,
                self.min_score(),
                self.max_score()
            )));
        }
        Ok((score as i16 + self.offset() as i16) as u8)
    }

    /// Re-encode quality bytes from one format to another
    ///
    /// Phred-based formats differ only by offset. Solexa scores are mapped
    /// through `Qphred = 10*log10(10^(Qsolexa/10) + 1)` (and its inverse),
    /// rounded and clamped into the target score range.
    pub fn convert(bytes: &[u8], from: FastqFormat, to: FastqFormat) -> SequenceResult<Vec<u8>> {
        from.validate(bytes)?;
        if from == to {
            return Ok(bytes.to_vec());
        }

        bytes
            .iter()
            .map(|&byte| {
                let score = from.decode(byte) as f64;
                let converted = match (from, to) {
                    (FastqFormat::Solexa, _) => 10.0 * (10f64.powf(score / 10.0) + 1.0).log10(),
                    (_, FastqFormat::Solexa) => {
                        let odds = 10f64.powf(score / 10.0) - 1.0;
                        if odds > 0.0 {
                            10.0 * odds.log10()
                        } else {
                            f64::from(to.min_score())
                        }
                    }
                    _ => score,
                };
                let clamped = converted
                    .round()
                    .clamp(f64::from(to.min_score()), f64::from(to.max_score()));
                to.encode(clamped as i8)
            })
            .collect()
    }
}

impl fmt::Display for FastqFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FastqFormat::Sanger => "Sanger",
            FastqFormat::Solexa => "Solexa",
            FastqFormat::Illumina => "Illumina",
        };
        f.write_str(name)
    }
}

impl FromStr for FastqFormat {
    type Err = SequenceError;

    fn from_str(s: &str) -> SequenceResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sanger" => Ok(FastqFormat::Sanger),
            "solexa" => Ok(FastqFormat::Solexa),
            "illumina" => Ok(FastqFormat::Illumina),
            _ => Err(SequenceError::InvalidQuality(format!(
                "unknown FASTQ format '{}'",
                s
            ))),
        }
    }
}
