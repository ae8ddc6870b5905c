//! Parsers and formatters for FASTQ and GenBank files
//!
//! `engines` holds the low-level machinery (buffered and memory-mapped I/O,
//! residue storage, the FASTQ index cache and text helpers). `modules` holds
//! the sequence model and the format readers and writers built on it.
//!
//! ```no_run
//! use bioformats::{FastqParser, GenBankParser};
//!
//! let reads = FastqParser::new().parse_file("reads.fastq")?;
//! let records = GenBankParser::new().parse_file("plasmid.gb")?;
//! for feature in records[0].genbank_metadata().into_iter().flat_map(|m| m.features.iter()) {
//!     println!("{} {}", feature.key(), feature.location());
//! }
//! # Ok::<(), bioformats::ParseError>(())
//! ```

pub mod engines;
pub mod modules;

pub use modules::io::fastq::{FastqFormatter, FastqParser, SequencePointer, VirtualFastq};
pub use modules::io::genbank::{
    FeatureItem, GenBankFormatter, GenBankMetadata, GenBankParser, Location, LocationRange,
    SequenceFeatures,
};
pub use modules::io::{ErrorKind, ParseError, ParseResult};
pub use modules::seq::{
    Alphabet, FastqFormat, MoleculeType, QualitativeSequence, Sequence, SequenceError,
};
