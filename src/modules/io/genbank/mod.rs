//! GenBank flat files
//!
//! This module provides the GenBank annotation model, the feature location
//! engine, and the flat-file parser and formatter.

pub mod features;
pub mod formatter;
pub mod location;
pub mod metadata;
pub mod parser;
mod resolver;

/// Convenience re-exports
pub use features::{standard_feature_keys, FeatureItem, SequenceFeatures};
pub use formatter::GenBankFormatter;
pub use location::{
    Location, LocationOperator, LocationRange, Position, PositionMarker, Separator,
};
pub use metadata::{
    CitationReference, GenBankAccession, GenBankMetadata, GenBankVersion, Locus, OrganismInfo,
    SequenceSource, StrandTopology, StrandType,
};
pub use parser::GenBankParser;

/// Two records (a trimmed yeast entry and a short protein) used across tests
#[cfg(test)]
pub(crate) const SAMPLE_RECORDS: &str = r#"LOCUS       SCU49845                 120 bp    DNA     linear   PLN 21-JUN-1999
DEFINITION  Saccharomyces cerevisiae TCP1-beta gene, partial cds; and Axl2p
            (AXL2) genes, complete cds.
ACCESSION   U49845
VERSION     U49845.1  GI:1293613
KEYWORDS    .
SOURCE      Saccharomyces cerevisiae (baker's yeast)
  ORGANISM  Saccharomyces cerevisiae
            Eukaryota; Fungi; Ascomycota; Saccharomycotina; Saccharomycetes;
            Saccharomycetales; Saccharomycetaceae; Saccharomyces.
REFERENCE   1  (bases 1 to 120)
  AUTHORS   Torpey,L.E., Gibbs,P.E., Nelson,J. and Lawrence,C.W.
  TITLE     Cloning and sequence of REV7, a gene whose function is required for
            DNA damage-induced mutagenesis in Saccharomyces cerevisiae
  JOURNAL   Yeast 10 (11), 1503-1509 (1994)
  PUBMED    7871890
REFERENCE   2  (bases 1 to 120)
  AUTHORS   Roemer,T., Madden,K., Chang,J. and Snyder,M.
  TITLE     Selection of axial growth sites in yeast requires Axl2p
  JOURNAL   Genes Dev. 10 (7), 777-793 (1996)
COMMENT     Test record trimmed to 120 bases.
FEATURES             Location/Qualifiers
     source          1..120
                     /organism="Saccharomyces cerevisiae"
                     /db_xref="taxon:4932"
     gene            <1..>60
                     /gene="TCP1-beta"
     CDS             <1..>60
                     /gene="TCP1-beta"
                     /codon_start=3
                     /citation=[2]
                     /product="TCP1-beta"
                     /note="a ""quoted"" note that is long enough to wrap onto
                     a second line"
                     /translation="SSIYNGISTSGLDLNNGTIADMRQLGIVESYKLKRAVVSSASEA
                     AEVLLRVDNIIRARPRTANRQHM"
     gene            complement(70..>120)
                     /gene="REV7"
                     /pseudo
     mRNA            join(70..80,
                     90..>120)
                     /gene="REV7"
ORIGIN
        1 gatcctccat atacaacggt atctccacct caggtttaga tctcaacaac ggaaccattg
       61 ccgacatgag acagttaggt atcgtcgaga gttacaagct aaaacgagca gtagtcagct
//
LOCUS       TESTPROT                  12 aa            linear   BCT 05-JAN-2023
DEFINITION  Test protein.
ACCESSION   XP0001
VERSION     XP0001.2
FEATURES             Location/Qualifiers
     Protein         1..12
                     /product="test"
ORIGIN
        1 mkvlaagiwr st
//
"#;
