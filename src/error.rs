/// Error taxonomy for the gene-block engine
///
/// Parse-level problems in hit files are recovered by the parser (skip + count);
/// the remaining variants are fatal for the query that raised them.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockError {
    /// A single hit line could not be parsed into the five required fields
    #[error("malformed hit record at line {line}: {reason}")]
    MalformedHitRecord { line: usize, reason: String },

    /// A gene list or reference gene table line is unusable
    #[error("malformed gene record at line {line}: {reason}")]
    MalformedGeneRecord { line: usize, reason: String },

    /// The same gene identifier appears twice in one genome
    #[error("duplicate gene '{gene}' in {genome}")]
    DuplicateGene { gene: String, genome: String },

    /// Thresholds violate their preconditions
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
