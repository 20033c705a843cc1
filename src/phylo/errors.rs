use std::path::PathBuf;
use thiserror::Error;

/// Result alias for tree, dataset and likelihood operations.
pub type PhyloResult<T> = Result<T, PhyloError>;

#[derive(Debug, Error)]
pub enum PhyloError {
    // ---- Newick ----
    #[error("Newick syntax error at byte {position}: {reason}")]
    NewickSyntax { position: usize, reason: &'static str },

    #[error("Invalid branch length '{text}' at byte {position}")]
    InvalidBranchLength { text: String, position: usize },

    #[error("Tree has no nodes")]
    EmptyTree,

    #[error("Invalid family-size range: {reason}")]
    InvalidRange { reason: &'static str },

    // ---- Family data ----
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: {reason}")]
    MalformedFamilyFile { path: PathBuf, reason: String },

    #[error("Invalid count '{text}' for family '{family}' and species '{species}'")]
    InvalidCount { text: String, family: String, species: String },

    #[error("Tree leaf '{name}' has no matching species column in the family data")]
    SpeciesNotFound { name: String },

    #[error("Tree leaf {node} has no name")]
    UnnamedLeaf { node: usize },

    #[error("Family index {index} out of range for {count} families")]
    FamilyIndexOutOfRange { index: usize, count: usize },

    // ---- Likelihood ----
    #[error("Node {node} has no branch length")]
    MissingBranchLength { node: usize },

    #[error("Node {node} has no birth/death rates assigned")]
    RatesNotAssigned { node: usize },

    #[error("Node {node} carries {found} rate clusters, expected {expected}")]
    ClusterCountMismatch { node: usize, expected: usize, found: usize },

    #[error("Transition matrices are not computed for node {node}")]
    TransitionsMissing { node: usize },
}
