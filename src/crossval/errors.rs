use crate::{phylo::errors::PhyloError, search::errors::SearchError};
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for cross-validation runs.
pub type CvResult<T> = Result<T, CvError>;

#[derive(Debug, Error)]
pub enum CvError {
    // ---- Preconditions ----
    #[error("Rate parameters must be set before cross-validation; run a search or supply them first")]
    ParametersNotSet,

    #[error("Invalid fold count {folds} for {families} families: {reason}")]
    InvalidFolds { folds: usize, families: usize, reason: &'static str },

    #[error("Validation file {path} must hold exactly one species column, found {found}")]
    ValidationSpecies { path: PathBuf, found: usize },

    #[error("Validation file {path} has {found} families; the loaded table has {expected}")]
    ValidationLength { path: PathBuf, expected: usize, found: usize },

    // ---- Scoring ----
    #[error("No observed counts to compare in {label}")]
    NothingToCompare { label: String },

    #[error("Leaf for species '{species}' was not reconstructed in family {family}")]
    MissingPrediction { species: String, family: usize },

    // ---- Wrapped ----
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Phylo(#[from] PhyloError),

    #[error("Cross-validation I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
