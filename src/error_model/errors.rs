use crate::{optimization::errors::OptError, phylo::errors::PhyloError};
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for measurement-error estimation.
pub type ErrorModelResult<T> = Result<T, ErrorModelError>;

#[derive(Debug, Error)]
pub enum ErrorModelError {
    // ---- Input files ----
    #[error(transparent)]
    Table(#[from] PhyloError),

    #[error("The number of columns does not match between {first} ({first_columns}) and {second} ({second_columns})")]
    ColumnCountMismatch {
        first: PathBuf,
        second: PathBuf,
        first_columns: usize,
        second_columns: usize,
    },

    #[error("The number of lines does not match between {first} ({first_lines}) and {second} ({second_lines})")]
    LineCountMismatch { first: PathBuf, second: PathBuf, first_lines: usize, second_lines: usize },

    #[error("Family IDs on line {line} do not match: '{first}' vs '{second}'")]
    FamilyIdMismatch { line: usize, first: String, second: String },

    #[error("No paired observations were found in the measurement files")]
    NoObservations,

    // ---- Model shape ----
    #[error(
        "Error band of half-width {half_width} leaves no sizes outside it for a maximum family size of {max_size}"
    )]
    BandTooWide { max_size: usize, half_width: usize },

    // ---- Estimation ----
    #[error(transparent)]
    Opt(#[from] OptError),

    #[error("Cannot write report line: {0}")]
    Report(#[from] std::io::Error),
}
