use crate::{optimization::errors::OptError, phylo::errors::PhyloError, rates::errors::RateError};
use thiserror::Error;

/// Result alias for rate searches and the analysis context.
pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    // ---- Configuration ----
    #[error("Rate parameters have not been set; run a search or supply them first")]
    ParametersNotSet,

    #[error("The family table has no families")]
    EmptyDataset,

    // ---- Wrapped ----
    #[error(transparent)]
    Rate(#[from] RateError),

    #[error(transparent)]
    Phylo(#[from] PhyloError),

    #[error(transparent)]
    Opt(#[from] OptError),

    #[error("Cannot write report line: {0}")]
    Report(#[from] std::io::Error),
}
