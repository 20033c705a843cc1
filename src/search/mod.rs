//! search — rate fitting on an explicit analysis context.
//!
//! - [`context`]: [`AnalysisContext`] and the operations that drive it
//!   (`set_parameters`, `search_rates`, `score`, `reconstruct_family`).
//! - [`objective`]: the rate log-likelihood and start sampler handed to the
//!   optimizer.
//! - [`errors`]: [`SearchError`], wrapping rate, tree and optimizer errors.

pub mod context;
pub mod errors;
pub mod objective;

pub use self::context::{AnalysisContext, SearchOptions, SearchSummary, describe_rates};
pub use self::errors::{SearchError, SearchResult};
pub use self::objective::{RateObjective, RateStart, family_log_likelihood};
