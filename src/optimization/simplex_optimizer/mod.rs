//! simplex_optimizer — derivative-free, argmin-powered log-likelihood optimizer.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed layer for **maximizing log-likelihoods**
//! `ℓ(θ)` that have no usable gradient (rate likelihoods over a tree, error-model
//! likelihoods with hard feasibility walls). Callers implement [`LogLikelihood`]
//! and invoke [`maximize`] to run one Nelder–Mead search.
//!
//! Key behaviors
//! -------------
//! - Convert `ℓ(θ)` into an Argmin cost `c(θ) = -ℓ(θ)` via
//!   [`adapter::ArgMinAdapter`]; infeasible points (`ℓ = -∞`) become `+∞`.
//! - Build the initial simplex from the start point ([`builders`]).
//! - Execute with an iteration budget ([`run::run_nelder_mead`]) and normalize
//!   results into an [`OptimOutcome`] that records whether the budget ran out.
//!
//! Invariants & assumptions
//! ------------------------
//! - Start vectors are finite; [`validation`] enforces this up front.
//! - Objectives never signal infeasibility through errors; errors are reserved
//!   for malformed inputs and model failures.
//!
//! Downstream usage
//! ----------------
//! - [`crate::optimization::multistart`] repeats [`maximize`] from random
//!   starts and decides convergence across runs.
//!
//! Testing notes
//! -------------
//! - Unit tests cover simplex geometry, option validation, the sign
//!   convention of the adapter, and toy end-to-end runs.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LogLikelihood, OptimOutcome, SimplexOptions, Tolerances};
pub use self::types::{Cost, FnEvalMap, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LogLikelihood, OptimOutcome, SimplexOptions, Tolerances};
    pub use super::types::{Cost, Theta};
}
