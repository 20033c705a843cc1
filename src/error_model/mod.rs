//! error_model — measurement-error (misclassification) estimation.
//!
//! Purpose
//! -------
//! Estimate how often a gene family of true size `s` is observed as `s + d`,
//! from two measurements of the same families, independently of any tree or
//! rate model.
//!
//! Key behaviors
//! -------------
//! - [`measure`]: read and cross-check two family tables, then summarize them
//!   as a smoothed size distribution and a pair-count matrix.
//! - [`matrix`]: expand `D + 1` (symmetric) or `2D + 1` (asymmetric) band
//!   parameters into a column-stochastic matrix.
//! - [`objective`]: the pair log-likelihood with its feasibility walls.
//! - [`estimate`]: multi-start maximum-likelihood fit and its report.
//!
//! Invariants & assumptions
//! ------------------------
//! - Both tables list the same families in the same order with the same
//!   number of species columns.
//! - The band leaves at least one size outside it.

pub mod errors;
pub mod estimate;
pub mod matrix;
pub mod measure;
pub mod objective;

pub use self::errors::{ErrorModelError, ErrorModelResult};
pub use self::estimate::{
    ErrorEstimate, ErrorModelOptions, estimate_error_double_measure, estimate_error_model,
    estimate_error_true_measure,
};
pub use self::matrix::{ErrorMatrix, ErrorShape};
pub use self::measure::{ErrorMeasure, MeasurementMode};
pub use self::objective::PairLikelihood;
