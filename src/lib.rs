//! genefam_rates — birth–death rate estimation for gene family sizes.
//!
//! Purpose
//! -------
//! Fit per-branch birth (λ) and death (μ) rates of gene-family size evolution
//! on a species tree, estimate measurement-error models for family counts,
//! and cross-validate fitted rates on held-out data.
//!
//! Key behaviors
//! -------------
//! - [`rates`]: map a flat parameter vector onto rate classes, mixture
//!   clusters and weights, and install it on every tree node.
//! - [`optimization`]: Nelder–Mead maximization of log-likelihoods with a
//!   multi-start restart policy.
//! - [`search`]: the explicit analysis context and its rate search / scoring
//!   operations.
//! - [`error_model`]: misclassification matrices fitted from paired
//!   measurements.
//! - [`crossval`]: by-family and by-species cross-validation.
//! - [`phylo`]: tree, family tables, transition matrices, pruning likelihood
//!   and Viterbi reconstruction.
//!
//! Conventions
//! -----------
//! - Log-likelihoods are maximized; optimizers minimize `−ℓ`.
//! - Infeasible parameter vectors score `ℓ = −∞` and are never errors.
//! - User-facing results are lines written through [`report::Reporter`];
//!   diagnostics are `tracing` events.
//!
//! Downstream usage
//! ----------------
//! - The `genefam` binary wraps these modules behind [`cli::Cli`] and
//!   [`run`].

pub mod cli;
pub mod commands;
pub mod crossval;
pub mod error_model;
pub mod optimization;
pub mod phylo;
pub mod rates;
pub mod report;
pub mod search;

pub use commands::run;
