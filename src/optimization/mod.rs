//! optimization — derivative-free MLE stack and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer shared by rate searches and error-model
//! estimation: an Argmin-backed Nelder–Mead maximizer of log-likelihoods, a
//! multi-start driver with convergence detection across restarts, and a single
//! error/result surface.
//!
//! Key behaviors
//! -------------
//! - Maximize `ℓ(θ)` from one start point (`simplex_optimizer`).
//! - Repeat from random starts until two accepted runs agree (`multistart`).
//! - Normalize configuration issues and backend solver errors into
//!   `errors::OptError` with a common result alias (`OptResult<T>`).
//!
//! Conventions
//! -----------
//! - All solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; outcomes are
//!   reported in terms of `ℓ`, with `cost()` accessors where the minimized
//!   score is wanted.
//! - Infeasible points are `ℓ = -∞`, never errors.
//! - This module only emits `tracing` events; user-facing reporting happens
//!   in the callers.

pub mod errors;
pub mod multistart;
pub mod simplex_optimizer;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::multistart::{
        MultiStartOptions, MultiStartOutcome, StartSampler, StartShape, UnimodalStart,
        multistart_maximize,
    };
    pub use super::simplex_optimizer::prelude::*;
}
