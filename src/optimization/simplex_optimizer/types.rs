//! simplex_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and the concrete Nelder–Mead alias used by
//! the derivative-free optimizer so the rest of the crate stays agnostic to
//! `ndarray` and Argmin generics.
//!
//! Conventions
//! -----------
//! - `Theta` is a flat parameter vector; structured interpretation (rate
//!   classes, mixture weights, error-band probabilities) happens in the
//!   model layers.
//! - `Cost` is the minimized scalar `c(θ) = -ℓ(θ)`.
//! - `Simplex` holds the `n + 1` vertices handed to Nelder–Mead.
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use std::collections::HashMap;

/// Parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Scalar objective value used by the optimizer (`c(θ) = -ℓ(θ)`).
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
pub type FnEvalMap = HashMap<String, u64>;

/// Vertices of an initial simplex.
pub type Simplex = Vec<Theta>;

/// Nelder–Mead specialized to this crate's numeric types.
pub type NelderMeadSolver = NelderMead<Theta, Cost>;

/// Relative perturbation applied to non-zero start coordinates.
pub const DEFAULT_REL_STEP: f64 = 0.05;

/// Absolute perturbation applied to start coordinates that are (near) zero.
pub const DEFAULT_ZERO_STEP: f64 = 0.00025;

/// Default tolerance on the spread of vertex costs.
pub const DEFAULT_TOL_COST: f64 = 1e-9;

/// Iterations allowed per free parameter when no explicit cap is set.
pub const ITERS_PER_PARAM: usize = 200;
