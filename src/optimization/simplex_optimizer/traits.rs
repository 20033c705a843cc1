//! Public API surface for derivative-free log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait users implement for their model.
//! - [`SimplexOptions`] and [`Tolerances`]: configuration for one Nelder–Mead run.
//! - [`OptimOutcome`]: normalized result returned by the high-level `maximize` API.
//!
//! Convention: we *maximize* a user log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)`. Infeasible points are reported by returning `f64::NEG_INFINITY`
//! from [`LogLikelihood::value`]; they are never errors.
use crate::optimization::{
    errors::{OptError, OptResult},
    simplex_optimizer::{
        Cost, FnEvalMap, Theta,
        types::{DEFAULT_REL_STEP, DEFAULT_TOL_COST, DEFAULT_ZERO_STEP, ITERS_PER_PARAM},
        validation::{validate_theta_hat, verify_step, verify_tol_cost},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};

/// User-implemented log-likelihood interface.
///
/// - `type Data`: per-model data carried into `value`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`. Return
///   `f64::NEG_INFINITY` for points outside the feasible region.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   malformed `θ`/`data` pairs (wrong length, non-finite entries). Called
///   once per start vector before optimization.
pub trait LogLikelihood {
    type Data;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;
}

/// Stopping rules for a single simplex run.
///
/// - `tol_cost`: terminate once the standard deviation of the vertex costs
///   falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations. `None` resolves to
///   `200 · n` for an `n`-parameter problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_cost: f64,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolCost`] for non-finite or non-positive `tol_cost`.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == Some(0)`.
    pub fn new(tol_cost: f64, max_iter: Option<usize>) -> OptResult<Self> {
        verify_tol_cost(tol_cost)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_cost, max_iter })
    }

    /// Iteration cap for a problem with `dim` free parameters.
    pub fn iteration_budget(&self, dim: usize) -> usize {
        self.max_iter.unwrap_or(ITERS_PER_PARAM * dim.max(1))
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_cost: DEFAULT_TOL_COST, max_iter: None }
    }
}

/// Configuration of one Nelder–Mead run.
///
/// Fields:
/// - `tols`: stopping rules.
/// - `rel_step`: relative perturbation used to build the initial simplex
///   around non-zero coordinates.
/// - `zero_step`: absolute perturbation for coordinates that are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexOptions {
    pub tols: Tolerances,
    pub rel_step: f64,
    pub zero_step: f64,
}

impl SimplexOptions {
    pub fn new(tols: Tolerances, rel_step: f64, zero_step: f64) -> OptResult<Self> {
        verify_step(rel_step)?;
        verify_step(zero_step)?;
        Ok(Self { tols, rel_step, zero_step })
    }
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self { tols: Tolerances::default(), rel_step: DEFAULT_REL_STEP, zero_step: DEFAULT_ZERO_STEP }
    }
}

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best **log-likelihood** value `ℓ(θ)` (`-∞` when every visited
///   point was infeasible).
/// - `converged`: `true` if the solver stopped on its own criterion.
/// - `budget_exhausted`: `true` if the run hit its iteration cap.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub budget_exhausted: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat`.
    /// - [`OptError::NanObjective`] if the best cost is NaN.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        budget: usize, fn_evals: FnEvalMap,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        if value.is_nan() {
            return Err(OptError::NanObjective);
        }
        let iterations = iterations as usize;
        let (converged, status) = match &termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(TerminationReason::MaxItersReached) => {
                (false, format!("{termination:?}"))
            }
            _ => (true, format!("{termination:?}")),
        };
        let budget_exhausted = !converged || iterations >= budget;
        Ok(Self { theta_hat, value, converged, budget_exhausted, status, iterations, fn_evals })
    }

    /// Cost `c(θ̂) = -ℓ(θ̂)` as minimized by the solver.
    pub fn cost(&self) -> Cost {
        -self.value
    }

    /// Whether the run ended on a finite log-likelihood.
    pub fn is_feasible(&self) -> bool {
        self.value.is_finite()
    }
}
