//! Multi-start driver around the single-run simplex optimizer.
//!
//! Purpose
//! -------
//! Repeat [`maximize`] from random starting points until two accepted runs
//! agree on the optimum, or until the restart limit is reached, and return the
//! best accepted run together with the restart bookkeeping.
//!
//! Key behaviors
//! -------------
//! - Start draws with `ℓ(θ₀) = -∞` are redrawn, up to [`MAX_START_DRAWS`]
//!   per restart, and do not consume a restart.
//! - A run is *accepted* only if it finished inside its iteration budget on a
//!   finite log-likelihood. Rejected runs still consume a restart.
//! - Convergence is declared when an accepted run's cost is within
//!   `tol_converge` of the best accepted cost seen before it.
//! - Non-convergence is not an error: the best accepted run is returned with
//!   `converged = false` and a warning is logged.
//!
//! Invariants & assumptions
//! ------------------------
//! - Randomness comes only from the caller's RNG, so a seeded RNG reproduces
//!   the whole search.
//! - The loop is bounded by `max_restarts`.
use crate::optimization::{
    errors::{OptError, OptResult},
    multistart::seeding::StartSampler,
    simplex_optimizer::{LogLikelihood, OptimOutcome, SimplexOptions, Theta, maximize},
};
use rand::Rng;

/// Default restart limit.
pub const DEFAULT_MAX_RESTARTS: usize = 100;

/// Default agreement tolerance between accepted runs.
pub const DEFAULT_TOL_CONVERGE: f64 = 1e-9;

/// Draws per restart spent looking for a feasible start.
pub const MAX_START_DRAWS: usize = 1000;

/// Restart policy plus the per-run simplex configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiStartOptions {
    pub max_restarts: usize,
    pub tol_converge: f64,
    pub simplex: SimplexOptions,
}

impl MultiStartOptions {
    /// Construct validated multi-start options.
    ///
    /// # Errors
    /// - [`OptError::InvalidMaxRestarts`] if `max_restarts == 0`.
    /// - [`OptError::InvalidTolConverge`] for non-finite or non-positive tolerances.
    pub fn new(max_restarts: usize, tol_converge: f64, simplex: SimplexOptions) -> OptResult<Self> {
        if max_restarts == 0 {
            return Err(OptError::InvalidMaxRestarts {
                max_restarts,
                reason: "At least one restart is required.",
            });
        }
        if !tol_converge.is_finite() || tol_converge <= 0.0 {
            return Err(OptError::InvalidTolConverge {
                tol: tol_converge,
                reason: "Tolerance must be finite and positive.",
            });
        }
        Ok(Self { max_restarts, tol_converge, simplex })
    }

    /// Options for a single run (no restarts).
    pub fn single_run(simplex: SimplexOptions) -> Self {
        Self { max_restarts: 1, tol_converge: DEFAULT_TOL_CONVERGE, simplex }
    }
}

impl Default for MultiStartOptions {
    fn default() -> Self {
        Self {
            max_restarts: DEFAULT_MAX_RESTARTS,
            tol_converge: DEFAULT_TOL_CONVERGE,
            simplex: SimplexOptions::default(),
        }
    }
}

/// Bookkeeping for one restart.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub attempt: usize,
    pub cost: f64,
    pub iterations: usize,
    pub accepted: bool,
}

/// Result of a multi-start search.
///
/// - `best`: best accepted run.
/// - `converged`: two accepted runs agreed within `tol_converge`.
/// - `attempts`: restarts consumed (accepted or not).
/// - `accepted`: number of accepted runs.
/// - `history`: one entry per restart, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiStartOutcome {
    pub best: OptimOutcome,
    pub converged: bool,
    pub attempts: usize,
    pub accepted: usize,
    pub history: Vec<RunSummary>,
}

impl MultiStartOutcome {
    /// Best cost `c(θ̂) = -ℓ(θ̂)`.
    pub fn best_cost(&self) -> f64 {
        self.best.cost()
    }

    /// Report lines for the end of a search.
    ///
    /// A converged search counts its accepted runs. A failed one names the
    /// restart limit and the best score.
    pub fn verdict(&self, max_restarts: usize) -> Vec<String> {
        if self.converged {
            vec![format!("score converged in {} runs.", self.accepted)]
        } else {
            vec![
                format!("score failed to converge in {max_restarts} runs."),
                format!("best score: {:.6}", self.best_cost()),
            ]
        }
    }
}

#[derive(Debug, Default)]
struct SearchState {
    best: Option<OptimOutcome>,
    converged: bool,
    attempts: usize,
    accepted: usize,
    history: Vec<RunSummary>,
}

impl SearchState {
    /// Fold one finished run into the accumulator.
    fn observe(&mut self, run: OptimOutcome, tol: f64) {
        let accepted = !run.budget_exhausted && run.is_feasible();
        self.history.push(RunSummary {
            attempt: self.attempts,
            cost: run.cost(),
            iterations: run.iterations,
            accepted,
        });
        self.attempts += 1;
        if !accepted {
            return;
        }
        self.accepted += 1;
        match &self.best {
            Some(best) => {
                if (best.cost() - run.cost()).abs() < tol {
                    self.converged = true;
                }
                if run.cost() < best.cost() {
                    self.best = Some(run);
                }
            }
            None => self.best = Some(run),
        }
    }
}

/// Draw a start with a finite log-likelihood, or the last draw once
/// [`MAX_START_DRAWS`] have all been infeasible.
fn feasible_start<F, S, R>(
    f: &F, data: &F::Data, sampler: &mut S, rng: &mut R,
) -> OptResult<Theta>
where
    F: LogLikelihood,
    S: StartSampler,
    R: Rng + ?Sized,
{
    let mut theta0 = sampler.sample(rng);
    for redraw in 1..MAX_START_DRAWS {
        f.check(&theta0, data)?;
        if f.value(&theta0, data)?.is_finite() {
            if redraw > 1 {
                tracing::trace!(discarded = redraw - 1, "infeasible starts redrawn");
            }
            return Ok(theta0);
        }
        theta0 = sampler.sample(rng);
    }
    tracing::debug!(draws = MAX_START_DRAWS, "no feasible start found");
    Ok(theta0)
}

/// Maximize `f` from repeated random starts.
///
/// # Behavior
/// - Each restart draws a feasible `θ₀` from `sampler`, runs [`maximize`],
///   and folds the result into the running state.
/// - Stops after the first agreement between accepted runs, or after
///   `opts.max_restarts` restarts.
///
/// # Errors
/// - Propagates errors from individual runs (malformed starts, model failures).
/// - [`OptError::NoAcceptedRun`] if no restart was accepted.
pub fn multistart_maximize<F, S, R>(
    f: &F, data: &F::Data, sampler: &mut S, rng: &mut R, opts: &MultiStartOptions,
) -> OptResult<MultiStartOutcome>
where
    F: LogLikelihood,
    S: StartSampler,
    R: Rng + ?Sized,
{
    let mut state = SearchState::default();
    for attempt in 0..opts.max_restarts {
        let theta0 = feasible_start(f, data, sampler, rng)?;
        let run = maximize(f, theta0, data, &opts.simplex)?;
        tracing::debug!(
            attempt,
            cost = run.cost(),
            iterations = run.iterations,
            exhausted = run.budget_exhausted,
            "restart finished"
        );
        state.observe(run, opts.tol_converge);
        if state.converged {
            break;
        }
    }

    let SearchState { best, converged, attempts, accepted, history } = state;
    let best = best.ok_or(OptError::NoAcceptedRun { attempts })?;
    if converged {
        tracing::debug!(attempts, cost = best.cost(), "score converged");
    } else if opts.max_restarts > 1 {
        tracing::warn!(attempts, cost = best.cost(), "score failed to converge");
    }
    Ok(MultiStartOutcome { best, converged, attempts, accepted, history })
}
