//! High-level entry point for maximizing a user-provided `LogLikelihood`
//! from a single start point.
use crate::optimization::{
    errors::OptResult,
    simplex_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::build_nelder_mead,
        run::run_nelder_mead,
        traits::{LogLikelihood, SimplexOptions},
        validation::validate_theta0,
    },
};

/// Upper bound on simplex rebuilds after the first run.
pub const MAX_POLISH_ROUNDS: usize = 50;

/// Maximize a log-likelihood `ℓ(θ)` with Nelder–Mead started at `theta0`.
///
/// # Behavior
/// - Validates `theta0` (finite entries) and calls `f.check(theta0, data)`.
/// - Builds the initial simplex and solver from `opts`.
/// - Runs the solver on `c(θ) = -ℓ(θ)`. A feasible run that stopped on its
///   own criterion is then restarted from its optimum with a fresh simplex
///   until a restart gains no more than `tol_cost`, for at most
///   [`MAX_POLISH_ROUNDS`] rounds.
/// - The returned [`OptimOutcome`] carries the best point, the summed
///   iteration and evaluation counts, and the budget verdict of the first run.
///
/// # Errors
/// - Propagates errors from `f.check`, the builder and the runs.
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &SimplexOptions,
) -> OptResult<OptimOutcome> {
    let dim = theta0.len();
    validate_theta0(&theta0, dim)?;
    f.check(&theta0, data)?;
    let mut best = single_pass(f, &theta0, data, opts)?;

    for round in 0..MAX_POLISH_ROUNDS {
        if best.budget_exhausted || !best.is_feasible() {
            break;
        }
        let next = single_pass(f, &best.theta_hat, data, opts)?;
        let gain = best.cost() - next.cost();
        best.iterations += next.iterations;
        for (name, count) in &next.fn_evals {
            *best.fn_evals.entry(name.clone()).or_insert(0) += *count;
        }
        if next.budget_exhausted || gain <= 0.0 {
            break;
        }
        tracing::trace!(round, gain, cost = next.cost(), "simplex rebuilt at optimum");
        best.theta_hat = next.theta_hat;
        best.value = next.value;
        best.status = next.status;
        if gain <= opts.tols.tol_cost {
            break;
        }
    }
    Ok(best)
}

/// One Nelder–Mead run from `theta0` without polishing.
fn single_pass<F: LogLikelihood>(
    f: &F, theta0: &Theta, data: &F::Data, opts: &SimplexOptions,
) -> OptResult<OptimOutcome> {
    let solver = build_nelder_mead(theta0, opts)?;
    let problem = ArgMinAdapter::new(f, data);
    run_nelder_mead(problem, solver, opts, theta0.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{errors::OptError, simplex_optimizer::Tolerances};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // End-to-end single-start runs on toy log-likelihoods.
    // -------------------------------------------------------------------------

    struct Bowl;

    impl LogLikelihood for Bowl {
        type Data = (f64, f64);

        fn value(&self, theta: &Theta, target: &(f64, f64)) -> OptResult<f64> {
            let dx = theta[0] - target.0;
            let dy = theta[1] - target.1;
            Ok(-(dx * dx + dy * dy))
        }

        fn check(&self, theta: &Theta, _: &(f64, f64)) -> OptResult<()> {
            if theta.len() != 2 {
                return Err(OptError::ThetaLengthMismatch { expected: 2, actual: theta.len() });
            }
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Nelder–Mead finds the maximum of a concave quadratic.
    //
    // Given
    // -----
    // - `ℓ(θ) = -|θ - (0.3, 0.7)|²`, start at `(0.1, 0.1)`.
    //
    // Expect
    // ------
    // - Converged within budget, `θ̂ ≈ (0.3, 0.7)`.
    fn maximize_recovers_quadratic_peak() {
        // Arrange
        let opts = SimplexOptions::default();

        // Act
        let out = maximize(&Bowl, array![0.1, 0.1], &(0.3, 0.7), &opts).unwrap();

        // Assert
        assert!(out.converged);
        assert!(!out.budget_exhausted);
        assert!((out.theta_hat[0] - 0.3).abs() < 1e-3);
        assert!((out.theta_hat[1] - 0.7).abs() < 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // A tiny iteration cap is reported as an exhausted budget.
    //
    // Given
    // -----
    // - `max_iter = 2` on the same quadratic.
    //
    // Expect
    // ------
    // - `budget_exhausted == true`.
    fn maximize_reports_exhausted_budget() {
        let opts =
            SimplexOptions { tols: Tolerances::new(1e-12, Some(2)).unwrap(), ..Default::default() };

        let out = maximize(&Bowl, array![0.1, 0.1], &(0.3, 0.7), &opts).unwrap();

        assert!(out.budget_exhausted);
    }

    /// Quadratic bowl centred on the diagonal wall `θ₁ ≤ θ₀`; the peak sits
    /// on the wall at `(1, 1)`.
    struct Wedge;

    impl LogLikelihood for Wedge {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            if theta[1] > theta[0] {
                return Ok(f64::NEG_INFINITY);
            }
            Ok(-((theta[0] - 1.0).powi(2) + (theta[1] - 1.0).powi(2)))
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Rebuilding the simplex at its own optimum walks a run along a
    // feasibility wall instead of stopping where the first simplex collapsed.
    //
    // Given
    // -----
    // - `Wedge`, start `(0.2, 0.1)`, default options.
    //
    // Expect
    // ------
    // - The polished cost is no worse than a single pass and close to the
    //   peak on the wall.
    // - Iterations include the single pass.
    fn maximize_polishes_runs_stalled_on_a_wall() {
        // Arrange
        let opts = SimplexOptions::default();
        let start = array![0.2, 0.1];
        let one_pass = single_pass(&Wedge, &start, &(), &opts).unwrap();

        // Act
        let out = maximize(&Wedge, start, &(), &opts).unwrap();

        // Assert
        assert!(out.is_feasible());
        assert!(!out.budget_exhausted);
        assert!(out.cost() <= one_pass.cost());
        assert!(out.cost() < 1e-2, "{:?} {}", out.theta_hat, out.cost());
        assert!(out.iterations >= one_pass.iterations);
    }

    #[test]
    // Purpose
    // -------
    // An exhausted first run is returned as is, without polishing.
    fn maximize_skips_polish_after_exhausted_budget() {
        let opts =
            SimplexOptions { tols: Tolerances::new(1e-12, Some(3)).unwrap(), ..Default::default() };

        let out = maximize(&Wedge, array![0.2, 0.1], &(), &opts).unwrap();

        assert!(out.budget_exhausted);
        assert!(out.iterations <= 3);
    }

    #[test]
    // Purpose
    // -------
    // `check` is consulted before the run starts.
    fn maximize_propagates_check_errors() {
        let out = maximize(&Bowl, array![0.1, 0.1, 0.1], &(0.3, 0.7), &SimplexOptions::default());
        assert_eq!(out.unwrap_err(), OptError::ThetaLengthMismatch { expected: 2, actual: 3 });
    }
}
