//! Execution helper that runs the Nelder–Mead solver on a log-likelihood problem
//! and returns a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    simplex_optimizer::{
        LogLikelihood, OptimOutcome, SimplexOptions, adapter::ArgMinAdapter,
        types::NelderMeadSolver,
    },
};
use argmin::core::{Executor, State};

/// Run one Nelder–Mead optimization.
///
/// Wires the user model via [`ArgMinAdapter`] and the prepared solver, applies the
/// iteration budget for a `dim`-parameter problem, executes, and converts the
/// final state into an [`OptimOutcome`].
///
/// # Errors
/// - Propagates any `argmin` runtime error through `From<argmin::core::Error>`,
///   which also recovers `OptError`s raised inside the objective.
/// - Propagates validation errors from [`OptimOutcome::new`].
pub fn run_nelder_mead<'a, F>(
    problem: ArgMinAdapter<'a, F>, solver: NelderMeadSolver, opts: &SimplexOptions, dim: usize,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
{
    let budget = opts.tols.iteration_budget(dim);
    let optimizer =
        Executor::new(problem, solver).configure(|state| state.max_iters(budget as u64));

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        budget,
        function_counts,
    )
}
