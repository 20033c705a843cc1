//! error_model::estimate — maximum-likelihood fit of a misclassification model.
//!
//! Purpose
//! -------
//! Drive [`multistart_maximize`] over [`PairLikelihood`] with band-shaped
//! random starts and report the best parameters, the implied `ε` and the
//! materialized matrix.
//!
//! Key behaviors
//! -------------
//! - Every restart is reported as its iteration count and score (the
//!   minimized negative log-likelihood).
//! - The search stops at the first pair of accepted runs whose scores agree
//!   within [`ERROR_MODEL_TOL_CONVERGE`], or after the restart limit. Each
//!   run polishes to [`ERROR_MODEL_TOL`] on its own.
//! - Non-convergence is reported, not raised; the best accepted run is kept.
//!
//! Downstream usage
//! ----------------
//! - The `errormodel` subcommand; callers wanting other inputs can build an
//!   [`ErrorMeasure`] themselves and call [`estimate_error_model`].
use crate::{
    error_model::{
        errors::ErrorModelResult,
        matrix::{ErrorMatrix, ErrorShape},
        measure::{ErrorMeasure, MeasurementMode},
        objective::PairLikelihood,
    },
    optimization::{
        errors::OptResult,
        multistart::{MultiStartOptions, StartShape, UnimodalStart, multistart_maximize},
        simplex_optimizer::{SimplexOptions, Tolerances},
    },
    report::Reporter,
};
use rand::Rng;
use std::path::Path;

/// Cost-spread tolerance of each simplex run.
pub const ERROR_MODEL_TOL: f64 = 1e-9;

/// Agreement between two accepted restarts that declares convergence.
pub const ERROR_MODEL_TOL_CONVERGE: f64 = 1e-3;

/// Restart limit for error-model fits.
pub const ERROR_MODEL_MAX_RESTARTS: usize = 100;

/// Search configuration for error-model estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorModelOptions {
    pub multistart: MultiStartOptions,
}

impl ErrorModelOptions {
    /// `tol_cost` stops each simplex run; `tol_converge` is the score
    /// difference under which two accepted restarts agree.
    ///
    /// # Errors
    /// Propagates tolerance and restart-limit validation from the optimizer.
    pub fn new(max_restarts: usize, tol_cost: f64, tol_converge: f64) -> OptResult<Self> {
        let simplex =
            SimplexOptions { tols: Tolerances::new(tol_cost, None)?, ..Default::default() };
        Ok(Self { multistart: MultiStartOptions::new(max_restarts, tol_converge, simplex)? })
    }
}

impl Default for ErrorModelOptions {
    fn default() -> Self {
        let simplex = SimplexOptions {
            tols: Tolerances { tol_cost: ERROR_MODEL_TOL, max_iter: None },
            ..Default::default()
        };
        Self {
            multistart: MultiStartOptions {
                max_restarts: ERROR_MODEL_MAX_RESTARTS,
                tol_converge: ERROR_MODEL_TOL_CONVERGE,
                simplex,
            },
        }
    }
}

/// Fitted error model.
///
/// - `params`: free band parameters (centre first when symmetric, otherwise
///   offsets `−D..=+D`).
/// - `epsilon`: implied probability of each off-band size.
/// - `log_likelihood`: `ℓ` at `params`.
/// - `runs`: accepted restarts; `attempts`: all restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEstimate {
    pub params: Vec<f64>,
    pub epsilon: f64,
    pub matrix: ErrorMatrix,
    pub log_likelihood: f64,
    pub converged: bool,
    pub runs: usize,
    pub attempts: usize,
}

/// Fit an error model from two independent noisy measurements of the same families.
///
/// # Errors
/// File, consistency and band-width errors from [`ErrorMeasure::from_files`];
/// optimizer failures (including no accepted restart); report write failures.
pub fn estimate_error_double_measure<R: Rng + ?Sized>(
    first: &Path, second: &Path, shape: ErrorShape, opts: &ErrorModelOptions, rng: &mut R,
    reporter: &Reporter,
) -> ErrorModelResult<ErrorEstimate> {
    let measure = ErrorMeasure::from_files(first, second, MeasurementMode::Double, shape)?;
    estimate_error_model(&measure, opts, rng, reporter)
}

/// Fit an error model from a noisy measurement and the true counts.
///
/// # Errors
/// As [`estimate_error_double_measure`].
pub fn estimate_error_true_measure<R: Rng + ?Sized>(
    error_file: &Path, truth_file: &Path, shape: ErrorShape, opts: &ErrorModelOptions,
    rng: &mut R, reporter: &Reporter,
) -> ErrorModelResult<ErrorEstimate> {
    let measure = ErrorMeasure::from_files(error_file, truth_file, MeasurementMode::Truth, shape)?;
    estimate_error_model(&measure, opts, rng, reporter)
}

/// Fit an error model to an already summarized measurement.
///
/// # Errors
/// Optimizer failures and report write failures.
pub fn estimate_error_model<R: Rng + ?Sized>(
    measure: &ErrorMeasure, opts: &ErrorModelOptions, rng: &mut R, reporter: &Reporter,
) -> ErrorModelResult<ErrorEstimate> {
    let shape = measure.shape;
    let start_shape = if shape.symmetric {
        StartShape::Symmetric
    } else {
        StartShape::Asymmetric { half_width: shape.half_width }
    };
    let mut sampler = UnimodalStart::new(shape.n_params(), start_shape);

    let out = multistart_maximize(&PairLikelihood, measure, &mut sampler, rng, &opts.multistart)?;
    for run in &out.history {
        reporter.line(format!("Misclassification Matrix Search Result: {}", run.iterations))?;
        reporter.line(format!("Score: {:.6}", run.cost))?;
    }
    for line in out.verdict(opts.multistart.max_restarts) {
        reporter.line(line)?;
    }

    let params = out.best.theta_hat.to_vec();
    let epsilon = shape.marginal_epsilon(&params, measure.max_size);
    let matrix = ErrorMatrix::from_params(&params, shape, measure.max_size);
    tracing::debug!(?params, epsilon, converged = out.converged, "error model fitted");
    Ok(ErrorEstimate {
        params,
        epsilon,
        matrix,
        log_likelihood: out.best.value,
        converged: out.converged,
        runs: out.accepted,
        attempts: out.attempts,
    })
}
