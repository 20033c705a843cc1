//! Validation helpers for simplex optimization.
//!
//! - **Tolerance checks**: [`verify_tol_cost`], [`verify_step`] ensure
//!   numeric settings are finite and strictly positive.
//! - **Start vectors**: [`validate_theta0`] enforces dimension and finite
//!   entries before a run starts.
//! - **Parameter estimates**: [`validate_theta_hat`] ensures a candidate
//!   `theta_hat` exists and contains only finite values.
use crate::optimization::{
    errors::{OptError, OptResult},
    simplex_optimizer::Theta,
};

/// Validate the cost-spread tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
    }
    Ok(())
}

/// Validate an initial-simplex perturbation.
///
/// # Errors
/// Returns [`OptError::InvalidSimplexStep`] if the value is non-finite or ≤ 0.0.
pub fn verify_step(step: f64) -> OptResult<()> {
    if !step.is_finite() {
        return Err(OptError::InvalidSimplexStep { step, reason: "Step must be finite." });
    }
    if step <= 0.0 {
        return Err(OptError::InvalidSimplexStep { step, reason: "Step must be positive." });
    }
    Ok(())
}

/// Validate a start vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::EmptyTheta`] if `dim == 0`.
/// - [`OptError::ThetaLengthMismatch`] if the length does not match `dim`.
/// - [`OptError::InvalidThetaInput`] for the first non-finite element.
pub fn validate_theta0(theta: &Theta, dim: usize) -> OptResult<()> {
    if dim == 0 {
        return Err(OptError::EmptyTheta);
    }
    if theta.len() != dim {
        return Err(OptError::ThetaLengthMismatch { expected: dim, actual: theta.len() });
    }
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaInput { index, value });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}
