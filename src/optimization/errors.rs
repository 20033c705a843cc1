use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptError {
    // ---- SimplexOptions ----
    /// Cost spread tolerance needs to be positive and finite.
    #[error("Invalid cost spread tolerance {tol}: {reason}")]
    InvalidTolCost { tol: f64, reason: &'static str },

    /// Maximum iterations needs to be positive.
    #[error("Invalid maximum iterations {max_iter}: {reason}")]
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// Initial simplex steps need to be positive and finite.
    #[error("Invalid simplex step {step}: {reason}")]
    InvalidSimplexStep { step: f64, reason: &'static str },

    // ---- MultiStartOptions ----
    /// At least one restart is required.
    #[error("Invalid restart limit {max_restarts}: {reason}")]
    InvalidMaxRestarts { max_restarts: usize, reason: &'static str },

    /// Convergence tolerance between restarts needs to be positive and finite.
    #[error("Invalid restart convergence tolerance {tol}: {reason}")]
    InvalidTolConverge { tol: f64, reason: &'static str },

    // ---- Start vectors ----
    /// The objective has no free parameters.
    #[error("Cannot optimize over an empty parameter vector")]
    EmptyTheta,

    /// Start vector length does not match the objective.
    #[error("Theta length mismatch: expected {expected}, actual {actual}")]
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Start vectors must have finite values.
    #[error("Invalid theta input at index {index}: {value}, must be finite")]
    InvalidThetaInput { index: usize, value: f64 },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    #[error("Invalid estimated parameter at index {index}: {value}: {reason}")]
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    /// Theta hat is missing
    #[error("Missing estimated parameters (theta hat)")]
    MissingThetaHat,

    /// Objective produced NaN, which cannot be ranked.
    #[error("Objective returned NaN")]
    NanObjective,

    /// Every restart exhausted its budget or stayed infeasible.
    #[error("No restart finished within its iteration budget after {attempts} attempts")]
    NoAcceptedRun { attempts: usize },

    // ---- Objective ----
    /// Failure raised by a model while evaluating its log-likelihood.
    #[error("Objective evaluation failed: {text}")]
    Objective { text: String },

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    #[error("Invalid parameter: {text}")]
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    #[error("Not implemented: {text}")]
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    #[error("Not initialized: {text}")]
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    #[error("Condition violated: {text}")]
    ConditionViolated { text: String },
    /// Wrapper for argmin::CheckPointNotFound
    #[error("Checkpoint not found: {text}")]
    CheckPointNotFound { text: String },
    /// Wrapper for argmin::PotentialBug
    #[error("Potential bug: {text}")]
    PotentialBug { text: String },
    /// Wrapper for argmin::ImpossibleError
    #[error("Impossible error: {text}")]
    ImpossibleError { text: String },
    /// Wrapper for other argmin::Error types
    #[error("Backend error: {text}")]
    BackendError { text: String },

    // ---- Fallback ----
    #[error("Unknown error")]
    UnknownError,
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Errors raised by our own objectives travel through argmin boxed; unwrap them first.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Conversions from argmin's boxed error type into `OptError`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // An `OptError` raised inside a cost function must come back out of
    // argmin unchanged.
    //
    // Given
    // -----
    // - `OptError::NanObjective` boxed into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - Converting back yields the same variant.
    fn from_argmin_error_recovers_own_variant() {
        // Arrange
        let boxed: Error = OptError::NanObjective.into();

        // Act
        let back = OptError::from(boxed);

        // Assert
        assert_eq!(back, OptError::NanObjective);
    }

    #[test]
    // Purpose
    // -------
    // Argmin's own error kinds map to their dedicated wrappers.
    //
    // Given
    // -----
    // - `ArgminError::InvalidParameter` boxed into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - `OptError::InvalidParameter` with the same text.
    fn from_argmin_error_maps_invalid_parameter() {
        // Arrange
        let boxed: Error = ArgminError::InvalidParameter { text: "bad".to_string() }.into();

        // Act
        let back = OptError::from(boxed);

        // Assert
        assert_eq!(back, OptError::InvalidParameter { text: "bad".to_string() });
    }
}
