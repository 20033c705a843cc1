//! error_model::objective — log-likelihood of band parameters given paired data.
//!
//! Purpose
//! -------
//! Score a candidate parameter vector against an [`ErrorMeasure`] by
//! materializing the misclassification matrix and evaluating the probability
//! of every observed pair under it.
//!
//! Key behaviors
//! -------------
//! - Infeasible vectors (negative entries, negative `ε`, any entry below `ε`,
//!   or a band that grows away from the centre when `peak_zero` is set) score
//!   `-∞`.
//! - Double measurements: `P(i, j) = Σ_k s_k·E[i,k]·E[j,k]`, doubled off the
//!   diagonal, over the upper triangle.
//! - Truth measurements: `P(i, j) = s_j·E[i,j]` over the full grid.
//! - Both subtract `ln(1 − P(0, 0))`; families observed as absent everywhere
//!   never enter the tables.
use crate::{
    error_model::{
        matrix::ErrorMatrix,
        measure::{ErrorMeasure, MeasurementMode},
    },
    optimization::{
        errors::{OptError, OptResult},
        simplex_optimizer::{LogLikelihood, Theta},
    },
};

/// Pair log-likelihood for an error model; stateless, the data carries the shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairLikelihood;

/// True when `params` describe a valid band for `measure`.
pub fn band_feasible(measure: &ErrorMeasure, params: &[f64]) -> bool {
    let shape = measure.shape;
    if params.len() != shape.n_params() {
        return false;
    }
    let epsilon = shape.marginal_epsilon(params, measure.max_size);
    if epsilon < 0.0 || epsilon.is_nan() {
        return false;
    }
    if params.iter().any(|&p| p < 0.0 || p.is_nan() || p < epsilon) {
        return false;
    }
    !shape.peak_zero || shape.is_unimodal(params)
}

fn weighted(pairs: f64, probability: f64) -> f64 {
    if pairs == 0.0 { 0.0 } else { pairs * probability.ln() }
}

fn double_measure_log_likelihood(measure: &ErrorMeasure, e: &ErrorMatrix) -> f64 {
    let n = measure.max_size + 1;
    let s = &measure.size_dist;
    let joint = |i: usize, j: usize| -> f64 {
        (0..n).map(|k| s[k] * e.probability(i, k) * e.probability(j, k)).sum()
    };

    let mut ll = 0.0;
    for i in 0..n {
        for j in i..n {
            let pairs = measure.pairs[[i, j]];
            if pairs == 0.0 {
                continue;
            }
            let factor = if i == j { 1.0 } else { 2.0 };
            ll += weighted(pairs, factor * joint(i, j));
        }
    }
    ll - (1.0 - joint(0, 0)).ln()
}

fn truth_measure_log_likelihood(measure: &ErrorMeasure, e: &ErrorMatrix) -> f64 {
    let n = measure.max_size + 1;
    let s = &measure.size_dist;
    let mut ll = 0.0;
    for i in 0..n {
        for j in 0..n {
            ll += weighted(measure.pairs[[i, j]], s[j] * e.probability(i, j));
        }
    }
    ll - (1.0 - e.probability(0, 0) * s[0]).ln()
}

impl LogLikelihood for PairLikelihood {
    type Data = ErrorMeasure;

    fn value(&self, theta: &Theta, measure: &ErrorMeasure) -> OptResult<f64> {
        let params = theta.to_vec();
        if !band_feasible(measure, &params) {
            return Ok(f64::NEG_INFINITY);
        }
        let matrix = ErrorMatrix::from_params(&params, measure.shape, measure.max_size);
        let ll = match measure.mode {
            MeasurementMode::Double => double_measure_log_likelihood(measure, &matrix),
            MeasurementMode::Truth => truth_measure_log_likelihood(measure, &matrix),
        };
        if ll.is_nan() {
            return Ok(f64::NEG_INFINITY);
        }
        tracing::trace!(?params, ll, "error model evaluated");
        Ok(ll)
    }

    fn check(&self, theta: &Theta, measure: &ErrorMeasure) -> OptResult<()> {
        let expected = measure.shape.n_params();
        if theta.len() != expected {
            return Err(OptError::ThetaLengthMismatch { expected, actual: theta.len() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_model::matrix::ErrorShape;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, Array2};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Feasibility walls and the two discordance models on small hand-built
    // measurements.
    // -------------------------------------------------------------------------

    fn measure(mode: MeasurementMode, shape: ErrorShape, pairs: Array2<f64>) -> ErrorMeasure {
        let n = pairs.nrows();
        ErrorMeasure {
            size_dist: Array1::from_elem(n, 1.0 / n as f64),
            pairs,
            max_size: n - 1,
            shape,
            mode,
        }
    }

    #[test]
    // Purpose
    // -------
    // Each infeasibility condition is a `-∞` wall.
    //
    // Given
    // -----
    // - Symmetric D = 1 over sizes 0..=4 (ε spread over 2 sizes), peak_zero.
    //
    // Expect
    // ------
    // - Negative entry, band mass > 1, entry below ε and a rising band all
    //   score `-∞`; a sensible band scores finite.
    fn infeasible_bands_are_walls() {
        // Arrange
        let shape = ErrorShape::new(true, 1, true);
        let mut pairs = Array2::zeros((5, 5));
        pairs[[1, 1]] = 3.0;
        pairs[[2, 3]] = 1.0;
        let m = measure(MeasurementMode::Double, shape, pairs);
        let score = |p: Vec<f64>| PairLikelihood.value(&Theta::from(p), &m).unwrap();

        // Act / Assert
        assert_eq!(score(vec![-0.1, 0.1]), f64::NEG_INFINITY);
        assert_eq!(score(vec![0.9, 0.1]), f64::NEG_INFINITY);
        assert_eq!(score(vec![0.9, 0.001]), f64::NEG_INFINITY);
        assert_eq!(score(vec![0.2, 0.3]), f64::NEG_INFINITY);
        assert!(score(vec![0.8, 0.08]).is_finite());
    }

    #[test]
    // Purpose
    // -------
    // Truth-measure likelihood matches a hand computation.
    //
    // Given
    // -----
    // - Asymmetric D = 1, params [0.1, 0.7, 0.1], sizes 0..=3, uniform size
    //   distribution, one pair (observed 2, truth 2) and one (3, 2).
    //
    // Expect
    // ------
    // - ℓ = ln(¼·0.7) + ln(¼·0.1) − ln(1 − ¼·E[0,0]); column 0 loses its
    //   offset −1 entry, so E[0,0] = 0.7 with no shortfall to absorb.
    fn truth_measure_matches_hand_computation() {
        let shape = ErrorShape::new(false, 1, false);
        let mut pairs = Array2::zeros((4, 4));
        pairs[[2, 2]] = 1.0;
        pairs[[3, 2]] = 1.0;
        let m = measure(MeasurementMode::Truth, shape, pairs);

        let ll = PairLikelihood.value(&Theta::from(vec![0.1, 0.7, 0.1]), &m).unwrap();

        let expected = (0.25f64 * 0.7).ln() + (0.25f64 * 0.1).ln() - (1.0f64 - 0.25 * 0.7).ln();
        assert_abs_diff_eq!(ll, expected, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Concordant double measurements prefer a sharper band.
    fn concordant_pairs_favour_high_centre() {
        let shape = ErrorShape::new(true, 1, true);
        let mut pairs = Array2::zeros((6, 6));
        for s in 0..6 {
            pairs[[s, s]] = 10.0;
        }
        let m = measure(MeasurementMode::Double, shape, pairs);

        let sharp = PairLikelihood.value(&Theta::from(vec![0.9, 0.04]), &m).unwrap();
        let blurry = PairLikelihood.value(&Theta::from(vec![0.5, 0.2]), &m).unwrap();

        assert!(sharp > blurry);
    }

    #[test]
    // Purpose
    // -------
    // `check` enforces the parameter count implied by the shape.
    fn check_rejects_wrong_length() {
        let shape = ErrorShape::new(false, 2, false);
        let m = measure(MeasurementMode::Truth, shape, Array2::ones((7, 7)));

        let err = PairLikelihood.check(&Theta::from(vec![0.5, 0.2, 0.1]), &m).unwrap_err();

        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 5, actual: 3 });
    }
}
