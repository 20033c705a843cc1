//! error_model::matrix — misclassification matrices from band parameters.
//!
//! Purpose
//! -------
//! Expand the free parameters of an error model into the full
//! `(max+1) × (max+1)` matrix `E[observed, truth]`, each column a probability
//! distribution over observed sizes.
//!
//! Key behaviors
//! -------------
//! - The band `truth − D ..= truth + D` holds the free parameters (mirrored
//!   around the centre for symmetric models); every other row holds the
//!   marginal error probability `ε`.
//! - `ε = (1 − band mass) / (sizes outside the band)`.
//! - Column sums are then repaired: the first `D` columns put any shortfall
//!   on row 0, interior columns are rescaled when off by more than `1e-14`,
//!   and the last `D` columns put the shortfall on the last row.
//!
//! Invariants & assumptions
//! ------------------------
//! - `max + 1 > 2D + 1`; [`ErrorShape::check_fits`] enforces it before any
//!   matrix is built.
use crate::error_model::errors::{ErrorModelError, ErrorModelResult};
use ndarray::Array2;

/// Interior columns whose sum is off by more than this are rescaled.
const COLUMN_SUM_TOL: f64 = 1e-14;

/// Shape of an error model.
///
/// - `symmetric`: the band is mirrored, `D + 1` free parameters (centre
///   first); otherwise `2D + 1` parameters ordered from offset `−D` to `+D`.
/// - `half_width`: `D`.
/// - `peak_zero`: parameters must not increase away from offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorShape {
    pub symmetric: bool,
    pub half_width: usize,
    pub peak_zero: bool,
}

impl ErrorShape {
    pub fn new(symmetric: bool, half_width: usize, peak_zero: bool) -> Self {
        Self { symmetric, half_width, peak_zero }
    }

    /// Number of free parameters.
    pub fn n_params(&self) -> usize {
        if self.symmetric { self.half_width + 1 } else { 2 * self.half_width + 1 }
    }

    /// Index of the offset-0 parameter.
    pub fn centre(&self) -> usize {
        if self.symmetric { 0 } else { self.half_width }
    }

    /// # Errors
    /// [`ErrorModelError::BandTooWide`] unless at least one size lies outside the band.
    pub fn check_fits(&self, max_size: usize) -> ErrorModelResult<()> {
        if max_size < 2 * self.half_width + 1 {
            return Err(ErrorModelError::BandTooWide { max_size, half_width: self.half_width });
        }
        Ok(())
    }

    /// Probability mass of the band (symmetric off-centre values count twice).
    pub fn band_mass(&self, params: &[f64]) -> f64 {
        if self.symmetric {
            params.first().copied().unwrap_or(0.0) + 2.0 * params.iter().skip(1).sum::<f64>()
        } else {
            params.iter().sum()
        }
    }

    /// Marginal error probability `ε` implied by `params` for sizes `0..=max_size`.
    pub fn marginal_epsilon(&self, params: &[f64], max_size: usize) -> f64 {
        let outside = (max_size + 1) - (2 * self.half_width + 1);
        (1.0 - self.band_mass(params)) / outside as f64
    }

    /// Band values for offsets `−D..=+D`.
    pub fn band(&self, params: &[f64]) -> Vec<f64> {
        let d = self.half_width;
        if self.symmetric {
            (0..=2 * d).map(|k| params[k.abs_diff(d)]).collect()
        } else {
            params.to_vec()
        }
    }

    /// True when parameters do not increase moving away from offset 0.
    pub fn is_unimodal(&self, params: &[f64]) -> bool {
        if self.symmetric {
            return params.windows(2).all(|w| w[0] >= w[1]);
        }
        let d = self.half_width;
        let left = (1..=d).all(|i| params[d - i] <= params[d - i + 1]);
        let right = (1..=d).all(|i| params[d + i] <= params[d + i - 1]);
        left && right
    }
}

/// Column-stochastic misclassification matrix `E[observed, truth]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMatrix {
    probs: Array2<f64>,
    shape: ErrorShape,
}

impl ErrorMatrix {
    /// Build the matrix for sizes `0..=max_size` from free parameters.
    pub fn from_params(params: &[f64], shape: ErrorShape, max_size: usize) -> Self {
        let epsilon = shape.marginal_epsilon(params, max_size);
        let band = shape.band(params);
        let d = shape.half_width;
        let n = max_size + 1;

        let mut probs = Array2::from_elem((n, n), epsilon);
        for truth in 0..n {
            for (k, &value) in band.iter().enumerate() {
                let observed = truth + k;
                if observed >= d && observed - d < n {
                    probs[[observed - d, truth]] = value;
                }
            }
        }
        let mut matrix = Self { probs, shape };
        matrix.repair_columns();
        matrix
    }

    fn repair_columns(&mut self) {
        let d = self.shape.half_width;
        let last = self.max_size();
        for truth in 0..=last {
            let sum: f64 = self.probs.column(truth).sum();
            if truth < d {
                self.probs[[0, truth]] += 1.0 - sum;
            } else if truth + d <= last {
                if (1.0 - sum).abs() > COLUMN_SUM_TOL {
                    self.probs.column_mut(truth).mapv_inplace(|p| p / sum);
                }
            } else {
                self.probs[[last, truth]] += 1.0 - sum;
            }
        }
    }

    pub fn max_size(&self) -> usize {
        self.probs.nrows() - 1
    }

    pub fn shape(&self) -> ErrorShape {
        self.shape
    }

    /// `P(observe observed | true size truth)`.
    pub fn probability(&self, observed: usize, truth: usize) -> f64 {
        self.probs[[observed, truth]]
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.probs
    }
}
