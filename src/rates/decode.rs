//! rates::decode — interpret a flat parameter vector through a layout.
//!
//! Purpose
//! -------
//! Turn `θ` into per-class, per-cluster birth and death rates plus the full
//! mixture-weight vector, and back. Also provides the per-node value that the
//! rate assigner writes onto the tree.
//!
//! Key behaviors
//! -------------
//! - `λ[L][k]` is 0 for the fixed cluster, otherwise read from the λ region.
//! - `μ[L][k]` mirrors `λ[0][k]` for the background class under
//!   `eq_background`, is 0 for the fixed cluster, otherwise read from the μ
//!   region.
//! - Weights: `K − 1` values from the weights region and an implied last one,
//!   `1 − Σ`. Without a mixture the weight vector is empty.
//! - [`ParameterLayout::encode`] inverts [`ParameterLayout::decode`] exactly.
//!
//! Invariants & assumptions
//! ------------------------
//! - Length mismatches are errors, never truncations.
//! - No feasibility checks happen here; negative values decode unchanged and
//!   are rejected by the objectives.
use crate::rates::{
    errors::{RateError, RateResult},
    layout::ParameterLayout,
};
use ndarray::Array2;

/// Birth and death rate of one branch in one cluster.
///
/// `mu` is `None` in λ-only models; the transition engine then uses `μ = λ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchRates {
    pub lambda: f64,
    pub mu: Option<f64>,
}

/// Rates installed on one tree node. Replaced wholesale on every assignment.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BirthDeathAssignment {
    #[default]
    Unset,
    Scalar(BranchRates),
    /// One entry per mixture cluster.
    Clustered(Vec<BranchRates>),
}

impl BirthDeathAssignment {
    /// Rates per cluster (one entry for `Scalar`, none for `Unset`).
    pub fn clusters(&self) -> &[BranchRates] {
        match self {
            Self::Unset => &[],
            Self::Scalar(rates) => std::slice::from_ref(rates),
            Self::Clustered(rates) => rates,
        }
    }
}

/// Decoded view of a parameter vector.
///
/// - `lambda`: `lambda_classes × columns` (columns = `K`, or 1 without a mixture).
/// - `mu`: same shape over the μ classes, `None` in λ-only models.
/// - `weights`: all `K` mixture weights including the implied last one.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRates {
    pub lambda: Array2<f64>,
    pub mu: Option<Array2<f64>>,
    pub weights: Vec<f64>,
}

impl ParameterLayout {
    /// Decode `theta` into rates and weights.
    ///
    /// # Errors
    /// - [`RateError::ParameterCountMismatch`] if `theta.len() != self.total()`.
    pub fn decode(&self, theta: &[f64]) -> RateResult<DecodedRates> {
        self.check_len(theta.len())?;
        let columns = self.cluster_columns();

        let lambda = Array2::from_shape_fn((self.lambda_classes, columns), |(class, k)| {
            self.lambda_index(class, k).map_or(0.0, |i| theta[i])
        });
        let mu = self.has_mu().then(|| {
            Array2::from_shape_fn((self.mu_classes, columns), |(class, k)| {
                if self.model.eq_background && class == 0 {
                    lambda[[0, k]]
                } else {
                    self.mu_index(class, k).map_or(0.0, |i| theta[i])
                }
            })
        });

        let mut weights = Vec::new();
        if self.model.has_mixture() {
            weights.extend_from_slice(&theta[self.weights_region()]);
            let implied = 1.0 - weights.iter().sum::<f64>();
            weights.push(implied);
        }
        Ok(DecodedRates { lambda, mu, weights })
    }

    /// Write `decoded` back into a flat vector.
    ///
    /// Values that the layout does not store (fixed cluster, mirrored
    /// background μ, implied last weight) are ignored.
    ///
    /// # Errors
    /// - [`RateError::ClassCountMismatch`] if the tables have the wrong number
    ///   of classes or columns.
    /// - [`RateError::RegionCountMismatch`] if the weight vector has the wrong
    ///   length.
    pub fn encode(&self, decoded: &DecodedRates) -> RateResult<Vec<f64>> {
        let columns = self.cluster_columns();
        check_table(&decoded.lambda, self.lambda_classes, columns)?;
        let mut theta = vec![0.0; self.total()];
        for class in 0..self.lambda_classes {
            for k in 0..columns {
                if let Some(i) = self.lambda_index(class, k) {
                    theta[i] = decoded.lambda[[class, k]];
                }
            }
        }
        if let Some(mu) = decoded.mu.as_ref().filter(|_| self.has_mu()) {
            check_table(mu, self.mu_classes, columns)?;
            for class in 0..self.mu_classes {
                for k in 0..columns {
                    if let Some(i) = self.mu_index(class, k) {
                        theta[i] = mu[[class, k]];
                    }
                }
            }
        }
        if self.model.has_mixture() {
            let required = self.model.clusters;
            if decoded.weights.len() != required {
                return Err(RateError::RegionCountMismatch {
                    region: "weight",
                    supplied: decoded.weights.len(),
                    required,
                });
            }
            let region = self.weights_region();
            theta[region.clone()].copy_from_slice(&decoded.weights[..region.len()]);
        }
        Ok(theta)
    }

    /// Assemble a vector from user-supplied region values.
    ///
    /// `mus` and `weights` may be empty when the layout has no such region.
    ///
    /// # Errors
    /// - [`RateError::RegionCountMismatch`] naming the region, the supplied
    ///   count and the required count.
    pub fn compose(&self, lambdas: &[f64], mus: &[f64], weights: &[f64]) -> RateResult<Vec<f64>> {
        let regions = [
            ("lambda", lambdas, self.lambda_region().len()),
            ("mu", mus, self.mu_region().len()),
            ("weight", weights, self.weights_region().len()),
        ];
        let mut theta = Vec::with_capacity(self.total());
        for (region, values, required) in regions {
            if values.len() != required {
                return Err(RateError::RegionCountMismatch {
                    region,
                    supplied: values.len(),
                    required,
                });
            }
            theta.extend_from_slice(values);
        }
        Ok(theta)
    }

    /// Assignment for a node of rate class `class`.
    ///
    /// # Errors
    /// - [`RateError::ClassCountMismatch`] if `class` is outside the layout.
    pub fn node_assignment(
        &self, decoded: &DecodedRates, class: usize,
    ) -> RateResult<BirthDeathAssignment> {
        if class >= decoded.lambda.nrows() {
            return Err(RateError::ClassCountMismatch {
                expected: decoded.lambda.nrows(),
                found: class + 1,
            });
        }
        let rates_at = |k: usize| BranchRates {
            lambda: decoded.lambda[[class, k]],
            mu: decoded.mu.as_ref().map(|mu| mu[[class, k]]),
        };
        Ok(if self.model.has_mixture() {
            BirthDeathAssignment::Clustered((0..self.model.clusters).map(rates_at).collect())
        } else {
            BirthDeathAssignment::Scalar(rates_at(0))
        })
    }

    fn check_len(&self, supplied: usize) -> RateResult<()> {
        let required = self.total();
        if supplied != required {
            return Err(RateError::ParameterCountMismatch { supplied, required });
        }
        Ok(())
    }
}

fn check_table(table: &Array2<f64>, classes: usize, columns: usize) -> RateResult<()> {
    if table.nrows() != classes || table.ncols() != columns {
        return Err(RateError::ClassCountMismatch { expected: classes, found: table.nrows() });
    }
    Ok(())
}
