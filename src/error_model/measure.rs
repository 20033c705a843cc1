//! error_model::measure — paired measurements and their summaries.
//!
//! Two family tables measured on the same families (two noisy readings, or
//! one noisy reading and the truth) are reduced to what the error-model
//! likelihood needs: a smoothed size distribution and a matrix of observed
//! pairs.
//!
//! Missing counts (`NA`, `?`, empty) take part in neither summary.
use crate::{
    error_model::{
        errors::{ErrorModelError, ErrorModelResult},
        matrix::ErrorShape,
    },
    phylo::family::FamilyDataset,
};
use ndarray::{Array1, Array2};
use std::path::Path;

/// How the two tables relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementMode {
    /// Two independent noisy readings; pair order carries no information.
    Double,
    /// A noisy reading (first table) against the true counts (second table).
    Truth,
}

/// Summaries of a pair of measurement tables.
///
/// - `size_dist[s]`: Laplace-smoothed frequency of size `s` over both tables.
/// - `pairs[a, b]`: number of `(first = a, second = b)` observations; for
///   [`MeasurementMode::Double`] folded into the upper triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMeasure {
    pub size_dist: Array1<f64>,
    pub pairs: Array2<f64>,
    pub max_size: usize,
    pub shape: ErrorShape,
    pub mode: MeasurementMode,
}

impl ErrorMeasure {
    /// Read and summarize two measurement files.
    ///
    /// # Errors
    /// - Per-file read errors as [`ErrorModelError::Table`].
    /// - [`ErrorModelError::ColumnCountMismatch`] /
    ///   [`ErrorModelError::LineCountMismatch`] when the tables do not line up.
    /// - Errors of [`ErrorMeasure::from_tables`].
    pub fn from_files(
        first: &Path, second: &Path, mode: MeasurementMode, shape: ErrorShape,
    ) -> ErrorModelResult<Self> {
        let a = FamilyDataset::load(first)?;
        let b = FamilyDataset::load(second)?;
        if a.species.len() != b.species.len() {
            return Err(ErrorModelError::ColumnCountMismatch {
                first: first.to_path_buf(),
                second: second.to_path_buf(),
                first_columns: a.species.len() + 2,
                second_columns: b.species.len() + 2,
            });
        }
        if a.len() != b.len() {
            return Err(ErrorModelError::LineCountMismatch {
                first: first.to_path_buf(),
                second: second.to_path_buf(),
                first_lines: a.len(),
                second_lines: b.len(),
            });
        }
        Self::from_tables(&a, &b, mode, shape)
    }

    /// Summarize two tables already in memory (same families, same columns).
    ///
    /// # Errors
    /// - [`ErrorModelError::FamilyIdMismatch`] if row IDs differ.
    /// - [`ErrorModelError::NoObservations`] if no cell is observed in both.
    /// - [`ErrorModelError::BandTooWide`] if the band covers every size.
    pub fn from_tables(
        first: &FamilyDataset, second: &FamilyDataset, mode: MeasurementMode, shape: ErrorShape,
    ) -> ErrorModelResult<Self> {
        for (line, (a, b)) in first.families.iter().zip(&second.families).enumerate() {
            if a.id != b.id {
                return Err(ErrorModelError::FamilyIdMismatch {
                    line: line + 2,
                    first: a.id.clone(),
                    second: b.id.clone(),
                });
            }
        }

        let max_size = first.max_size().max(second.max_size());
        shape.check_fits(max_size)?;

        let mut freq = Array1::<f64>::ones(max_size + 1);
        for family in first.families.iter().chain(&second.families) {
            for &size in family.counts.iter().flatten() {
                freq[size] += 1.0;
            }
        }
        let total = freq.sum();
        let size_dist = freq / total;

        let mut pairs = Array2::<f64>::zeros((max_size + 1, max_size + 1));
        for (a, b) in first.families.iter().zip(&second.families) {
            for (x, y) in a.counts.iter().zip(&b.counts) {
                if let (Some(x), Some(y)) = (x, y) {
                    pairs[[*x, *y]] += 1.0;
                }
            }
        }
        if pairs.sum() == 0.0 {
            return Err(ErrorModelError::NoObservations);
        }
        if mode == MeasurementMode::Double {
            for i in 0..=max_size {
                for j in 0..i {
                    pairs[[j, i]] += pairs[[i, j]];
                    pairs[[i, j]] = 0.0;
                }
            }
        }
        Ok(Self { size_dist, pairs, max_size, shape, mode })
    }
}
