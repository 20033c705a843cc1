//! rates::layout — closed-form layout of the flat rate parameter vector.
//!
//! Purpose
//! -------
//! Map a rate-model description (which rates are estimated, how many rate
//! classes the branches fall into, how many mixture clusters families fall
//! into, and two sharing switches) to the length and region offsets of the
//! flat vector the optimizer works on.
//!
//! Key behaviors
//! -------------
//! - Regions are laid out contiguously: λ, then μ, then mixture weights.
//! - With `K > 0` clusters each rate class owns `K − fix_cluster0` slots;
//!   without clusters it owns one.
//! - With `eq_background`, the first (background) μ class is not estimated;
//!   it mirrors the first λ class.
//! - `K − 1` weights are free; the last one is implied.
//!
//! Invariants & assumptions
//! ------------------------
//! - Offsets are computed once in [`ParameterLayout::new`]; inconsistent mode
//!   combinations never produce a layout.
//!
//! Downstream usage
//! ----------------
//! - `rates::decode` interprets vectors through a layout.
//! - Rate searches size their start vectors with [`ParameterLayout::total`].
use crate::rates::errors::{RateError, RateResult};
use std::ops::Range;

/// Which rates are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateKind {
    /// Birth rates only; death equals birth on every branch.
    Lambda,
    /// Separate birth and death rates.
    LambdaMu,
}

/// How many death-rate classes a λ/μ layout uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuClasses {
    /// No death-rate parameters.
    Absent,
    /// Not specified yet: one μ class per λ class.
    SameAsLambda,
    Explicit(usize),
}

/// Rate-model switches.
///
/// - `clusters`: number of mixture clusters `K` (0 = no mixture).
/// - `fix_cluster0`: cluster 0 has rates fixed at zero and is not estimated.
/// - `eq_background`: the background class's μ equals its λ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateModel {
    pub kind: RateKind,
    pub clusters: usize,
    pub fix_cluster0: bool,
    pub eq_background: bool,
}

impl RateModel {
    pub fn lambda_only() -> Self {
        Self { kind: RateKind::Lambda, clusters: 0, fix_cluster0: false, eq_background: false }
    }

    pub fn lambda_mu() -> Self {
        Self { kind: RateKind::LambdaMu, ..Self::lambda_only() }
    }

    pub fn with_clusters(self, clusters: usize, fix_cluster0: bool) -> Self {
        Self { clusters, fix_cluster0, ..self }
    }

    pub fn with_eq_background(self, eq_background: bool) -> Self {
        Self { eq_background, ..self }
    }

    pub fn has_mixture(&self) -> bool {
        self.clusters > 0
    }
}

impl Default for RateModel {
    fn default() -> Self {
        Self::lambda_only()
    }
}

/// Region sizes and offsets of a rate parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLayout {
    pub model: RateModel,
    pub lambda_classes: usize,
    /// μ classes including a mirrored background class (0 for λ-only).
    pub mu_classes: usize,
    /// Estimated values per class and rate (`K − fix` or 1).
    pub slots_per_class: usize,
    pub has_rate_tree: bool,
    lambda_len: usize,
    mu_offset: usize,
    mu_len: usize,
    weights_offset: usize,
    weights_len: usize,
}

impl ParameterLayout {
    /// Compute the layout for `model` over `lambda_classes` branch classes.
    ///
    /// # Errors
    /// - [`RateError::NoRateClasses`] if `lambda_classes == 0`.
    /// - [`RateError::FixClusterWithoutMixture`] if `fix_cluster0` is set with
    ///   fewer than two clusters.
    /// - [`RateError::EqualBackgroundWithoutTree`] /
    ///   [`RateError::EqualBackgroundWithoutMu`] for `eq_background` without a
    ///   rate tree or without μ parameters.
    /// - [`RateError::MuClassMismatch`] if an explicit μ class count differs
    ///   from the λ class count.
    pub fn new(
        model: RateModel, lambda_classes: usize, mu: MuClasses, has_rate_tree: bool,
    ) -> RateResult<Self> {
        if lambda_classes == 0 {
            return Err(RateError::NoRateClasses);
        }
        if model.fix_cluster0 && model.clusters < 2 {
            return Err(RateError::FixClusterWithoutMixture { clusters: model.clusters });
        }
        if model.eq_background && !has_rate_tree {
            return Err(RateError::EqualBackgroundWithoutTree);
        }
        let mu_classes = match (model.kind, mu) {
            (RateKind::Lambda, _) => 0,
            (RateKind::LambdaMu, MuClasses::Absent | MuClasses::SameAsLambda) => lambda_classes,
            (RateKind::LambdaMu, MuClasses::Explicit(n)) if n == lambda_classes => n,
            (RateKind::LambdaMu, MuClasses::Explicit(n)) => {
                return Err(RateError::MuClassMismatch { mu: n, lambda: lambda_classes });
            }
        };
        if model.eq_background && mu_classes == 0 {
            return Err(RateError::EqualBackgroundWithoutMu);
        }

        let slots_per_class = if model.has_mixture() {
            model.clusters - usize::from(model.fix_cluster0)
        } else {
            1
        };
        let lambda_len = lambda_classes * slots_per_class;
        let estimated_mu = mu_classes.saturating_sub(usize::from(model.eq_background));
        let mu_len = estimated_mu * slots_per_class;
        let weights_len = model.clusters.saturating_sub(1);
        Ok(Self {
            model,
            lambda_classes,
            mu_classes,
            slots_per_class,
            has_rate_tree,
            lambda_len,
            mu_offset: lambda_len,
            mu_len,
            weights_offset: lambda_len + mu_len,
            weights_len,
        })
    }

    /// Total number of free parameters.
    pub fn total(&self) -> usize {
        self.lambda_len + self.mu_len + self.weights_len
    }

    pub fn lambda_region(&self) -> Range<usize> {
        0..self.lambda_len
    }

    pub fn mu_region(&self) -> Range<usize> {
        self.mu_offset..self.mu_offset + self.mu_len
    }

    pub fn weights_region(&self) -> Range<usize> {
        self.weights_offset..self.weights_offset + self.weights_len
    }

    /// Columns per class in decoded rate tables (`K`, or 1 without a mixture).
    pub fn cluster_columns(&self) -> usize {
        self.model.clusters.max(1)
    }

    pub fn has_mu(&self) -> bool {
        self.mu_classes > 0
    }

    /// Index of class `class`, cluster `k` inside the λ region, if estimated.
    pub(crate) fn lambda_index(&self, class: usize, k: usize) -> Option<usize> {
        let slot = self.slot(k)?;
        Some(class * self.slots_per_class + slot)
    }

    /// Index of class `class`, cluster `k` inside the full vector's μ region, if estimated.
    pub(crate) fn mu_index(&self, class: usize, k: usize) -> Option<usize> {
        let background = usize::from(self.model.eq_background);
        if class < background {
            return None;
        }
        let slot = self.slot(k)?;
        Some(self.mu_offset + (class - background) * self.slots_per_class + slot)
    }

    fn slot(&self, k: usize) -> Option<usize> {
        match (self.model.fix_cluster0, k) {
            (true, 0) => None,
            (true, k) => Some(k - 1),
            (false, k) => Some(k),
        }
    }
}
