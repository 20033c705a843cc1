//! search::objective — the rate log-likelihood seen by the optimizer.
//!
//! Purpose
//! -------
//! Score a rate vector `θ` against a family table: install `θ` on a private
//! copy of the species tree, recompute transition matrices, and sum the log
//! mixture likelihood of every family.
//!
//! Key behaviors
//! -------------
//! - Negative rates or weights, and a negative implied last weight, score
//!   `-∞` without touching the tree.
//! - A family with zero likelihood makes the whole vector `-∞`.
//! - Structural failures (bad rate tree, missing branch lengths) surface as
//!   [`OptError::Objective`] and abort the search.
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective owns its tree; the analysis context's tree is only updated
//!   once the search has picked a winner.
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        multistart::StartSampler,
        simplex_optimizer::{LogLikelihood, Theta},
    },
    phylo::{
        birthdeath::populate_transitions,
        errors::PhyloResult,
        family::{FamilyDataset, LeafMap},
        likelihood::{PruningLikelihood, TreeLikelihood, cluster_likelihoods},
        tree::PhyloTree,
    },
    rates::{assign::MixtureState, assign_rates, layout::ParameterLayout, rate_tree::RateSpecTree},
};
use rand::Rng;
use std::{cell::RefCell, fmt::Display};

/// Sum of `ln Σ_k w_k L_k(family)` over every family in `data`.
///
/// `on_family` sees each family's per-cluster likelihoods (used for posterior
/// membership updates). Returns `-∞` as soon as one family has zero likelihood.
///
/// # Errors
/// Propagates likelihood failures (missing transitions, bad family index).
pub fn family_log_likelihood(
    tree: &mut PhyloTree, data: &FamilyDataset, map: &LeafMap, weights: &[f64],
    mut on_family: impl FnMut(usize, &[f64]),
) -> PhyloResult<f64> {
    let range = *tree.range();
    let mut total = 0.0;
    for index in 0..data.len() {
        data.set_leaves(index, tree, map)?;
        let root = PruningLikelihood.root_likelihoods(tree)?;
        let per_cluster = cluster_likelihoods(&root, &range);
        on_family(index, &per_cluster);
        let likelihood: f64 = per_cluster.iter().zip(weights).map(|(l, w)| l * w).sum();
        if likelihood <= 0.0 || likelihood.is_nan() {
            return Ok(f64::NEG_INFINITY);
        }
        total += likelihood.ln();
    }
    Ok(total)
}

/// True when every rate and weight is non-negative and the implied weight is too.
pub fn rates_feasible(layout: &ParameterLayout, theta: &[f64]) -> bool {
    if theta.len() != layout.total() || theta.iter().any(|v| *v < 0.0 || v.is_nan()) {
        return false;
    }
    let weight_sum: f64 = theta[layout.weights_region()].iter().sum();
    !layout.model.has_mixture() || weight_sum <= 1.0
}

/// Rate log-likelihood over a private tree copy.
#[derive(Debug)]
pub struct RateObjective<'a> {
    tree: RefCell<PhyloTree>,
    rate_tree: Option<&'a RateSpecTree>,
    layout: ParameterLayout,
    leaf_map: LeafMap,
    mixture: RefCell<MixtureState>,
}

impl<'a> RateObjective<'a> {
    pub fn new(
        tree: PhyloTree, rate_tree: Option<&'a RateSpecTree>, layout: ParameterLayout,
        leaf_map: LeafMap,
    ) -> Self {
        Self {
            tree: RefCell::new(tree),
            rate_tree,
            layout,
            leaf_map,
            mixture: RefCell::new(MixtureState::default()),
        }
    }
}

fn objective_error(err: impl Display) -> OptError {
    OptError::Objective { text: err.to_string() }
}

impl LogLikelihood for RateObjective<'_> {
    type Data = FamilyDataset;

    fn value(&self, theta: &Theta, data: &FamilyDataset) -> OptResult<f64> {
        let theta = theta.to_vec();
        if !rates_feasible(&self.layout, &theta) {
            return Ok(f64::NEG_INFINITY);
        }
        let mut tree = self.tree.borrow_mut();
        let mut mixture = self.mixture.borrow_mut();
        assign_rates(&mut tree, self.rate_tree, &self.layout, &theta, data.len(), &mut mixture)
            .map_err(objective_error)?;
        populate_transitions(&mut tree).map_err(objective_error)?;
        let weights = mixture.likelihood_weights();
        let log_lik = family_log_likelihood(&mut tree, data, &self.leaf_map, &weights, |_, _| {})
            .map_err(objective_error)?;
        tracing::trace!(log_lik, "rate objective evaluated");
        Ok(log_lik)
    }

    fn check(&self, theta: &Theta, data: &FamilyDataset) -> OptResult<()> {
        if theta.len() != self.layout.total() {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.layout.total(),
                actual: theta.len(),
            });
        }
        if data.is_empty() {
            return Err(OptError::Objective { text: "no families to score".into() });
        }
        Ok(())
    }
}

/// Random rate starts: rates `U(0,1) / longest branch`, weights `1/K`.
#[derive(Debug, Clone, Copy)]
pub struct RateStart {
    pub layout: ParameterLayout,
    pub max_branch_length: f64,
}

impl StartSampler for RateStart {
    fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Theta {
        let scale = if self.max_branch_length > 0.0 { 1.0 / self.max_branch_length } else { 1.0 };
        let weights = self.layout.weights_region();
        let uniform_weight = 1.0 / self.layout.model.clusters.max(1) as f64;
        Theta::from_shape_fn(self.layout.total(), |i| {
            if weights.contains(&i) { uniform_weight } else { rng.random::<f64>() * scale }
        })
    }
}
