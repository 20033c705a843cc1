//! rates::assign — install a parameter vector onto the species tree.
//!
//! Purpose
//! -------
//! Decode `θ`, give every node the birth/death assignment of its rate class,
//! and reset the per-node state that depends on the previous assignment.
//!
//! Key behaviors
//! -------------
//! - The rate tree (if any) is checked against the species tree before any
//!   node is touched; a failed check leaves the tree unchanged.
//! - Every node's assignment is replaced, never merged.
//! - Transition matrices are dropped (they belong to the old rates) and
//!   likelihood buffers are freshly allocated for the current cluster count.
//! - Mixture weights are stored on the [`MixtureState`]; on first use each
//!   family's membership prior is the weight vector.
//!
//! Downstream usage
//! ----------------
//! - Callers run `phylo::birthdeath::populate_transitions` next, then the
//!   likelihood or reconstruction passes.
use crate::{
    phylo::tree::PhyloTree,
    rates::{
        decode::DecodedRates,
        errors::{RateError, RateResult},
        layout::ParameterLayout,
        rate_tree::RateSpecTree,
    },
};
use ndarray::{Array1, Array2};

/// Mixture weights and per-family cluster memberships.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixtureState {
    /// All `K` weights (empty without a mixture).
    pub weights: Vec<f64>,
    /// `families × K` membership probabilities.
    pub memberships: Option<Array2<f64>>,
}

impl MixtureState {
    /// Weights to combine per-cluster likelihoods with (`[1.0]` without a mixture).
    pub fn likelihood_weights(&self) -> Vec<f64> {
        if self.weights.is_empty() { vec![1.0] } else { self.weights.clone() }
    }

    /// Replace family `family`'s memberships by its posterior cluster probabilities.
    ///
    /// Posterior `∝ w_k · L_k`; a family with zero total likelihood keeps its prior.
    pub fn update_posterior(&mut self, family: usize, cluster_likelihoods: &[f64]) {
        let Some(memberships) = self.memberships.as_mut() else {
            return;
        };
        if family >= memberships.nrows() || cluster_likelihoods.len() != memberships.ncols() {
            return;
        }
        let joint: Vec<f64> =
            self.weights.iter().zip(cluster_likelihoods).map(|(w, l)| w * l).collect();
        let total: f64 = joint.iter().sum();
        if total > 0.0 && total.is_finite() {
            memberships.row_mut(family).assign(&Array1::from_iter(joint.iter().map(|j| j / total)));
        }
    }
}

/// Decode `theta` and install it on every node of `tree`.
///
/// # Errors
/// - [`RateError::TopologyMismatch`] / [`RateError::UnderSpecified`] from the
///   rate-tree check.
/// - [`RateError::ClassCountMismatch`] if the rate tree defines a different
///   number of classes than `layout`.
/// - [`RateError::ParameterCountMismatch`] if `theta` has the wrong length.
pub fn assign_rates(
    tree: &mut PhyloTree, rate_tree: Option<&RateSpecTree>, layout: &ParameterLayout,
    theta: &[f64], n_families: usize, mixture: &mut MixtureState,
) -> RateResult<DecodedRates> {
    if let Some(rate_tree) = rate_tree {
        rate_tree.validate_against(tree)?;
        if rate_tree.class_count() != layout.lambda_classes {
            return Err(RateError::ClassCountMismatch {
                expected: layout.lambda_classes,
                found: rate_tree.class_count(),
            });
        }
    }
    let decoded = layout.decode(theta)?;

    let assignments = (0..tree.len())
        .map(|index| {
            let class = rate_tree.map_or(0, |r| r.class_of(index));
            layout.node_assignment(&decoded, class)
        })
        .collect::<RateResult<Vec<_>>>()?;

    let width = tree.range().size_of_factor();
    let clusters = layout.model.clusters;
    for (node, assignment) in tree.nodes_mut().iter_mut().zip(assignments) {
        node.birth_death = assignment;
        node.transitions.clear();
        node.likelihoods = Array1::zeros(width);
        node.k_likelihoods = (clusters > 0).then(|| Array2::zeros((clusters, width)));
    }

    mixture.weights = decoded.weights.clone();
    if clusters > 0 {
        let stale = mixture
            .memberships
            .as_ref()
            .is_none_or(|m| m.nrows() != n_families || m.ncols() != clusters);
        if stale {
            let prior = Array1::from(decoded.weights.clone());
            let mut memberships = Array2::zeros((n_families, clusters));
            for mut row in memberships.rows_mut() {
                row.assign(&prior);
            }
            mixture.memberships = Some(memberships);
        }
    } else {
        mixture.memberships = None;
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{
        decode::{BirthDeathAssignment, BranchRates},
        layout::{MuClasses, RateModel},
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Wholesale replacement of node state, buffer sizing by cluster count,
    // membership initialization, and rejection before mutation.
    // -------------------------------------------------------------------------

    const SPECIES: &str = "((A:1,B:1):1,(C:1,D:1):1);";

    #[test]
    // Purpose
    // -------
    // A second assignment replaces the first on every node.
    //
    // Given
    // -----
    // - Single λ layout; θ = [0.01] then θ = [0.02].
    //
    // Expect
    // ------
    // - Every node ends with `Scalar { λ: 0.02, μ: None }` and no transitions.
    fn reassignment_replaces_previous_rates() {
        // Arrange
        let mut tree = PhyloTree::from_newick(SPECIES).unwrap();
        let layout =
            ParameterLayout::new(RateModel::lambda_only(), 1, MuClasses::Absent, false).unwrap();
        let mut mixture = MixtureState::default();

        // Act
        assign_rates(&mut tree, None, &layout, &[0.01], 3, &mut mixture).unwrap();
        assign_rates(&mut tree, None, &layout, &[0.02], 3, &mut mixture).unwrap();

        // Assert
        let expected = BirthDeathAssignment::Scalar(BranchRates { lambda: 0.02, mu: None });
        for node in tree.nodes() {
            assert_eq!(node.birth_death, expected);
            assert!(node.transitions.is_empty());
            assert!(node.k_likelihoods.is_none());
        }
        assert!(mixture.memberships.is_none());
        assert_eq!(mixture.likelihood_weights(), vec![1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Mixtures get K-row buffers and prior memberships from the weights.
    //
    // Given
    // -----
    // - K = 2, λ-only, θ = [0.1, 0.2, 0.3] (two λ values, one free weight).
    //
    // Expect
    // ------
    // - `k_likelihoods` is 2 × width on every node.
    // - Memberships are 4 rows of [0.3, 0.7].
    fn mixture_allocates_cluster_buffers_and_priors() {
        let mut tree = PhyloTree::from_newick(SPECIES).unwrap();
        let width = tree.range().size_of_factor();
        let layout = ParameterLayout::new(
            RateModel::lambda_only().with_clusters(2, false),
            1,
            MuClasses::Absent,
            false,
        )
        .unwrap();
        let mut mixture = MixtureState::default();

        assign_rates(&mut tree, None, &layout, &[0.1, 0.2, 0.3], 4, &mut mixture).unwrap();

        for node in tree.nodes() {
            assert_eq!(node.k_likelihoods.as_ref().map(|k| k.dim()), Some((2, width)));
            assert_eq!(node.birth_death.clusters().len(), 2);
        }
        let memberships = mixture.memberships.as_ref().unwrap();
        assert_eq!(memberships.dim(), (4, 2));
        for row in memberships.rows() {
            assert!((row[0] - 0.3).abs() < 1e-12 && (row[1] - 0.7).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Branch classes come from the rate tree.
    fn rate_tree_selects_branch_class() {
        let mut tree = PhyloTree::from_newick(SPECIES).unwrap();
        let rate_tree = RateSpecTree::parse("((1,1)1,(2,2)1)").unwrap();
        let layout =
            ParameterLayout::new(RateModel::lambda_only(), 2, MuClasses::Absent, true).unwrap();
        let mut mixture = MixtureState::default();

        assign_rates(&mut tree, Some(&rate_tree), &layout, &[0.1, 0.5], 1, &mut mixture).unwrap();

        let c = tree.leaf_by_name("C").unwrap();
        let a = tree.leaf_by_name("A").unwrap();
        assert_eq!(tree.node(c).birth_death.clusters()[0].lambda, 0.5);
        assert_eq!(tree.node(a).birth_death.clusters()[0].lambda, 0.1);
    }

    #[test]
    // Purpose
    // -------
    // A mismatched rate tree aborts before any node is modified.
    fn topology_mismatch_leaves_tree_untouched() {
        let mut tree = PhyloTree::from_newick(SPECIES).unwrap();
        let before = tree.clone();
        let rate_tree = RateSpecTree::parse("((1,1)1,1)").unwrap();
        let layout =
            ParameterLayout::new(RateModel::lambda_only(), 1, MuClasses::Absent, true).unwrap();
        let mut mixture = MixtureState::default();

        let err =
            assign_rates(&mut tree, Some(&rate_tree), &layout, &[0.1], 1, &mut mixture).unwrap_err();

        assert_eq!(err, RateError::TopologyMismatch { tree_nodes: 7, rate_nodes: 5 });
        assert_eq!(tree, before);
    }

    #[test]
    // Purpose
    // -------
    // Posterior memberships are proportional to weight × likelihood.
    fn update_posterior_normalizes() {
        let mut mixture = MixtureState {
            weights: vec![0.5, 0.5],
            memberships: Some(Array2::from_elem((1, 2), 0.5)),
        };

        mixture.update_posterior(0, &[1.0, 3.0]);

        let row = mixture.memberships.unwrap().row(0).to_vec();
        assert!((row[0] - 0.25).abs() < 1e-12);
        assert!((row[1] - 0.75).abs() < 1e-12);
    }
}
