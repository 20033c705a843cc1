//! phylo::likelihood — postorder pruning over family sizes.
//!
//! Purpose
//! -------
//! Turn the family currently placed on the tree leaves into conditional
//! likelihoods `L_v(s) = P(data below v | size s at v)` for every node, one pass
//! per rate cluster, and expose the root array that family likelihoods are
//! built from.
//!
//! Key behaviors
//! -------------
//! - Leaves: indicator of the observed size; unobserved leaves are all ones.
//! - Internal nodes: `L_v(s) = Π_children Σ_c P_child(s→c) · L_child(c)`.
//! - Results are written into each node's buffers (`likelihoods` for
//!   single-rate trees, row `k` of `k_likelihoods` for mixtures), replacing
//!   whatever the previous family left there.
//!
//! Invariants & assumptions
//! ------------------------
//! - Transition matrices are current (`birthdeath::populate_transitions` ran
//!   after the last rate assignment).
use crate::phylo::{
    errors::{PhyloError, PhyloResult},
    family::FamilySizeRange,
    tree::PhyloTree,
};
use ndarray::{Array1, Array2};

/// Likelihood engine seam used by rate objectives and reconstruction.
pub trait TreeLikelihood {
    /// Root conditional likelihoods, one row per rate cluster.
    fn root_likelihoods(&self, tree: &mut PhyloTree) -> PhyloResult<Array2<f64>>;
}

/// Felsenstein-style pruning over family sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PruningLikelihood;

impl TreeLikelihood for PruningLikelihood {
    fn root_likelihoods(&self, tree: &mut PhyloTree) -> PhyloResult<Array2<f64>> {
        let clusters = cluster_count(tree)?;
        let width = tree.range().size_of_factor();
        let root = tree.root();
        let mut root_lik = Array2::zeros((clusters, width));
        for k in 0..clusters {
            let conditionals = conditional_likelihoods(tree, k, width);
            root_lik.row_mut(k).assign(&conditionals[root]);
            for (node, lik) in tree.nodes_mut().iter_mut().zip(conditionals) {
                match node.k_likelihoods.as_mut() {
                    Some(buffer) => buffer.row_mut(k).assign(&lik),
                    None => node.likelihoods = lik,
                }
            }
        }
        Ok(root_lik)
    }
}

/// Number of rate clusters carried by the tree's transition matrices.
///
/// # Errors
/// - [`PhyloError::TransitionsMissing`] if a non-root node has no matrices.
/// - [`PhyloError::ClusterCountMismatch`] if nodes disagree.
pub fn cluster_count(tree: &PhyloTree) -> PhyloResult<usize> {
    let mut expected = None;
    for (index, node) in tree.nodes().iter().enumerate() {
        if tree.is_root(index) {
            continue;
        }
        let found = node.transitions.len();
        if found == 0 {
            return Err(PhyloError::TransitionsMissing { node: index });
        }
        match expected {
            None => expected = Some(found),
            Some(e) if e != found => {
                return Err(PhyloError::ClusterCountMismatch { node: index, expected: e, found });
            }
            Some(_) => {}
        }
    }
    // A single-node tree has no branches; it behaves as one cluster.
    Ok(expected.unwrap_or(1))
}

/// Leaf vector for an observed (or missing) size.
pub(crate) fn leaf_vector(size: Option<usize>, width: usize) -> Array1<f64> {
    match size {
        Some(c) => {
            let mut v = Array1::zeros(width);
            if c < width {
                v[c] = 1.0;
            }
            v
        }
        None => Array1::ones(width),
    }
}

fn conditional_likelihoods(tree: &PhyloTree, cluster: usize, width: usize) -> Vec<Array1<f64>> {
    let mut out: Vec<Array1<f64>> = Vec::with_capacity(tree.len());
    for node in tree.nodes() {
        let lik = if node.is_leaf() {
            leaf_vector(node.family_size, width)
        } else {
            let mut lik = Array1::ones(width);
            for &child in &node.children {
                let p = &tree.node(child).transitions[cluster];
                lik *= &p.dot(&out[child]);
            }
            lik
        };
        out.push(lik);
    }
    out
}

/// Per-cluster family likelihoods `Σ_s prior(s) · L_root,k(s)` over the root range.
pub fn cluster_likelihoods(root: &Array2<f64>, range: &FamilySizeRange) -> Vec<f64> {
    let prior = range.root_prior();
    root.rows()
        .into_iter()
        .map(|row| (range.root_min..=range.root_max).map(|s| prior * row[s]).sum::<f64>())
        .collect()
}

/// Mixture likelihood `Σ_k w_k · L_k` of the family on the leaves.
pub fn family_likelihood(root: &Array2<f64>, weights: &[f64], range: &FamilySizeRange) -> f64 {
    cluster_likelihoods(root, range).iter().zip(weights).map(|(l, w)| l * w).sum()
}
