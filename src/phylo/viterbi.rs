//! phylo::viterbi — most probable ancestral family sizes.
//!
//! Max-product version of the pruning pass: every node keeps, for each parent
//! size, the best child size, then the best root size (and, for mixtures, the
//! best cluster) is traced back down the tree. Internal nodes and unobserved
//! leaves receive the reconstructed size in `family_size`; observed leaves keep
//! their data.
use crate::phylo::{
    errors::PhyloResult, likelihood::cluster_count, likelihood::leaf_vector, tree::PhyloTree,
};
use ndarray::Array1;

/// Outcome of one reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconstruction {
    /// Rate cluster explaining the family best (0 without a mixture).
    pub cluster: usize,
    pub root_size: usize,
    /// Joint probability of the reconstructed sizes and the data.
    pub probability: f64,
}

struct MaxProduct {
    values: Vec<Array1<f64>>,
    /// `back[v][s]`: best size of `v` given size `s` at its parent.
    back: Vec<Vec<usize>>,
}

fn max_product(tree: &PhyloTree, cluster: usize, width: usize) -> MaxProduct {
    let n = tree.len();
    let mut values: Vec<Array1<f64>> = Vec::with_capacity(n);
    let mut back: Vec<Vec<usize>> = vec![Vec::new(); n];
    for node in tree.nodes() {
        let value = if node.is_leaf() {
            leaf_vector(node.family_size, width)
        } else {
            let mut value = Array1::ones(width);
            for &child in &node.children {
                let p = &tree.node(child).transitions[cluster];
                let below = &values[child];
                let mut choice = vec![0; width];
                for s in 0..width {
                    let (best_c, best_v) = (0..width)
                        .map(|c| (c, p[[s, c]] * below[c]))
                        .fold((0, f64::NEG_INFINITY), |acc, x| if x.1 > acc.1 { x } else { acc });
                    choice[s] = best_c;
                    value[s] *= best_v;
                }
                back[child] = choice;
            }
            value
        };
        values.push(value);
    }
    MaxProduct { values, back }
}

/// Reconstruct the family currently on the leaves.
///
/// `weights` are the mixture weights (`[1.0]` without a mixture).
///
/// # Errors
/// Propagates [`cluster_count`] failures (missing or inconsistent transitions).
pub fn reconstruct(tree: &mut PhyloTree, weights: &[f64]) -> PhyloResult<Reconstruction> {
    let clusters = cluster_count(tree)?;
    let range = *tree.range();
    let width = range.size_of_factor();
    let root = tree.root();

    let prior = range.root_prior();
    let mut best: Option<(Reconstruction, MaxProduct)> = None;
    for k in 0..clusters {
        let pass = max_product(tree, k, width);
        let weight = weights.get(k).copied().unwrap_or(1.0);
        let candidate = (range.root_min..=range.root_max)
            .map(|s| Reconstruction {
                cluster: k,
                root_size: s,
                probability: weight * prior * pass.values[root][s],
            })
            .fold(None, |acc: Option<Reconstruction>, r| match acc {
                Some(a) if a.probability >= r.probability => Some(a),
                _ => Some(r),
            });
        if let Some(candidate) = candidate {
            if best.as_ref().is_none_or(|(b, _)| candidate.probability > b.probability) {
                best = Some((candidate, pass));
            }
        }
    }
    let Some((result, pass)) = best else {
        return Ok(Reconstruction { cluster: 0, root_size: range.root_min, probability: 0.0 });
    };

    let mut sizes = vec![0usize; tree.len()];
    sizes[root] = result.root_size;
    for v in (0..tree.len()).rev() {
        for &child in &tree.node(v).children {
            sizes[child] = pass.back[child][sizes[v]];
        }
    }
    for (v, node) in tree.nodes_mut().iter_mut().enumerate() {
        if !node.is_leaf() || node.family_size.is_none() {
            node.family_size = Some(sizes[v]);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        phylo::{birthdeath::populate_transitions, family::FamilySizeRange},
        rates::decode::{BirthDeathAssignment, BranchRates},
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Reconstruction of internal and unobserved leaf sizes on small trees.
    // -------------------------------------------------------------------------

    fn tree_with_rates(newick: &str, lambda: f64) -> PhyloTree {
        let mut tree = PhyloTree::from_newick(newick).unwrap();
        tree.set_range(FamilySizeRange::new(15, 1, 8).unwrap());
        for node in tree.nodes_mut() {
            node.birth_death =
                BirthDeathAssignment::Scalar(BranchRates { lambda, mu: Some(lambda) });
        }
        populate_transitions(&mut tree).unwrap();
        tree
    }

    #[test]
    // Purpose
    // -------
    // Agreeing leaves reconstruct the same ancestral size.
    //
    // Given
    // -----
    // - `((A:1,B:1):1,(C:1,D:1):1)` with small rates, all leaves at 4.
    //
    // Expect
    // ------
    // - Every internal node reconstructs to 4.
    fn agreeing_leaves_reconstruct_their_size() {
        // Arrange
        let mut tree = tree_with_rates("((A:1,B:1):1,(C:1,D:1):1);", 0.01);
        for leaf in tree.leaves().collect::<Vec<_>>() {
            tree.node_mut(leaf).family_size = Some(4);
        }

        // Act
        let result = reconstruct(&mut tree, &[1.0]).unwrap();

        // Assert
        assert_eq!(result.root_size, 4);
        for node in tree.nodes() {
            assert_eq!(node.family_size, Some(4));
        }
    }

    #[test]
    // Purpose
    // -------
    // A missing leaf is filled in from its relatives.
    //
    // Given
    // -----
    // - Same tree, leaves A, B, C at 3 and D unobserved.
    //
    // Expect
    // ------
    // - D reconstructs to 3.
    fn missing_leaf_is_predicted() {
        let mut tree = tree_with_rates("((A:1,B:1):1,(C:1,D:1):1);", 0.01);
        for name in ["A", "B", "C"] {
            let leaf = tree.leaf_by_name(name).unwrap();
            tree.node_mut(leaf).family_size = Some(3);
        }

        reconstruct(&mut tree, &[1.0]).unwrap();

        let d = tree.leaf_by_name("D").unwrap();
        assert_eq!(tree.node(d).family_size, Some(3));
    }
}
