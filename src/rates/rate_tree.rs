//! rates::rate_tree — branch rate-class labels overlaid on the species tree.
//!
//! A rate tree is a Newick string with the species tree's shape where each
//! node's label is its rate class, written 1-based (`((1,1)1,2)`). Because
//! both trees are stored in postorder, node `i` of the rate tree labels node
//! `i` of the species tree once the shapes have been checked to agree.
//!
//! The root's label is optional; an unlabelled root uses class 0.
use crate::{
    phylo::tree::PhyloTree,
    rates::errors::{RateError, RateResult},
};

/// Parsed rate-class tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSpecTree {
    tree: PhyloTree,
    /// 0-based class of each node, `None` where unlabelled.
    classes: Vec<Option<usize>>,
    class_count: usize,
}

impl RateSpecTree {
    /// Parse and check a rate tree.
    ///
    /// # Errors
    /// - [`RateError::RateTreeSyntax`] if the Newick string does not parse.
    /// - [`RateError::InvalidClassLabel`] for labels that are not integers ≥ 1.
    /// - [`RateError::UnderSpecified`] if a non-root node has no label.
    /// - [`RateError::NonContiguousClasses`] if labels skip a class, class 1
    ///   included. An unlabelled root does not count as a use of class 1.
    pub fn parse(newick: &str) -> RateResult<Self> {
        let tree = PhyloTree::from_newick(newick)
            .map_err(|e| RateError::RateTreeSyntax { text: e.to_string() })?;
        let mut classes = Vec::with_capacity(tree.len());
        for (index, node) in tree.nodes().iter().enumerate() {
            let class = match node.name.as_deref() {
                None => None,
                Some(label) => match label.parse::<usize>() {
                    Ok(c) if c >= 1 => Some(c - 1),
                    _ => {
                        return Err(RateError::InvalidClassLabel {
                            node: index,
                            label: label.to_string(),
                        });
                    }
                },
            };
            classes.push(class);
        }

        let branches = tree.len() - 1;
        let labelled = classes[..branches].iter().filter(|c| c.is_some()).count();
        if labelled != branches {
            return Err(RateError::UnderSpecified { branches, labelled });
        }

        let class_count = classes.iter().flatten().max().map_or(1, |m| m + 1);
        let mut used = vec![false; class_count];
        for &c in classes.iter().flatten() {
            used[c] = true;
        }
        let any_label = classes.iter().any(Option::is_some);
        if let Some(missing) = used.iter().position(|u| !u).filter(|_| any_label) {
            return Err(RateError::NonContiguousClasses { classes: class_count, missing: missing + 1 });
        }
        Ok(Self { tree, classes, class_count })
    }

    /// Number of distinct rate classes (λ classes of the layout).
    pub fn class_count(&self) -> usize {
        self.class_count
    }

    /// Class of node `node` (0 for an unlabelled root).
    pub fn class_of(&self, node: usize) -> usize {
        self.classes.get(node).copied().flatten().unwrap_or(0)
    }

    /// Check that this rate tree can label `tree`.
    ///
    /// # Errors
    /// - [`RateError::TopologyMismatch`] if node counts or child lists differ.
    /// - [`RateError::UnderSpecified`] if the species tree has more branches
    ///   than this tree labels.
    pub fn validate_against(&self, tree: &PhyloTree) -> RateResult<()> {
        let mismatch =
            RateError::TopologyMismatch { tree_nodes: tree.len(), rate_nodes: self.tree.len() };
        if tree.len() != self.tree.len() {
            return Err(mismatch);
        }
        let same_shape = tree
            .nodes()
            .iter()
            .zip(self.tree.nodes())
            .all(|(a, b)| a.children == b.children);
        if !same_shape {
            return Err(mismatch);
        }
        let branches = tree.len() - 1;
        let labelled = self.classes[..branches].iter().filter(|c| c.is_some()).count();
        if labelled < branches {
            return Err(RateError::UnderSpecified { branches, labelled });
        }
        Ok(())
    }
}
