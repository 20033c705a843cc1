//! phylo::tree — arena phylogeny with per-node birth/death state.
//!
//! Purpose
//! -------
//! Hold the fixed species tree that rates are fitted on. Nodes live in one
//! `Vec` in postorder (children before parents, root last), so the node list
//! of two trees parsed from isomorphic Newick strings lines up index by index.
//! This is what lets a rate-class tree be overlaid on the species tree.
//!
//! Key behaviors
//! -------------
//! - Parse Newick with optional names and branch lengths on every node.
//! - Carry the per-node state the rate engine rewrites on every
//!   re-parameterization: the birth/death assignment, the per-cluster
//!   transition matrices, conditional-likelihood buffers, and the observed or
//!   reconstructed family size.
//!
//! Invariants & assumptions
//! ------------------------
//! - `nodes.last()` is the root; every other node has exactly one parent.
//! - Likelihood buffers always have length `range.size_of_factor()`.
use crate::{
    phylo::{
        errors::{PhyloError, PhyloResult},
        family::FamilySizeRange,
    },
    rates::decode::BirthDeathAssignment,
};
use ndarray::{Array1, Array2};

/// One node of a [`PhyloTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: Option<String>,
    /// Length of the branch leading to this node.
    pub branch_length: Option<f64>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Observed (leaves) or reconstructed (internal) family size.
    pub family_size: Option<usize>,
    pub birth_death: BirthDeathAssignment,
    /// Transition matrices `P[parent_size, child_size]`, one per rate cluster.
    pub transitions: Vec<Array2<f64>>,
    /// Conditional likelihoods by family size.
    pub likelihoods: Array1<f64>,
    /// Per-cluster conditional likelihoods (`K × sizes`) for mixture models.
    pub k_likelihoods: Option<Array2<f64>>,
}

impl TreeNode {
    fn new(name: Option<String>, branch_length: Option<f64>, children: Vec<usize>) -> Self {
        Self {
            name,
            branch_length,
            parent: None,
            children,
            family_size: None,
            birth_death: BirthDeathAssignment::Unset,
            transitions: Vec::new(),
            likelihoods: Array1::zeros(0),
            k_likelihoods: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Rooted tree stored as a postorder arena.
#[derive(Debug, Clone, PartialEq)]
pub struct PhyloTree {
    nodes: Vec<TreeNode>,
    range: FamilySizeRange,
}

impl PhyloTree {
    /// Parse a Newick string such as `((A:1,B:1):2,C:3);`.
    ///
    /// The trailing `;` is optional. Names may be any run of characters other
    /// than `(),:;` and whitespace; internal nodes may be named too.
    ///
    /// # Errors
    /// - [`PhyloError::NewickSyntax`] for unbalanced parentheses, missing
    ///   separators, or trailing input.
    /// - [`PhyloError::InvalidBranchLength`] if a length does not parse as `f64`.
    pub fn from_newick(text: &str) -> PhyloResult<Self> {
        let raw = NewickParser { bytes: text.as_bytes(), pos: 0 }.parse()?;
        let mut nodes = Vec::new();
        flatten(raw, &mut nodes);
        let mut tree = Self { nodes, range: FamilySizeRange::default() };
        tree.set_range(FamilySizeRange::default());
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [TreeNode] {
        &mut self.nodes
    }

    pub fn node(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: usize) -> &mut TreeNode {
        &mut self.nodes[index]
    }

    /// Index of the root (always the last node).
    pub fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_root(&self, index: usize) -> bool {
        index == self.root()
    }

    /// Leaf indices in postorder.
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().enumerate().filter(|(_, n)| n.is_leaf()).map(|(i, _)| i)
    }

    /// Leaf carrying `name`, if any.
    pub fn leaf_by_name(&self, name: &str) -> Option<usize> {
        self.leaves().find(|&i| self.nodes[i].name.as_deref() == Some(name))
    }

    /// Longest branch in the tree (0 when no lengths are given).
    pub fn max_branch_length(&self) -> f64 {
        self.nodes.iter().filter_map(|n| n.branch_length).fold(0.0, f64::max)
    }

    pub fn range(&self) -> &FamilySizeRange {
        &self.range
    }

    /// Install a new family-size range.
    ///
    /// Reallocates every node's likelihood buffer to the new width and drops
    /// transition matrices computed for the old range.
    pub fn set_range(&mut self, range: FamilySizeRange) {
        let width = range.size_of_factor();
        for node in &mut self.nodes {
            node.likelihoods = Array1::zeros(width);
            node.k_likelihoods =
                node.k_likelihoods.as_ref().map(|k| Array2::zeros((k.nrows(), width)));
            node.transitions.clear();
        }
        self.range = range;
    }

    /// Forget every node's family size.
    pub fn clear_family_sizes(&mut self) {
        for node in &mut self.nodes {
            node.family_size = None;
        }
    }
}

// ---- Newick parsing ----

struct RawNode {
    name: Option<String>,
    length: Option<f64>,
    children: Vec<RawNode>,
}

struct NewickParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl NewickParser<'_> {
    fn parse(mut self) -> PhyloResult<RawNode> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(PhyloError::EmptyTree);
        }
        let root = self.subtree()?;
        self.skip_ws();
        if self.peek() == Some(b';') {
            self.pos += 1;
            self.skip_ws();
        }
        if self.pos != self.bytes.len() {
            return Err(PhyloError::NewickSyntax {
                position: self.pos,
                reason: "unexpected input after the end of the tree",
            });
        }
        Ok(root)
    }

    fn subtree(&mut self) -> PhyloResult<RawNode> {
        self.skip_ws();
        let mut children = Vec::new();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            loop {
                children.push(self.subtree()?);
                self.skip_ws();
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    _ => {
                        return Err(PhyloError::NewickSyntax {
                            position: self.pos,
                            reason: "expected ',' or ')'",
                        });
                    }
                }
            }
        }
        let name = self.label();
        let length = self.branch_length()?;
        Ok(RawNode { name, length, children })
    }

    fn label(&mut self) -> Option<String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b"(),:;".contains(&b) || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        (self.pos > start).then(|| String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn branch_length(&mut self) -> PhyloResult<Option<f64>> {
        self.skip_ws();
        if self.peek() != Some(b':') {
            return Ok(None);
        }
        self.pos += 1;
        self.skip_ws();
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !(b.is_ascii_digit() || b"+-.eE".contains(&b)) {
                break;
            }
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(Some)
            .ok_or(PhyloError::InvalidBranchLength { text, position: start })
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }
}

fn flatten(raw: RawNode, nodes: &mut Vec<TreeNode>) -> usize {
    let RawNode { name, length, children } = raw;
    let child_ids: Vec<usize> = children.into_iter().map(|c| flatten(c, nodes)).collect();
    let id = nodes.len();
    for &c in &child_ids {
        nodes[c].parent = Some(id);
    }
    nodes.push(TreeNode::new(name, length, child_ids));
    id
}
