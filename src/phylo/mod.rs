//! phylo — species tree, family data and the likelihood machinery rates are
//! scored with.
//!
//! Purpose
//! -------
//! Provide the concrete collaborators the rate engine drives: an arena tree
//! with per-node birth/death state ([`tree`]), gene-family tables and the
//! family-size range ([`family`]), closed-form birth–death transition matrices
//! ([`birthdeath`]), postorder pruning ([`likelihood`]) and max-product
//! reconstruction ([`viterbi`]).
//!
//! Conventions
//! -----------
//! - Node indices are postorder positions; the root is last.
//! - Family sizes are `usize`; `None` marks an unobserved or not yet
//!   reconstructed size.
//! - Probabilities are plain `f64` (no log scaling); trees and size ranges are
//!   assumed small enough for that to stay representable.

pub mod birthdeath;
pub mod errors;
pub mod family;
pub mod likelihood;
pub mod tree;
pub mod viterbi;

pub use self::errors::{PhyloError, PhyloResult};
pub use self::family::{FamilyDataset, FamilySizeRange, GeneFamily, LeafMap};
pub use self::likelihood::{PruningLikelihood, TreeLikelihood};
pub use self::tree::{PhyloTree, TreeNode};
