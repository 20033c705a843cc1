//! rates — parameter space and rate assignment.
//!
//! Purpose
//! -------
//! Own everything between a flat parameter vector and the rates installed on
//! the species tree:
//! - [`layout`]: closed-form region sizes for a rate model,
//! - [`decode`]: vector ↔ per-class, per-cluster rates,
//! - [`rate_tree`]: branch rate classes and their validation,
//! - [`assign`]: installing decoded rates and resetting node state.
//!
//! Conventions
//! -----------
//! - Rate classes are 0-based internally (1-based in rate-tree files).
//! - Cluster 0 is the one `fix_cluster0` pins at zero; class 0 is the
//!   background class `eq_background` refers to.

pub mod assign;
pub mod decode;
pub mod errors;
pub mod layout;
pub mod rate_tree;

pub use self::assign::{MixtureState, assign_rates};
pub use self::decode::{BirthDeathAssignment, BranchRates, DecodedRates};
pub use self::errors::{RateError, RateResult};
pub use self::layout::{MuClasses, ParameterLayout, RateKind, RateModel};
pub use self::rate_tree::RateSpecTree;
