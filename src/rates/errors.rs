use thiserror::Error;

/// Result alias for parameter-space and rate-assignment operations.
pub type RateResult<T> = Result<T, RateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    // ---- Rate tree ----
    #[error("Rate tree is not valid Newick: {text}")]
    RateTreeSyntax { text: String },

    #[error("Rate class label '{label}' on node {node} is not a positive integer")]
    InvalidClassLabel { node: usize, label: String },

    #[error("Rate classes must be numbered 1..={classes} without gaps; class {missing} is unused")]
    NonContiguousClasses { classes: usize, missing: usize },

    #[error(
        "Rate tree has a different topology from the species tree ({rate_nodes} vs {tree_nodes} nodes)"
    )]
    TopologyMismatch { tree_nodes: usize, rate_nodes: usize },

    #[error(
        "Branch rate classes are not fully specified: {labelled} labels for a total of {branches} branches"
    )]
    UnderSpecified { branches: usize, labelled: usize },

    // ---- Layout ----
    #[error("At least one rate class is required")]
    NoRateClasses,

    #[error("Death-rate classes ({mu}) must match birth-rate classes ({lambda})")]
    MuClassMismatch { mu: usize, lambda: usize },

    #[error("Fixing cluster 0 needs at least two clusters, got {clusters}")]
    FixClusterWithoutMixture { clusters: usize },

    #[error("An equal background death rate requires a rate tree")]
    EqualBackgroundWithoutTree,

    #[error("An equal background death rate requires estimating death rates")]
    EqualBackgroundWithoutMu,

    #[error("Rate tree defines {found} classes but the layout was built for {expected}")]
    ClassCountMismatch { expected: usize, found: usize },

    // ---- Parameter vectors ----
    #[error("The number of parameters is {supplied}; the layout needs {required}")]
    ParameterCountMismatch { supplied: usize, required: usize },

    #[error("Got {supplied} {region} values; {required} are required")]
    RegionCountMismatch { region: &'static str, supplied: usize, required: usize },
}
