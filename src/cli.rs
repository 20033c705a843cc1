use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(
    name = "genefam",
    version,
    about = "Birth-death rates, misclassification models and cross-validation for gene family sizes"
)]
pub struct Cli {
    /// Append report lines to this file instead of printing them.
    #[arg(long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Seed for the restart generator; omitted means seeded from the OS.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Tree, family table and rate model shared by the rate commands.
#[derive(Debug, Args)]
pub struct ModelArgs {
    /// Species tree: a Newick file, or a Newick string.
    #[arg(short, long, value_name = "NEWICK")]
    pub tree: String,

    /// Tab-delimited family file (`Desc  Family ID  species…`).
    #[arg(short, long, value_name = "FILE")]
    pub family: PathBuf,

    /// Rate-class tree (same topology, 1-based class labels), as a file or string.
    #[arg(long = "rate-tree", value_name = "NEWICK")]
    pub rate_tree: Option<String>,

    /// Number of rate clusters in a mixture (0 for none).
    #[arg(short = 'k', long, default_value_t = 0)]
    pub clusters: usize,

    /// Fix the first cluster's rates at zero.
    #[arg(long = "fix-cluster0")]
    pub fix_cluster0: bool,

    /// Tie the background class's death rate to its birth rate.
    #[arg(long = "eq-background")]
    pub eq_background: bool,

    /// Repeat searches until two runs agree.
    #[arg(long = "check-convergence")]
    pub check_convergence: bool,
}

/// Parameter values, or a request to search for them.
#[derive(Debug, Args)]
pub struct ParamArgs {
    /// Birth rates, one per class and free cluster slot.
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    pub lambda: Vec<f64>,

    /// Death rates, one per class and free cluster slot.
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    pub mu: Vec<f64>,

    /// Free mixture weights (the last weight is implied).
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    pub weights: Vec<f64>,

    /// Fit the rates instead of supplying them.
    #[arg(short, long)]
    pub search: bool,

    /// Fit separate death rates.
    #[arg(long = "with-mu")]
    pub with_mu: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set or search birth and death rates, then report the score.
    Lambdamu {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Report the log-likelihood of the given (or fitted) rates.
    Score {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// k-fold cross-validation over families.
    Cvfamily {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        params: ParamArgs,
        /// Number of folds.
        #[arg(long, default_value_t = 1)]
        fold: usize,
    },
    /// Leave-one-species-out cross-validation.
    Cvspecies {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        params: ParamArgs,
        /// Score this one-species validation file against the current rates
        /// instead of refitting per species.
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Estimate a misclassification model from two measurements.
    Errormodel {
        /// First measurement (the noisy one when `--truth` is set).
        #[arg(value_name = "FIRST")]
        first: PathBuf,

        /// Second measurement (the true counts when `--truth` is set).
        #[arg(value_name = "SECOND")]
        second: PathBuf,

        /// The second file holds true counts.
        #[arg(long)]
        truth: bool,

        /// Mirror the band around the centre.
        #[arg(long)]
        symmetric: bool,

        /// Half-width of the error band.
        #[arg(long = "half-width", default_value_t = 1)]
        half_width: usize,

        /// Require the band to decrease away from the centre.
        #[arg(long = "peak-zero")]
        peak_zero: bool,

        /// Restart limit.
        #[arg(long = "max-restarts", default_value_t = 100)]
        max_restarts: usize,
    },
}
