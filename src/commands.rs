//! commands — glue from parsed CLI arguments to the library operations.
use crate::{
    cli::{Cli, Command, ModelArgs, ParamArgs},
    crossval::{cross_validate_by_family, cross_validate_by_species, validate_species_file},
    error_model::{
        ErrorModelOptions, ErrorShape,
        estimate::{ERROR_MODEL_TOL, ERROR_MODEL_TOL_CONVERGE},
        estimate_error_double_measure, estimate_error_true_measure,
    },
    phylo::{family::FamilyDataset, tree::PhyloTree},
    rates::{RateKind, RateModel, RateSpecTree},
    report::Reporter,
    search::{AnalysisContext, SearchOptions},
};
use anyhow::{Context, Result, bail};
use rand::{SeedableRng, rngs::StdRng};
use std::{fs, path::Path};

pub fn run(cli: Cli) -> Result<()> {
    let reporter = match &cli.log {
        Some(path) => Reporter::append_to(path)
            .with_context(|| format!("failed to open log {}", path.display()))?,
        None => Reporter::stdout(),
    };
    match cli.command {
        Command::Lambdamu { model, params } => {
            require_mu(&params)?;
            let mut ctx = context(&model, &params, RateKind::LambdaMu, cli.seed, reporter)?;
            if !params.search {
                ctx.score()?;
            }
            Ok(())
        }
        Command::Score { model, params } => {
            let kind = kind_for(&params);
            let mut ctx = context(&model, &params, kind, cli.seed, reporter)?;
            ctx.score()?;
            Ok(())
        }
        Command::Cvfamily { model, params, fold } => {
            let kind = kind_for(&params);
            let mut ctx = context(&model, &params, kind, cli.seed, reporter)?;
            cross_validate_by_family(&mut ctx, fold)?;
            Ok(())
        }
        Command::Cvspecies { model, params, input } => {
            let kind = kind_for(&params);
            let mut ctx = context(&model, &params, kind, cli.seed, reporter)?;
            match input {
                Some(path) => {
                    validate_species_file(&mut ctx, &path)?;
                }
                None => {
                    cross_validate_by_species(&mut ctx)?;
                }
            }
            Ok(())
        }
        Command::Errormodel {
            first,
            second,
            truth,
            symmetric,
            half_width,
            peak_zero,
            max_restarts,
        } => {
            let shape = ErrorShape::new(symmetric, half_width, peak_zero);
            let opts =
                ErrorModelOptions::new(max_restarts, ERROR_MODEL_TOL, ERROR_MODEL_TOL_CONVERGE)?;
            let mut rng = match cli.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let fit = if truth {
                estimate_error_true_measure(&first, &second, shape, &opts, &mut rng, &reporter)?
            } else {
                estimate_error_double_measure(&first, &second, shape, &opts, &mut rng, &reporter)?
            };
            let band: Vec<String> = fit.params.iter().map(|p| format!("{p:.6}")).collect();
            reporter.line(format!("Misclassification parameters : {}", band.join(" ")))?;
            reporter.line(format!("Marginal error probability : {:.6}", fit.epsilon))?;
            reporter.line(format!("Log-likelihood : {:.6}", fit.log_likelihood))?;
            Ok(())
        }
    }
}

/// `lambdamu` installs one μ per λ; supplied rates must include them.
fn require_mu(params: &ParamArgs) -> Result<()> {
    if !params.search && !params.lambda.is_empty() && params.mu.is_empty() {
        bail!("lambdamu needs death rates: supply them with --mu or fit them with --search");
    }
    Ok(())
}

fn kind_for(params: &ParamArgs) -> RateKind {
    if params.with_mu || !params.mu.is_empty() { RateKind::LambdaMu } else { RateKind::Lambda }
}

/// Newick text from a file, or the argument itself when no such file exists.
fn newick(arg: &str) -> Result<String> {
    let path = Path::new(arg);
    if path.is_file() {
        return fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()));
    }
    Ok(arg.to_string())
}

/// Build the analysis context and install supplied or fitted parameters.
fn context(
    model: &ModelArgs, params: &ParamArgs, kind: RateKind, seed: Option<u64>, reporter: Reporter,
) -> Result<AnalysisContext> {
    let tree = PhyloTree::from_newick(newick(&model.tree)?.trim()).context("invalid species tree")?;
    let family = FamilyDataset::load(&model.family)?;
    let rate_tree = match &model.rate_tree {
        Some(arg) => Some(RateSpecTree::parse(newick(arg)?.trim()).context("invalid rate tree")?),
        None => None,
    };
    let rate_model = RateModel { kind, ..Default::default() }
        .with_clusters(model.clusters, model.fix_cluster0)
        .with_eq_background(model.eq_background);
    let options = SearchOptions {
        seed,
        check_convergence: model.check_convergence,
        ..Default::default()
    };

    let mut ctx = AnalysisContext::new(tree, family, rate_tree, rate_model, options, reporter)?;
    if params.search {
        ctx.search_rates()?;
    } else if params.lambda.is_empty() {
        bail!("supply rates with --lambda or fit them with --search");
    } else {
        ctx.set_parameters(&params.lambda, &params.mu, &params.weights)?;
    }
    Ok(ctx)
}
