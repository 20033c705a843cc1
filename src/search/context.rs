//! search::context — the explicit analysis context.
//!
//! Purpose
//! -------
//! Hold everything one analysis works on (species tree, optional rate tree,
//! family table, rate model and layout, current parameters, mixture state,
//! search options, RNG and report sink) and expose the operations that drive
//! it: installing parameters, searching rates, scoring, and reconstructing
//! families.
//!
//! Key behaviors
//! -------------
//! - The family-size range follows the loaded table and is recomputed when
//!   the table is replaced.
//! - [`AnalysisContext::search_rates`] runs one simplex search, or the full
//!   multi-start policy when `check_convergence` is set, then installs and
//!   reports the best vector.
//! - Every installation replaces the tree's rates wholesale and recomputes
//!   the transition matrices.
//!
//! Invariants & assumptions
//! ------------------------
//! - After a successful `install` the tree's transitions match `parameters`.
//! - The RNG is owned here; a fixed `seed` makes every search reproducible.
use crate::{
    optimization::{
        errors::OptError,
        multistart::{MultiStartOptions, StartSampler, multistart_maximize},
        simplex_optimizer::{SimplexOptions, Theta, maximize},
    },
    phylo::{
        birthdeath::populate_transitions,
        family::{FamilyDataset, FamilySizeRange, LeafMap},
        tree::PhyloTree,
        viterbi::{Reconstruction, reconstruct},
    },
    rates::{
        assign::{MixtureState, assign_rates},
        decode::DecodedRates,
        layout::{MuClasses, ParameterLayout, RateKind, RateModel},
        rate_tree::RateSpecTree,
    },
    report::Reporter,
    search::{
        errors::{SearchError, SearchResult},
        objective::{RateObjective, RateStart, family_log_likelihood},
    },
};
use rand::{SeedableRng, rngs::StdRng};

/// Search configuration.
///
/// - `seed`: RNG seed; `None` seeds from the operating system.
/// - `check_convergence`: repeat searches until two runs agree (otherwise a
///   single run is made).
/// - `multistart`: restart limit, agreement tolerance and simplex settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchOptions {
    pub seed: Option<u64>,
    pub check_convergence: bool,
    pub multistart: MultiStartOptions,
}

/// Outcome of a rate search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    pub theta: Vec<f64>,
    pub log_likelihood: f64,
    /// Accepted runs (1 without convergence checking).
    pub runs: usize,
    /// `None` when convergence was not checked.
    pub converged: Option<bool>,
}

/// Explicit state of one analysis.
#[derive(Debug)]
pub struct AnalysisContext {
    tree: PhyloTree,
    rate_tree: Option<RateSpecTree>,
    family: FamilyDataset,
    leaf_map: LeafMap,
    layout: ParameterLayout,
    parameters: Option<Vec<f64>>,
    mixture: MixtureState,
    options: SearchOptions,
    rng: StdRng,
    reporter: Reporter,
}

impl AnalysisContext {
    /// Build a context for `model` on `tree` and `family`.
    ///
    /// The number of λ classes is the rate tree's class count (1 without a
    /// rate tree); λ/μ models get one μ class per λ class.
    ///
    /// # Errors
    /// - [`SearchError::EmptyDataset`] for a table without families.
    /// - Rate-tree validation and layout errors as [`SearchError::Rate`].
    /// - Leaf/species binding errors as [`SearchError::Phylo`].
    pub fn new(
        mut tree: PhyloTree, family: FamilyDataset, rate_tree: Option<RateSpecTree>,
        model: RateModel, options: SearchOptions, reporter: Reporter,
    ) -> SearchResult<Self> {
        if family.is_empty() {
            return Err(SearchError::EmptyDataset);
        }
        if let Some(rate_tree) = &rate_tree {
            rate_tree.validate_against(&tree)?;
        }
        let classes = rate_tree.as_ref().map_or(1, RateSpecTree::class_count);
        let mu = match model.kind {
            RateKind::Lambda => MuClasses::Absent,
            RateKind::LambdaMu => MuClasses::SameAsLambda,
        };
        let layout = ParameterLayout::new(model, classes, mu, rate_tree.is_some())?;
        let leaf_map = family.leaf_map(&tree)?;
        tree.set_range(FamilySizeRange::from_max_observed(family.max_size()));
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            tree,
            rate_tree,
            family,
            leaf_map,
            layout,
            parameters: None,
            mixture: MixtureState::default(),
            options,
            rng,
            reporter,
        })
    }

    pub fn tree(&self) -> &PhyloTree {
        &self.tree
    }

    pub fn family(&self) -> &FamilyDataset {
        &self.family
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn parameters(&self) -> Option<&[f64]> {
        self.parameters.as_deref()
    }

    pub fn mixture(&self) -> &MixtureState {
        &self.mixture
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Install a full parameter vector on the tree.
    ///
    /// # Errors
    /// Propagates assignment and transition errors; on failure `parameters`
    /// keeps its previous value.
    pub fn install(&mut self, theta: Vec<f64>) -> SearchResult<DecodedRates> {
        let decoded = assign_rates(
            &mut self.tree,
            self.rate_tree.as_ref(),
            &self.layout,
            &theta,
            self.family.len(),
            &mut self.mixture,
        )?;
        populate_transitions(&mut self.tree)?;
        self.parameters = Some(theta);
        Ok(decoded)
    }

    /// Install user-supplied λ, μ and weight values.
    ///
    /// # Errors
    /// - [`crate::rates::RateError::RegionCountMismatch`] naming the supplied
    ///   and required counts; nothing is installed in that case.
    pub fn set_parameters(
        &mut self, lambdas: &[f64], mus: &[f64], weights: &[f64],
    ) -> SearchResult<DecodedRates> {
        let theta = self.layout.compose(lambdas, mus, weights)?;
        self.install(theta)
    }

    /// Replace the family table and recompute the size range.
    ///
    /// Installed parameters are reinstalled for the new range; mixture
    /// memberships start again from the weights.
    ///
    /// # Errors
    /// - [`SearchError::EmptyDataset`] or leaf-binding errors; the context is
    ///   unchanged in that case.
    pub fn replace_family(&mut self, family: FamilyDataset) -> SearchResult<()> {
        if family.is_empty() {
            return Err(SearchError::EmptyDataset);
        }
        self.leaf_map = family.leaf_map(&self.tree)?;
        self.tree.set_range(FamilySizeRange::from_max_observed(family.max_size()));
        self.family = family;
        self.mixture.memberships = None;
        if let Some(theta) = self.parameters.clone() {
            self.install(theta)?;
        }
        Ok(())
    }

    /// Fit rates to the current family table and install the best vector.
    ///
    /// # Errors
    /// - Optimizer failures (including no acceptable run) as [`SearchError::Opt`].
    /// - Installation and reporting failures.
    pub fn search_rates(&mut self) -> SearchResult<SearchSummary> {
        let objective = RateObjective::new(
            self.tree.clone(),
            self.rate_tree.as_ref(),
            self.layout,
            self.leaf_map.clone(),
        );
        let mut sampler =
            RateStart { layout: self.layout, max_branch_length: self.tree.max_branch_length() };

        let (theta, runs, converged) = if self.options.check_convergence {
            let outcome = multistart_maximize(
                &objective,
                &self.family,
                &mut sampler,
                &mut self.rng,
                &self.options.multistart,
            )?;
            for line in outcome.verdict(self.options.multistart.max_restarts) {
                self.reporter.line(line)?;
            }
            (outcome.best.theta_hat, outcome.accepted, Some(outcome.converged))
        } else {
            let simplex = self.options.multistart.simplex;
            let run = single_run(&objective, &self.family, &mut sampler, &mut self.rng, &simplex)?;
            (run, 1, None)
        };

        drop(objective);
        let theta = theta.to_vec();
        self.install(theta.clone())?;
        let log_likelihood = self.score()?;
        Ok(SearchSummary { theta, log_likelihood, runs, converged })
    }

    /// Log-likelihood of the installed parameters, reported with the rates.
    ///
    /// Mixture memberships are updated to each family's posterior.
    ///
    /// # Errors
    /// - [`SearchError::ParametersNotSet`] before any parameters are installed.
    pub fn score(&mut self) -> SearchResult<f64> {
        let theta = self.parameters.clone().ok_or(SearchError::ParametersNotSet)?;
        let decoded = self.install(theta)?;
        let weights = self.mixture.likelihood_weights();
        let mixture = &mut self.mixture;
        let log_likelihood = family_log_likelihood(
            &mut self.tree,
            &self.family,
            &self.leaf_map,
            &weights,
            |family, per_cluster| mixture.update_posterior(family, per_cluster),
        )?;
        self.reporter.line(format!("{} & Score: {log_likelihood:.6}", describe_rates(&decoded)))?;
        Ok(log_likelihood)
    }

    /// Most probable ancestral sizes of family `index` of `data`.
    ///
    /// Leaves unobserved in `data` are predicted; the tree keeps the result in
    /// each node's `family_size`.
    ///
    /// # Errors
    /// - [`SearchError::ParametersNotSet`] before any parameters are installed.
    /// - Leaf-binding and reconstruction errors.
    pub fn reconstruct_family(
        &mut self, data: &FamilyDataset, index: usize,
    ) -> SearchResult<Reconstruction> {
        if self.parameters.is_none() {
            return Err(SearchError::ParametersNotSet);
        }
        let map = data.leaf_map(&self.tree)?;
        data.set_leaves(index, &mut self.tree, &map)?;
        let weights = self.mixture.likelihood_weights();
        Ok(reconstruct(&mut self.tree, &weights)?)
    }
}

/// One simplex run from a fresh start.
///
/// A run that used up its iteration budget is still taken, with a warning;
/// an infeasible end point is an error.
fn single_run(
    objective: &RateObjective<'_>, data: &FamilyDataset, sampler: &mut RateStart,
    rng: &mut StdRng, simplex: &SimplexOptions,
) -> SearchResult<Theta> {
    let run = maximize(objective, sampler.sample(rng), data, simplex)?;
    if !run.is_feasible() {
        return Err(OptError::NoAcceptedRun { attempts: 1 }.into());
    }
    if run.budget_exhausted {
        tracing::warn!(iterations = run.iterations, "rate search stopped at its iteration limit");
    }
    Ok(run.theta_hat)
}

/// `Lambda : … Mu : … Weights : …` line for decoded rates.
pub fn describe_rates(decoded: &DecodedRates) -> String {
    fn join<'a>(values: impl Iterator<Item = &'a f64>) -> String {
        values.map(|v| format!("{v:.10}")).collect::<Vec<_>>().join(" ")
    }
    let mut line = format!("Lambda : {}", join(decoded.lambda.iter()));
    if let Some(mu) = &decoded.mu {
        line.push_str(&format!(" Mu : {}", join(mu.iter())));
    }
    if !decoded.weights.is_empty() {
        line.push_str(&format!(" Weights : {}", join(decoded.weights.iter())));
    }
    line
}
