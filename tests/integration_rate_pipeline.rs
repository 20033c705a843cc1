//! Integration tests for the rate pipeline: files in, rates installed,
//! scores and cross-validation errors out.
//!
//! Purpose
//! -------
//! - Validate the path a user takes through the library: load a species
//!   tree and a family file from disk, install or search rates on an
//!   [`AnalysisContext`], score them, and cross-validate.
//! - Check the state the context leaves on the tree after repeated
//!   assignments.
//!
//! Coverage
//! --------
//! - `phylo`: Newick parsing and tab-delimited family loading from files.
//! - `rates`: wholesale replacement of per-node assignments.
//! - `search::context`: `set_parameters`, `score`, `search_rates`.
//! - `crossval`: by-family cross-validation with a single fold.
//!
//! Exclusions
//! ----------
//! - Numerical checks of transition probabilities and pruning; those are
//!   covered by unit tests next to the code.
//! - Mixture and rate-tree layouts beyond a smoke check.
use genefam_rates::{
    crossval::cross_validate_by_family,
    phylo::{family::FamilyDataset, tree::PhyloTree},
    rates::{BirthDeathAssignment, RateModel, RateSpecTree},
    report::{LineBuffer, Reporter},
    search::{AnalysisContext, SearchOptions},
};
use std::io::Write;
use tempfile::NamedTempFile;

const NEWICK: &str = "((A:10,B:10):5,(C:8,D:8):7);";

/// Write a four-species family file with a handful of small families.
fn family_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Desc\tFamily ID\tA\tB\tC\tD").unwrap();
    let rows = [
        [1, 1, 1, 1],
        [2, 2, 1, 2],
        [3, 2, 3, 3],
        [1, 1, 2, 1],
        [0, 1, 1, 1],
        [4, 4, 3, 5],
        [2, 1, 2, 2],
        [1, 2, 1, 1],
    ];
    for (i, row) in rows.iter().enumerate() {
        writeln!(file, "family\tfam{i}\t{}\t{}\t{}\t{}", row[0], row[1], row[2], row[3]).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Build a context over the fixture with the given model and a fixed seed.
fn context(model: RateModel, rate_tree: Option<&str>) -> (AnalysisContext, LineBuffer) {
    let families = family_file();
    let data = FamilyDataset::load(families.path()).unwrap();
    let tree = PhyloTree::from_newick(NEWICK).unwrap();
    let rate_tree = rate_tree.map(|s| RateSpecTree::parse(s).unwrap());
    let (reporter, lines) = Reporter::memory();
    let options = SearchOptions { seed: Some(2024), ..Default::default() };
    let ctx = AnalysisContext::new(tree, data, rate_tree, model, options, reporter).unwrap();
    (ctx, lines)
}

#[test]
// Purpose
// -------
// A second assignment replaces the first on every node.
//
// Given
// -----
// - λ-only model without a rate tree.
// - λ = 0.01 installed, then λ = 0.02.
//
// Expect
// ------
// - Every node holds a scalar assignment with λ = 0.02 and no μ.
fn reassignment_replaces_every_node() {
    // Arrange
    let (mut ctx, _) = context(RateModel::lambda_only(), None);

    // Act
    ctx.set_parameters(&[0.01], &[], &[]).unwrap();
    ctx.set_parameters(&[0.02], &[], &[]).unwrap();

    // Assert
    for node in ctx.tree().nodes() {
        match &node.birth_death {
            BirthDeathAssignment::Scalar(rates) => {
                assert_eq!(rates.lambda, 0.02);
                assert_eq!(rates.mu, None);
            }
            other => panic!("expected a scalar assignment, got {other:?}"),
        }
    }
}

#[test]
// Purpose
// -------
// Scoring supplied rates reports one finite, negative log-likelihood.
//
// Expect
// ------
// - `score` returns a finite value below zero.
// - The last report line carries the rates and the same score.
fn score_reports_rates_and_log_likelihood() {
    // Arrange
    let (mut ctx, lines) = context(RateModel::lambda_mu(), None);
    ctx.set_parameters(&[0.01], &[0.02], &[]).unwrap();

    // Act
    let score = ctx.score().unwrap();

    // Assert
    assert!(score.is_finite() && score < 0.0);
    let lines = lines.borrow();
    let last = lines.last().unwrap();
    assert!(last.starts_with("Lambda : "));
    assert!(last.contains(" Mu : "));
    assert!(last.ends_with(&format!("Score: {score:.6}")));
}

#[test]
// Purpose
// -------
// A searched rate scores at least as well as a poor hand-picked one.
//
// Given
// -----
// - λ-only model; hand-picked λ = 0.5 on branches of length 5–10.
//
// Expect
// ------
// - The searched λ is strictly positive and its score is not worse.
fn search_improves_on_poor_rate() {
    // Arrange
    let (mut ctx, _) = context(RateModel::lambda_only(), None);
    ctx.set_parameters(&[0.5], &[], &[]).unwrap();
    let poor = ctx.score().unwrap();

    // Act
    let summary = ctx.search_rates().unwrap();

    // Assert
    assert_eq!(summary.theta.len(), 1);
    assert!(summary.theta[0] > 0.0);
    assert!(summary.log_likelihood >= poor - 1e-6);
    assert_eq!(ctx.parameters(), Some(summary.theta.as_slice()));
}

#[test]
// Purpose
// -------
// A rate tree with two classes installs class-specific λ on the branches.
fn rate_tree_assigns_class_rates() {
    let (mut ctx, _) = context(RateModel::lambda_only(), Some("((1,1)1,(2,2)2)1;"));

    ctx.set_parameters(&[0.01, 0.03], &[], &[]).unwrap();

    let tree = ctx.tree();
    let c = tree.leaf_by_name("C").unwrap();
    let a = tree.leaf_by_name("A").unwrap();
    assert_eq!(tree.node(a).birth_death.clusters()[0].lambda, 0.01);
    assert_eq!(tree.node(c).birth_death.clusters()[0].lambda, 0.03);
}

#[test]
// Purpose
// -------
// Single-fold cross-validation trains and validates on the full table.
//
// Expect
// ------
// - One fold with finite MSE and MAE, and MSE ≥ MAE².
// - The fold average equals the single fold.
fn single_fold_cross_validation_is_finite() {
    // Arrange
    let (mut ctx, lines) = context(RateModel::lambda_only(), None);
    ctx.set_parameters(&[0.01], &[], &[]).unwrap();

    // Act
    let report = cross_validate_by_family(&mut ctx, 1).unwrap();

    // Assert
    assert_eq!(report.folds.len(), 1);
    assert!(report.mse.is_finite() && report.mae.is_finite());
    assert!(report.mse + 1e-12 >= report.mae * report.mae);
    assert_eq!(report.mse, report.folds[0].mse);
    assert!(lines.borrow().iter().any(|l| l.starts_with("MSE all folds ")));
}
