//! crossval::validate — refit-and-predict cycles over held-out data.
//!
//! Purpose
//! -------
//! Measure how well fitted rates predict hidden counts: train on one part of
//! the family table, reconstruct hidden leaf counts with Viterbi, and compare
//! them with the truth.
//!
//! Key behaviors
//! -------------
//! - Each split is written to a scratch directory, the training table is read
//!   back and installed (recomputing the family-size range), and rates are
//!   refit with the context's configured search.
//! - By family: each query family's reconstructed leaves are compared with
//!   the validation table; a family contributes `SSE / leaves` and
//!   `SAE / leaves`, and a fold's errors are the averages over its families.
//! - By species: the hidden species' reconstructed count is compared with
//!   its true count, averaged over families.
//! - A user-written validation file for one species can be scored against
//!   the installed rates without any refit.
//! - MSE and MAE are accumulated separately.
//! - Afterwards the original table is reinstalled and the rates refit on it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters must already be installed on the context.
//! - Leaves whose true count is missing are left out of every average.
use crate::{
    crossval::{
        errors::{CvError, CvResult},
        partition::{family_folds, write_family_fold, write_species_split},
    },
    phylo::{errors::PhyloError, family::FamilyDataset},
    search::context::AnalysisContext,
};
use std::path::Path;
use tempfile::TempDir;

/// Errors for one fold (or one held-out species).
#[derive(Debug, Clone, PartialEq)]
pub struct FoldError {
    pub label: String,
    pub mse: f64,
    pub mae: f64,
}

/// Per-fold errors and their averages.
#[derive(Debug, Clone, PartialEq)]
pub struct CvReport {
    pub folds: Vec<FoldError>,
    pub mse: f64,
    pub mae: f64,
}

impl CvReport {
    fn from_folds(folds: Vec<FoldError>) -> Self {
        let n = folds.len().max(1) as f64;
        let mse = folds.iter().map(|f| f.mse).sum::<f64>() / n;
        let mae = folds.iter().map(|f| f.mae).sum::<f64>() / n;
        Self { folds, mse, mae }
    }
}

#[derive(Debug, Default)]
struct ErrorSums {
    squared: f64,
    absolute: f64,
    count: usize,
}

impl ErrorSums {
    fn add(&mut self, truth: usize, predicted: usize) {
        let error = truth as f64 - predicted as f64;
        self.squared += error * error;
        self.absolute += error.abs();
        self.count += 1;
    }

    /// `(MSE, MAE)`, or `None` when nothing was compared.
    fn means(&self) -> Option<(f64, f64)> {
        (self.count > 0).then(|| {
            let n = self.count as f64;
            (self.squared / n, self.absolute / n)
        })
    }
}

fn ensure_parameters(ctx: &AnalysisContext) -> CvResult<()> {
    if ctx.parameters().is_none() {
        return Err(CvError::ParametersNotSet);
    }
    Ok(())
}

fn retrain(ctx: &mut AnalysisContext, train: FamilyDataset) -> CvResult<()> {
    ctx.replace_family(train)?;
    ctx.search_rates()?;
    Ok(())
}

fn restore(ctx: &mut AnalysisContext, original: FamilyDataset) -> CvResult<()> {
    tracing::debug!("restoring the full family table");
    retrain(ctx, original)
}

/// Score a by-family fold: reconstruct every query family and compare all
/// leaves with the validation table.
fn score_family_fold(
    ctx: &mut AnalysisContext, query: &FamilyDataset, valid: &FamilyDataset, label: &str,
) -> CvResult<FoldError> {
    let truth_map = valid.leaf_map(ctx.tree())?;
    let mut fold_mse = 0.0;
    let mut fold_mae = 0.0;
    let mut scored = 0usize;
    for index in 0..query.len() {
        ctx.reconstruct_family(query, index)?;
        let truth = &valid.families[index];
        let mut sums = ErrorSums::default();
        for &(node, column) in &truth_map.pairs {
            if let (Some(t), Some(p)) = (truth.counts[column], ctx.tree().node(node).family_size) {
                sums.add(t, p);
            }
        }
        if let Some((mse, mae)) = sums.means() {
            fold_mse += mse;
            fold_mae += mae;
            scored += 1;
        }
    }
    if scored == 0 {
        return Err(CvError::NothingToCompare { label: label.to_string() });
    }
    let n = scored as f64;
    Ok(FoldError { label: label.to_string(), mse: fold_mse / n, mae: fold_mae / n })
}

/// Compare the reconstructed count of `species` in every `query` family with
/// the single-column `valid` table.
fn score_held_out_species(
    ctx: &mut AnalysisContext, query: &FamilyDataset, valid: &FamilyDataset, species: &str,
) -> CvResult<FoldError> {
    let leaf = ctx
        .tree()
        .leaf_by_name(species)
        .ok_or_else(|| PhyloError::SpeciesNotFound { name: species.to_string() })?;
    let mut sums = ErrorSums::default();
    for (index, truth) in valid.families.iter().enumerate() {
        ctx.reconstruct_family(query, index)?;
        let predicted = ctx.tree().node(leaf).family_size.ok_or_else(|| {
            CvError::MissingPrediction { species: species.to_string(), family: index }
        })?;
        if let Some(t) = truth.counts[0] {
            sums.add(t, predicted);
        }
    }
    let (mse, mae) =
        sums.means().ok_or_else(|| CvError::NothingToCompare { label: species.to_string() })?;
    ctx.reporter().line(format!("MSE {species} {mse:.6}"))?;
    ctx.reporter().line(format!("MAE {species} {mae:.6}"))?;
    Ok(FoldError { label: species.to_string(), mse, mae })
}

/// k-fold cross-validation over families.
///
/// Reports `MSE fold i` / `MAE fold i` per fold and `MSE all folds` /
/// `MAE all folds` at the end.
///
/// # Errors
/// - [`CvError::ParametersNotSet`] before any parameters are installed.
/// - [`CvError::InvalidFolds`] for an unusable fold count.
/// - Scratch-file, search and reconstruction failures.
pub fn cross_validate_by_family(ctx: &mut AnalysisContext, folds: usize) -> CvResult<CvReport> {
    ensure_parameters(ctx)?;
    let original = ctx.family().clone();
    let splits = family_folds(&original, folds)?;
    let scratch = TempDir::new()?;

    let mut results = Vec::with_capacity(splits.len());
    for (i, fold) in splits.iter().enumerate() {
        let files = write_family_fold(scratch.path(), i, fold)?;
        let train = FamilyDataset::load(&files.train)?;
        let valid = FamilyDataset::load(&files.valid)?;
        let query = match &files.query {
            Some(path) => FamilyDataset::load(path)?,
            None => valid.clone(),
        };
        tracing::debug!(fold = i + 1, train = train.len(), query = query.len(), "cross-validation fold");
        retrain(ctx, train)?;

        let label = format!("fold {}", i + 1);
        let result = score_family_fold(ctx, &query, &valid, &label)?;
        ctx.reporter().line(format!("MSE {} {:.6}", result.label, result.mse))?;
        ctx.reporter().line(format!("MAE {} {:.6}", result.label, result.mae))?;
        results.push(result);
    }

    let report = CvReport::from_folds(results);
    ctx.reporter().line(format!("MSE all folds {:.6}", report.mse))?;
    ctx.reporter().line(format!("MAE all folds {:.6}", report.mae))?;
    restore(ctx, original)?;
    Ok(report)
}

/// Leave-one-species-out cross-validation.
///
/// Reports `MSE <species>` / `MAE <species>` per species and
/// `MSE all species` / `MAE all species` at the end.
///
/// # Errors
/// - [`CvError::ParametersNotSet`] before any parameters are installed.
/// - [`CvError::MissingPrediction`] if the hidden leaf was not reconstructed.
/// - Scratch-file, search and reconstruction failures.
pub fn cross_validate_by_species(ctx: &mut AnalysisContext) -> CvResult<CvReport> {
    ensure_parameters(ctx)?;
    let original = ctx.family().clone();
    let scratch = TempDir::new()?;

    let mut results = Vec::with_capacity(original.species.len());
    for column in 0..original.species.len() {
        let species = original.species[column].clone();
        let files = write_species_split(scratch.path(), &original, column)?;
        let train = FamilyDataset::load(&files.train)?;
        let valid = FamilyDataset::load(&files.valid)?;
        tracing::debug!(%species, "leaving species out");
        retrain(ctx, train.clone())?;
        results.push(score_held_out_species(ctx, &train, &valid, &species)?);
    }

    let report = CvReport::from_folds(results);
    ctx.reporter().line(format!("MSE all species {:.6}", report.mse))?;
    ctx.reporter().line(format!("MAE all species {:.6}", report.mae))?;
    restore(ctx, original)?;
    Ok(report)
}

/// Score the installed rates against a held-out species read from `path`.
///
/// The file is a family table with one species column and one row per
/// family of the loaded table, in the same order. That species is hidden
/// in the loaded table, every family is reconstructed, and the predicted
/// leaf counts are compared with the file. Nothing is refit and the loaded
/// table is left as it was.
///
/// Reports `MSE <species>` / `MAE <species>`.
///
/// # Errors
/// - [`CvError::ParametersNotSet`] before any parameters are installed.
/// - [`CvError::ValidationSpecies`] unless the file has exactly one species.
/// - [`CvError::ValidationLength`] if the family counts differ.
/// - File, species-lookup and reconstruction failures.
pub fn validate_species_file(ctx: &mut AnalysisContext, path: &Path) -> CvResult<FoldError> {
    ensure_parameters(ctx)?;
    let valid = FamilyDataset::load(path)?;
    if valid.species.len() != 1 {
        return Err(CvError::ValidationSpecies {
            path: path.to_path_buf(),
            found: valid.species.len(),
        });
    }
    let loaded = ctx.family();
    if valid.len() != loaded.len() {
        return Err(CvError::ValidationLength {
            path: path.to_path_buf(),
            expected: loaded.len(),
            found: valid.len(),
        });
    }
    let species = valid.species[0].clone();
    let column = loaded
        .species_index(&species)
        .ok_or_else(|| PhyloError::SpeciesNotFound { name: species.clone() })?;
    let query = loaded.with_species_masked(column);
    tracing::debug!(%species, families = valid.len(), "scoring validation file");
    score_held_out_species(ctx, &query, &valid, &species)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        phylo::{family::GeneFamily, tree::PhyloTree},
        rates::layout::RateModel,
        report::{LineBuffer, Reporter},
        search::context::SearchOptions,
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Preconditions, report lines and the state left behind by both
    // cross-validation strategies on a small four-species table.
    // -------------------------------------------------------------------------

    fn data() -> FamilyDataset {
        let rows = [
            [1, 1, 1, 1],
            [2, 2, 1, 2],
            [3, 3, 3, 2],
            [1, 2, 1, 1],
            [2, 1, 2, 2],
            [4, 3, 4, 4],
        ];
        FamilyDataset {
            species: ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect(),
            families: rows
                .iter()
                .enumerate()
                .map(|(i, counts)| GeneFamily {
                    description: "desc".into(),
                    id: format!("fam{i}"),
                    counts: counts.iter().map(|&c| Some(c)).collect(),
                })
                .collect(),
        }
    }

    fn context() -> (AnalysisContext, LineBuffer) {
        let (reporter, lines) = Reporter::memory();
        let options = SearchOptions { seed: Some(11), ..Default::default() };
        let tree = PhyloTree::from_newick("((A:1,B:1):1,(C:1,D:1):1);").unwrap();
        let ctx =
            AnalysisContext::new(tree, data(), None, RateModel::lambda_only(), options, reporter)
                .unwrap();
        (ctx, lines)
    }

    #[test]
    // Purpose
    // -------
    // Cross-validation refuses to run without installed parameters.
    fn requires_parameters() {
        let (mut ctx, _) = context();

        assert!(matches!(cross_validate_by_family(&mut ctx, 2), Err(CvError::ParametersNotSet)));
        assert!(matches!(cross_validate_by_species(&mut ctx), Err(CvError::ParametersNotSet)));
        assert!(matches!(
            validate_species_file(&mut ctx, Path::new("unused.valid")),
            Err(CvError::ParametersNotSet)
        ));
    }

    #[test]
    // Purpose
    // -------
    // Two folds give finite, separately accumulated errors and restore the table.
    //
    // Given
    // -----
    // - Six families, λ = 0.05 installed, two folds.
    //
    // Expect
    // ------
    // - Two fold entries with finite MSE ≥ MAE² and MAE ≥ 0.
    // - "MSE fold 1", "MAE fold 1" and "MAE all folds" report lines.
    // - The context holds the full table again.
    fn family_folds_report_separate_errors() {
        // Arrange
        let (mut ctx, lines) = context();
        ctx.set_parameters(&[0.05], &[], &[]).unwrap();

        // Act
        let report = cross_validate_by_family(&mut ctx, 2).unwrap();

        // Assert
        assert_eq!(report.folds.len(), 2);
        for fold in &report.folds {
            assert!(fold.mse.is_finite() && fold.mae.is_finite());
            assert!(fold.mse + 1e-12 >= fold.mae * fold.mae);
        }
        let lines = lines.borrow();
        assert!(lines.iter().any(|l| l.starts_with("MSE fold 1 ")));
        assert!(lines.iter().any(|l| l.starts_with("MAE fold 1 ")));
        assert!(lines.iter().any(|l| l.starts_with("MAE all folds ")));
        assert_eq!(ctx.family(), &data());
    }

    #[test]
    // Purpose
    // -------
    // Leaving each species out yields one entry per species.
    fn species_cv_covers_every_species() {
        let (mut ctx, lines) = context();
        ctx.set_parameters(&[0.05], &[], &[]).unwrap();

        let report = cross_validate_by_species(&mut ctx).unwrap();

        let labels: Vec<&str> = report.folds.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C", "D"]);
        assert!(report.mse.is_finite() && report.mae.is_finite());
        assert!(lines.borrow().iter().any(|l| l == &format!("MAE all species {:.6}", report.mae)));
        assert_eq!(ctx.family(), &data());
    }

    fn validation_file(table: &FamilyDataset) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        table.write(file.path()).unwrap();
        file
    }

    #[test]
    // Purpose
    // -------
    // A one-species validation file is scored against the installed rates
    // without refitting.
    //
    // Given
    // -----
    // - λ = 0.05 installed on the six-family table.
    // - A validation file holding species C only, as written for a
    //   leave-one-species-out split.
    //
    // Expect
    // ------
    // - A single entry labelled "C" with finite MSE ≥ MAE².
    // - "MSE C" and "MAE C" report lines and no search output.
    // - Parameters and the loaded table are unchanged.
    fn validation_file_is_scored_without_refit() {
        // Arrange
        let (mut ctx, lines) = context();
        ctx.set_parameters(&[0.05], &[], &[]).unwrap();
        let file = validation_file(&data().only_species(2));
        lines.borrow_mut().clear();

        // Act
        let result = validate_species_file(&mut ctx, file.path()).unwrap();

        // Assert
        assert_eq!(result.label, "C");
        assert!(result.mse.is_finite() && result.mse + 1e-12 >= result.mae * result.mae);
        let lines = lines.borrow();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("MSE C {:.6}", result.mse));
        assert_eq!(lines[1], format!("MAE C {:.6}", result.mae));
        assert_eq!(ctx.parameters(), Some(&[0.05][..]));
        assert_eq!(ctx.family(), &data());
    }

    #[test]
    // Purpose
    // -------
    // Validation files with several species or the wrong number of families
    // are refused before any reconstruction.
    fn validation_file_shape_is_checked() {
        let (mut ctx, _) = context();
        ctx.set_parameters(&[0.05], &[], &[]).unwrap();
        let two_species = validation_file(&data());
        let mut short = data().only_species(0);
        short.families.truncate(3);
        let short = validation_file(&short);

        let wide = validate_species_file(&mut ctx, two_species.path()).unwrap_err();
        let truncated = validate_species_file(&mut ctx, short.path()).unwrap_err();

        assert!(matches!(wide, CvError::ValidationSpecies { found: 4, .. }));
        assert!(matches!(truncated, CvError::ValidationLength { expected: 6, found: 3, .. }));
    }
}
