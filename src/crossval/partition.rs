//! crossval::partition — training / query / validation splits.
//!
//! By family: families go to folds round-robin (`i mod folds`). Each fold's
//! validation set is its own families, the training set is everything else,
//! and the query set is the validation set with one species hidden per
//! family, rotating through the species. With a single fold all three sets
//! are the full table.
//!
//! By species: the training set hides one species everywhere and the
//! validation set keeps only that species.
//!
//! Splits are written to a scratch directory and read back, so every fold
//! trains on a freshly loaded table.
use crate::{
    crossval::errors::{CvError, CvResult},
    phylo::family::FamilyDataset,
};
use std::path::{Path, PathBuf};

/// One by-family fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyFold {
    pub train: FamilyDataset,
    pub query: FamilyDataset,
    pub valid: FamilyDataset,
}

/// Files holding one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFiles {
    pub train: PathBuf,
    pub query: Option<PathBuf>,
    pub valid: PathBuf,
}

/// Split `data` into `folds` by-family folds.
///
/// # Errors
/// [`CvError::InvalidFolds`] for zero folds or more folds than families.
pub fn family_folds(data: &FamilyDataset, folds: usize) -> CvResult<Vec<FamilyFold>> {
    let families = data.len();
    if folds == 0 {
        return Err(CvError::InvalidFolds { folds, families, reason: "at least one fold is required" });
    }
    if folds > families {
        return Err(CvError::InvalidFolds {
            folds,
            families,
            reason: "every fold needs at least one family",
        });
    }
    if folds == 1 {
        let all: Vec<usize> = (0..families).collect();
        return Ok(vec![FamilyFold {
            train: data.clone(),
            query: masked_query(data, &all),
            valid: data.clone(),
        }]);
    }

    Ok((0..folds)
        .map(|fold| {
            let (valid, train): (Vec<usize>, Vec<usize>) =
                (0..families).partition(|i| i % folds == fold);
            FamilyFold {
                train: data.subset(&train),
                query: masked_query(data, &valid),
                valid: data.subset(&valid),
            }
        })
        .collect())
}

/// Validation families with species `position mod n_species` hidden.
fn masked_query(data: &FamilyDataset, indices: &[usize]) -> FamilyDataset {
    let mut query = data.subset(indices);
    let n_species = data.species.len();
    for (position, family) in query.families.iter_mut().enumerate() {
        family.counts[position % n_species] = None;
    }
    query
}

/// Write a by-family fold as `fold<n>.train|query|valid` under `dir` (`n` is 1-based).
///
/// # Errors
/// Propagates table write errors.
pub fn write_family_fold(dir: &Path, index: usize, fold: &FamilyFold) -> CvResult<SplitFiles> {
    let stem = format!("fold{}", index + 1);
    let files = SplitFiles {
        train: dir.join(format!("{stem}.train")),
        query: Some(dir.join(format!("{stem}.query"))),
        valid: dir.join(format!("{stem}.valid")),
    };
    fold.train.write(&files.train)?;
    if let Some(query) = &files.query {
        fold.query.write(query)?;
    }
    fold.valid.write(&files.valid)?;
    Ok(files)
}

/// Write the leave-one-species-out split for species `column`.
///
/// # Errors
/// Propagates table write errors.
pub fn write_species_split(dir: &Path, data: &FamilyDataset, column: usize) -> CvResult<SplitFiles> {
    let stem = &data.species[column];
    let files = SplitFiles {
        train: dir.join(format!("{stem}.train")),
        query: None,
        valid: dir.join(format!("{stem}.valid")),
    };
    data.with_species_masked(column).write(&files.train)?;
    data.only_species(column).write(&files.valid)?;
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phylo::family::GeneFamily;
    use tempfile::TempDir;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Round-robin fold membership, query masking, fold-count validation and
    // the on-disk layout of splits.
    // -------------------------------------------------------------------------

    fn data(n: usize) -> FamilyDataset {
        FamilyDataset {
            species: vec!["A".into(), "B".into(), "C".into()],
            families: (0..n)
                .map(|i| GeneFamily {
                    description: "d".into(),
                    id: format!("f{i}"),
                    counts: vec![Some(i), Some(i + 1), Some(i + 2)],
                })
                .collect(),
        }
    }

    #[test]
    // Purpose
    // -------
    // Families are dealt to folds round-robin.
    //
    // Given
    // -----
    // - 7 families, 3 folds.
    //
    // Expect
    // ------
    // - Fold 0 validates f0, f3, f6 and trains on the other four.
    // - Query rows hide species 0, 1, 2 in turn.
    fn folds_are_round_robin() {
        // Act
        let folds = family_folds(&data(7), 3).unwrap();

        // Assert
        assert_eq!(folds.len(), 3);
        let ids: Vec<&str> = folds[0].valid.families.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["f0", "f3", "f6"]);
        assert_eq!(folds[0].train.len(), 4);
        let q = &folds[0].query.families;
        assert_eq!(q[0].counts, vec![None, Some(1), Some(2)]);
        assert_eq!(q[1].counts, vec![Some(3), None, Some(5)]);
        assert_eq!(q[2].counts, vec![Some(6), Some(7), None]);
    }

    #[test]
    // Purpose
    // -------
    // A single fold trains and validates on everything.
    fn single_fold_uses_whole_table() {
        let table = data(4);

        let folds = family_folds(&table, 1).unwrap();

        assert_eq!(folds.len(), 1);
        assert_eq!(folds[0].train, table);
        assert_eq!(folds[0].valid, table);
        assert_eq!(folds[0].query.len(), 4);
    }

    #[test]
    // Purpose
    // -------
    // Zero folds and more folds than families are rejected.
    fn fold_count_is_validated() {
        assert!(matches!(family_folds(&data(3), 0), Err(CvError::InvalidFolds { folds: 0, .. })));
        assert!(matches!(
            family_folds(&data(3), 4),
            Err(CvError::InvalidFolds { folds: 4, families: 3, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Written splits read back as the same tables.
    fn splits_round_trip_through_files() {
        let dir = TempDir::new().unwrap();
        let table = data(3);
        let fold = family_folds(&table, 1).unwrap().remove(0);

        let family_files = write_family_fold(dir.path(), 0, &fold).unwrap();
        let species_files = write_species_split(dir.path(), &table, 1).unwrap();

        assert!(family_files.train.ends_with("fold1.train"));
        let query = FamilyDataset::load(family_files.query.as_deref().unwrap()).unwrap();
        assert_eq!(query, fold.query);
        let train = FamilyDataset::load(&species_files.train).unwrap();
        assert!(train.families.iter().all(|f| f.counts[1].is_none()));
        let valid = FamilyDataset::load(&species_files.valid).unwrap();
        assert_eq!(valid.species, vec!["B".to_string()]);
        assert_eq!(valid.families[2].counts, vec![Some(3)]);
    }
}
