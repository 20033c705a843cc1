//! phylo::family — gene-family count tables and the family-size range.
//!
//! Files are tab-delimited with a header row `Desc  Family ID  species…` and one
//! family per line. `NA`, `?` and empty cells are unobserved counts; they stay
//! `None` all the way into the likelihood, where the leaf contributes no
//! information.
use crate::phylo::{
    errors::{PhyloError, PhyloResult},
    tree::PhyloTree,
};
use csv::{ReaderBuilder, WriterBuilder};
use std::{fs::File, path::Path};

/// Sizes the likelihood and reconstruction machinery considers.
///
/// - Node sizes range over `0..=max`.
/// - The root prior is uniform over `root_min..=root_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilySizeRange {
    pub max: usize,
    pub root_min: usize,
    pub root_max: usize,
}

impl FamilySizeRange {
    /// # Errors
    /// [`PhyloError::InvalidRange`] unless `root_min ≤ root_max ≤ max`.
    pub fn new(max: usize, root_min: usize, root_max: usize) -> PhyloResult<Self> {
        if root_min > root_max {
            return Err(PhyloError::InvalidRange { reason: "root_min exceeds root_max" });
        }
        if root_max > max {
            return Err(PhyloError::InvalidRange { reason: "root_max exceeds max" });
        }
        Ok(Self { max, root_min, root_max })
    }

    /// Range derived from the largest observed family size `m`.
    ///
    /// Roots span `1..=⌈1.25·m⌉`; nodes span `0..=max(2m, m + 10)`.
    pub fn from_max_observed(m: usize) -> Self {
        let root_max = ((m as f64) * 1.25).ceil().max(1.0) as usize;
        let max = (2 * m).max(m + 10).max(root_max);
        Self { max, root_min: 1, root_max }
    }

    /// Number of representable sizes (`max + 1`).
    pub fn size_of_factor(&self) -> usize {
        self.max + 1
    }

    /// Uniform prior mass of one root size.
    pub fn root_prior(&self) -> f64 {
        1.0 / (self.root_max - self.root_min + 1) as f64
    }
}

impl Default for FamilySizeRange {
    fn default() -> Self {
        Self::from_max_observed(0)
    }
}

/// One row of a family table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneFamily {
    pub description: String,
    pub id: String,
    /// Counts aligned with [`FamilyDataset::species`].
    pub counts: Vec<Option<usize>>,
}

/// Mapping from tree leaves to species columns, computed once per tree/dataset pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafMap {
    /// `(node index, species column)` pairs.
    pub pairs: Vec<(usize, usize)>,
}

impl LeafMap {
    /// Tree node of the leaf bound to species column `column`.
    pub fn node_for_column(&self, column: usize) -> Option<usize> {
        self.pairs.iter().find(|(_, c)| *c == column).map(|(n, _)| *n)
    }
}

/// Gene-family size table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyDataset {
    pub species: Vec<String>,
    pub families: Vec<GeneFamily>,
}

impl FamilyDataset {
    /// Load a tab-delimited family file.
    ///
    /// # Errors
    /// - [`PhyloError::Io`] if the file cannot be opened.
    /// - [`PhyloError::Csv`] for unreadable records.
    /// - [`PhyloError::MalformedFamilyFile`] for a missing species header or a
    ///   row whose column count differs from the header.
    /// - [`PhyloError::InvalidCount`] for a cell that is neither a count nor
    ///   a missing-value marker.
    pub fn load(path: &Path) -> PhyloResult<Self> {
        let file =
            File::open(path).map_err(|source| PhyloError::Io { path: path.to_path_buf(), source })?;
        let csv_err = |source| PhyloError::Csv { path: path.to_path_buf(), source };
        let mut reader = ReaderBuilder::new().delimiter(b'\t').flexible(true).from_reader(file);

        let headers = reader.headers().map_err(csv_err)?.clone();
        if headers.len() < 3 {
            return Err(PhyloError::MalformedFamilyFile {
                path: path.to_path_buf(),
                reason: "header needs Desc, Family ID and at least one species column".into(),
            });
        }
        let species: Vec<String> = headers.iter().skip(2).map(|s| s.trim().to_string()).collect();

        let mut families = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            if record.len() != headers.len() {
                return Err(PhyloError::MalformedFamilyFile {
                    path: path.to_path_buf(),
                    reason: format!(
                        "line {} has {} columns, expected {}",
                        line + 2,
                        record.len(),
                        headers.len()
                    ),
                });
            }
            let description = record.get(0).unwrap_or_default().to_string();
            let id = record.get(1).unwrap_or_default().to_string();
            let counts = record
                .iter()
                .skip(2)
                .zip(&species)
                .map(|(field, sp)| parse_count(field, &id, sp))
                .collect::<PhyloResult<Vec<_>>>()?;
            families.push(GeneFamily { description, id, counts });
        }
        Ok(Self { species, families })
    }

    /// Write the table back out, missing counts as `NA`.
    ///
    /// # Errors
    /// [`PhyloError::Io`] / [`PhyloError::Csv`] on write failures.
    pub fn write(&self, path: &Path) -> PhyloResult<()> {
        let file = File::create(path)
            .map_err(|source| PhyloError::Io { path: path.to_path_buf(), source })?;
        let csv_err = |source| PhyloError::Csv { path: path.to_path_buf(), source };
        let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(file);

        let mut header = vec!["Desc".to_string(), "Family ID".to_string()];
        header.extend(self.species.iter().cloned());
        writer.write_record(&header).map_err(csv_err)?;
        for family in &self.families {
            let mut record = vec![family.description.clone(), family.id.clone()];
            record.extend(family.counts.iter().map(|c| match c {
                Some(v) => v.to_string(),
                None => "NA".to_string(),
            }));
            writer.write_record(&record).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| PhyloError::Io { path: path.to_path_buf(), source })?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Largest observed count (0 for an empty table).
    pub fn max_size(&self) -> usize {
        self.families.iter().flat_map(|f| f.counts.iter().flatten()).copied().max().unwrap_or(0)
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s == name)
    }

    /// Families at `indices`, in that order.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            species: self.species.clone(),
            families: indices.iter().map(|&i| self.families[i].clone()).collect(),
        }
    }

    /// Copy with `column` replaced by missing values in every family.
    pub fn with_species_masked(&self, column: usize) -> Self {
        let mut masked = self.clone();
        for family in &mut masked.families {
            family.counts[column] = None;
        }
        masked
    }

    /// Copy restricted to a single species column.
    pub fn only_species(&self, column: usize) -> Self {
        Self {
            species: vec![self.species[column].clone()],
            families: self
                .families
                .iter()
                .map(|f| GeneFamily {
                    description: f.description.clone(),
                    id: f.id.clone(),
                    counts: vec![f.counts[column]],
                })
                .collect(),
        }
    }

    /// Bind each tree leaf to its species column by name.
    ///
    /// # Errors
    /// - [`PhyloError::UnnamedLeaf`] for a leaf without a name.
    /// - [`PhyloError::SpeciesNotFound`] if a leaf has no column.
    pub fn leaf_map(&self, tree: &PhyloTree) -> PhyloResult<LeafMap> {
        let pairs = tree
            .leaves()
            .map(|node| {
                let name =
                    tree.node(node).name.as_deref().ok_or(PhyloError::UnnamedLeaf { node })?;
                let column = self
                    .species_index(name)
                    .ok_or_else(|| PhyloError::SpeciesNotFound { name: name.to_string() })?;
                Ok((node, column))
            })
            .collect::<PhyloResult<Vec<_>>>()?;
        Ok(LeafMap { pairs })
    }

    /// Put family `index`'s counts on the tree leaves and clear internal sizes.
    ///
    /// # Errors
    /// [`PhyloError::FamilyIndexOutOfRange`] for a bad index.
    pub fn set_leaves(&self, index: usize, tree: &mut PhyloTree, map: &LeafMap) -> PhyloResult<()> {
        let family = self
            .families
            .get(index)
            .ok_or(PhyloError::FamilyIndexOutOfRange { index, count: self.families.len() })?;
        tree.clear_family_sizes();
        for &(node, column) in &map.pairs {
            tree.node_mut(node).family_size = family.counts[column];
        }
        Ok(())
    }
}

fn parse_count(field: &str, family: &str, species: &str) -> PhyloResult<Option<usize>> {
    let field = field.trim();
    if field.is_empty() || field == "NA" || field == "?" {
        return Ok(None);
    }
    field.parse::<usize>().map(Some).map_err(|_| PhyloError::InvalidCount {
        text: field.to_string(),
        family: family.to_string(),
        species: species.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Reading / writing family tables, missing-value handling, leaf binding
    // and the derived size range.
    // -------------------------------------------------------------------------

    fn table(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    // Purpose
    // -------
    // Counts and missing markers are parsed and survive a write/load cycle.
    //
    // Given
    // -----
    // - Two families over species A, B, C with one `NA` cell.
    //
    // Expect
    // ------
    // - Species list `[A, B, C]`, `NA` read as `None`, max size 7.
    // - Reloading the written copy yields the same dataset.
    fn load_parses_counts_and_missing_values() {
        // Arrange
        let file = table("Desc\tFamily ID\tA\tB\tC\nx\tf1\t1\t2\t3\ny\tf2\t7\tNA\t0\n");

        // Act
        let data = FamilyDataset::load(file.path()).unwrap();
        let out = NamedTempFile::new().unwrap();
        data.write(out.path()).unwrap();
        let again = FamilyDataset::load(out.path()).unwrap();

        // Assert
        assert_eq!(data.species, vec!["A", "B", "C"]);
        assert_eq!(data.families[1].counts, vec![Some(7), None, Some(0)]);
        assert_eq!(data.max_size(), 7);
        assert_eq!(again, data);
    }

    #[test]
    // Purpose
    // -------
    // Rows with the wrong number of columns and non-numeric cells are errors.
    fn load_rejects_malformed_rows() {
        let short = table("Desc\tFamily ID\tA\tB\nx\tf1\t1\n");
        let bad = table("Desc\tFamily ID\tA\tB\nx\tf1\t1\tmany\n");

        assert!(matches!(
            FamilyDataset::load(short.path()),
            Err(PhyloError::MalformedFamilyFile { .. })
        ));
        assert!(matches!(FamilyDataset::load(bad.path()), Err(PhyloError::InvalidCount { .. })));
        assert!(matches!(
            FamilyDataset::load(Path::new("/nonexistent/families.tab")),
            Err(PhyloError::Io { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Leaves are bound by name and family counts land on the right nodes.
    fn set_leaves_places_counts_on_named_leaves() {
        let file = table("Desc\tFamily ID\tB\tA\nx\tf1\t4\t9\n");
        let data = FamilyDataset::load(file.path()).unwrap();
        let mut tree = PhyloTree::from_newick("(A:1,B:1);").unwrap();

        let map = data.leaf_map(&tree).unwrap();
        data.set_leaves(0, &mut tree, &map).unwrap();

        let a = tree.leaf_by_name("A").unwrap();
        let b = tree.leaf_by_name("B").unwrap();
        assert_eq!(tree.node(a).family_size, Some(9));
        assert_eq!(tree.node(b).family_size, Some(4));
        assert_eq!(tree.node(tree.root()).family_size, None);
    }

    #[test]
    // Purpose
    // -------
    // A tree leaf without a species column is reported by name.
    fn leaf_map_reports_missing_species() {
        let file = table("Desc\tFamily ID\tA\nx\tf1\t4\n");
        let data = FamilyDataset::load(file.path()).unwrap();
        let tree = PhyloTree::from_newick("(A:1,Z:1);").unwrap();

        let err = data.leaf_map(&tree).unwrap_err();

        assert!(matches!(err, PhyloError::SpeciesNotFound { name } if name == "Z"));
    }

    #[test]
    // Purpose
    // -------
    // The derived range covers the observed sizes with headroom.
    fn range_from_max_observed_has_headroom() {
        let range = FamilySizeRange::from_max_observed(8);

        assert_eq!(range.root_min, 1);
        assert_eq!(range.root_max, 10);
        assert_eq!(range.max, 18);
        assert!(FamilySizeRange::new(5, 3, 2).is_err());
    }
}
