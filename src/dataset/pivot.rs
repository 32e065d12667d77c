//! Long-to-wide sparse pivot.
//!
//! Rows of the output follow the labels table (train rows, then test rows),
//! columns follow the order in which variables first appear in the feature
//! collection. The matrix is assembled from (row, column, value) triplets
//! and stored as CSR.

use crate::core::error::{FoldwiseError, Result};
use crate::core::types::{FeatureMatrix, Key, KeyTuple};
use crate::dataset::join::FeatureCollection;
use crate::dataset::table::Table;
use sprs::TriMat;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Key tuple → row position.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIndex {
    keys: Vec<KeyTuple>,
    positions: HashMap<KeyTuple, usize>,
}

impl RowIndex {
    /// Index the rows of `table` by key. Fails with a duplicate key error
    /// when a key tuple repeats.
    pub fn build(table: &Table, key: &Key) -> Result<Self> {
        let keys = table.key_tuples(key)?;
        let mut positions = HashMap::with_capacity(keys.len());

        for (row, tuple) in keys.iter().enumerate() {
            match positions.entry(tuple.clone()) {
                Entry::Occupied(first) => {
                    return Err(FoldwiseError::duplicate_key(
                        tuple.clone(),
                        table.name(),
                        *first.get(),
                        row,
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
            }
        }

        Ok(RowIndex { keys, positions })
    }

    /// Row of a key tuple.
    pub fn get(&self, key: &[String]) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Key tuple of a row.
    pub fn key_of(&self, row: usize) -> Option<&KeyTuple> {
        self.keys.get(row)
    }

    /// Key tuples in row order.
    pub fn keys(&self) -> &[KeyTuple] {
        &self.keys
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Variable name → column position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Assign columns to `names` in order, skipping repeats.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = ColumnIndex::default();
        for name in names {
            let name = name.into();
            if !index.positions.contains_key(&name) {
                index.positions.insert(name.clone(), index.names.len());
                index.names.push(name);
            }
        }
        index
    }

    /// Column of a variable.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Variable names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Output of [`pivot`].
#[derive(Debug, Clone)]
pub struct PivotResult {
    /// Row of each labels-table key
    pub rows: RowIndex,
    /// Column of each variable
    pub columns: ColumnIndex,
    /// Rows × variables, absent entries zero
    pub matrix: FeatureMatrix,
}

impl PivotResult {
    /// (rows, columns) of the matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.matrix.rows(), self.matrix.cols())
    }

    /// Value for a key tuple and variable; zero when never supplied, `None`
    /// when the key or variable is unknown.
    pub fn value(&self, key: &[String], variable: &str) -> Option<f64> {
        let row = self.rows.get(key)?;
        let col = self.columns.get(variable)?;
        Some(self.matrix.get(row, col).copied().unwrap_or(0.0))
    }
}

/// Pivot the feature collection into a sparse matrix aligned to `labels`.
///
/// Records whose key is not in `labels` are dropped. Two records for the
/// same key and variable are rejected with a schema error rather than
/// summed or overwritten.
pub fn pivot(labels: &Table, features: FeatureCollection, key: &Key) -> Result<PivotResult> {
    let rows = RowIndex::build(labels, key)?;
    let columns = ColumnIndex::from_names(features.variables().iter().cloned());

    let records = features.into_records();
    let mut triplets = TriMat::with_capacity((rows.len(), columns.len()), records.len());
    let mut occupied: HashSet<(usize, usize)> = HashSet::with_capacity(records.len());
    let mut unmatched = 0usize;

    for record in records {
        let Some(row) = rows.get(&record.key) else {
            unmatched += 1;
            continue;
        };
        let col = columns.get(&record.variable).ok_or_else(|| {
            FoldwiseError::internal(format!(
                "variable '{}' missing from column index",
                record.variable
            ))
        })?;

        if !occupied.insert((row, col)) {
            return Err(FoldwiseError::schema(format!(
                "variable '{}' supplied more than once for key {:?}",
                record.variable, record.key
            )));
        }
        triplets.add_triplet(row, col, record.value);
    }

    if unmatched > 0 {
        log::debug!("Dropped {} feature records whose key is not in {}", unmatched, labels.name());
    }

    let matrix: FeatureMatrix = triplets.to_csr();
    log::info!(
        "Pivoted features into a {} x {} sparse matrix with {} stored values",
        matrix.rows(),
        matrix.cols(),
        matrix.nnz()
    );

    Ok(PivotResult {
        rows,
        columns,
        matrix,
    })
}
