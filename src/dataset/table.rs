//! In-memory string table.
//!
//! Tables hold raw cell text exactly as read from the source. Numeric
//! interpretation happens later, where the role of a column is known
//! (feature value, target, fold id), so that a parse failure can name the
//! column and the file it came from.

use crate::core::error::{FoldwiseError, Result};
use crate::core::types::{Key, KeyTuple};
use std::collections::HashSet;
use std::ops::Range;

/// A named, row-major table of string cells with a header.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table. `name` is used in error messages (usually the file
    /// path). Every row must have one cell per column and column names
    /// must be unique.
    pub fn new<S: Into<String>>(
        name: S,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self> {
        let name = name.into();

        if columns.is_empty() {
            return Err(FoldwiseError::format(format!("{} has no columns", name)));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(FoldwiseError::format(format!(
                    "column '{}' appears more than once in {}",
                    column, name
                )));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(FoldwiseError::format(format!(
                    "row {} of {} has {} cells, expected {}",
                    i,
                    name,
                    row.len(),
                    columns.len()
                )));
            }
        }

        Ok(Table { name, columns, rows })
    }

    /// Build a table from string literals. Convenient for tests and small
    /// in-code fixtures.
    pub fn from_literals(name: &str, columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        Table::new(
            name,
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Source name used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// True if the table has the named column.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Key columns absent from this table, in key order.
    pub fn missing_columns(&self, key: &Key) -> Vec<String> {
        key.columns()
            .iter()
            .filter(|c| !self.has_column(c))
            .cloned()
            .collect()
    }

    /// Fail with a schema error unless every key column is present.
    pub fn require_key(&self, key: &Key) -> Result<()> {
        let missing = self.missing_columns(key);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FoldwiseError::schema(format!(
                "Not all keys were found in column names of {}! Missing: {}",
                self.name,
                missing.join(", ")
            )))
        }
    }

    /// Positions of the key columns, in key order.
    pub fn key_positions(&self, key: &Key) -> Result<Vec<usize>> {
        self.require_key(key)?;
        Ok(key
            .columns()
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect())
    }

    /// Cells of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Result<Vec<&str>> {
        let index = self.column_index(name).ok_or_else(|| {
            FoldwiseError::schema(format!("column '{}' not found in {}", name, self.name))
        })?;
        Ok(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Key tuple of every row, top to bottom.
    pub fn key_tuples(&self, key: &Key) -> Result<Vec<KeyTuple>> {
        let positions = self.key_positions(key)?;
        Ok(self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&p| row[p].clone()).collect())
            .collect())
    }

    /// Rows `range` as a new table with the same columns.
    pub fn slice_rows(&self, range: Range<usize>) -> Result<Table> {
        if range.start > range.end || range.end > self.rows.len() {
            return Err(FoldwiseError::shape(
                format!("row range within 0..{}", self.rows.len()),
                format!("{:?}", range),
            ));
        }
        Ok(Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: self.rows[range].to_vec(),
        })
    }

    /// Stack `other` below this table.
    ///
    /// Columns are the union of both headers: this table's columns first,
    /// then columns only `other` has. Cells for a column a table lacks are
    /// left empty (a test table has no target, for instance).
    pub fn concat<S: Into<String>>(self, other: Table, name: S) -> Table {
        let mut columns = self.columns;
        for column in &other.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }

        let width = columns.len();
        let mut rows = Vec::with_capacity(self.rows.len() + other.rows.len());
        for mut row in self.rows {
            row.resize(width, String::new());
            rows.push(row);
        }

        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|c| columns.iter().position(|x| x == c))
            .collect();
        for row in other.rows {
            let mut aligned = vec![String::new(); width];
            for (cell, &target) in row.into_iter().zip(&mapping) {
                aligned[target] = cell;
            }
            rows.push(aligned);
        }

        Table {
            name: name.into(),
            columns,
            rows,
        }
    }
}
