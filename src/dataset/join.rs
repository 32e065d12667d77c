//! Feature joining.
//!
//! Wide tables (one column per feature) and long tables (`variable` /
//! `value` pairs) are normalized into one long-format
//! [`FeatureCollection`]. The [`FeatureJoiner`] owns the collection while it
//! is being built and tracks every column name already defined, so a
//! feature can never be introduced twice.

use crate::core::constants::{VALUE_COLUMN, VARIABLE_COLUMN};
use crate::core::error::{FoldwiseError, Result};
use crate::core::types::{Key, KeyTuple};
use crate::dataset::table::Table;
use std::collections::{BTreeSet, HashSet};

/// One (observation, feature, value) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Key tuple of the observation
    pub key: KeyTuple,
    /// Feature name
    pub variable: String,
    /// Feature value
    pub value: f64,
}

/// Long-format union of every joined feature source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    records: Vec<FeatureRecord>,
    variables: Vec<String>,
}

impl FeatureCollection {
    /// All records in ingestion order.
    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    /// Distinct feature names in order of first appearance.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no records were joined.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the collection, yielding its records.
    pub fn into_records(self) -> Vec<FeatureRecord> {
        self.records
    }

    fn append(&mut self, records: Vec<FeatureRecord>, variables: Vec<String>) {
        self.records.extend(records);
        self.variables.extend(variables);
    }
}

/// Accumulates feature sources into a [`FeatureCollection`].
///
/// Every `add_*` call validates the whole source before touching the
/// collection, so a rejected source leaves the joiner exactly as it was.
#[derive(Debug, Clone)]
pub struct FeatureJoiner {
    key: Key,
    defined: HashSet<String>,
    collection: FeatureCollection,
    sources: Vec<String>,
}

impl FeatureJoiner {
    /// Start joining features onto `labels`. Its columns count as already
    /// defined, so no feature may reuse a labels column name.
    pub fn new(labels: &Table, key: Key) -> Result<Self> {
        key.validate()?;
        labels.require_key(&key)?;

        Ok(FeatureJoiner {
            defined: labels.columns().iter().cloned().collect(),
            key,
            collection: FeatureCollection::default(),
            sources: Vec::new(),
        })
    }

    /// Key the sources are joined on.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The collection built so far.
    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Names of the sources joined so far, in order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// True if `name` is a labels column or an already joined feature.
    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Finish joining.
    pub fn into_collection(self) -> FeatureCollection {
        self.collection
    }

    /// Join a wide-format table: every non-key column becomes a feature.
    ///
    /// Empty cells are skipped and read as zero after pivoting.
    pub fn add_wide(&mut self, table: &Table) -> Result<&mut Self> {
        let key_positions = self.key_positions(table)?;

        let value_columns: Vec<(usize, &String)> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| !self.key.contains(c))
            .collect();

        let colliding: BTreeSet<&str> = value_columns
            .iter()
            .filter(|(_, c)| self.defined.contains(c.as_str()))
            .map(|(_, c)| c.as_str())
            .collect();
        if !colliding.is_empty() {
            return Err(FoldwiseError::schema(format!(
                "Already defined variables are in feature {}! Colliding columns: {}",
                table.name(),
                join_names(&colliding)
            )));
        }

        if value_columns.is_empty() {
            log::warn!("Wide feature table {} has no columns besides the key", table.name());
        }

        let mut records = Vec::with_capacity(table.nrows() * value_columns.len());
        for (row_num, row) in table.rows().iter().enumerate() {
            let key: KeyTuple = key_positions.iter().map(|&p| row[p].clone()).collect();
            for &(col, name) in &value_columns {
                if let Some(value) = parse_value(&row[col], table.name(), name, row_num)? {
                    records.push(FeatureRecord {
                        key: key.clone(),
                        variable: name.clone(),
                        value,
                    });
                }
            }
        }

        let variables: Vec<String> = value_columns.iter().map(|(_, c)| (*c).clone()).collect();
        log::info!(
            "Joined wide features from {}: {} variables, {} records",
            table.name(),
            variables.len(),
            records.len()
        );
        self.commit(table.name(), records, variables);
        Ok(self)
    }

    /// Join a long-format table with exactly the key columns plus
    /// `variable` and `value`.
    pub fn add_long(&mut self, table: &Table) -> Result<&mut Self> {
        let key_positions = self.key_positions(table)?;

        let (variable_col, value_col) = match (
            table.column_index(VARIABLE_COLUMN),
            table.column_index(VALUE_COLUMN),
        ) {
            (Some(variable), Some(value)) => (variable, value),
            _ => {
                return Err(FoldwiseError::schema(format!(
                    "All long features must have columns '{}' and '{}'! Check {}",
                    VARIABLE_COLUMN,
                    VALUE_COLUMN,
                    table.name()
                )))
            }
        };

        let unexpected: Vec<&str> = table
            .columns()
            .iter()
            .filter(|c| {
                !self.key.contains(c) && c.as_str() != VARIABLE_COLUMN && c.as_str() != VALUE_COLUMN
            })
            .map(String::as_str)
            .collect();
        if !unexpected.is_empty() {
            return Err(FoldwiseError::schema(format!(
                "Unexpected columns (not keys or '{}'/'{}') in {}: {}",
                VARIABLE_COLUMN,
                VALUE_COLUMN,
                table.name(),
                unexpected.join(", ")
            )));
        }

        let colliding: BTreeSet<&str> = table
            .rows()
            .iter()
            .map(|row| row[variable_col].as_str())
            .filter(|v| self.defined.contains(*v))
            .collect();
        if !colliding.is_empty() {
            return Err(FoldwiseError::schema(format!(
                "Re-defining variables {{{}}} in feature file {}!",
                join_names(&colliding),
                table.name()
            )));
        }

        let mut records = Vec::with_capacity(table.nrows());
        let mut variables = Vec::new();
        let mut seen = HashSet::new();
        for (row_num, row) in table.rows().iter().enumerate() {
            let variable = &row[variable_col];
            if variable.is_empty() {
                return Err(FoldwiseError::schema(format!(
                    "empty '{}' at row {} of {}",
                    VARIABLE_COLUMN,
                    row_num,
                    table.name()
                )));
            }
            if seen.insert(variable.as_str()) {
                variables.push(variable.clone());
            }
            if let Some(value) = parse_value(&row[value_col], table.name(), VALUE_COLUMN, row_num)? {
                records.push(FeatureRecord {
                    key: key_positions.iter().map(|&p| row[p].clone()).collect(),
                    variable: variable.clone(),
                    value,
                });
            }
        }

        log::info!(
            "Joined long features from {}: {} variables, {} records",
            table.name(),
            variables.len(),
            records.len()
        );
        self.commit(table.name(), records, variables);
        Ok(self)
    }

    fn key_positions(&self, table: &Table) -> Result<Vec<usize>> {
        table.key_positions(&self.key)
    }

    fn commit(&mut self, source: &str, records: Vec<FeatureRecord>, variables: Vec<String>) {
        self.defined.extend(variables.iter().cloned());
        self.collection.append(records, variables);
        self.sources.push(source.to_string());
    }
}

fn join_names(names: &BTreeSet<&str>) -> String {
    names.iter().copied().collect::<Vec<_>>().join(", ")
}

fn parse_value(cell: &str, source: &str, column: &str, row: usize) -> Result<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some).map_err(|_| {
        FoldwiseError::format(format!(
            "value '{}' in column '{}' at row {} of {} is not numeric",
            cell, column, row, source
        ))
    })
}
