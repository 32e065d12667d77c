//! Table loading.
//!
//! [`TableLoader`] reads a single table; [`TableLoader::load_train_test`]
//! reads the training and test tables, checks both carry the key and stacks
//! them into one [`LabelsTable`] whose row order defines the rows of the
//! feature matrix.

pub mod csv;
#[cfg(feature = "polars")]
#[cfg_attr(docsrs, doc(cfg(feature = "polars")))]
pub mod polars;

pub use self::csv::{CsvConfig, CsvLoader};

use crate::core::error::Result;
use crate::core::types::Key;
use crate::dataset::table::Table;
use std::ops::Range;
use std::path::Path;

/// Reads tables from a tabular source.
pub trait TableLoader {
    /// Load one table. Fails with a format error when the source cannot be
    /// parsed as a table.
    fn load<P: AsRef<Path>>(&self, path: P) -> Result<Table>;

    /// Load the training and test tables and stack them, training rows
    /// first. Fails with a schema error when either lacks a key column.
    fn load_train_test<P, Q>(&self, train_path: P, test_path: Q, key: &Key) -> Result<LabelsTable>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let train = self.load(train_path)?;
        let test = self.load(test_path)?;
        LabelsTable::from_parts(train, test, key)
    }
}

/// Training rows stacked over test rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelsTable {
    table: Table,
    n_train: usize,
}

impl LabelsTable {
    /// Stack `train` over `test` after checking both carry every key column.
    pub fn from_parts(train: Table, test: Table, key: &Key) -> Result<Self> {
        train.require_key(key)?;
        test.require_key(key)?;

        let n_train = train.nrows();
        let name = format!("{} + {}", train.name(), test.name());
        let table = train.concat(test, name);
        log::debug!(
            "Combined labels table: {} training rows, {} test rows, {} columns",
            n_train,
            table.nrows() - n_train,
            table.ncols()
        );

        Ok(LabelsTable { table, n_train })
    }

    /// The combined table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Number of leading training rows.
    pub fn n_train(&self) -> usize {
        self.n_train
    }

    /// Number of trailing test rows.
    pub fn n_test(&self) -> usize {
        self.table.nrows() - self.n_train
    }

    /// Row range of the training rows.
    pub fn train_rows(&self) -> Range<usize> {
        0..self.n_train
    }

    /// Row range of the test rows.
    pub fn test_rows(&self) -> Range<usize> {
        self.n_train..self.table.nrows()
    }

    /// The training rows as their own table.
    pub fn train_table(&self) -> Result<Table> {
        self.table.slice_rows(self.train_rows())
    }
}
