//! Polars DataFrame interop.
//!
//! Lets a caller that already holds a `DataFrame` feed it to the feature
//! joiner without going through CSV. Every column is cast to text, nulls
//! become empty cells.

use crate::core::error::{FoldwiseError, Result};
use crate::dataset::table::Table;
use polars::prelude::*;

/// Convert a DataFrame into a [`Table`] named `name`.
pub fn table_from_dataframe(df: &DataFrame, name: &str) -> Result<Table> {
    log::debug!("Converting DataFrame with shape {:?} into table {}", df.shape(), name);

    let columns: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|c| c.to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(columns.len());
    for column in df.get_columns() {
        let text = column.cast(&DataType::String).map_err(|e| {
            FoldwiseError::format(format!(
                "column '{}' of {} cannot be read as text: {}",
                column.name(),
                name,
                e
            ))
        })?;
        let values = text.str().map_err(|e| {
            FoldwiseError::format(format!("column '{}' of {}: {}", column.name(), name, e))
        })?;
        cells.push(
            values
                .into_iter()
                .map(|v| v.map(str::to_string).unwrap_or_default())
                .collect(),
        );
    }

    let rows = (0..df.height())
        .map(|r| cells.iter().map(|column| column[r].clone()).collect())
        .collect();

    Table::new(name, columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataframe_conversion() {
        let df = df!(
            "device_id" => &["d1", "d2"],
            "brand" => &[Some(3i64), None],
        )
        .unwrap();

        let table = table_from_dataframe(&df, "frame").unwrap();
        assert_eq!(table.columns(), &["device_id".to_string(), "brand".to_string()]);
        assert_eq!(table.rows()[0], vec!["d1".to_string(), "3".to_string()]);
        assert_eq!(table.rows()[1][1], "");
    }
}
