//! CSV table loader.
//!
//! Inputs are comma-delimited with a header row and standard CSV quoting.
//! Cells are kept as text; see [`crate::dataset::table`].

use crate::core::error::{FoldwiseError, Result};
use crate::dataset::table::Table;
use super::TableLoader;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Field delimiter of every input table.
pub const CSV_DELIMITER: u8 = b',';

/// CSV-specific configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CsvConfig {
    /// Quote character
    pub quote_char: char,
    /// Trim whitespace around fields
    pub trim: bool,
    /// Maximum number of data rows to read
    pub max_rows: Option<usize>,
    /// Buffer size for reading
    pub buffer_size: usize,
}

impl Default for CsvConfig {
    fn default() -> Self {
        CsvConfig {
            quote_char: '"',
            trim: true,
            max_rows: None,
            buffer_size: 8192,
        }
    }
}

/// CSV table loader
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    csv_config: CsvConfig,
}

impl CsvLoader {
    /// Create a new CSV loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create CSV loader with custom configuration
    pub fn with_csv_config(mut self, csv_config: CsvConfig) -> Self {
        self.csv_config = csv_config;
        self
    }

    /// Set quote character
    pub fn with_quote_char(mut self, quote_char: char) -> Self {
        self.csv_config.quote_char = quote_char;
        self
    }

    /// Set maximum rows to read
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.csv_config.max_rows = Some(max_rows);
        self
    }

    /// CSV settings in use
    pub fn csv_config(&self) -> &CsvConfig {
        &self.csv_config
    }

    /// Load a CSV file
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        let path = path.as_ref();
        log::debug!("Loading CSV file: {}", path.display());

        if !path.is_file() {
            return Err(FoldwiseError::format(format!(
                "File does not exist or is not a file: {}",
                path.display()
            )));
        }

        let file = File::open(path)?;

        let table = self.read_table(file, &path.display().to_string())?;
        log::info!(
            "Loaded {} rows with {} columns from {}",
            table.nrows(),
            table.ncols(),
            path.display()
        );
        Ok(table)
    }

    /// Read a table from any reader; `name` is used in error messages
    pub fn read_table<R: Read>(&self, reader: R, name: &str) -> Result<Table> {
        let trim = if self.csv_config.trim {
            csv::Trim::All
        } else {
            csv::Trim::None
        };
        let mut reader = ReaderBuilder::new()
            .delimiter(CSV_DELIMITER)
            .quote(self.csv_config.quote_char as u8)
            .has_headers(true)
            .flexible(false)
            .trim(trim)
            .buffer_capacity(self.csv_config.buffer_size)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| FoldwiseError::format(format!("Failed to read headers of {}: {}", name, e)))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(FoldwiseError::format(format!("{} has no header row", name)));
        }

        let mut rows = Vec::new();
        for (line_num, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                FoldwiseError::format(format!(
                    "CSV parsing error in {} at line {}: {}",
                    name,
                    line_num + 2,
                    e
                ))
            })?;
            rows.push(record.iter().map(str::to_string).collect());

            if let Some(max_rows) = self.csv_config.max_rows {
                if rows.len() >= max_rows {
                    log::info!("Reached max_rows limit of {}, stopping", max_rows);
                    break;
                }
            }
        }

        Table::new(name, headers, rows)
    }
}

impl TableLoader for CsvLoader {
    fn load<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        self.load_csv(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_csv_loader_basic() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "device_id,brand").unwrap();
        writeln!(temp_file, "d1,3").unwrap();
        writeln!(temp_file, "\"d,2\", 5 ").unwrap();

        let table = CsvLoader::new().load(temp_file.path()).unwrap();
        assert_eq!(table.columns(), &["device_id".to_string(), "brand".to_string()]);
        assert_eq!(table.nrows(), 2);
        assert_eq!(table.rows()[1], vec!["d,2".to_string(), "5".to_string()]);
    }

    #[test]
    fn test_ragged_rows_are_format_errors() {
        let data = "a,b\n1,2\n3\n";
        let err = CsvLoader::new()
            .read_table(data.as_bytes(), "ragged.csv")
            .unwrap_err();
        assert_eq!(err.category(), "format");
        assert!(err.to_string().contains("ragged.csv"));
    }

    #[test]
    fn test_missing_file_is_format_error() {
        let err = CsvLoader::new().load("/definitely/not/here.csv").unwrap_err();
        assert_eq!(err.category(), "format");
    }

    #[test]
    fn test_max_rows() {
        let data = "a\n1\n2\n3\n";
        let table = CsvLoader::new()
            .with_max_rows(2)
            .read_table(data.as_bytes(), "t")
            .unwrap();
        assert_eq!(table.nrows(), 2);
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let table = CsvLoader::new()
            .read_table("device_id,brand\n".as_bytes(), "t")
            .unwrap();
        assert_eq!(table.nrows(), 0);
        assert_eq!(table.ncols(), 2);
    }
}
