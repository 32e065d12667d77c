//! Harness configuration structures and builder.
//!
//! A [`HarnessConfig`] names the input files, the validation strategy and
//! where predictions are exported. It can be built in code through
//! [`HarnessConfigBuilder`], read from a `.json` or `.toml` file, and
//! adjusted from `FOLDWISE_*` environment variables.

use crate::core::constants::*;
use crate::core::error::{FoldwiseError, Result};
use crate::core::types::{one_or_many, Key, TargetKind, ValidationType};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input files and column roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Training table (must contain the key and target columns)
    pub train_path: PathBuf,
    /// Test table (must contain the key columns)
    pub test_path: PathBuf,
    /// Columns identifying one observation across all files
    pub key: Key,
    /// Wide-format feature files, joined in order
    #[serde(deserialize_with = "one_or_many")]
    pub wide_files: Vec<PathBuf>,
    /// Long-format feature files, joined in order after the wide files
    #[serde(deserialize_with = "one_or_many")]
    pub long_files: Vec<PathBuf>,
    /// Target column of the training table
    pub target_column: String,
    /// Column of the training table holding externally assigned folds
    pub fold_column: Option<String>,
    /// How to interpret the target column
    pub target_kind: TargetKind,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            train_path: PathBuf::from("train.csv"),
            test_path: PathBuf::from("test.csv"),
            key: Key::from("id"),
            wide_files: Vec::new(),
            long_files: Vec::new(),
            target_column: "target".to_string(),
            fold_column: None,
            target_kind: TargetKind::Auto,
        }
    }
}

/// Cross-validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Validation strategy; `auto` follows the number of distinct folds
    #[serde(rename = "type")]
    pub validation_type: ValidationType,
    /// Number of folds for random assignment
    pub fold_count: usize,
    /// Seed for random fold assignment (unseeded when absent)
    pub seed: Option<u64>,
    /// Evaluate folds on a worker pool
    pub parallel: bool,
    /// Worker threads for parallel folds (0 = one per CPU)
    pub num_threads: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            validation_type: ValidationType::Auto,
            fold_count: DEFAULT_FOLD_COUNT,
            seed: None,
            parallel: false,
            num_threads: 0,
        }
    }
}

impl ValidationConfig {
    /// Worker threads to use, resolving 0 to the CPU count.
    pub fn effective_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }
}

/// Prediction export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write prediction files after a successful run
    pub enabled: bool,
    /// Base path; its extension is dropped and run key, score and suffix appended
    pub base_path: PathBuf,
    /// Header of the row id column
    pub id_column: String,
    /// Header of the out-of-fold prediction column
    pub cv_prediction_column: String,
    /// Header of the final prediction column
    pub prediction_column: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            enabled: false,
            base_path: PathBuf::from(DEFAULT_EXPORT_BASE_PATH),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            cv_prediction_column: DEFAULT_CV_PREDICTION_COLUMN.to_string(),
            prediction_column: DEFAULT_PREDICTION_COLUMN.to_string(),
        }
    }
}

/// Complete harness configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Input files and column roles
    pub data: DataConfig,
    /// Cross-validation settings
    pub validation: ValidationConfig,
    /// Prediction export settings
    pub export: ExportConfig,
}

impl HarnessConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.data.key.validate()?;

        if self.data.target_column.trim().is_empty() {
            return Err(FoldwiseError::config("target_column must not be empty"));
        }
        if self.data.key.contains(&self.data.target_column) {
            return Err(FoldwiseError::config(format!(
                "target column '{}' is also a key column",
                self.data.target_column
            )));
        }

        if self.validation.fold_count < 2 {
            return Err(FoldwiseError::config(format!(
                "fold_count must be at least 2, got {}",
                self.validation.fold_count
            )));
        }

        let random_folds = self.data.fold_column.is_none();
        match self.validation.validation_type {
            ValidationType::Holdout if random_folds && self.validation.fold_count != 2 => {
                return Err(FoldwiseError::config(format!(
                    "holdout validation with random folds needs fold_count = 2, got {}",
                    self.validation.fold_count
                )));
            }
            ValidationType::KFold if random_folds && self.validation.fold_count < 3 => {
                return Err(FoldwiseError::config(format!(
                    "kfold validation with random folds needs fold_count >= 3, got {}",
                    self.validation.fold_count
                )));
            }
            _ => {}
        }

        let export = &self.export;
        for (name, value) in [
            ("id_column", &export.id_column),
            ("cv_prediction_column", &export.cv_prediction_column),
            ("prediction_column", &export.prediction_column),
        ] {
            if value.trim().is_empty() {
                return Err(FoldwiseError::config(format!("export.{} must not be empty", name)));
            }
        }
        if export.id_column == export.cv_prediction_column
            || export.id_column == export.prediction_column
        {
            return Err(FoldwiseError::config(
                "export id column must differ from the prediction columns",
            ));
        }

        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config: HarnessConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            Some("toml") => toml::from_str(&std::fs::read_to_string(path)?)?,
            _ => {
                return Err(FoldwiseError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| FoldwiseError::config(format!("Failed to serialize to TOML: {}", e)))?,
            _ => {
                return Err(FoldwiseError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Apply `FOLDWISE_*` environment variable overrides
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup.
    ///
    /// Recognized names: `FOLDWISE_FOLD_COUNT`, `FOLDWISE_SEED`,
    /// `FOLDWISE_VALIDATION` and `FOLDWISE_EXPORT`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FOLDWISE_FOLD_COUNT") {
            self.validation.fold_count = val
                .trim()
                .parse()
                .map_err(|_| FoldwiseError::config("Invalid FOLDWISE_FOLD_COUNT"))?;
        }

        if let Some(val) = lookup("FOLDWISE_SEED") {
            self.validation.seed = Some(
                val.trim()
                    .parse()
                    .map_err(|_| FoldwiseError::config("Invalid FOLDWISE_SEED"))?,
            );
        }

        if let Some(val) = lookup("FOLDWISE_VALIDATION") {
            self.validation.validation_type = val.parse()?;
        }

        if let Some(val) = lookup("FOLDWISE_EXPORT") {
            self.export.enabled = match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(FoldwiseError::config("Invalid FOLDWISE_EXPORT")),
            };
        }

        self.validate()
    }
}

/// Builder for [`HarnessConfig`].
///
/// Invalid values are collected and reported together by [`build`](Self::build).
#[derive(Debug)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
    validation_errors: Vec<String>,
}

impl HarnessConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        HarnessConfigBuilder {
            config: HarnessConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the training table path
    pub fn train_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.data.train_path = path.into();
        self
    }

    /// Set the test table path
    pub fn test_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.data.test_path = path.into();
        self
    }

    /// Set the key columns
    pub fn key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match Key::new(columns) {
            Ok(key) => self.config.data.key = key,
            Err(e) => self.validation_errors.push(e.to_string()),
        }
        self
    }

    /// Add a wide-format feature file
    pub fn wide_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.data.wide_files.push(path.into());
        self
    }

    /// Add a long-format feature file
    pub fn long_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.data.long_files.push(path.into());
        self
    }

    /// Set the target column
    pub fn target_column<S: Into<String>>(mut self, column: S) -> Self {
        self.config.data.target_column = column.into();
        self
    }

    /// Set the target interpretation
    pub fn target_kind(mut self, kind: TargetKind) -> Self {
        self.config.data.target_kind = kind;
        self
    }

    /// Read fold assignments from a column of the training table
    pub fn fold_column<S: Into<String>>(mut self, column: S) -> Self {
        self.config.data.fold_column = Some(column.into());
        self
    }

    /// Set the validation strategy
    pub fn validation_type(mut self, validation_type: ValidationType) -> Self {
        self.config.validation.validation_type = validation_type;
        self
    }

    /// Set the number of random folds
    pub fn fold_count(mut self, folds: usize) -> Self {
        if folds < 2 {
            self.validation_errors
                .push("fold_count must be at least 2".to_string());
        }
        self.config.validation.fold_count = folds;
        self
    }

    /// Seed the random fold assignment
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.validation.seed = Some(seed);
        self
    }

    /// Evaluate folds in parallel on `num_threads` workers (0 = one per CPU)
    pub fn parallel(mut self, num_threads: usize) -> Self {
        self.config.validation.parallel = true;
        self.config.validation.num_threads = num_threads;
        self
    }

    /// Enable prediction export under the given base path
    pub fn export_to<P: Into<PathBuf>>(mut self, base_path: P) -> Self {
        self.config.export.enabled = true;
        self.config.export.base_path = base_path.into();
        self
    }

    /// Set the id column header of exported files
    pub fn id_column<S: Into<String>>(mut self, column: S) -> Self {
        self.config.export.id_column = column.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<HarnessConfig> {
        if !self.validation_errors.is_empty() {
            return Err(FoldwiseError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for HarnessConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
