//! # foldwise
//!
//! A feature-engineering and cross-validation harness for tabular
//! machine-learning competitions.
//!
//! foldwise reads a training and a test table, joins any number of
//! auxiliary feature files onto them, pivots the result into a sparse
//! feature matrix and cross-validates a caller-supplied model on it. The
//! model is an external collaborator: anything implementing [`Fittable`]
//! and [`Predictor`] can be validated.
//!
//! ## Features
//!
//! - **Wide and long feature files**: wide tables carry one column per
//!   feature, long tables carry `variable`/`value` pairs. Both are validated
//!   so a feature can never be defined twice.
//! - **Sparse pivot**: features are stored as a CSR matrix (via `sprs`)
//!   aligned to the combined train + test rows. Absent entries read as zero.
//! - **k-fold and hold-out validation**: random folds, externally supplied
//!   fold or group columns, or a single two-valued split.
//! - **Out-of-fold predictions**: every training row gets a prediction from
//!   a model that did not see it; the aggregate score is computed over all of
//!   them at once.
//! - **Parallel folds**: folds can run on a Rayon worker pool, each with its
//!   own model instance.
//! - **Prediction export**: out-of-fold and final predictions are written as
//!   CSV files tagged with a per-run key.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foldwise::{
//!     metrics::rmse, FeatureMatrix, Fittable, HarnessConfigBuilder, Harness, Prediction,
//!     Predictor, Result, Target,
//! };
//! use ndarray::Array1;
//!
//! #[derive(Default)]
//! struct MeanModel(f64);
//!
//! impl Fittable for MeanModel {
//!     fn fit(&mut self, _features: &FeatureMatrix, target: &Target) -> Result<()> {
//!         self.0 = target.as_numeric().and_then(|t| t.mean()).unwrap_or(0.0);
//!         Ok(())
//!     }
//! }
//!
//! impl Predictor for MeanModel {
//!     fn predict(&self, features: &FeatureMatrix) -> Result<Prediction> {
//!         Ok(Prediction::Values(Array1::from_elem(features.rows(), self.0)))
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! foldwise::init()?;
//!
//! let config = HarnessConfigBuilder::new()
//!     .train_path("data/train.csv")
//!     .test_path("data/test.csv")
//!     .key(["store", "date"])
//!     .wide_file("features/promotions.csv")
//!     .long_file("features/weather.csv")
//!     .target_column("sales")
//!     .seed(42)
//!     .export_to("models/predictions.csv")
//!     .build()?;
//!
//! let report = Harness::new(config)?.run(&mut MeanModel::default(), rmse)?;
//! println!("cross-validated RMSE: {}", report.cv.aggregate);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: keys, fold ids, targets, predictions, errors and the model
//!   and metric traits
//! - [`config`]: file- and builder-based run configuration
//! - [`dataset`]: table loading, feature joining, pivoting and the
//!   train/test split
//! - [`cross_validation`]: fold assignment, the validator and exports
//! - [`metrics`]: multi-class log loss and regression errors
//! - [`pipeline`]: the end-to-end [`FeatureEngineering`] and [`Harness`]

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Tables, feature joining and pivoting
pub mod dataset;

// Folds, validator and exports
pub mod cross_validation;

// Error metrics
pub mod metrics;

// End-to-end pipeline
pub mod pipeline;

// Re-export core functionality for convenience
pub use crate::core::{
    constants::*,
    error::{FoldwiseError, Result},
    traits::*,
    types::*,
};

// Re-export configuration functionality
pub use config::{DataConfig, ExportConfig, HarnessConfig, HarnessConfigBuilder, ValidationConfig};

// Re-export dataset functionality
pub use dataset::{
    pivot, ColumnIndex, CsvLoader, FeatureCollection, FeatureJoiner, LabelsTable, ModelData,
    PivotResult, RowIndex, Table, TableLoader,
};

// Re-export cross-validation functionality
pub use cross_validation::{
    CrossValidator, CvReport, ExportSettings, FoldAssignment, FoldScore, OutOfFold, RunReport,
    ValidationMode, ValidationPlan,
};

// Re-export pipeline functionality
pub use pipeline::{ExtractedFeatures, FeatureEngineering, Harness, Prepared};

// Version information
pub use crate::core::constants::FOLDWISE_VERSION as VERSION;

/// Initialize logging.
///
/// Installs `env_logger` (filter `info` unless `RUST_LOG` is set). Safe to
/// call more than once. Nothing else in the crate requires it.
///
/// # Examples
///
/// ```rust
/// fn main() -> foldwise::Result<()> {
///     foldwise::init()?;
///     assert!(foldwise::is_initialized());
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    crate::core::initialize_core()
}

/// Check if [`init`] has run.
pub fn is_initialized() -> bool {
    crate::core::is_core_initialized()
}
