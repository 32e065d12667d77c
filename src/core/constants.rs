//! System constants and default configuration values for foldwise.

/// Library version string.
pub const FOLDWISE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of folds for random fold assignment.
pub const DEFAULT_FOLD_COUNT: usize = 4;

/// Column holding the feature name in a long-format table.
pub const VARIABLE_COLUMN: &str = "variable";

/// Column holding the feature value in a long-format table.
pub const VALUE_COLUMN: &str = "value";

/// Exclusive upper bound of each random half of a run key.
pub const RUN_KEY_RANGE: u32 = 100_000;

/// Decimal places kept when scores are reported or embedded in file names.
pub const SCORE_DECIMALS: i32 = 6;

/// Default id column name in exported prediction files.
pub const DEFAULT_ID_COLUMN: &str = "id";

/// Default prediction column name in out-of-fold exports.
pub const DEFAULT_CV_PREDICTION_COLUMN: &str = "cv_prediction";

/// Default prediction column name in final (full fit) exports.
pub const DEFAULT_PREDICTION_COLUMN: &str = "prediction";

/// Default base path for prediction exports.
pub const DEFAULT_EXPORT_BASE_PATH: &str = "models/predictions.csv";

/// Separator used to join multi-column key tuples into a single row id.
pub const KEY_ID_SEPARATOR: &str = ":";

/// File suffix of out-of-fold exports.
pub const CV_EXPORT_SUFFIX: &str = "cv";

/// File suffix of final prediction exports.
pub const FULL_EXPORT_SUFFIX: &str = "full";

/// Round a score to [`SCORE_DECIMALS`] places.
pub fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (score * factor).round() / factor
}
