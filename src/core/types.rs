//! Core data types for foldwise.
//!
//! Keys, fold identifiers, training targets and model predictions. These are
//! the values that flow between the dataset side (loading, joining,
//! pivoting) and the cross-validation side of the crate.

use crate::core::error::{FoldwiseError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Values of the key columns for one observation, in key order.
pub type KeyTuple = Vec<String>;

/// Sparse feature matrix handed to models: rows are observations, columns
/// are features, absent entries read as zero.
pub type FeatureMatrix = sprs::CsMat<f64>;

/// Accept either a single value or a list of values.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Ordered column names whose joint values identify one observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(#[serde(deserialize_with = "one_or_many")] Vec<String>);

impl Key {
    /// Create a key from column names. Fails on an empty or repeated list.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = Key(columns.into_iter().map(Into::into).collect());
        key.validate()?;
        Ok(key)
    }

    /// Check that the key names at least one column and no column twice.
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(FoldwiseError::config("key must name at least one column"));
        }
        for (i, column) in self.0.iter().enumerate() {
            if self.0[..i].contains(column) {
                return Err(FoldwiseError::config(format!(
                    "key column '{}' listed more than once",
                    column
                )));
            }
        }
        Ok(())
    }

    /// Key column names in order.
    pub fn columns(&self) -> &[String] {
        &self.0
    }

    /// Number of key columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the key names no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `column` is one of the key columns.
    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }
}

impl From<&str> for Key {
    fn from(column: &str) -> Self {
        Key(vec![column.to_string()])
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Identifier of the fold a training row belongs to.
///
/// Integer identifiers order numerically, anything else (date buckets,
/// group keys) orders lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FoldId {
    /// Small integer fold number
    Int(i64),
    /// Externally supplied group or bucket label
    Text(String),
}

impl FoldId {
    /// Parse a whole column of raw fold values. Integers are used only when
    /// every value is written in canonical form (`"7"`, not `"07"` or
    /// `"+7"`), so distinct labels stay distinct and a column never mixes
    /// the two variants.
    pub fn parse_column<'a, I>(values: I) -> Vec<FoldId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let raw: Vec<&str> = values.into_iter().map(str::trim).collect();
        let ints: Option<Vec<i64>> = raw
            .iter()
            .map(|v| v.parse::<i64>().ok().filter(|n| n.to_string() == *v))
            .collect();
        match ints {
            Some(ints) => ints.into_iter().map(FoldId::Int).collect(),
            None => raw.into_iter().map(|v| FoldId::Text(v.to_string())).collect(),
        }
    }
}

impl From<i64> for FoldId {
    fn from(value: i64) -> Self {
        FoldId::Int(value)
    }
}

impl From<usize> for FoldId {
    fn from(value: usize) -> Self {
        FoldId::Int(value as i64)
    }
}

impl From<&str> for FoldId {
    fn from(value: &str) -> Self {
        FoldId::Text(value.to_string())
    }
}

impl fmt::Display for FoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoldId::Int(v) => write!(f, "{}", v),
            FoldId::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Requested validation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationType {
    /// Pick k-fold or hold-out from the number of distinct fold ids
    #[default]
    Auto,
    /// One pass per distinct fold id
    KFold,
    /// A single train/validation split
    Holdout,
}

impl FromStr for ValidationType {
    type Err = FoldwiseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ValidationType::Auto),
            "kfold" | "cross_validation" => Ok(ValidationType::KFold),
            "holdout" | "single_validation" | "validation" => Ok(ValidationType::Holdout),
            other => Err(FoldwiseError::config(format!(
                "Validation type {} not yet implemented!",
                other
            ))),
        }
    }
}

impl fmt::Display for ValidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationType::Auto => write!(f, "auto"),
            ValidationType::KFold => write!(f, "kfold"),
            ValidationType::Holdout => write!(f, "holdout"),
        }
    }
}

/// How the target column is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Numeric when every value parses as a number, categorical otherwise
    #[default]
    Auto,
    /// Regression-style numeric target
    Numeric,
    /// Class labels
    Categorical,
}

/// Training labels.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Numeric target values
    Numeric(Array1<f64>),
    /// Class labels
    Categorical(Vec<String>),
}

impl Target {
    /// Build a target from raw cell values.
    pub fn from_raw<S: AsRef<str>>(values: &[S], kind: TargetKind) -> Result<Self> {
        let parsed: Option<Vec<f64>> = values
            .iter()
            .map(|v| v.as_ref().trim().parse::<f64>().ok())
            .collect();

        match (kind, parsed) {
            (TargetKind::Categorical, _) | (TargetKind::Auto, None) => Ok(Target::Categorical(
                values.iter().map(|v| v.as_ref().trim().to_string()).collect(),
            )),
            (_, Some(numbers)) => Ok(Target::Numeric(Array1::from_vec(numbers))),
            (TargetKind::Numeric, None) => {
                let bad = values
                    .iter()
                    .position(|v| v.as_ref().trim().parse::<f64>().is_err())
                    .unwrap_or(0);
                Err(FoldwiseError::format(format!(
                    "target value '{}' at row {} is not numeric",
                    values[bad].as_ref(),
                    bad
                )))
            }
        }
    }

    /// Number of labelled rows.
    pub fn len(&self) -> usize {
        match self {
            Target::Numeric(values) => values.len(),
            Target::Categorical(values) => values.len(),
        }
    }

    /// True if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels of the given rows, in the given order.
    pub fn select(&self, rows: &[usize]) -> Target {
        match self {
            Target::Numeric(values) => Target::Numeric(values.select(Axis(0), rows)),
            Target::Categorical(values) => {
                Target::Categorical(rows.iter().map(|&r| values[r].clone()).collect())
            }
        }
    }

    /// Numeric values, if this is a numeric target.
    pub fn as_numeric(&self) -> Option<&Array1<f64>> {
        match self {
            Target::Numeric(values) => Some(values),
            Target::Categorical(_) => None,
        }
    }

    /// Position of each row's label among the sorted distinct labels,
    /// together with the number of distinct labels.
    pub fn class_indices(&self) -> (usize, Vec<usize>) {
        match self {
            Target::Numeric(values) => {
                let mut classes: Vec<f64> = values.to_vec();
                classes.sort_by(|a, b| a.total_cmp(b));
                classes.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
                let indices = values
                    .iter()
                    .map(|v| classes.partition_point(|c| c.total_cmp(v) == Ordering::Less))
                    .collect();
                (classes.len(), indices)
            }
            Target::Categorical(values) => {
                let mut classes: Vec<&str> = values.iter().map(String::as_str).collect();
                classes.sort_unstable();
                classes.dedup();
                let indices = values
                    .iter()
                    .map(|v| classes.partition_point(|c| *c < v.as_str()))
                    .collect();
                (classes.len(), indices)
            }
        }
    }
}

/// Model output for a set of rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// One value per row (regression or point classification)
    Values(Array1<f64>),
    /// One row per observation, one column per class
    Probabilities(Array2<f64>),
}

impl Prediction {
    /// Number of predicted rows.
    pub fn nrows(&self) -> usize {
        match self {
            Prediction::Values(values) => values.len(),
            Prediction::Probabilities(matrix) => matrix.nrows(),
        }
    }

    /// Number of values per row (1 for point predictions).
    pub fn width(&self) -> usize {
        match self {
            Prediction::Values(_) => 1,
            Prediction::Probabilities(matrix) => matrix.ncols(),
        }
    }

    /// Predictions of the given rows, in the given order.
    pub fn select(&self, rows: &[usize]) -> Prediction {
        match self {
            Prediction::Values(values) => Prediction::Values(values.select(Axis(0), rows)),
            Prediction::Probabilities(matrix) => {
                Prediction::Probabilities(matrix.select(Axis(0), rows))
            }
        }
    }

    /// Point values, if this is a vector prediction.
    pub fn as_values(&self) -> Option<&Array1<f64>> {
        match self {
            Prediction::Values(values) => Some(values),
            Prediction::Probabilities(_) => None,
        }
    }

    /// Probability matrix, if this is a class-probability prediction.
    pub fn as_probabilities(&self) -> Option<&Array2<f64>> {
        match self {
            Prediction::Values(_) => None,
            Prediction::Probabilities(matrix) => Some(matrix),
        }
    }
}
