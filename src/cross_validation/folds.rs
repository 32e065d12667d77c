//! Fold assignment and validation-mode selection.

use crate::core::constants::DEFAULT_FOLD_COUNT;
use crate::core::error::{FoldwiseError, Result};
use crate::core::types::{FoldId, ValidationType};
use crate::dataset::table::Table;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Fold identifier of every training row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAssignment {
    folds: Vec<FoldId>,
}

impl FoldAssignment {
    /// Use externally computed fold ids as they are.
    pub fn from_ids<I>(folds: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FoldId>,
    {
        FoldAssignment {
            folds: folds.into_iter().map(Into::into).collect(),
        }
    }

    /// Spread `n_rows` over `fold_count` folds at random.
    ///
    /// The sequence `0..fold_count` is repeated `n_rows / fold_count + 1`
    /// times, shuffled and cut to `n_rows`. When `n_rows` is small a fold can
    /// end up empty.
    pub fn assign_random<R: Rng + ?Sized>(
        n_rows: usize,
        fold_count: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if fold_count < 2 {
            return Err(FoldwiseError::config(format!(
                "fold count must be at least 2, got {}",
                fold_count
            )));
        }

        let repeats = n_rows / fold_count + 1;
        let mut folds: Vec<usize> = (0..repeats).flat_map(|_| 0..fold_count).collect();
        folds.shuffle(rng);
        folds.truncate(n_rows);

        Ok(FoldAssignment::from_ids(folds))
    }

    /// Read fold ids from `column` of `table`. Integers are used when every
    /// cell is an integer, text otherwise.
    pub fn from_column(table: &Table, column: &str) -> Result<Self> {
        if !table.has_column(column) {
            return Err(FoldwiseError::schema(format!(
                "fold column '{}' not found in {}",
                column,
                table.name()
            )));
        }
        let values = table.column_values(column)?;
        if let Some(row) = values.iter().position(|v| v.trim().is_empty()) {
            return Err(FoldwiseError::format(format!(
                "fold column '{}' of {} is empty at row {}",
                column,
                table.name(),
                row
            )));
        }
        Ok(FoldAssignment {
            folds: FoldId::parse_column(values),
        })
    }

    /// Number of assigned rows.
    pub fn len(&self) -> usize {
        self.folds.len()
    }

    /// True if no rows are assigned.
    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    /// Fold id of every row.
    pub fn folds(&self) -> &[FoldId] {
        &self.folds
    }

    /// Distinct fold ids in ascending order.
    pub fn distinct(&self) -> Vec<FoldId> {
        self.folds
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of rows per fold id.
    pub fn fold_sizes(&self) -> BTreeMap<FoldId, usize> {
        let mut sizes = BTreeMap::new();
        for fold in &self.folds {
            *sizes.entry(fold.clone()).or_insert(0) += 1;
        }
        sizes
    }

    /// Rows assigned to `fold`, ascending.
    pub fn rows_in(&self, fold: &FoldId) -> Vec<usize> {
        self.folds
            .iter()
            .enumerate()
            .filter(|(_, f)| *f == fold)
            .map(|(row, _)| row)
            .collect()
    }

    /// Rows assigned to any other fold, ascending.
    pub fn rows_not_in(&self, fold: &FoldId) -> Vec<usize> {
        self.folds
            .iter()
            .enumerate()
            .filter(|(_, f)| *f != fold)
            .map(|(row, _)| row)
            .collect()
    }

    /// Validation mode implied by the number of distinct ids.
    pub fn mode(&self) -> Result<ValidationMode> {
        ValidationMode::select(self.distinct(), ValidationType::Auto)
    }
}

/// How the training rows are validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every fold is validated once against a model trained on the others
    KFold {
        /// Distinct fold ids, ascending
        folds: Vec<FoldId>,
    },
    /// One split: train on the lower id, validate on the higher
    Holdout {
        /// Id of the training rows
        train: FoldId,
        /// Id of the validation rows
        validation: FoldId,
    },
}

impl ValidationMode {
    /// Pick a mode for the given distinct (ascending) fold ids.
    ///
    /// Two ids mean hold-out and three or more mean k-fold. A pinned
    /// validation type must agree with that.
    pub fn select(distinct: Vec<FoldId>, pinned: ValidationType) -> Result<Self> {
        if distinct.len() < 2 {
            return Err(FoldwiseError::config(format!(
                "validation needs at least two distinct fold ids, found {}",
                distinct.len()
            )));
        }

        match (pinned, distinct.len()) {
            (ValidationType::Holdout, n) if n != 2 => Err(FoldwiseError::config(format!(
                "hold-out validation needs exactly two distinct fold ids, found {}",
                n
            ))),
            (ValidationType::KFold, 2) => Err(FoldwiseError::config(
                "k-fold validation needs at least three distinct fold ids, found 2",
            )),
            (_, 2) => {
                let mut ids = distinct.into_iter();
                match (ids.next(), ids.next()) {
                    (Some(train), Some(validation)) => {
                        Ok(ValidationMode::Holdout { train, validation })
                    }
                    _ => Err(FoldwiseError::internal("expected two fold ids")),
                }
            }
            _ => Ok(ValidationMode::KFold { folds: distinct }),
        }
    }

    /// Folds that get validated, in run order.
    pub fn validation_folds(&self) -> Vec<FoldId> {
        match self {
            ValidationMode::KFold { folds } => folds.clone(),
            ValidationMode::Holdout { validation, .. } => vec![validation.clone()],
        }
    }

    /// The corresponding validation type.
    pub fn validation_type(&self) -> ValidationType {
        match self {
            ValidationMode::KFold { .. } => ValidationType::KFold,
            ValidationMode::Holdout { .. } => ValidationType::Holdout,
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::KFold { folds } => write!(f, "{}-fold", folds.len()),
            ValidationMode::Holdout { train, validation } => {
                write!(f, "hold-out (train {}, validate {})", train, validation)
            }
        }
    }
}

/// Where the fold assignment of a run comes from.
///
/// A cv index is a per-row fold id used for k-fold (or hold-out when it has
/// two values). A validation index is a per-row two-valued split. Supplying
/// neither assigns folds at random.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPlan {
    /// Externally supplied fold ids
    pub cv_index: Option<Vec<FoldId>>,
    /// Externally supplied hold-out split
    pub validation_index: Option<Vec<FoldId>>,
    /// Pinned validation type
    pub validation_type: ValidationType,
    /// Folds for random assignment
    pub fold_count: usize,
    /// Seed for random assignment; entropy when absent
    pub seed: Option<u64>,
}

impl Default for ValidationPlan {
    fn default() -> Self {
        ValidationPlan {
            cv_index: None,
            validation_index: None,
            validation_type: ValidationType::Auto,
            fold_count: DEFAULT_FOLD_COUNT,
            seed: None,
        }
    }
}

impl ValidationPlan {
    /// Random assignment over the default fold count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these fold ids.
    pub fn with_cv_index(mut self, folds: Vec<FoldId>) -> Self {
        self.cv_index = Some(folds);
        self
    }

    /// Use this hold-out split.
    pub fn with_validation_index(mut self, split: Vec<FoldId>) -> Self {
        self.validation_index = Some(split);
        self
    }

    /// Pin the validation type.
    pub fn with_validation_type(mut self, validation_type: ValidationType) -> Self {
        self.validation_type = validation_type;
        self
    }

    /// Fold count for random assignment.
    pub fn with_fold_count(mut self, fold_count: usize) -> Self {
        self.fold_count = fold_count;
        self
    }

    /// Seed random assignment.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Resolve the plan for `n_rows` training rows, drawing random folds from
    /// the configured seed (or entropy).
    pub fn resolve(&self, n_rows: usize) -> Result<(FoldAssignment, ValidationMode)> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.resolve_with_rng(n_rows, &mut rng)
    }

    /// Resolve the plan, drawing random folds from `rng`.
    pub fn resolve_with_rng<R: Rng + ?Sized>(
        &self,
        n_rows: usize,
        rng: &mut R,
    ) -> Result<(FoldAssignment, ValidationMode)> {
        let (assignment, pinned) = match (&self.cv_index, &self.validation_index) {
            (Some(_), Some(_)) => {
                return Err(FoldwiseError::config(
                    "Cannot provide both cv index and validation index!",
                ));
            }
            (Some(cv_index), None) => (FoldAssignment::from_ids(cv_index.clone()), self.validation_type),
            (None, Some(split)) => {
                if self.validation_type == ValidationType::KFold {
                    return Err(FoldwiseError::config(
                        "a validation index cannot be used for k-fold validation",
                    ));
                }
                (FoldAssignment::from_ids(split.clone()), ValidationType::Holdout)
            }
            (None, None) => (
                FoldAssignment::assign_random(n_rows, self.fold_count, rng)?,
                self.validation_type,
            ),
        };

        if assignment.len() != n_rows {
            return Err(FoldwiseError::shape(
                format!("{} fold ids", n_rows),
                format!("{} fold ids", assignment.len()),
            ));
        }

        let mode = ValidationMode::select(assignment.distinct(), pinned)?;
        log::debug!("Validation plan resolved to {} over {} rows", mode, n_rows);
        Ok((assignment, mode))
    }
}
