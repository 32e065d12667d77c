//! Cross-validation driver.
//!
//! A [`CrossValidator`] owns a fold assignment over the training rows of a
//! [`ModelData`] and a metric. Each fold fits the model on the rows outside
//! the fold and predicts the rows inside it; the predictions are collected
//! in an [`OutOfFold`] buffer. In k-fold mode the aggregate score is computed
//! once over the complete buffer, not averaged over folds. A final pass fits
//! on every training row and predicts the test rows.

use crate::core::constants::{round_score, RUN_KEY_RANGE};
use crate::core::error::{FoldwiseError, Result};
use crate::core::traits::{Metric, Model};
use crate::core::types::{FoldId, Prediction, ValidationType};
use crate::cross_validation::export::ExportSettings;
use crate::cross_validation::folds::{FoldAssignment, ValidationMode, ValidationPlan};
use crate::cross_validation::out_of_fold::OutOfFold;
use crate::dataset::model_data::ModelData;
use crate::dataset::sparse::select_rows;
use rand::Rng;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Score of one validated fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldScore {
    /// Validated fold
    pub fold: FoldId,
    /// Metric over the fold's rows
    pub score: f64,
}

/// Everything one fold produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldOutcome {
    /// Validated fold
    pub fold: FoldId,
    /// Metric over the fold's rows
    pub score: f64,
    /// Training rows that were predicted, ascending
    pub validation_rows: Vec<usize>,
    /// One prediction row per validation row
    pub prediction: Prediction,
}

/// Result of [`CrossValidator::run`].
#[derive(Debug, Clone)]
pub struct CvReport {
    /// Mode the run used
    pub mode: ValidationMode,
    /// Per-fold scores in run order
    pub fold_scores: Vec<FoldScore>,
    /// Score over every out-of-fold prediction (the single fold's score in
    /// hold-out mode)
    pub aggregate: f64,
    /// Out-of-fold predictions of the training rows
    pub out_of_fold: OutOfFold,
}

impl CvReport {
    /// Score of `fold`, if it was validated.
    pub fn score_of(&self, fold: &FoldId) -> Option<f64> {
        self.fold_scores
            .iter()
            .find(|s| &s.fold == fold)
            .map(|s| s.score)
    }

    /// Unweighted mean of the fold scores.
    pub fn mean_fold_score(&self) -> f64 {
        if self.fold_scores.is_empty() {
            return f64::NAN;
        }
        self.fold_scores.iter().map(|s| s.score).sum::<f64>() / self.fold_scores.len() as f64
    }
}

/// Result of [`CrossValidator::evaluate`].
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Cross-validation scores and out-of-fold predictions
    pub cv: CvReport,
    /// Predictions of the test rows from a model fitted on all training rows
    pub final_prediction: Prediction,
    /// Files written, out-of-fold first
    pub exported: Vec<PathBuf>,
}

/// A random run key: two numbers below 100000 written back to back.
pub fn generate_run_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}{}",
        rng.gen_range(0..RUN_KEY_RANGE),
        rng.gen_range(0..RUN_KEY_RANGE)
    )
}

/// Runs fold-wise fit/predict cycles over one [`ModelData`].
pub struct CrossValidator<'a, Me> {
    data: &'a ModelData,
    folds: FoldAssignment,
    mode: ValidationMode,
    metric: Me,
    run_key: String,
    export: Option<ExportSettings>,
    num_threads: usize,
}

// Metrics are usually plain functions, which have no `Debug`.
impl<Me> fmt::Debug for CrossValidator<'_, Me> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossValidator")
            .field("mode", &self.mode)
            .field("run_key", &self.run_key)
            .field("n_train", &self.data.n_train())
            .field("n_test", &self.data.n_test())
            .field("export", &self.export)
            .field("num_threads", &self.num_threads)
            .finish_non_exhaustive()
    }
}

impl<'a, Me: Metric> CrossValidator<'a, Me> {
    /// Resolve `plan` over the training rows of `data`.
    pub fn new(data: &'a ModelData, plan: &ValidationPlan, metric: Me) -> Result<Self> {
        let (folds, mode) = plan.resolve(data.n_train())?;
        Self::assemble(data, folds, mode, metric)
    }

    /// Use a ready fold assignment; `pinned` must agree with its number of
    /// distinct ids unless it is `Auto`.
    pub fn from_assignment(
        data: &'a ModelData,
        folds: FoldAssignment,
        pinned: ValidationType,
        metric: Me,
    ) -> Result<Self> {
        if folds.len() != data.n_train() {
            return Err(FoldwiseError::shape(
                format!("{} fold ids", data.n_train()),
                folds.len().to_string(),
            ));
        }
        let mode = ValidationMode::select(folds.distinct(), pinned)?;
        Self::assemble(data, folds, mode, metric)
    }

    fn assemble(
        data: &'a ModelData,
        folds: FoldAssignment,
        mode: ValidationMode,
        metric: Me,
    ) -> Result<Self> {
        let run_key = generate_run_key(&mut rand::thread_rng());
        log::info!(
            "Cross validator {}: {} over {} training rows, {} test rows",
            run_key,
            mode,
            data.n_train(),
            data.n_test()
        );

        Ok(CrossValidator {
            data,
            folds,
            mode,
            metric,
            run_key,
            export: None,
            num_threads: 0,
        })
    }

    /// Replace the random run key.
    pub fn with_run_key<S: Into<String>>(mut self, run_key: S) -> Self {
        self.run_key = run_key.into();
        self
    }

    /// Export predictions after [`evaluate`](Self::evaluate) succeeds.
    pub fn with_export(mut self, settings: ExportSettings) -> Self {
        self.export = Some(settings);
        self
    }

    /// Worker threads for [`run_parallel`](Self::run_parallel); 0 means one
    /// per CPU.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Key embedded in export file names.
    pub fn run_key(&self) -> &str {
        &self.run_key
    }

    /// Fold of every training row.
    pub fn folds(&self) -> &FoldAssignment {
        &self.folds
    }

    /// Selected validation mode.
    pub fn mode(&self) -> &ValidationMode {
        &self.mode
    }

    /// Data being validated.
    pub fn data(&self) -> &ModelData {
        self.data
    }

    /// Fit on the rows outside `fold`, predict and score the rows inside it.
    /// Nothing is recorded.
    pub fn evaluate_fold<M: Model + ?Sized>(&self, model: &mut M, fold: &FoldId) -> Result<FoldOutcome> {
        let validation_rows = self.folds.rows_in(fold);
        let train_rows = self.folds.rows_not_in(fold);
        if validation_rows.is_empty() {
            return Err(FoldwiseError::config(format!("fold {} has no rows", fold)));
        }
        if train_rows.is_empty() {
            return Err(FoldwiseError::config(format!(
                "fold {} leaves no training rows",
                fold
            )));
        }

        let x_train = select_rows(&self.data.train, &train_rows)?;
        let y_train = self.data.target.select(&train_rows);
        let x_valid = select_rows(&self.data.train, &validation_rows)?;
        let y_valid = self.data.target.select(&validation_rows);

        log::debug!(
            "Fold {}: fitting on {} rows, validating on {}",
            fold,
            train_rows.len(),
            validation_rows.len()
        );
        model.fit(&x_train, &y_train).map_err(|e| {
            log::error!("Fitting failed for fold {}: {}", fold, e);
            e
        })?;
        let prediction = model.predict(&x_valid).map_err(|e| {
            log::error!("Prediction failed for fold {}: {}", fold, e);
            e
        })?;

        if prediction.nrows() != validation_rows.len() {
            return Err(FoldwiseError::shape(
                format!("{} predictions for fold {}", validation_rows.len(), fold),
                prediction.nrows().to_string(),
            ));
        }

        let score = self.metric.evaluate(&y_valid, &prediction)?;
        Ok(FoldOutcome {
            fold: fold.clone(),
            score,
            validation_rows,
            prediction,
        })
    }

    /// Validate `fold` and store its predictions in `out_of_fold`.
    pub fn run_fold<M: Model + ?Sized>(
        &self,
        model: &mut M,
        fold: &FoldId,
        out_of_fold: &mut OutOfFold,
    ) -> Result<f64> {
        let outcome = self.evaluate_fold(model, fold)?;
        self.record(outcome, out_of_fold)
    }

    fn record(&self, outcome: FoldOutcome, out_of_fold: &mut OutOfFold) -> Result<f64> {
        out_of_fold.write(&outcome.fold, &outcome.validation_rows, &outcome.prediction)?;
        log::info!("Error for fold {} was: {}", outcome.fold, round_score(outcome.score));
        Ok(outcome.score)
    }

    /// Validate every fold of the selected mode with one model instance.
    pub fn run<M: Model + ?Sized>(&self, model: &mut M) -> Result<CvReport> {
        let mut out_of_fold = OutOfFold::new(self.data.n_train());
        let mut fold_scores = Vec::new();

        for fold in self.mode.validation_folds() {
            let score = self.run_fold(model, &fold, &mut out_of_fold)?;
            fold_scores.push(FoldScore { fold, score });
        }

        self.summarize(fold_scores, out_of_fold)
    }

    /// Validate folds on a worker pool, each with a fresh model from
    /// `factory`. Produces the same report as [`run`](Self::run) for a
    /// deterministic model.
    pub fn run_parallel<M, F>(&self, factory: F) -> Result<CvReport>
    where
        M: Model,
        F: Fn() -> M + Sync,
        Me: Sync,
    {
        let threads = if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| FoldwiseError::internal(format!("Failed to create thread pool: {}", e)))?;

        let folds = self.mode.validation_folds();
        log::debug!("Running {} folds on {} threads", folds.len(), threads);
        let outcomes = pool.install(|| {
            folds
                .par_iter()
                .map(|fold| {
                    let mut model = factory();
                    self.evaluate_fold(&mut model, fold)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut out_of_fold = OutOfFold::new(self.data.n_train());
        let mut fold_scores = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let fold = outcome.fold.clone();
            let score = self.record(outcome, &mut out_of_fold)?;
            fold_scores.push(FoldScore { fold, score });
        }

        self.summarize(fold_scores, out_of_fold)
    }

    fn summarize(&self, fold_scores: Vec<FoldScore>, out_of_fold: OutOfFold) -> Result<CvReport> {
        let aggregate = match &self.mode {
            ValidationMode::KFold { .. } => {
                let prediction = out_of_fold.to_prediction()?;
                self.metric.evaluate(&self.data.target, &prediction)?
            }
            ValidationMode::Holdout { .. } => fold_scores
                .first()
                .map(|s| s.score)
                .ok_or_else(|| FoldwiseError::internal("hold-out run produced no score"))?,
        };
        log::info!("Error was: {}", round_score(aggregate));

        Ok(CvReport {
            mode: self.mode.clone(),
            fold_scores,
            aggregate,
            out_of_fold,
        })
    }

    /// Fit on every training row and predict the test rows.
    pub fn run_final<M: Model + ?Sized>(&self, model: &mut M) -> Result<Prediction> {
        model.fit(&self.data.train, &self.data.target)?;
        let prediction = model.predict(&self.data.test)?;
        if prediction.nrows() != self.data.n_test() {
            return Err(FoldwiseError::shape(
                format!("{} test predictions", self.data.n_test()),
                prediction.nrows().to_string(),
            ));
        }
        log::info!("Final model predicted {} test rows", prediction.nrows());
        Ok(prediction)
    }

    /// [`run`](Self::run), then [`run_final`](Self::run_final), then export.
    /// Files are written only when both passes succeeded.
    pub fn evaluate<M: Model + ?Sized>(&self, model: &mut M) -> Result<RunReport> {
        let cv = self.run(model)?;
        let final_prediction = self.run_final(model)?;
        self.finish(cv, final_prediction)
    }

    /// [`run_parallel`](Self::run_parallel), then a final pass with one more
    /// model from `factory`, then export.
    pub fn evaluate_parallel<M, F>(&self, factory: F) -> Result<RunReport>
    where
        M: Model,
        F: Fn() -> M + Sync,
        Me: Sync,
    {
        let cv = self.run_parallel(&factory)?;
        let mut model = factory();
        let final_prediction = self.run_final(&mut model)?;
        self.finish(cv, final_prediction)
    }

    fn finish(&self, cv: CvReport, final_prediction: Prediction) -> Result<RunReport> {
        let mut exported = Vec::new();
        if let Some(settings) = &self.export {
            let cv_path = settings.export_out_of_fold(
                &self.run_key,
                cv.aggregate,
                &self.data.train_ids,
                &cv.out_of_fold,
            )?;
            let full_path = match settings.export_final(
                &self.run_key,
                &self.data.test_ids,
                &final_prediction,
            ) {
                Ok(path) => path,
                Err(e) => {
                    if let Err(remove) = fs::remove_file(&cv_path) {
                        log::warn!("Could not remove {}: {}", cv_path.display(), remove);
                    }
                    return Err(e);
                }
            };
            exported.push(cv_path);
            exported.push(full_path);
        }

        Ok(RunReport {
            cv,
            final_prediction,
            exported,
        })
    }
}
