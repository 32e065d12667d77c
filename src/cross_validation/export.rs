//! Prediction export.
//!
//! Out-of-fold and final predictions are written as CSV files next to a
//! base path: `{base without extension}_{run key}{score}_{suffix}.csv`,
//! where the score is only part of the out-of-fold file name.

use crate::config::ExportConfig;
use crate::core::constants::{
    round_score, CV_EXPORT_SUFFIX, DEFAULT_CV_PREDICTION_COLUMN, DEFAULT_EXPORT_BASE_PATH,
    DEFAULT_ID_COLUMN, DEFAULT_PREDICTION_COLUMN, FULL_EXPORT_SUFFIX,
};
use crate::core::error::{FoldwiseError, Result};
use crate::core::types::Prediction;
use crate::cross_validation::out_of_fold::OutOfFold;
use std::fs;
use std::path::{Path, PathBuf};

/// Where and under which headers predictions are written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    /// Base path; the extension is replaced
    pub base_path: PathBuf,
    /// Header of the id column
    pub id_column: String,
    /// Header of the out-of-fold prediction column
    pub cv_prediction_column: String,
    /// Header of the final prediction column
    pub prediction_column: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            base_path: PathBuf::from(DEFAULT_EXPORT_BASE_PATH),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            cv_prediction_column: DEFAULT_CV_PREDICTION_COLUMN.to_string(),
            prediction_column: DEFAULT_PREDICTION_COLUMN.to_string(),
        }
    }
}

impl ExportSettings {
    /// Default headers under `base_path`.
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        ExportSettings {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Settings of an enabled export section, `None` when disabled.
    pub fn from_config(config: &ExportConfig) -> Option<Self> {
        config.enabled.then(|| ExportSettings {
            base_path: config.base_path.clone(),
            id_column: config.id_column.clone(),
            cv_prediction_column: config.cv_prediction_column.clone(),
            prediction_column: config.prediction_column.clone(),
        })
    }

    /// Write the out-of-fold predictions of the training rows.
    pub fn export_out_of_fold(
        &self,
        run_key: &str,
        score: f64,
        ids: &[String],
        out_of_fold: &OutOfFold,
    ) -> Result<PathBuf> {
        let path = export_path(&self.base_path, run_key, Some(score), CV_EXPORT_SUFFIX);
        let width = out_of_fold.values().map_or(1, Prediction::width);
        let probabilities = matches!(out_of_fold.values(), Some(Prediction::Probabilities(_)));
        let header = prediction_header(&self.id_column, &self.cv_prediction_column, probabilities, width);
        let rows = (0..out_of_fold.len()).map(|row| out_of_fold.row(row));

        write_rows(&path, &header, ids, rows)?;
        log::info!("Cross validation results saved in {}", path.display());
        Ok(path)
    }

    /// Write the final predictions of the test rows.
    pub fn export_final(&self, run_key: &str, ids: &[String], prediction: &Prediction) -> Result<PathBuf> {
        let path = export_path(&self.base_path, run_key, None, FULL_EXPORT_SUFFIX);
        let probabilities = matches!(prediction, Prediction::Probabilities(_));
        let header = prediction_header(
            &self.id_column,
            &self.prediction_column,
            probabilities,
            prediction.width(),
        );
        let rows = (0..prediction.nrows()).map(|row| match prediction {
            Prediction::Values(values) => Some(vec![values[row]]),
            Prediction::Probabilities(probs) => Some(probs.row(row).to_vec()),
        });

        write_rows(&path, &header, ids, rows)?;
        log::info!("Final predictions saved in {}", path.display());
        Ok(path)
    }
}

/// Export file name for a run.
pub fn export_path(base: &Path, run_key: &str, score: Option<f64>, suffix: &str) -> PathBuf {
    let stem = base.with_extension("");
    let score = score.map(|s| round_score(s).to_string()).unwrap_or_default();
    PathBuf::from(format!("{}_{}{}_{}.csv", stem.display(), run_key, score, suffix))
}

/// `[id, column]` for point predictions, `[id, column_0, .., column_k]`
/// for class probabilities.
pub fn prediction_header(id_column: &str, column: &str, probabilities: bool, width: usize) -> Vec<String> {
    let mut header = vec![id_column.to_string()];
    if probabilities {
        header.extend((0..width).map(|k| format!("{}_{}", column, k)));
    } else {
        header.push(column.to_string());
    }
    header
}

fn write_rows<I>(path: &Path, header: &[String], ids: &[String], rows: I) -> Result<()>
where
    I: ExactSizeIterator<Item = Option<Vec<f64>>>,
{
    if rows.len() != ids.len() {
        return Err(FoldwiseError::shape(
            format!("{} ids", rows.len()),
            ids.len().to_string(),
        ));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_failed(path, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| write_failed(path, e))?;
    writer.write_record(header).map_err(|e| write_failed(path, e))?;

    let blanks = header.len() - 1;
    for (id, values) in ids.iter().zip(rows) {
        let mut record = Vec::with_capacity(header.len());
        record.push(id.clone());
        match values {
            Some(values) => record.extend(values.iter().map(f64::to_string)),
            None => record.extend(std::iter::repeat(String::new()).take(blanks)),
        }
        writer.write_record(&record).map_err(|e| write_failed(path, e))?;
    }

    writer.flush().map_err(|e| write_failed(path, e))?;
    Ok(())
}

fn write_failed(path: &Path, error: impl std::fmt::Display) -> FoldwiseError {
    FoldwiseError::export(format!("cannot write {}: {}", path.display(), error))
}
