//! Regression metrics.

use crate::core::error::{FoldwiseError, Result};
use crate::core::types::{Prediction, Target};
use ndarray::Array1;

fn paired<'a>(actual: &'a Target, predicted: &'a Prediction) -> Result<(&'a Array1<f64>, &'a Array1<f64>)> {
    let targets = actual
        .as_numeric()
        .ok_or_else(|| FoldwiseError::metric("regression metrics need a numeric target"))?;
    let predictions = predicted.as_values().ok_or_else(|| {
        FoldwiseError::shape("a vector of point predictions", "a class probability matrix")
    })?;

    if targets.is_empty() {
        return Err(FoldwiseError::metric("no rows to score"));
    }
    if targets.len() != predictions.len() {
        return Err(FoldwiseError::shape(
            format!("{} predictions", targets.len()),
            predictions.len().to_string(),
        ));
    }
    Ok((targets, predictions))
}

/// Mean squared error.
pub fn mean_squared_error(actual: &Target, predicted: &Prediction) -> Result<f64> {
    let (targets, predictions) = paired(actual, predicted)?;
    let sum = predictions
        .iter()
        .zip(targets.iter())
        .map(|(&pred, &target)| (pred - target).powi(2))
        .sum::<f64>();
    Ok(sum / targets.len() as f64)
}

/// Root mean squared error.
pub fn rmse(actual: &Target, predicted: &Prediction) -> Result<f64> {
    Ok(mean_squared_error(actual, predicted)?.sqrt())
}

/// Mean absolute error.
pub fn mean_absolute_error(actual: &Target, predicted: &Prediction) -> Result<f64> {
    let (targets, predictions) = paired(actual, predicted)?;
    let sum = predictions
        .iter()
        .zip(targets.iter())
        .map(|(&pred, &target)| (pred - target).abs())
        .sum::<f64>();
    Ok(sum / targets.len() as f64)
}
