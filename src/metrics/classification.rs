//! Classification metrics.

use crate::core::error::{FoldwiseError, Result};
use crate::core::types::{Prediction, Target};

/// Multi-class logarithmic loss, summed over rows.
///
/// `predicted` holds one row of class weights per observation, with columns
/// in the sorted order of the distinct classes of `actual`. Each row is
/// normalized to sum to one before the probability of the true class is
/// looked up, so unnormalized scores are accepted. A zero probability for
/// the true class yields an infinite loss.
pub fn multi_log_loss(actual: &Target, predicted: &Prediction) -> Result<f64> {
    let probabilities = predicted.as_probabilities().ok_or_else(|| {
        FoldwiseError::shape("a class probability matrix", "a vector of point predictions")
    })?;

    if actual.is_empty() {
        return Err(FoldwiseError::metric("no rows to score"));
    }
    if probabilities.nrows() != actual.len() {
        return Err(FoldwiseError::shape(
            format!("{} prediction rows", actual.len()),
            probabilities.nrows().to_string(),
        ));
    }

    let (n_classes, classes) = actual.class_indices();
    if n_classes != probabilities.ncols() {
        return Err(FoldwiseError::shape(
            format!("{} probability columns (one per distinct class)", n_classes),
            probabilities.ncols().to_string(),
        ));
    }

    let mut loss = 0.0;
    for (row, (weights, &class)) in probabilities.rows().into_iter().zip(&classes).enumerate() {
        let total = weights.sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(FoldwiseError::metric(format!(
                "prediction row {} sums to {}, cannot normalize",
                row, total
            )));
        }
        loss -= (weights[class] / total).ln();
    }

    Ok(loss)
}

/// Share of rows whose highest-weighted class is not the actual class.
pub fn classification_error(actual: &Target, predicted: &Prediction) -> Result<f64> {
    let probabilities = predicted.as_probabilities().ok_or_else(|| {
        FoldwiseError::shape("a class probability matrix", "a vector of point predictions")
    })?;
    if actual.is_empty() {
        return Err(FoldwiseError::metric("no rows to score"));
    }
    if probabilities.nrows() != actual.len() {
        return Err(FoldwiseError::shape(
            format!("{} prediction rows", actual.len()),
            probabilities.nrows().to_string(),
        ));
    }
    let (n_classes, classes) = actual.class_indices();
    if n_classes != probabilities.ncols() {
        return Err(FoldwiseError::shape(
            format!("{} probability columns (one per distinct class)", n_classes),
            probabilities.ncols().to_string(),
        ));
    }

    let wrong = probabilities
        .rows()
        .into_iter()
        .zip(&classes)
        .filter(|(weights, &class)| {
            let best = weights
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (k, &w)| if w > best.1 { (k, w) } else { best })
                .0;
            best != class
        })
        .count();

    Ok(wrong as f64 / actual.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn labels(values: &[&str]) -> Target {
        Target::Categorical(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_multi_log_loss_normalizes_rows() {
        let actual = labels(&["a", "b", "a"]);
        let predicted = Prediction::Probabilities(array![[2.0, 2.0], [1.0, 3.0], [3.0, 1.0]]);
        let expected = -(0.5f64.ln() + 0.75f64.ln() + 0.75f64.ln());
        assert_relative_eq!(multi_log_loss(&actual, &predicted).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_columns_follow_sorted_classes() {
        let actual = labels(&["z", "a"]);
        let predicted = Prediction::Probabilities(array![[0.1, 0.9], [0.8, 0.2]]);
        let expected = -(0.9f64.ln() + 0.8f64.ln());
        assert_relative_eq!(multi_log_loss(&actual, &predicted).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_class_count_mismatch() {
        let actual = labels(&["a", "b", "a"]);
        let predicted = Prediction::Probabilities(array![[0.2, 0.3, 0.5], [0.2, 0.3, 0.5], [0.2, 0.3, 0.5]]);
        let err = multi_log_loss(&actual, &predicted).unwrap_err();
        assert_eq!(err.category(), "shape");
    }

    #[test]
    fn test_rejects_point_predictions_and_zero_rows() {
        let actual = labels(&["a", "b"]);
        assert!(multi_log_loss(&actual, &Prediction::Values(array![0.1, 0.2])).is_err());

        let predicted = Prediction::Probabilities(array![[0.0, 0.0], [0.5, 0.5]]);
        assert_eq!(multi_log_loss(&actual, &predicted).unwrap_err().category(), "metric");
    }

    #[test]
    fn test_classification_error() {
        let actual = labels(&["a", "b", "b", "a"]);
        let predicted = Prediction::Probabilities(array![[0.9, 0.1], [0.4, 0.6], [0.7, 0.3], [0.6, 0.4]]);
        assert_relative_eq!(classification_error(&actual, &predicted).unwrap(), 0.25);
    }
}
