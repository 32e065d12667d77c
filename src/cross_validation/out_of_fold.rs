//! Out-of-fold prediction buffer.

use crate::core::error::{FoldwiseError, Result};
use crate::core::types::{FoldId, Prediction};
use ndarray::{Array1, Array2};

/// One prediction slot per training row, each written at most once.
///
/// A slot remembers which fold filled it. The value buffer takes its shape
/// (point values or class probabilities) from the first write.
#[derive(Debug, Clone, PartialEq)]
pub struct OutOfFold {
    sources: Vec<Option<FoldId>>,
    values: Option<Prediction>,
}

impl OutOfFold {
    /// Empty buffer for `n_rows` training rows.
    pub fn new(n_rows: usize) -> Self {
        OutOfFold {
            sources: vec![None; n_rows],
            values: None,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Store the predictions of `fold` for `rows`.
    ///
    /// Nothing is written unless every row is in range and still unset and
    /// the prediction matches the buffer's shape.
    pub fn write(&mut self, fold: &FoldId, rows: &[usize], prediction: &Prediction) -> Result<()> {
        if prediction.nrows() != rows.len() {
            return Err(FoldwiseError::shape(
                format!("{} predictions for fold {}", rows.len(), fold),
                prediction.nrows().to_string(),
            ));
        }
        for &row in rows {
            match self.sources.get(row) {
                None => {
                    return Err(FoldwiseError::shape(
                        format!("row < {}", self.sources.len()),
                        row.to_string(),
                    ))
                }
                Some(Some(previous)) => {
                    return Err(FoldwiseError::internal(format!(
                        "row {} already holds a prediction from fold {}",
                        row, previous
                    )))
                }
                Some(None) => {}
            }
        }

        let n_rows = self.sources.len();
        let buffer = self.values.get_or_insert_with(|| match prediction {
            Prediction::Values(_) => Prediction::Values(Array1::zeros(n_rows)),
            Prediction::Probabilities(p) => {
                Prediction::Probabilities(Array2::zeros((n_rows, p.ncols())))
            }
        });

        match (buffer, prediction) {
            (Prediction::Values(buffer), Prediction::Values(values)) => {
                for (&row, &value) in rows.iter().zip(values.iter()) {
                    buffer[row] = value;
                }
            }
            (Prediction::Probabilities(buffer), Prediction::Probabilities(probs))
                if buffer.ncols() == probs.ncols() =>
            {
                for (&row, source) in rows.iter().zip(probs.rows()) {
                    buffer.row_mut(row).assign(&source);
                }
            }
            (buffer, _) => {
                return Err(FoldwiseError::shape(
                    format!("predictions of width {}", buffer.width()),
                    format!("width {} from fold {}", prediction.width(), fold),
                ));
            }
        }

        for &row in rows {
            self.sources[row] = Some(fold.clone());
        }
        Ok(())
    }

    /// Number of filled slots.
    pub fn filled_count(&self) -> usize {
        self.sources.iter().filter(|s| s.is_some()).count()
    }

    /// True once every slot is filled.
    pub fn is_complete(&self) -> bool {
        self.sources.iter().all(Option::is_some)
    }

    /// Fold that filled `row`.
    pub fn source(&self, row: usize) -> Option<&FoldId> {
        self.sources.get(row).and_then(Option::as_ref)
    }

    /// Filled rows, ascending.
    pub fn filled_rows(&self) -> Vec<usize> {
        self.sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(row, _)| row)
            .collect()
    }

    /// Values of `row`, `None` while unset.
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        self.source(row)?;
        match self.values.as_ref()? {
            Prediction::Values(values) => Some(vec![values[row]]),
            Prediction::Probabilities(probs) => Some(probs.row(row).to_vec()),
        }
    }

    /// The buffer, including unset slots.
    pub fn values(&self) -> Option<&Prediction> {
        self.values.as_ref()
    }

    /// The whole buffer as one prediction. Fails unless every slot is filled.
    pub fn to_prediction(&self) -> Result<Prediction> {
        if !self.is_complete() {
            return Err(FoldwiseError::shape(
                format!("{} out-of-fold predictions", self.len()),
                self.filled_count().to_string(),
            ));
        }
        match &self.values {
            Some(values) => Ok(values.clone()),
            None => Ok(Prediction::Values(Array1::zeros(0))),
        }
    }

    /// Predictions of the filled rows only, in ascending row order.
    pub fn filled_prediction(&self) -> Option<(Vec<usize>, Prediction)> {
        let rows = self.filled_rows();
        let values = self.values.as_ref()?;
        Some((rows.clone(), values.select(&rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_write_and_complete() {
        let mut oof = OutOfFold::new(3);
        oof.write(&FoldId::Int(1), &[2, 0], &Prediction::Values(array![0.2, 0.0]))
            .unwrap();
        assert!(!oof.is_complete());
        assert_eq!(oof.row(1), None);
        assert!(oof.to_prediction().is_err());

        oof.write(&FoldId::Int(0), &[1], &Prediction::Values(array![0.1]))
            .unwrap();
        assert!(oof.is_complete());
        assert_eq!(oof.source(2), Some(&FoldId::Int(1)));
        assert_eq!(
            oof.to_prediction().unwrap(),
            Prediction::Values(array![0.0, 0.1, 0.2])
        );
    }

    #[test]
    fn test_double_write_rejected_without_side_effects() {
        let mut oof = OutOfFold::new(3);
        oof.write(&FoldId::Int(0), &[0], &Prediction::Values(array![1.0]))
            .unwrap();
        let err = oof
            .write(&FoldId::Int(1), &[1, 0], &Prediction::Values(array![2.0, 3.0]))
            .unwrap_err();
        assert_eq!(err.category(), "internal");
        assert_eq!(oof.filled_count(), 1);
        assert_eq!(oof.row(1), None);
    }

    #[test]
    fn test_probability_rows() {
        let mut oof = OutOfFold::new(2);
        oof.write(
            &FoldId::from("b"),
            &[1],
            &Prediction::Probabilities(array![[0.3, 0.7]]),
        )
        .unwrap();
        assert_eq!(oof.row(1), Some(vec![0.3, 0.7]));

        let err = oof
            .write(&FoldId::from("a"), &[0], &Prediction::Values(array![1.0]))
            .unwrap_err();
        assert_eq!(err.category(), "shape");

        let (rows, prediction) = oof.filled_prediction().unwrap();
        assert_eq!(rows, vec![1]);
        assert_eq!(prediction.width(), 2);
    }

    #[test]
    fn test_row_count_mismatch() {
        let mut oof = OutOfFold::new(2);
        let err = oof
            .write(&FoldId::Int(0), &[0, 1], &Prediction::Values(array![1.0]))
            .unwrap_err();
        assert_eq!(err.category(), "shape");
        assert!(oof.write(&FoldId::Int(0), &[5], &Prediction::Values(array![1.0])).is_err());
    }
}
