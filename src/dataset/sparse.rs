//! Helpers over the CSR feature matrix.

use crate::core::error::{FoldwiseError, Result};
use crate::core::types::FeatureMatrix;

/// Copy the given rows (in the given order) into a new CSR matrix with the
/// same number of columns.
pub fn select_rows(matrix: &FeatureMatrix, rows: &[usize]) -> Result<FeatureMatrix> {
    if !matrix.is_csr() {
        return Err(FoldwiseError::internal("row selection needs a CSR matrix"));
    }

    let mut indptr = Vec::with_capacity(rows.len() + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();
    indptr.push(0);

    for &row in rows {
        let view = matrix
            .outer_view(row)
            .ok_or_else(|| FoldwiseError::shape(format!("row < {}", matrix.rows()), row.to_string()))?;
        for (col, &value) in view.iter() {
            indices.push(col);
            data.push(value);
        }
        indptr.push(indices.len());
    }

    Ok(FeatureMatrix::new((rows.len(), matrix.cols()), indptr, indices, data))
}

/// Value at (`row`, `col`); entries never stored read as zero.
pub fn value_at(matrix: &FeatureMatrix, row: usize, col: usize) -> f64 {
    matrix.get(row, col).copied().unwrap_or(0.0)
}

/// Dense copy of one row.
pub fn dense_row(matrix: &FeatureMatrix, row: usize) -> Vec<f64> {
    let mut dense = vec![0.0; matrix.cols()];
    if let Some(view) = matrix.outer_view(row) {
        for (col, &value) in view.iter() {
            dense[col] = value;
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    fn sample() -> FeatureMatrix {
        let mut triplets = TriMat::new((3, 2));
        triplets.add_triplet(0, 1, 5.0);
        triplets.add_triplet(2, 0, 7.0);
        triplets.add_triplet(2, 1, 8.0);
        triplets.to_csr()
    }

    #[test]
    fn test_select_rows_reorders() {
        let matrix = sample();
        let selected = select_rows(&matrix, &[2, 0]).unwrap();
        assert_eq!(selected.rows(), 2);
        assert_eq!(selected.cols(), 2);
        assert_eq!(dense_row(&selected, 0), vec![7.0, 8.0]);
        assert_eq!(dense_row(&selected, 1), vec![0.0, 5.0]);
    }

    #[test]
    fn test_select_no_rows() {
        let selected = select_rows(&sample(), &[]).unwrap();
        assert_eq!(selected.rows(), 0);
        assert_eq!(selected.nnz(), 0);
    }

    #[test]
    fn test_select_out_of_range() {
        assert!(select_rows(&sample(), &[3]).is_err());
    }

    #[test]
    fn test_value_at_defaults_to_zero() {
        let matrix = sample();
        assert_eq!(value_at(&matrix, 0, 0), 0.0);
        assert_eq!(value_at(&matrix, 0, 1), 5.0);
    }
}
