//! Model-ready data: the pivoted matrix split into training and test rows.

use crate::core::constants::KEY_ID_SEPARATOR;
use crate::core::error::{FoldwiseError, Result};
use crate::core::types::{FeatureMatrix, Target, TargetKind};
use crate::dataset::loader::LabelsTable;
use crate::dataset::pivot::{ColumnIndex, PivotResult};
use crate::dataset::sparse::select_rows;

/// Training features and labels, test features, and string ids for both.
#[derive(Debug, Clone)]
pub struct ModelData {
    /// Training rows of the feature matrix
    pub train: FeatureMatrix,
    /// Test rows of the feature matrix
    pub test: FeatureMatrix,
    /// Labels of the training rows
    pub target: Target,
    /// Id of each training row, written to the cross-validation export
    pub train_ids: Vec<String>,
    /// Id of each test row, written to the final export
    pub test_ids: Vec<String>,
    /// Feature names in column order
    pub columns: ColumnIndex,
}

impl ModelData {
    /// Assemble from matrices already in hand. Rows are identified by their
    /// position until [`ModelData::with_ids`] is called.
    pub fn new(train: FeatureMatrix, target: Target, test: FeatureMatrix) -> Result<Self> {
        if target.len() != train.rows() {
            return Err(FoldwiseError::shape(
                format!("{} training labels", train.rows()),
                format!("{} labels", target.len()),
            ));
        }
        if test.cols() != train.cols() {
            return Err(FoldwiseError::shape(
                format!("{} test columns", train.cols()),
                format!("{} columns", test.cols()),
            ));
        }

        let columns = ColumnIndex::from_names((0..train.cols()).map(|c| format!("f{}", c)));
        Ok(ModelData {
            train_ids: (0..train.rows()).map(|r| r.to_string()).collect(),
            test_ids: (0..test.rows()).map(|r| r.to_string()).collect(),
            train,
            test,
            target,
            columns,
        })
    }

    /// Replace the row ids.
    pub fn with_ids(mut self, train_ids: Vec<String>, test_ids: Vec<String>) -> Result<Self> {
        if train_ids.len() != self.train.rows() || test_ids.len() != self.test.rows() {
            return Err(FoldwiseError::shape(
                format!("{} train and {} test ids", self.train.rows(), self.test.rows()),
                format!("{} and {}", train_ids.len(), test_ids.len()),
            ));
        }
        self.train_ids = train_ids;
        self.test_ids = test_ids;
        Ok(self)
    }

    /// Split a pivot over `labels` at the train/test boundary and read the
    /// target from the training rows.
    ///
    /// Ids are the key values of each row joined with `:`.
    pub fn from_pivot(
        labels: &LabelsTable,
        pivot: PivotResult,
        target_column: &str,
        kind: TargetKind,
    ) -> Result<Self> {
        let table = labels.table();
        if pivot.rows.len() != table.nrows() {
            return Err(FoldwiseError::shape(
                format!("{} pivot rows", table.nrows()),
                pivot.rows.len().to_string(),
            ));
        }

        let raw = table.column_values(target_column)?;
        let raw_train = &raw[labels.train_rows()];
        if raw_train.is_empty() {
            return Err(FoldwiseError::format(format!(
                "{} has no training rows",
                table.name()
            )));
        }
        if let Some(row) = raw_train.iter().position(|v| v.trim().is_empty()) {
            return Err(FoldwiseError::format(format!(
                "target column '{}' is empty at training row {}",
                target_column, row
            )));
        }
        let target = Target::from_raw(raw_train, kind)?;

        let ids: Vec<String> = pivot
            .rows
            .keys()
            .iter()
            .map(|tuple| tuple.join(KEY_ID_SEPARATOR))
            .collect();
        let train_rows: Vec<usize> = labels.train_rows().collect();
        let test_rows: Vec<usize> = labels.test_rows().collect();

        let train = select_rows(&pivot.matrix, &train_rows)?;
        let test = select_rows(&pivot.matrix, &test_rows)?;
        log::debug!(
            "Model data: {} training rows, {} test rows, {} features",
            train.rows(),
            test.rows(),
            train.cols()
        );

        Ok(ModelData {
            train,
            test,
            target,
            train_ids: ids[labels.train_rows()].to_vec(),
            test_ids: ids[labels.test_rows()].to_vec(),
            columns: pivot.columns,
        })
    }

    /// Number of training rows.
    pub fn n_train(&self) -> usize {
        self.train.rows()
    }

    /// Number of test rows.
    pub fn n_test(&self) -> usize {
        self.test.rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Key;
    use crate::dataset::join::FeatureJoiner;
    use crate::dataset::pivot::pivot;
    use crate::dataset::sparse::value_at;
    use crate::dataset::table::Table;

    fn labels() -> LabelsTable {
        let train = Table::from_literals(
            "train.csv",
            &["store", "day", "sales"],
            &[&["s1", "1", "10"], &["s1", "2", "12"]],
        )
        .unwrap();
        let test = Table::from_literals("test.csv", &["store", "day"], &[&["s2", "1"]]).unwrap();
        LabelsTable::from_parts(train, test, &Key::new(["store", "day"]).unwrap()).unwrap()
    }

    #[test]
    fn test_from_pivot_splits_rows() {
        let labels = labels();
        let key = Key::new(["store", "day"]).unwrap();
        let mut joiner = FeatureJoiner::new(labels.table(), key.clone()).unwrap();
        joiner
            .add_wide(
                &Table::from_literals(
                    "promo.csv",
                    &["day", "store", "promo"],
                    &[&["1", "s2", "1"], &["2", "s1", "1"]],
                )
                .unwrap(),
            )
            .unwrap();
        let pivoted = pivot(labels.table(), joiner.into_collection(), &key).unwrap();

        let data = ModelData::from_pivot(&labels, pivoted, "sales", TargetKind::Auto).unwrap();
        assert_eq!(data.n_train(), 2);
        assert_eq!(data.n_test(), 1);
        assert_eq!(data.train_ids, vec!["s1:1".to_string(), "s1:2".to_string()]);
        assert_eq!(data.test_ids, vec!["s2:1".to_string()]);
        assert_eq!(value_at(&data.train, 1, 0), 1.0);
        assert_eq!(value_at(&data.train, 0, 0), 0.0);
        assert_eq!(value_at(&data.test, 0, 0), 1.0);
        assert!(data.target.as_numeric().is_some());
    }

    #[test]
    fn test_missing_target_column() {
        let labels = labels();
        let pivoted = pivot(
            labels.table(),
            Default::default(),
            &Key::new(["store", "day"]).unwrap(),
        )
        .unwrap();
        let err = ModelData::from_pivot(&labels, pivoted, "revenue", TargetKind::Auto).unwrap_err();
        assert_eq!(err.category(), "schema");
    }

    #[test]
    fn test_new_checks_shapes() {
        let train = FeatureMatrix::zero((3, 2));
        let test = FeatureMatrix::zero((1, 2));
        let target = Target::Categorical(vec!["a".into(), "b".into()]);
        assert_eq!(
            ModelData::new(train.clone(), target, test.clone()).unwrap_err().category(),
            "shape"
        );

        let target = Target::Categorical(vec!["a".into(), "b".into(), "a".into()]);
        let data = ModelData::new(train, target, test).unwrap();
        assert_eq!(data.train_ids, vec!["0", "1", "2"]);
        assert!(data.with_ids(vec!["x".into()], vec![]).is_err());
    }
}
