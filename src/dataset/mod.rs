//! Dataset side of foldwise.
//!
//! Loading the training and test tables, joining wide and long feature
//! sources onto them, pivoting the joined features into a sparse matrix and
//! splitting that matrix into model-ready training and test data.

pub mod join;
pub mod loader;
pub mod model_data;
pub mod pivot;
pub mod sparse;
pub mod table;

// Re-export commonly used types
pub use join::{FeatureCollection, FeatureJoiner, FeatureRecord};
pub use loader::{CsvConfig, CsvLoader, LabelsTable, TableLoader};
pub use model_data::ModelData;
pub use pivot::{pivot, ColumnIndex, PivotResult, RowIndex};
pub use table::Table;
