//! Cross-validation side of foldwise.
//!
//! - [`folds`]: fold assignment and k-fold / hold-out selection
//! - [`out_of_fold`]: the per-row out-of-fold prediction buffer
//! - [`validator`]: the fold loop, final fit and reports
//! - [`export`]: CSV export of out-of-fold and final predictions

pub mod export;
pub mod folds;
pub mod out_of_fold;
pub mod validator;

pub use export::{export_path, ExportSettings};
pub use folds::{FoldAssignment, ValidationMode, ValidationPlan};
pub use out_of_fold::OutOfFold;
pub use validator::{
    generate_run_key, CrossValidator, CvReport, FoldOutcome, FoldScore, RunReport,
};
