//! Error metrics.
//!
//! Every metric is a plain function `(actual, predicted) -> Result<f64>` and
//! therefore a [`Metric`](crate::core::traits::Metric). Lower is better for
//! all of them.
//!
//! ```rust
//! use foldwise::metrics::multi_log_loss;
//! use foldwise::{Prediction, Target};
//! use ndarray::array;
//!
//! # fn example() -> foldwise::Result<()> {
//! let actual = Target::Categorical(vec!["a".into(), "b".into()]);
//! let predicted = Prediction::Probabilities(array![[0.8, 0.2], [0.4, 0.6]]);
//! let loss = multi_log_loss(&actual, &predicted)?;
//! assert!(loss > 0.0);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod classification;
pub mod regression;

pub use classification::{classification_error, multi_log_loss};
pub use regression::{mean_absolute_error, mean_squared_error, rmse};
