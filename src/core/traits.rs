//! Core trait definitions for foldwise.
//!
//! Models and metrics are external collaborators. The cross-validator only
//! needs something that can be fitted on a sparse feature matrix, something
//! that can predict from one, and a function scoring predictions against
//! labels. These traits name those capabilities so they are checked when a
//! validator is composed rather than when a fold runs.

use crate::core::error::Result;
use crate::core::types::{FeatureMatrix, Prediction, Target};

/// A model that can be trained on labelled rows.
pub trait Fittable {
    /// Fit on `features` (one row per label in `target`).
    ///
    /// Calling `fit` again must discard whatever the previous call learned.
    fn fit(&mut self, features: &FeatureMatrix, target: &Target) -> Result<()>;
}

/// A trained model that can score unseen rows.
pub trait Predictor {
    /// Predict one output row per feature row.
    fn predict(&self, features: &FeatureMatrix) -> Result<Prediction>;
}

/// Anything that can both fit and predict.
pub trait Model: Fittable + Predictor {}

impl<T: Fittable + Predictor + ?Sized> Model for T {}

impl<M: Fittable + ?Sized> Fittable for Box<M> {
    fn fit(&mut self, features: &FeatureMatrix, target: &Target) -> Result<()> {
        (**self).fit(features, target)
    }
}

impl<M: Predictor + ?Sized> Predictor for Box<M> {
    fn predict(&self, features: &FeatureMatrix) -> Result<Prediction> {
        (**self).predict(features)
    }
}

/// Error metric comparing actual labels with predictions.
///
/// Any `Fn(&Target, &Prediction) -> Result<f64>` is a metric, so plain
/// functions such as [`crate::metrics::multi_log_loss`] can be passed
/// directly.
pub trait Metric {
    /// Score `predicted` against `actual`. Lower is better for every metric
    /// shipped with this crate, but the validator does not rely on it.
    fn evaluate(&self, actual: &Target, predicted: &Prediction) -> Result<f64>;
}

impl<F> Metric for F
where
    F: Fn(&Target, &Prediction) -> Result<f64>,
{
    fn evaluate(&self, actual: &Target, predicted: &Prediction) -> Result<f64> {
        self(actual, predicted)
    }
}
