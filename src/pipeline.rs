//! End-to-end pipeline.
//!
//! [`FeatureEngineering`] turns the training and test files plus any number
//! of wide and long feature files into a pivoted feature matrix.
//! [`Harness`] drives the whole run from a [`HarnessConfig`]: features,
//! target, folds, cross-validation, final fit and export.

use crate::config::{DataConfig, HarnessConfig};
use crate::core::error::Result;
use crate::core::traits::{Metric, Model};
use crate::core::types::{Key, TargetKind};
use crate::cross_validation::export::ExportSettings;
use crate::cross_validation::folds::{FoldAssignment, ValidationPlan};
use crate::cross_validation::validator::{CrossValidator, RunReport};
use crate::dataset::join::FeatureJoiner;
use crate::dataset::loader::{CsvLoader, LabelsTable, TableLoader};
use crate::dataset::model_data::ModelData;
use crate::dataset::pivot::{pivot, PivotResult};
use std::path::{Path, PathBuf};

/// Labels table and pivoted features produced by
/// [`FeatureEngineering::extract_features`].
#[derive(Debug, Clone)]
pub struct ExtractedFeatures {
    /// Training rows stacked over test rows
    pub labels: LabelsTable,
    /// Feature matrix aligned to `labels`
    pub pivot: PivotResult,
}

impl ExtractedFeatures {
    /// Split into training and test data, reading the target from
    /// `target_column` of the training rows.
    pub fn into_model_data(self, target_column: &str, kind: TargetKind) -> Result<ModelData> {
        ModelData::from_pivot(&self.labels, self.pivot, target_column, kind)
    }
}

/// Loads, joins and pivots the input files.
#[derive(Debug, Clone)]
pub struct FeatureEngineering<L = CsvLoader> {
    train_path: PathBuf,
    test_path: PathBuf,
    key: Key,
    wide_files: Vec<PathBuf>,
    long_files: Vec<PathBuf>,
    loader: L,
}

impl FeatureEngineering<CsvLoader> {
    /// Read `train_path` and `test_path` as CSV and join on `key`.
    pub fn new<P, Q>(train_path: P, test_path: Q, key: Key) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        FeatureEngineering {
            train_path: train_path.into(),
            test_path: test_path.into(),
            key,
            wide_files: Vec::new(),
            long_files: Vec::new(),
            loader: CsvLoader::new(),
        }
    }

    /// Files and key of a data section.
    pub fn from_config(config: &DataConfig) -> Self {
        FeatureEngineering::new(&config.train_path, &config.test_path, config.key.clone())
            .with_wide_files(config.wide_files.iter().cloned())
            .with_long_files(config.long_files.iter().cloned())
    }
}

impl<L: TableLoader> FeatureEngineering<L> {
    /// Append wide-format feature files.
    pub fn with_wide_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.wide_files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Append long-format feature files.
    pub fn with_long_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.long_files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Read tables through another loader.
    pub fn with_loader<T: TableLoader>(self, loader: T) -> FeatureEngineering<T> {
        FeatureEngineering {
            train_path: self.train_path,
            test_path: self.test_path,
            key: self.key,
            wide_files: self.wide_files,
            long_files: self.long_files,
            loader,
        }
    }

    /// Key the files are joined on.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Load train and test, join every wide file and then every long file,
    /// and pivot.
    pub fn extract_features(&self) -> Result<ExtractedFeatures> {
        let labels = self
            .loader
            .load_train_test(&self.train_path, &self.test_path, &self.key)?;
        let mut joiner = FeatureJoiner::new(labels.table(), self.key.clone())?;

        for path in &self.wide_files {
            let table = self.loader.load(path)?;
            joiner.add_wide(&table)?;
            log::info!("Added wide features from {}", path.display());
        }
        for path in &self.long_files {
            let table = self.loader.load(path)?;
            joiner.add_long(&table)?;
            log::info!("Added long features from {}", path.display());
        }

        let pivot = pivot(labels.table(), joiner.into_collection(), &self.key)?;
        Ok(ExtractedFeatures { labels, pivot })
    }
}

/// Model data together with the plan its folds are drawn from.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Training and test data
    pub data: ModelData,
    /// Fold source for the validator
    pub plan: ValidationPlan,
}

/// Config-driven run: features, folds, cross-validation and export.
#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    /// Validate `config` and wrap it.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Harness { config })
    }

    /// Load a `.toml` or `.json` config and apply `FOLDWISE_*` overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = HarnessConfig::load_from_file(path)?;
        config.apply_environment_overrides()?;
        Harness::new(config)
    }

    /// The configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Build the model data and the validation plan.
    ///
    /// With a fold column the folds come from the training rows of that
    /// column; otherwise they are assigned at random when the validator is
    /// created.
    pub fn prepare(&self) -> Result<Prepared> {
        let data_config = &self.config.data;
        let extracted = FeatureEngineering::from_config(data_config).extract_features()?;

        let mut plan = ValidationPlan::new()
            .with_validation_type(self.config.validation.validation_type)
            .with_fold_count(self.config.validation.fold_count);
        if let Some(seed) = self.config.validation.seed {
            plan = plan.with_seed(seed);
        }
        if let Some(column) = &data_config.fold_column {
            let train = extracted.labels.train_table()?;
            let folds = FoldAssignment::from_column(&train, column)?;
            plan = plan.with_cv_index(folds.folds().to_vec());
        }

        let data = extracted.into_model_data(&data_config.target_column, data_config.target_kind)?;
        Ok(Prepared { data, plan })
    }

    /// A validator over `prepared`, with the configured thread count and
    /// export settings.
    pub fn validator<'a, Me: Metric>(
        &self,
        prepared: &'a Prepared,
        metric: Me,
    ) -> Result<CrossValidator<'a, Me>> {
        let mut validator = CrossValidator::new(&prepared.data, &prepared.plan, metric)?
            .with_num_threads(self.config.validation.effective_num_threads());
        if let Some(settings) = ExportSettings::from_config(&self.config.export) {
            validator = validator.with_export(settings);
        }
        Ok(validator)
    }

    /// Prepare, cross-validate `model`, fit it on all training rows and
    /// export.
    pub fn run<M, Me>(&self, model: &mut M, metric: Me) -> Result<RunReport>
    where
        M: Model + ?Sized,
        Me: Metric,
    {
        let prepared = self.prepare()?;
        self.validator(&prepared, metric)?.evaluate(model)
    }

    /// Like [`run`](Self::run) with models from `factory`; folds run on a
    /// worker pool when the config asks for parallel validation.
    pub fn run_with_factory<M, F, Me>(&self, factory: F, metric: Me) -> Result<RunReport>
    where
        M: Model,
        F: Fn() -> M + Sync,
        Me: Metric + Sync,
    {
        let prepared = self.prepare()?;
        let validator = self.validator(&prepared, metric)?;
        if self.config.validation.parallel {
            validator.evaluate_parallel(factory)
        } else {
            let mut model = factory();
            validator.evaluate(&mut model)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfigBuilder;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_extract_features_from_files() {
        let dir = TempDir::new().unwrap();
        let train = write(&dir, "train.csv", "device_id,group\nd1,a\nd2,b\n");
        let test = write(&dir, "test.csv", "device_id\nd3\n");
        let brand = write(&dir, "brand.csv", "device_id,brand\nd1,1\nd3,2\n");
        let apps = write(&dir, "apps.csv", "device_id,variable,value\nd2,app_count,4\n");

        let extracted = FeatureEngineering::new(&train, &test, Key::from("device_id"))
            .with_wide_files([&brand])
            .with_long_files([&apps])
            .extract_features()
            .unwrap();

        assert_eq!(extracted.pivot.shape(), (3, 2));
        assert_eq!(extracted.labels.n_train(), 2);
        assert_eq!(extracted.pivot.value(&["d3".to_string()], "brand"), Some(2.0));
    }

    #[test]
    fn test_error_names_feature_file() {
        let dir = TempDir::new().unwrap();
        let train = write(&dir, "train.csv", "device_id,group\nd1,a\n");
        let test = write(&dir, "test.csv", "device_id\nd3\n");
        let bad = write(&dir, "bad_long.csv", "device_id,variable,value,extra\nd1,x,1,2\n");

        let err = FeatureEngineering::new(&train, &test, Key::from("device_id"))
            .with_long_files([&bad])
            .extract_features()
            .unwrap_err();
        assert_eq!(err.category(), "schema");
        assert!(err.to_string().contains("bad_long.csv"));
    }

    #[test]
    fn test_prepare_reads_fold_column() {
        let dir = TempDir::new().unwrap();
        let train = write(
            &dir,
            "train.csv",
            "id,y,week\n1,1.0,1\n2,2.0,2\n3,3.0,1\n4,4.0,2\n",
        );
        let test = write(&dir, "test.csv", "id\n5\n");
        let config = HarnessConfigBuilder::new()
            .train_path(train)
            .test_path(test)
            .key(["id"])
            .target_column("y")
            .fold_column("week")
            .build()
            .unwrap();

        let prepared = Harness::new(config).unwrap().prepare().unwrap();
        assert_eq!(prepared.data.n_train(), 4);
        assert_eq!(prepared.data.n_test(), 1);
        let (folds, _) = prepared.plan.resolve(4).unwrap();
        assert_eq!(folds.distinct().len(), 2);
    }
}
