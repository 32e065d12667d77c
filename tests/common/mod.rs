//! Common test utilities for foldwise integration tests.

#![allow(dead_code)]

use foldwise::*;
use ndarray::{Array1, Array2};
use sprs::TriMat;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `content` to `name` inside `dir`.
pub fn write_csv<P: AsRef<Path>>(dir: P, name: &str, content: &str) -> PathBuf {
    let path = dir.as_ref().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Paths of the device fixture: 8 training devices, 2 test devices, a wide
/// `brand` file and a long `app_count` file.
pub struct DeviceFiles {
    pub dir: TempDir,
    pub train: PathBuf,
    pub test: PathBuf,
    pub brand: PathBuf,
    pub apps: PathBuf,
}

pub fn device_files() -> DeviceFiles {
    let dir = TempDir::new().unwrap();
    let train = write_csv(
        &dir,
        "gender_age_train.csv",
        "device_id,gender,age,group\n\
         d1,M,23,M22-23\n\
         d2,F,31,F29-32\n\
         d3,M,45,M39+\n\
         d4,F,24,F24-26\n\
         d5,M,33,M32-38\n\
         d6,F,29,F29-32\n\
         d7,M,22,M22-23\n\
         d8,F,41,F33-42\n",
    );
    let test = write_csv(&dir, "gender_age_test.csv", "device_id\nt1\nt2\n");
    let brand = write_csv(
        &dir,
        "phone_brand.csv",
        "device_id,brand\nd1,3\nd2,1\nd3,3\nd5,2\nd6,1\nd7,4\nd8,2\nt1,3\n",
    );
    let apps = write_csv(
        &dir,
        "app_counts.csv",
        "device_id,variable,value\nd1,app_count,12\nd4,app_count,40\nd8,app_count,7\nt2,app_count,19\n",
    );

    DeviceFiles {
        dir,
        train,
        test,
        brand,
        apps,
    }
}

/// Model data whose single feature is `row + 1` for training rows and
/// `100 + row` for test rows, with the given numeric target.
pub fn tagged_data(target: &[f64], n_test: usize) -> ModelData {
    let mut train = TriMat::new((target.len(), 1));
    for row in 0..target.len() {
        train.add_triplet(row, 0, row as f64 + 1.0);
    }
    let mut test = TriMat::new((n_test, 1));
    for row in 0..n_test {
        test.add_triplet(row, 0, 100.0 + row as f64);
    }
    ModelData::new(
        train.to_csr(),
        Target::Numeric(Array1::from_vec(target.to_vec())),
        test.to_csr(),
    )
    .unwrap()
}

/// Predicts the mean training target for every row.
#[derive(Debug, Default, Clone)]
pub struct MeanModel {
    mean: f64,
}

impl Fittable for MeanModel {
    fn fit(&mut self, _features: &FeatureMatrix, target: &Target) -> Result<()> {
        self.mean = target
            .as_numeric()
            .and_then(|t| t.mean())
            .ok_or_else(|| FoldwiseError::model("fit", "numeric target required"))?;
        Ok(())
    }
}

impl Predictor for MeanModel {
    fn predict(&self, features: &FeatureMatrix) -> Result<Prediction> {
        Ok(Prediction::Values(Array1::from_elem(features.rows(), self.mean)))
    }
}

/// Remembers the first feature of every row it was fitted on or asked to
/// predict, and predicts that feature back.
#[derive(Debug, Default, Clone)]
pub struct RecordingModel {
    pub fitted_on: Vec<Vec<f64>>,
    pub predicted_on: Vec<Vec<f64>>,
}

fn first_column(features: &FeatureMatrix) -> Vec<f64> {
    (0..features.rows())
        .map(|r| features.get(r, 0).copied().unwrap_or(0.0))
        .collect()
}

impl Fittable for RecordingModel {
    fn fit(&mut self, features: &FeatureMatrix, _target: &Target) -> Result<()> {
        self.fitted_on.push(first_column(features));
        Ok(())
    }
}

impl Predictor for RecordingModel {
    fn predict(&self, features: &FeatureMatrix) -> Result<Prediction> {
        Ok(Prediction::Values(Array1::from_vec(first_column(features))))
    }
}

/// Class frequencies of the training labels, predicted for every row.
/// Columns follow the sorted distinct classes seen in `fit`.
#[derive(Debug, Default, Clone)]
pub struct FrequencyModel {
    frequencies: Vec<f64>,
}

impl Fittable for FrequencyModel {
    fn fit(&mut self, _features: &FeatureMatrix, target: &Target) -> Result<()> {
        let labels = match target {
            Target::Categorical(labels) => labels,
            Target::Numeric(_) => return Err(FoldwiseError::model("fit", "class labels required")),
        };
        let mut counts: BTreeMap<&str, f64> = BTreeMap::new();
        for label in labels {
            *counts.entry(label.as_str()).or_insert(0.0) += 1.0;
        }
        self.frequencies = counts.values().map(|c| c / labels.len() as f64).collect();
        Ok(())
    }
}

impl Predictor for FrequencyModel {
    fn predict(&self, features: &FeatureMatrix) -> Result<Prediction> {
        let width = self.frequencies.len();
        let mut probabilities = Array2::zeros((features.rows(), width));
        for mut row in probabilities.rows_mut() {
            for (k, &p) in self.frequencies.iter().enumerate() {
                row[k] = p;
            }
        }
        Ok(Prediction::Probabilities(probabilities))
    }
}

/// Fails in `fit`.
#[derive(Debug, Default, Clone)]
pub struct FailingModel;

impl Fittable for FailingModel {
    fn fit(&mut self, _features: &FeatureMatrix, _target: &Target) -> Result<()> {
        Err(FoldwiseError::model("fit", "refusing to learn"))
    }
}

impl Predictor for FailingModel {
    fn predict(&self, features: &FeatureMatrix) -> Result<Prediction> {
        Ok(Prediction::Values(Array1::zeros(features.rows())))
    }
}

/// Files directly inside `dir`.
pub fn files_in<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect(),
        Err(_) => Vec::new(),
    }
}
