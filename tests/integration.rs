//! End-to-end tests: files in, cross-validated scores and prediction files out.

use approx::assert_relative_eq;
use foldwise::metrics::{multi_log_loss, rmse};
use foldwise::*;
use ndarray::array;
use std::fs;
use tempfile::TempDir;

mod common;
use common::*;

/// First seed whose random assignment of 8 rows uses all 4 folds.
fn seed_with_four_folds() -> u64 {
    (0..100)
        .find(|&seed| {
            let plan = ValidationPlan::new().with_fold_count(4).with_seed(seed);
            let (folds, _) = plan.resolve(8).unwrap();
            folds.distinct().len() == 4
        })
        .expect("some seed fills every fold")
}

#[test]
fn test_device_files_pivot() {
    let files = device_files();
    let extracted = FeatureEngineering::new(&files.train, &files.test, Key::from("device_id"))
        .with_wide_files([&files.brand])
        .with_long_files([&files.apps])
        .extract_features()
        .unwrap();

    assert_eq!(extracted.pivot.shape(), (10, 2));
    assert_eq!(
        extracted.pivot.columns.names(),
        &["brand".to_string(), "app_count".to_string()]
    );
    assert_eq!(extracted.pivot.value(&["d4".to_string()], "brand"), Some(0.0));
    assert_eq!(extracted.pivot.value(&["d4".to_string()], "app_count"), Some(40.0));
    assert_eq!(extracted.pivot.value(&["t2".to_string()], "app_count"), Some(19.0));

    let data = extracted.into_model_data("age", TargetKind::Auto).unwrap();
    assert_eq!(data.n_train(), 8);
    assert_eq!(data.n_test(), 2);
    assert_eq!(data.test_ids, vec!["t1".to_string(), "t2".to_string()]);
}

#[test]
fn test_four_fold_run_over_device_files() {
    let files = device_files();
    let seed = seed_with_four_folds();
    let config = HarnessConfigBuilder::new()
        .train_path(&files.train)
        .test_path(&files.test)
        .key(["device_id"])
        .wide_file(&files.brand)
        .long_file(&files.apps)
        .target_column("age")
        .fold_count(4)
        .seed(seed)
        .build()
        .unwrap();

    let harness = Harness::new(config).unwrap();
    let report = harness.run(&mut MeanModel::default(), rmse).unwrap();

    assert_eq!(report.cv.mode, ValidationMode::KFold {
        folds: (0..4usize).map(FoldId::from).collect()
    });
    assert_eq!(report.cv.fold_scores.len(), 4);
    assert!(report.cv.fold_scores.iter().all(|s| s.score.is_finite() && s.score >= 0.0));
    assert!(report.cv.out_of_fold.is_complete());
    assert!(report.cv.aggregate > 0.0);
    assert!(report.exported.is_empty());

    // The final model predicts the mean age of all eight devices.
    let mean_age = (23.0 + 31.0 + 45.0 + 24.0 + 33.0 + 29.0 + 22.0 + 41.0) / 8.0;
    let final_values = report.final_prediction.as_values().unwrap();
    assert_eq!(final_values.len(), 2);
    assert_relative_eq!(final_values[0], mean_age);
}

#[test]
fn test_same_seed_same_scores() {
    let files = device_files();
    let config = HarnessConfigBuilder::new()
        .train_path(&files.train)
        .test_path(&files.test)
        .key(["device_id"])
        .wide_file(&files.brand)
        .target_column("age")
        .fold_count(4)
        .seed(seed_with_four_folds())
        .build()
        .unwrap();
    let harness = Harness::new(config).unwrap();

    let first = harness.run(&mut MeanModel::default(), rmse).unwrap();
    let second = harness.run(&mut MeanModel::default(), rmse).unwrap();
    assert_eq!(first.cv.fold_scores, second.cv.fold_scores);
    assert_eq!(first.cv.aggregate, second.cv.aggregate);
}

#[test]
fn test_multi_log_loss_matches_hand_computation() {
    let actual = Target::Categorical(vec!["a".into(), "b".into(), "a".into()]);
    let predicted = Prediction::Probabilities(array![[0.8, 0.2], [0.4, 0.6], [0.5, 0.5]]);

    let loss = multi_log_loss(&actual, &predicted).unwrap();
    let expected = -(0.8f64.ln() + 0.6f64.ln() + 0.5f64.ln());
    assert_relative_eq!(loss, expected, epsilon = 1e-12);
}

#[test]
fn test_fold_column_holdout_with_export() {
    let dir = TempDir::new().unwrap();
    let train = write_csv(
        &dir,
        "train.csv",
        "id,y,period\n1,1.0,2016\n2,2.0,2017\n3,3.0,2016\n4,5.0,2017\n",
    );
    let test = write_csv(&dir, "test.csv", "id\n10\n11\n");
    let feature = write_csv(&dir, "feature.csv", "id,x\n1,1\n2,2\n3,3\n4,4\n10,5\n");
    let out = dir.path().join("out");

    let config = HarnessConfigBuilder::new()
        .train_path(&train)
        .test_path(&test)
        .key(["id"])
        .wide_file(&feature)
        .target_column("y")
        .fold_column("period")
        .export_to(out.join("submission.csv"))
        .build()
        .unwrap();

    let report = Harness::new(config)
        .unwrap()
        .run(&mut RecordingModel::default(), rmse)
        .unwrap();

    assert_eq!(
        report.cv.mode,
        ValidationMode::Holdout {
            train: FoldId::Int(2016),
            validation: FoldId::Int(2017)
        }
    );
    // Rows 2 and 4 are predicted by their own feature value.
    let expected = (((2.0f64 - 2.0).powi(2) + (4.0f64 - 5.0).powi(2)) / 2.0).sqrt();
    assert_relative_eq!(report.cv.aggregate, expected);

    let mut names: Vec<String> = files_in(&out)
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|n| n.starts_with("submission_") && n.ends_with("_cv.csv")));
    assert!(names.iter().any(|n| n.starts_with("submission_") && n.ends_with("_full.csv")));

    let cv = fs::read_to_string(&report.exported[0]).unwrap();
    assert_eq!(cv, "id,cv_prediction\n1,\n2,2\n3,\n4,4\n");
    let full = fs::read_to_string(&report.exported[1]).unwrap();
    assert_eq!(full, "id,prediction\n10,5\n11,0\n");
}

#[test]
fn test_harness_from_toml_file() {
    let files = device_files();
    let export_base = files.dir.path().join("preds").join("gender_age.csv");
    let config_path = write_csv(
        &files.dir,
        "harness.toml",
        &format!(
            r#"
[data]
train_path = "{train}"
test_path = "{test}"
key = "device_id"
wide_files = "{brand}"
long_files = ["{apps}"]
target_column = "age"

[validation]
type = "kfold"
fold_count = 4
seed = {seed}
parallel = true
num_threads = 2

[export]
enabled = true
base_path = "{export}"
"#,
            train = files.train.display(),
            test = files.test.display(),
            brand = files.brand.display(),
            apps = files.apps.display(),
            seed = seed_with_four_folds(),
            export = export_base.display(),
        ),
    );

    let harness = Harness::from_file(&config_path).unwrap();
    assert_eq!(harness.config().data.wide_files, vec![files.brand.clone()]);
    assert_eq!(harness.config().validation.validation_type, ValidationType::KFold);

    let report = harness.run_with_factory(MeanModel::default, rmse).unwrap();
    assert_eq!(report.cv.fold_scores.len(), 4);
    assert_eq!(report.exported.len(), 2);
    for path in &report.exported {
        assert!(path.starts_with(files.dir.path().join("preds")));
        assert!(path.exists());
    }

    let full = fs::read_to_string(&report.exported[1]).unwrap();
    let mut lines = full.lines();
    assert_eq!(lines.next(), Some("id,prediction"));
    assert!(lines.next().unwrap().starts_with("t1,"));
    assert!(lines.next().unwrap().starts_with("t2,"));
}

#[test]
fn test_config_errors() {
    let files = device_files();

    let err = HarnessConfigBuilder::new()
        .train_path(&files.train)
        .test_path(&files.test)
        .key(["device_id"])
        .target_column("device_id")
        .build()
        .unwrap_err();
    assert_eq!(err.category(), "config");

    let err = HarnessConfigBuilder::new()
        .validation_type(ValidationType::Holdout)
        .fold_count(4)
        .build()
        .unwrap_err();
    assert_eq!(err.category(), "config");

    let bad = write_csv(&files.dir, "bad.yaml", "data: {}");
    assert_eq!(Harness::from_file(&bad).unwrap_err().category(), "config");
}

#[test]
fn test_missing_target_column() {
    let files = device_files();
    let config = HarnessConfigBuilder::new()
        .train_path(&files.train)
        .test_path(&files.test)
        .key(["device_id"])
        .target_column("income")
        .build()
        .unwrap();
    let err = Harness::new(config).unwrap().prepare().unwrap_err();
    assert_eq!(err.category(), "schema");
}

#[test]
fn test_categorical_target_is_scored_with_log_loss() {
    let dir = TempDir::new().unwrap();
    let train = write_csv(
        &dir,
        "train.csv",
        "id,gender,fold\n1,M,1\n2,F,1\n3,M,2\n4,F,2\n5,M,3\n6,F,3\n",
    );
    let test = write_csv(&dir, "test.csv", "id\n7\n");
    let config = HarnessConfigBuilder::new()
        .train_path(&train)
        .test_path(&test)
        .key(["id"])
        .target_column("gender")
        .target_kind(TargetKind::Categorical)
        .fold_column("fold")
        .build()
        .unwrap();

    let report = Harness::new(config)
        .unwrap()
        .run(&mut FrequencyModel::default(), multi_log_loss)
        .unwrap();
    assert_eq!(report.cv.fold_scores.len(), 3);
    assert_relative_eq!(report.cv.aggregate, -6.0 * 0.5f64.ln(), epsilon = 1e-12);
    assert_eq!(report.final_prediction.width(), 2);
}
