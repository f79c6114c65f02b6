//! End-to-end runs over CSV inputs written to temporary directories

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use ratingfill::prelude::*;
use tempfile::TempDir;

const TRAIN: &str = "userId,movieId,rating,timestamp
1,1,5.0,964982703
2,2,3.0,964981247
3,1,4.0,964982224
";

const TEST: &str = "userId,movieId,rating,timestamp
1,2,4.0,964983815
";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn setup(train: &str, test: &str) -> (TempDir, RunConfig) {
    let dir = tempfile::tempdir().unwrap();
    let train = write(dir.path(), "ratings_train.csv", train);
    let test = write(dir.path(), "ratings_test.csv", test);
    let config = RunConfig::new(Algorithm::Svd1(SvdTruncate::new(1)))
        .with_data(train, test)
        .with_outputs(dir.path().join("result.txt"), dir.path().join("results_log.txt"));
    (dir, config)
}

#[test]
fn test_svd1_run_writes_result_and_log() {
    let (_dir, config) = setup(TRAIN, TEST);

    let report = execute(&config).unwrap();
    assert!(report.is_valid());

    let written: f64 = fs::read_to_string(&config.result_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert_relative_eq!(written, report.test_rmse);

    let log = fs::read_to_string(&config.log_file).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.starts_with("For matrix user_item_blend SVD1 with r = 1 reduced RMSE by"));
    assert!(log.trim_end().ends_with("s)"));
}

#[test]
fn test_repeated_runs_append_to_log() {
    let (_dir, config) = setup(TRAIN, TEST);
    execute(&config).unwrap();

    let svd2 = RunConfig {
        algorithm: "SVD2".parse::<Algorithm>().unwrap().with_overrides(&Overrides {
            rank: Some(1),
            iterations: Some(3),
            ..Overrides::default()
        }),
        ..config.clone()
    };
    execute(&svd2).unwrap();

    let log = fs::read_to_string(&config.log_file).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("SVD2 with i = 3, r = 1"));
}

#[test]
fn test_every_algorithm_runs_on_small_input() {
    let (_dir, config) = setup(TRAIN, TEST);
    let overrides = Overrides {
        rank: Some(1),
        iterations: Some(2),
        batch_size: Some(1),
        ..Overrides::default()
    };

    for kind in AlgorithmKind::ALL {
        let run = RunConfig {
            algorithm: Algorithm::with_defaults(kind).with_overrides(&overrides),
            ..config.clone()
        };
        let report = execute(&run).unwrap();
        assert_eq!(report.algorithm, kind.name());
        assert!(report.test_rmse.is_finite(), "{kind} produced {}", report.test_rmse);
    }
}

#[test]
fn test_missing_column_is_reported() {
    let (_dir, config) = setup("userId,rating\n1,5.0\n", TEST);
    let err = execute(&config).unwrap_err();
    assert!(matches!(err, CompletionError::MissingColumn { .. }));
    assert!(!config.result_file.exists());
    assert!(!config.log_file.exists());
}

#[test]
fn test_user_only_in_test_set() {
    let test = "userId,movieId,rating\n9,1,3.5\n";
    let (_dir, config) = setup(TRAIN, test);
    assert!(matches!(
        execute(&config),
        Err(CompletionError::UserWithoutRatings { user_id: 9 })
    ));

    let lenient = config.with_missing_users(MissingUserPolicy::GlobalMean);
    let report = execute(&lenient).unwrap();
    assert!(report.test_rmse.is_finite());
}

#[test]
fn test_unknown_algorithm_name() {
    let err = "ALS".parse::<Algorithm>().unwrap_err();
    assert!(matches!(err, CompletionError::UnknownAlgorithm { ref name } if name == "ALS"));
    assert_eq!(
        err.to_string(),
        "Unknown algorithm 'ALS' (expected one of NMF, SVD1, SVD2, SGD, NMF2_SVD2)"
    );
}

#[test]
fn test_invalid_hyperparameters_fail_before_reading_files() {
    let dir = tempfile::tempdir().unwrap();
    let base = RunConfig::new(Algorithm::Svd1(SvdTruncate::new(1))).with_data(
        dir.path().join("absent_train.csv"),
        dir.path().join("absent_test.csv"),
    );

    let svd2 = RunConfig {
        algorithm: Algorithm::with_defaults(AlgorithmKind::Svd2).with_overrides(&Overrides {
            iterations: Some(0),
            ..Overrides::default()
        }),
        ..base.clone()
    };
    assert!(matches!(
        execute(&svd2),
        Err(CompletionError::InvalidParameter { .. })
    ));

    let sgd = RunConfig {
        algorithm: Algorithm::with_defaults(AlgorithmKind::Sgd).with_overrides(&Overrides {
            learning_rate: Some(-1.0),
            ..Overrides::default()
        }),
        ..base.clone()
    };
    assert!(matches!(execute(&sgd), Err(CompletionError::Optimizer(_))));

    assert!(matches!(execute(&base), Err(CompletionError::Io { .. })));
}
