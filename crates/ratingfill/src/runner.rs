//! Algorithm dispatch, timing and test-set evaluation.
//!
//! A [`Runner`] binds an [`EvaluationContext`] and the input matrix choice.
//! Each run approximates the input with one algorithm, measures the
//! wall-clock time, computes the test RMSE and returns a [`RunReport`] whose
//! [`log_line`](RunReport::log_line) is the entry appended to the run log.
//!
//! [`RunConfig`] and [`execute`] wire the runner to the input and output
//! files for the command-line binary.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratingfill_approx::{Algorithm, Overrides, ResultStatus};
use ratingfill_core::{
    baseline::MissingUserPolicy,
    context::{EvaluationContext, InputMatrix},
    error::Result,
};
use tracing::{info, warn};

use crate::io;

/// Outcome of one algorithm run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Algorithm name
    pub algorithm: &'static str,
    /// Input matrix the algorithm was given
    pub input: InputMatrix,
    /// Summary produced by the approximator
    pub summary: String,
    /// RMSE of the approximation on the test set
    pub test_rmse: f64,
    /// Wall-clock time of approximation and evaluation
    pub elapsed: Duration,
    /// Validity of the approximation
    pub status: ResultStatus,
}

impl RunReport {
    /// Entry for the append-only run log.
    pub fn log_line(&self) -> String {
        format!(
            "For matrix {} {} (Total time: {:.3}s)",
            self.input,
            self.summary,
            self.elapsed.as_secs_f64()
        )
    }

    /// Returns `true` unless the approximation is degenerate.
    pub fn is_valid(&self) -> bool {
        self.status == ResultStatus::Valid
    }
}

/// Runs algorithms against a prepared evaluation context.
#[derive(Debug, Clone, Copy)]
pub struct Runner<'a> {
    ctx: &'a EvaluationContext,
    input: InputMatrix,
}

impl<'a> Runner<'a> {
    /// Creates a runner feeding `input` to every algorithm.
    pub fn new(ctx: &'a EvaluationContext, input: InputMatrix) -> Self {
        Self { ctx, input }
    }

    /// The evaluation context.
    pub fn context(&self) -> &'a EvaluationContext {
        self.ctx
    }

    /// Runs `algorithm` and evaluates it on the test set.
    pub fn run(&self, algorithm: &Algorithm) -> Result<RunReport> {
        info!(algorithm = algorithm.name(), input = %self.input, "running algorithm");
        let start = Instant::now();

        let result = algorithm.approximate(self.ctx, self.ctx.input(self.input))?;
        let test_rmse = self.ctx.test_rmse(result.matrix())?;
        let elapsed = start.elapsed();

        if let ResultStatus::Degenerate { reason } = result.status() {
            warn!(algorithm = algorithm.name(), reason = %reason, test_rmse, "degenerate approximation");
        }
        info!(
            algorithm = algorithm.name(),
            test_rmse,
            elapsed_secs = elapsed.as_secs_f64(),
            "run finished"
        );

        Ok(RunReport {
            algorithm: algorithm.name(),
            input: self.input,
            summary: result.summary().to_string(),
            test_rmse,
            elapsed,
            status: result.status().clone(),
        })
    }

    /// Parses `name`, applies `overrides` and runs the algorithm.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAlgorithm` for a name outside the supported set.
    pub fn run_by_name(&self, name: &str, overrides: &Overrides) -> Result<RunReport> {
        let algorithm = name.parse::<Algorithm>()?.with_overrides(overrides);
        self.run(&algorithm)
    }
}

/// Everything a command-line run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Training ratings file
    pub train: PathBuf,
    /// Test ratings file
    pub test: PathBuf,
    /// Configured algorithm
    pub algorithm: Algorithm,
    /// Input matrix choice
    pub input: InputMatrix,
    /// Policy for users without training ratings
    pub missing_users: MissingUserPolicy,
    /// File receiving the test RMSE
    pub result_file: PathBuf,
    /// Append-only run log
    pub log_file: PathBuf,
}

impl RunConfig {
    /// Configuration with default files and options for `algorithm`.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            train: PathBuf::from("data/ratings_train.csv"),
            test: PathBuf::from("data/ratings_test.csv"),
            algorithm,
            input: InputMatrix::default(),
            missing_users: MissingUserPolicy::default(),
            result_file: PathBuf::from("result.txt"),
            log_file: PathBuf::from("results_log.txt"),
        }
    }

    /// Sets the train and test files.
    pub fn with_data<P1: Into<PathBuf>, P2: Into<PathBuf>>(mut self, train: P1, test: P2) -> Self {
        self.train = train.into();
        self.test = test.into();
        self
    }

    /// Sets the input matrix.
    pub fn with_input(mut self, input: InputMatrix) -> Self {
        self.input = input;
        self
    }

    /// Sets the missing-user policy.
    pub fn with_missing_users(mut self, policy: MissingUserPolicy) -> Self {
        self.missing_users = policy;
        self
    }

    /// Sets the result and log files.
    pub fn with_outputs<P1: Into<PathBuf>, P2: Into<PathBuf>>(
        mut self,
        result_file: P1,
        log_file: P2,
    ) -> Self {
        self.result_file = result_file.into();
        self.log_file = log_file.into();
        self
    }
}

/// Reads the inputs, runs the algorithm, writes the result and appends the
/// run log line.
///
/// Hyperparameters are validated before any file is opened.
pub fn execute(config: &RunConfig) -> Result<RunReport> {
    config.algorithm.validate()?;
    let train = io::read_ratings(&config.train)?;
    let test = io::read_ratings(&config.test)?;
    let ctx = EvaluationContext::build(&train, &test, config.missing_users)?;

    let report = Runner::new(&ctx, config.input).run(&config.algorithm)?;
    io::append_log(&config.log_file, &report.log_line())?;
    io::write_result(&config.result_file, report.test_rmse)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratingfill_core::{error::CompletionError, ratings::RatingRecord};

    fn context() -> EvaluationContext {
        let train = vec![
            RatingRecord::new(1, 1, 5.0),
            RatingRecord::new(2, 2, 3.0),
            RatingRecord::new(3, 1, 4.0),
        ];
        let test = vec![RatingRecord::new(1, 2, 4.0)];
        EvaluationContext::build(&train, &test, MissingUserPolicy::default()).unwrap()
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let ctx = context();
        let runner = Runner::new(&ctx, InputMatrix::Blend);
        let err = runner.run_by_name("KNN", &Overrides::default()).unwrap_err();
        assert!(matches!(err, CompletionError::UnknownAlgorithm { ref name } if name == "KNN"));
    }

    #[test]
    fn test_log_line_format() {
        let report = RunReport {
            algorithm: "SVD1",
            input: InputMatrix::User,
            summary: "SVD1 with r = 1 reduced RMSE by n/a from 0.000 to 0.100".to_string(),
            test_rmse: 0.5,
            elapsed: Duration::from_millis(1250),
            status: ResultStatus::Valid,
        };
        assert_eq!(
            report.log_line(),
            "For matrix user_average SVD1 with r = 1 reduced RMSE by n/a from 0.000 to 0.100 (Total time: 1.250s)"
        );
    }

    #[test]
    fn test_run_reports_test_rmse() {
        let ctx = context();
        let runner = Runner::new(&ctx, InputMatrix::Blend);
        let overrides = Overrides {
            rank: Some(1),
            ..Overrides::default()
        };
        let report = runner.run_by_name("SVD1", &overrides).unwrap();
        assert_eq!(report.algorithm, "SVD1");
        assert!(report.is_valid());
        assert!(report.test_rmse.is_finite());
        assert!(report.log_line().starts_with("For matrix user_item_blend SVD1 with r = 1"));
    }
}
