//! ratingfill command-line binary

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ratingfill::prelude::{execute, Algorithm, InputMatrix, MissingUserPolicy, Overrides, RunConfig};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MissingUsers {
    /// Reject test users without training ratings
    Fail,
    /// Give them the global training mean
    GlobalMean,
}

impl From<MissingUsers> for MissingUserPolicy {
    fn from(value: MissingUsers) -> Self {
        match value {
            MissingUsers::Fail => Self::Fail,
            MissingUsers::GlobalMean => Self::GlobalMean,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(Parser)]
#[command(name = "ratingfill")]
#[command(about = "Evaluate low-rank rating completion algorithms by test RMSE")]
struct Args {
    /// Training ratings CSV (userId, movieId, rating, timestamp)
    #[arg(long, default_value = "data/ratings_train.csv")]
    train: PathBuf,

    /// Test ratings CSV
    #[arg(long, default_value = "data/ratings_test.csv")]
    test: PathBuf,

    /// Algorithm: NMF, SVD1, SVD2, SGD or NMF2_SVD2
    #[arg(long, default_value = "NMF")]
    alg: String,

    /// File receiving the test RMSE
    #[arg(long = "result_file", alias = "result-file", default_value = "result.txt")]
    result_file: PathBuf,

    /// Append-only run log
    #[arg(long, default_value = "results_log.txt")]
    log_file: PathBuf,

    /// Input matrix: user, item or blend
    #[arg(long, default_value = "blend")]
    input: InputMatrix,

    /// Rank r
    #[arg(long)]
    rank: Option<usize>,

    /// Round count i of SVD2 and NMF2_SVD2
    #[arg(long)]
    iterations: Option<usize>,

    /// SGD learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// SGD batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// SGD epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Seed of NMF initialization or SGD shuffling
    #[arg(long)]
    seed: Option<u64>,

    /// Handling of test users without training ratings
    #[arg(long, value_enum, default_value = "fail")]
    missing_users: MissingUsers,

    /// Logging level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            rank: self.rank,
            iterations: self.iterations,
            learning_rate: self.learning_rate,
            batch_size: self.batch_size,
            epochs: self.epochs,
            seed: self.seed,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(args.log_level))
        .init();

    // Reject unknown names and invalid hyperparameters before touching any file.
    let parsed = args
        .alg
        .parse::<Algorithm>()
        .map(|algorithm| algorithm.with_overrides(&args.overrides()))
        .and_then(|algorithm| algorithm.validate().map(|()| algorithm));
    let algorithm = match parsed {
        Ok(algorithm) => algorithm,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let config = RunConfig::new(algorithm)
        .with_data(&args.train, &args.test)
        .with_input(args.input)
        .with_missing_users(args.missing_users.into())
        .with_outputs(&args.result_file, &args.log_file);

    let report = match execute(&config) {
        Ok(report) => report,
        Err(e) => {
            error!("Run failed: {}", e);
            return Err(e.into());
        }
    };

    if !report.is_valid() {
        warn!("{} produced a degenerate approximation", report.algorithm);
    }
    info!("{}", report.summary);
    info!(
        "Test RMSE {} written to {}",
        report.test_rmse,
        config.result_file.display()
    );
    Ok(())
}
