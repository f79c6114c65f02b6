//! Input and output files of a run.
//!
//! - Ratings are read from CSV files with a header row containing at least
//!   `userId`, `movieId` and `rating`; a `timestamp` column is optional and
//!   extra columns are ignored.
//! - The result file receives the test RMSE as plain text and is overwritten.
//! - The run log is opened in append mode, one line per run.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use ratingfill_core::{
    error::{CompletionError, Result},
    ratings::RatingRecord,
};
use tracing::debug;

/// Columns every ratings file must provide.
pub const REQUIRED_COLUMNS: [&str; 3] = ["userId", "movieId", "rating"];

/// Reads all rating records from the CSV file at `path`.
///
/// # Errors
///
/// - `Io` when the file cannot be opened or read.
/// - `MissingColumn` when a required column is absent from the header.
/// - `InvalidInput` for a row that does not parse or has a non-positive
///   rating (a zero rating would be indistinguishable from a missing cell).
pub fn read_ratings<P: AsRef<Path>>(path: P) -> Result<Vec<RatingRecord>> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let file = File::open(path).map_err(|e| CompletionError::io(&path_str, &e))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| CompletionError::invalid_input(&path_str, 1, e.to_string()))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(CompletionError::missing_column(&path_str, column));
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| {
            let line = e.position().map_or(0, csv::Position::line);
            CompletionError::invalid_input(&path_str, line, e.to_string())
        })?;
        let line = row.position().map_or(0, csv::Position::line);
        let record: RatingRecord = row
            .deserialize(Some(&headers))
            .map_err(|e| CompletionError::invalid_input(&path_str, line, e.to_string()))?;
        if !record.rating.is_finite() || record.rating <= 0.0 {
            return Err(CompletionError::invalid_input(
                &path_str,
                line,
                format!("rating must be positive, got {}", record.rating),
            ));
        }
        records.push(record);
    }

    debug!(path = %path_str, records = records.len(), "ratings loaded");
    Ok(records)
}

/// Writes the test RMSE to `path`, replacing any previous content.
pub fn write_result<P: AsRef<Path>>(path: P, rmse: f64) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, rmse.to_string()).map_err(|e| CompletionError::io(path.display().to_string(), &e))
}

/// Appends `line` to the run log at `path`, creating the file if needed.
pub fn append_log<P: AsRef<Path>>(path: P, line: &str) -> Result<()> {
    let path = path.as_ref();
    let to_error = |e: std::io::Error| CompletionError::io(path.display().to_string(), &e);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)?;
    writeln!(file, "{line}").map_err(to_error)
}
