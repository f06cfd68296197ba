use thiserror::Error;

use hifitime::HifitimeError;
use zip::result::ZipError;

/// Errors that abort the processing of one request
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid date: ({0}, {1}) is neither year/day-of-year nor gps week/day-of-week")]
    InvalidCoordinate(i64, i64),

    #[error("unknown correction tier code \"{0}\"")]
    UnknownTier(String),

    #[error("summary report: missing {0} field")]
    MissingField(&'static str),

    #[error("summary report: invalid {field} value \"{value}\"")]
    InvalidField { field: &'static str, value: String },

    #[error("no valid clock epoch found in input files")]
    EmptySeries,

    #[error("incomplete week: {0} daily files")]
    IncompleteWeek(usize),

    #[error("{0} is in the future")]
    FutureDate(String),

    #[error("{0}: no valid data line, refusing to append")]
    CorruptDataset(String),

    #[error("can't locate measurement path from \"{0}\"")]
    MeasurementPath(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("time error: {0}")]
    Time(#[from] HifitimeError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip error: {0}")]
    Zip(#[from] ZipError),
}
