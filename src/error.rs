use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid amount {0:?}: expected a non-negative number no larger than 10^15")]
    InvalidAmount(String),

    #[error("invalid transaction type {0:?}: expected \"income\" or \"expense\"")]
    InvalidKind(String),

    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time {0:?}: expected HH:MM")]
    InvalidTime(String),

    #[error("stored transactions are malformed: {0}")]
    MalformedData(#[source] serde_json::Error),

    #[error("could not save transactions to {0:?}: {1}")]
    Persist(PathBuf, #[source] std::io::Error),

    #[error("unable to locate the user data directory")]
    DataDir,

    #[error("could not format date: {0}")]
    Format(#[from] time::error::Format),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
