use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::models::ticker::Ticker;

/// Run-level errors. Any of these aborts the current run.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Cannot read ticker list {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read output file {path}: {source}")]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot append to output file {path}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Per-ticker fetch failure. Recovered by the runner, never fatal.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("no statistics page exists for {ticker}")]
    NotFound { ticker: Ticker },

    #[error("request for {ticker} returned HTTP {status}")]
    Status {
        ticker: Ticker,
        status: reqwest::StatusCode,
    },

    #[error("request for {ticker} failed: {source}")]
    Request {
        ticker: Ticker,
        #[source]
        source: reqwest::Error,
    },

    #[error("page for {ticker} contained no statistics rows")]
    NoStatistics { ticker: Ticker },

    #[error("fetching {ticker} timed out after {after:?}")]
    Timeout { ticker: Ticker, after: Duration },

    #[error("fetching {ticker} failed: {reason}")]
    Other { ticker: Ticker, reason: String },
}

impl FetchError {
    pub fn ticker(&self) -> &Ticker {
        match self {
            FetchError::NotFound { ticker }
            | FetchError::Status { ticker, .. }
            | FetchError::Request { ticker, .. }
            | FetchError::NoStatistics { ticker }
            | FetchError::Timeout { ticker, .. }
            | FetchError::Other { ticker, .. } => ticker,
        }
    }
}

impl FetchError {
    /// Failure description without the ticker, for per-ticker log lines
    pub fn reason(&self) -> String {
        match self {
            FetchError::NotFound { .. } => "no statistics page exists".to_string(),
            FetchError::Status { status, .. } => format!("HTTP {}", status),
            FetchError::Request { source, .. } => format!("request failed: {}", source),
            FetchError::NoStatistics { .. } => "page contained no statistics rows".to_string(),
            FetchError::Timeout { after, .. } => format!("timed out after {:?}", after),
            FetchError::Other { reason, .. } => reason.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CollectorError>;
