use thiserror::Error;

use super::{HttpError, MetricsError, ValidationError, WorkerError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("HTTP client error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
    #[error("Join error: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
    #[error("Parse error: {source}")]
    ParseInt {
        #[from]
        source: std::num::ParseIntError,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn http<E>(error: E) -> Self
    where
        E: Into<HttpError>,
    {
        error.into().into()
    }

    pub fn metrics<E>(error: E) -> Self
    where
        E: Into<MetricsError>,
    {
        error.into().into()
    }

    pub fn worker<E>(error: E) -> Self
    where
        E: Into<WorkerError>,
    {
        error.into().into()
    }

    /// Process exit code for this error. Problems detected before any load
    /// is generated (bad arguments, bad URL, unresolvable host) exit with 2,
    /// everything else with 1.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            AppError::Validation(_) | AppError::Clap { .. } | AppError::Http(_) => 2,
            AppError::Io { .. }
            | AppError::Json { .. }
            | AppError::Reqwest { .. }
            | AppError::Join { .. }
            | AppError::ParseInt { .. }
            | AppError::Metrics(_)
            | AppError::Worker(_) => 1,
        }
    }
}
