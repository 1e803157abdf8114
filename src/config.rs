use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::args::{HammerArgs, HttpMethod};
use crate::error::{AppError, AppResult, HttpError, ValidationError};

/// Interval between live progress snapshots emitted by workers.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Resolved request body. File bodies are read once at config build time so
/// worker processes never touch the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestBody {
    Empty,
    Raw { content: String },
    Json { content: String },
}

impl RequestBody {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

/// Immutable run configuration, constructed once by the coordinator and
/// shared read-only with every worker process. `total_rps` is the sum of the
/// per-worker shares computed by [`rate_share`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub total_rps: u64,
    pub duration: Duration,
    pub warmup: u64,
    pub concurrency: usize,
    pub timeout: Duration,
    pub insecure: bool,
    pub read_body: bool,
    pub progress: bool,
}

impl RunConfig {
    /// Build and validate a run configuration from CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed or non-HTTP URL, an unreadable body
    /// file, invalid JSON for `--json`, or conflicting body sources. These
    /// are the fatal errors detected before any worker starts.
    pub fn from_args(args: &HammerArgs) -> AppResult<Self> {
        let url = validate_url(&args.url)?;
        let body = resolve_body(args)?;

        Ok(Self {
            url,
            method: args.method,
            headers: args.headers.clone(),
            body,
            total_rps: args.rps.get(),
            duration: args.duration,
            warmup: args.warmup,
            concurrency: args.concurrency.get(),
            timeout: args.timeout,
            insecure: args.insecure,
            read_body: !args.no_read_body,
            progress: args.progress,
        })
    }
}

fn validate_url(raw: &str) -> AppResult<String> {
    let parsed = Url::parse(raw).map_err(|err| {
        AppError::http(HttpError::InvalidUrl {
            url: raw.to_owned(),
            source: err,
        })
    })?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AppError::http(HttpError::UnsupportedScheme {
                scheme: other.to_owned(),
            }));
        }
    }
    if parsed.host_str().is_none() {
        return Err(AppError::http(HttpError::MissingHost {
            url: raw.to_owned(),
        }));
    }
    Ok(parsed.into())
}

fn resolve_body(args: &HammerArgs) -> AppResult<RequestBody> {
    let sources = usize::from(args.data.is_some())
        .saturating_add(usize::from(args.json.is_some()))
        .saturating_add(usize::from(args.data_file.is_some()));
    if sources > 1 {
        return Err(AppError::validation(ValidationError::BodySourceConflict));
    }

    if let Some(json) = args.json.as_deref() {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|err| AppError::validation(ValidationError::InvalidJsonBody { source: err }))?;
        let content = serde_json::to_string(&value)?;
        return Ok(RequestBody::Json { content });
    }

    if let Some(path) = args.data_file.as_deref() {
        let content = std::fs::read_to_string(path).map_err(|err| {
            AppError::http(HttpError::ReadBodyFile {
                path: PathBuf::from(path),
                source: err,
            })
        })?;
        return Ok(RequestBody::Raw { content });
    }

    if let Some(data) = args.data.as_ref() {
        return Ok(RequestBody::Raw {
            content: data.clone(),
        });
    }

    Ok(RequestBody::Empty)
}

/// Exact rate share for one worker: `total / workers` plus one extra unit for
/// the first `total % workers` workers, so the shares always sum to `total`.
#[must_use]
pub fn rate_share(total_rps: u64, workers: usize, index: usize) -> u64 {
    let workers = workers.max(1) as u64;
    let index = index as u64;
    let base = total_rps.checked_div(workers).unwrap_or(0);
    let remainder = total_rps.checked_rem(workers).unwrap_or(0);
    if index < remainder {
        base.saturating_add(1)
    } else {
        base
    }
}
