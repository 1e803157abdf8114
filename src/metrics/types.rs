use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Closed error taxonomy for failed requests. Non-2xx/3xx responses are
/// counted as failures through the status histogram instead; an error kind is
/// only assigned when the exchange itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Timeout,
    ConnectionError,
    ClientError,
    OtherError,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::ConnectionError => "connection-error",
            ErrorKind::ClientError => "client-error",
            ErrorKind::OtherError => "other-error",
        }
    }

    /// Classify a transport failure into the fixed error taxonomy.
    #[must_use]
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            ErrorKind::Timeout
        } else if error.is_connect() {
            ErrorKind::ConnectionError
        } else if error.is_builder() || error.is_request() || error.is_body() {
            ErrorKind::ClientError
        } else {
            ErrorKind::OtherError
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One settled request. Created by the worker loop the moment a request
/// completes, fails, or times out; folded into the worker's sketch and
/// discarded immediately afterwards.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeRecord {
    /// Nominal dispatch instant the scheduler assigned to this tick.
    pub scheduled: Instant,
    /// Instant the exchange settled.
    pub completed: Instant,
    /// Completion minus actual dispatch (not scheduled dispatch).
    pub latency: Duration,
    /// Present only when an HTTP exchange completed.
    pub status: Option<u16>,
    pub bytes: u64,
    pub error: Option<ErrorKind>,
}

impl OutcomeRecord {
    /// A request succeeded when the exchange completed with a 2xx/3xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && matches!(self.status, Some(code) if (200..400).contains(&code))
    }
}
