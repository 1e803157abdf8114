use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::error::AppResult;
use crate::metrics::{ErrorKind, LatencySketch, Moments, WorkerSummary};

/// One line on the coordinator/worker pipe. Exactly one JSON object per
/// line; the tag tells the receiver what follows.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Coordinator to worker, first and only line on stdin.
    Config(Box<ConfigMessage>),
    /// Worker to coordinator, periodic live snapshot.
    Stream(Box<StreamMessage>),
    /// Worker to coordinator, final summary, last line before exit.
    Report(Box<ReportMessage>),
    /// Worker to coordinator, fatal worker-side failure.
    Error(ErrorMessage),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigMessage {
    pub worker_index: usize,
    /// This worker's share of the total target rate.
    pub rate: u64,
    pub config: RunConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamMessage {
    pub worker_index: usize,
    pub summary: WireSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportMessage {
    pub worker_index: usize,
    pub summary: WireSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub worker_index: usize,
    pub message: String,
}

/// Serializable form of a worker summary. The latency histogram travels as a
/// base64 blob; the exact moments travel as plain fields beside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSummary {
    pub duration_ms: u64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub bytes_total: u64,
    pub late_ticks: u64,
    pub delayed_ticks: u64,
    #[serde(deserialize_with = "status_counts_from_wire")]
    pub status_counts: BTreeMap<u16, u64>,
    pub error_counts: BTreeMap<ErrorKind, u64>,
    pub histogram_b64: String,
    pub moments: Moments,
    pub partial: bool,
}

/// JSON object keys are always strings, and the internally tagged
/// `WireMessage` enum buffers them as such before this struct sees them, so
/// the status-code keys must be parsed back to `u16` explicitly.
fn status_counts_from_wire<'de, D>(deserializer: D) -> Result<BTreeMap<u16, u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = BTreeMap::<String, u64>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| key.parse::<u16>().map(|code| (code, value)).map_err(D::Error::custom))
        .collect()
}

impl WireSummary {
    /// # Errors
    ///
    /// Fails if the latency histogram cannot be serialized.
    pub fn from_summary(summary: &WorkerSummary) -> AppResult<Self> {
        Ok(Self {
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            total_requests: summary.total_requests,
            successful_requests: summary.successful_requests,
            failed_requests: summary.failed_requests,
            bytes_total: summary.bytes_total,
            late_ticks: summary.late_ticks,
            delayed_ticks: summary.delayed_ticks,
            status_counts: summary.status_counts.clone(),
            error_counts: summary.error_counts.clone(),
            histogram_b64: summary.sketch.encode_base64()?,
            moments: summary.sketch.moments(),
            partial: summary.partial,
        })
    }

    /// # Errors
    ///
    /// Fails on an undecodable histogram blob.
    pub fn to_summary(&self) -> AppResult<WorkerSummary> {
        Ok(WorkerSummary {
            duration: Duration::from_millis(self.duration_ms),
            total_requests: self.total_requests,
            successful_requests: self.successful_requests,
            failed_requests: self.failed_requests,
            bytes_total: self.bytes_total,
            late_ticks: self.late_ticks,
            delayed_ticks: self.delayed_ticks,
            status_counts: self.status_counts.clone(),
            error_counts: self.error_counts.clone(),
            sketch: LatencySketch::decode_base64(&self.histogram_b64, self.moments)?,
            partial: self.partial,
        })
    }
}
