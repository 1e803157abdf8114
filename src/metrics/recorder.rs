use std::collections::BTreeMap;
use std::time::Duration;

use super::sketch::LatencySketch;
use super::summary::WorkerSummary;
use super::types::{ErrorKind, OutcomeRecord};
use crate::error::AppResult;

/// Folds settled requests into fixed-size state: a latency sketch plus
/// counters and the status/error histograms. Owned by a single task; records
/// arrive over a channel and are dropped after folding.
#[derive(Debug)]
pub struct SampleRecorder {
    sketch: LatencySketch,
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    bytes_total: u64,
    status_counts: BTreeMap<u16, u64>,
    error_counts: BTreeMap<ErrorKind, u64>,
}

impl SampleRecorder {
    /// # Errors
    ///
    /// Fails only if the latency sketch cannot be allocated.
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            sketch: LatencySketch::new()?,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            bytes_total: 0,
            status_counts: BTreeMap::new(),
            error_counts: BTreeMap::new(),
        })
    }

    /// Fold one settled request. Latency samples are taken only from
    /// completed exchanges; transport failures contribute to the error
    /// histogram but not to the latency distribution.
    ///
    /// # Errors
    ///
    /// Fails if the latency sketch rejects the sample.
    pub fn record(&mut self, outcome: &OutcomeRecord) -> AppResult<()> {
        self.total_requests = self.total_requests.saturating_add(1);
        self.bytes_total = self.bytes_total.saturating_add(outcome.bytes);

        if let Some(status) = outcome.status {
            *self.status_counts.entry(status).or_insert(0) += 1;
            self.sketch.record(outcome.latency)?;
        }

        if let Some(kind) = outcome.error {
            *self.error_counts.entry(kind).or_insert(0) += 1;
        }

        if outcome.is_success() {
            self.successful_requests = self.successful_requests.saturating_add(1);
        } else {
            self.failed_requests = self.failed_requests.saturating_add(1);
        }
        Ok(())
    }

    #[must_use]
    pub const fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Snapshot the current state into a summary. Used both for live
    /// progress (with `partial` set) and for the final report.
    #[must_use]
    pub fn snapshot(
        &self,
        duration: Duration,
        late_ticks: u64,
        delayed_ticks: u64,
        partial: bool,
    ) -> WorkerSummary {
        WorkerSummary {
            duration,
            total_requests: self.total_requests,
            successful_requests: self.successful_requests,
            failed_requests: self.failed_requests,
            bytes_total: self.bytes_total,
            late_ticks,
            delayed_ticks,
            status_counts: self.status_counts.clone(),
            error_counts: self.error_counts.clone(),
            sketch: self.sketch.clone(),
            partial,
        }
    }
}
