use std::collections::BTreeMap;
use std::time::Duration;

use super::sketch::LatencySketch;
use super::types::ErrorKind;
use crate::error::{AppError, AppResult, WorkerError};

/// Aggregate produced by one worker, either as a live snapshot or as its
/// final report.
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    /// Measured wall-clock span for this worker, capped at the configured
    /// run duration.
    pub duration: Duration,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub bytes_total: u64,
    /// Measured ticks that fired after their nominal instant.
    pub late_ticks: u64,
    /// Measured ticks that had to wait for an admission permit.
    pub delayed_ticks: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub error_counts: BTreeMap<ErrorKind, u64>,
    pub sketch: LatencySketch,
    /// Set when the run was interrupted or a worker went missing.
    pub partial: bool,
}

/// Derived latency figures for the report, all in microseconds.
#[derive(Debug, Clone, Copy)]
pub struct LatencyStats {
    pub min: u64,
    pub mean: f64,
    pub median: u64,
    pub max: u64,
    pub std_dev: f64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
}

/// Merged run-wide aggregate. Absorbing worker summaries is associative and
/// commutative, so arrival order never changes the result.
#[derive(Debug)]
pub struct GlobalSummary {
    pub workers_expected: usize,
    pub workers_reporting: usize,
    pub duration: Duration,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub bytes_total: u64,
    pub late_ticks: u64,
    pub delayed_ticks: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub error_counts: BTreeMap<ErrorKind, u64>,
    pub sketch: LatencySketch,
    pub partial: bool,
}

impl GlobalSummary {
    /// # Errors
    ///
    /// Fails only if the latency sketch cannot be allocated.
    pub fn new(workers_expected: usize) -> AppResult<Self> {
        Ok(Self {
            workers_expected,
            workers_reporting: 0,
            duration: Duration::ZERO,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            bytes_total: 0,
            late_ticks: 0,
            delayed_ticks: 0,
            status_counts: BTreeMap::new(),
            error_counts: BTreeMap::new(),
            sketch: LatencySketch::new()?,
            partial: false,
        })
    }

    /// Fold one worker summary into the run-wide aggregate. Counters add,
    /// histograms merge bucket-wise, the duration takes the maximum.
    ///
    /// # Errors
    ///
    /// Fails if the latency sketches cannot be merged.
    pub fn absorb(&mut self, summary: &WorkerSummary) -> AppResult<()> {
        self.workers_reporting = self.workers_reporting.saturating_add(1);
        self.duration = self.duration.max(summary.duration);
        self.total_requests = self.total_requests.saturating_add(summary.total_requests);
        self.successful_requests = self
            .successful_requests
            .saturating_add(summary.successful_requests);
        self.failed_requests = self.failed_requests.saturating_add(summary.failed_requests);
        self.bytes_total = self.bytes_total.saturating_add(summary.bytes_total);
        self.late_ticks = self.late_ticks.saturating_add(summary.late_ticks);
        self.delayed_ticks = self.delayed_ticks.saturating_add(summary.delayed_ticks);
        for (status, count) in &summary.status_counts {
            *self.status_counts.entry(*status).or_insert(0) += count;
        }
        for (kind, count) in &summary.error_counts {
            *self.error_counts.entry(*kind).or_insert(0) += count;
        }
        self.sketch.merge(&summary.sketch)?;
        self.partial = self.partial || summary.partial;
        Ok(())
    }

    /// Mark the run partial because a worker never reported.
    pub fn note_missing_worker(&mut self) {
        self.partial = true;
    }

    /// # Errors
    ///
    /// Fails when no worker reported at all.
    pub fn require_reports(&self) -> AppResult<()> {
        if self.workers_reporting == 0 {
            return Err(AppError::worker(WorkerError::NoSummaries));
        }
        Ok(())
    }

    /// Achieved throughput over the measured span.
    #[must_use]
    pub fn achieved_rps(&self) -> f64 {
        let seconds = self.duration.as_secs_f64();
        if seconds > 0.0 {
            self.total_requests as f64 / seconds
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64 * 100.0
        }
    }

    #[must_use]
    pub fn latency_stats(&self) -> LatencyStats {
        LatencyStats {
            min: self.sketch.min_micros(),
            mean: self.sketch.mean_micros(),
            median: self.sketch.median_micros(),
            max: self.sketch.max_micros(),
            std_dev: self.sketch.std_dev_micros(),
            p50: self.sketch.percentile_micros(50.0),
            p90: self.sketch.percentile_micros(90.0),
            p95: self.sketch.percentile_micros(95.0),
            p99: self.sketch.percentile_micros(99.0),
        }
    }
}
