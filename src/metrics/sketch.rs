use std::io::Cursor;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use hdrhistogram::Histogram;
use hdrhistogram::serialization::{Deserializer, Serializer, V2Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, MetricsError};

/// Running first and second moments (Welford). Tracks exact mean and variance
/// alongside the bucketed histogram, and combines across workers without
/// revisiting samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Moments {
    pub fn push(&mut self, value: f64) {
        self.count = self.count.saturating_add(1);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Parallel combine. Associative and commutative up to floating-point
    /// rounding, so worker states can merge in any order.
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let total = self.count.saturating_add(other.count);
        let delta = other.mean - self.mean;
        let weight = other.count as f64 / total as f64;
        self.mean += delta * weight;
        self.m2 += other.m2 + delta * delta * (self.count as f64) * weight;
        self.count = total;
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    /// Sample variance (n - 1 denominator), 0 for fewer than two samples.
    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Fixed-size latency aggregate: an HDR histogram at three significant figures
/// for percentiles plus [`Moments`] for exact mean and standard deviation.
/// Values are recorded in microseconds. Memory stays bounded no matter how
/// many samples are folded in.
#[derive(Debug, Clone)]
pub struct LatencySketch {
    histogram: Histogram<u64>,
    moments: Moments,
}

impl LatencySketch {
    /// # Errors
    ///
    /// Fails only if the histogram cannot be allocated.
    pub fn new() -> AppResult<Self> {
        let histogram = Histogram::new(3).map_err(|err| {
            AppError::metrics(MetricsError::HistogramCreate {
                message: err.to_string(),
            })
        })?;
        Ok(Self {
            histogram,
            moments: Moments::default(),
        })
    }

    /// Record one latency sample. Sub-microsecond samples are clamped to one
    /// microsecond so they stay visible in the histogram.
    ///
    /// # Errors
    ///
    /// Fails if the histogram rejects the value.
    pub fn record(&mut self, latency: Duration) -> AppResult<()> {
        let micros = u64::try_from(latency.as_micros())
            .unwrap_or(u64::MAX)
            .max(1);
        self.histogram.record(micros).map_err(|err| {
            AppError::metrics(MetricsError::HistogramRecord {
                message: err.to_string(),
            })
        })?;
        self.moments.push(micros as f64);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the histograms are incompatible.
    pub fn merge(&mut self, other: &Self) -> AppResult<()> {
        self.histogram.add(&other.histogram).map_err(|err| {
            AppError::metrics(MetricsError::HistogramMerge {
                message: err.to_string(),
            })
        })?;
        self.moments.merge(&other.moments);
        Ok(())
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.histogram.len()
    }

    #[must_use]
    pub fn min_micros(&self) -> u64 {
        if self.count() == 0 { 0 } else { self.histogram.min() }
    }

    #[must_use]
    pub fn max_micros(&self) -> u64 {
        if self.count() == 0 { 0 } else { self.histogram.max() }
    }

    #[must_use]
    pub fn mean_micros(&self) -> f64 {
        self.moments.mean()
    }

    #[must_use]
    pub fn std_dev_micros(&self) -> f64 {
        self.moments.std_dev()
    }

    #[must_use]
    pub const fn moments(&self) -> Moments {
        self.moments
    }

    /// Percentile by rank: with `n` recorded samples, percentile `p` (0-100)
    /// is the value at rank `ceil(p/100 * n)`, ranks clamped to `[1, n]`.
    /// Walks the recorded buckets in value order accumulating counts.
    #[must_use]
    pub fn percentile_micros(&self, percentile: f64) -> u64 {
        let count = self.count();
        if count == 0 {
            return 0;
        }
        let rank = (percentile / 100.0 * count as f64).ceil() as u64;
        let rank = rank.clamp(1, count);
        let mut seen = 0u64;
        for value in self.histogram.iter_recorded() {
            seen = seen.saturating_add(value.count_since_last_iteration());
            if seen >= rank {
                return value.value_iterated_to();
            }
        }
        self.histogram.max()
    }

    #[must_use]
    pub fn median_micros(&self) -> u64 {
        self.percentile_micros(50.0)
    }

    /// Serialize the histogram to base64 for the wire. Moments travel as
    /// plain fields next to the blob.
    ///
    /// # Errors
    ///
    /// Fails if the histogram cannot be serialized.
    pub fn encode_base64(&self) -> AppResult<String> {
        let mut buffer = Vec::new();
        V2Serializer::new()
            .serialize(&self.histogram, &mut buffer)
            .map_err(|err| {
                AppError::metrics(MetricsError::HistogramSerialize {
                    message: err.to_string(),
                })
            })?;
        Ok(BASE64_STANDARD.encode(buffer))
    }

    /// Rebuild a sketch from a base64 histogram blob and its moments.
    ///
    /// # Errors
    ///
    /// Fails on malformed base64 or an undecodable histogram payload.
    pub fn decode_base64(encoded: &str, moments: Moments) -> AppResult<Self> {
        let bytes = BASE64_STANDARD.decode(encoded).map_err(|err| {
            AppError::metrics(MetricsError::HistogramDecode {
                message: err.to_string(),
            })
        })?;
        let histogram = Deserializer::new()
            .deserialize(&mut Cursor::new(bytes))
            .map_err(|err| {
                AppError::metrics(MetricsError::HistogramDeserialize {
                    message: err.to_string(),
                })
            })?;
        Ok(Self { histogram, moments })
    }
}
