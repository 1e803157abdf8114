use std::time::Duration;

use tokio::time::Instant;

/// One scheduling slot handed to the dispatch loop.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub index: u64,
    /// Nominal dispatch instant: `origin + index / rate`.
    pub nominal: Instant,
    /// Warmup ticks run before the measured window and stay out of the
    /// report.
    pub warmup: bool,
    /// The loop reached this tick after its nominal instant had passed.
    pub late: bool,
}

/// Open-loop tick source. Every tick has an absolute nominal instant computed
/// from the origin, so a late tick never pushes later ticks back and the
/// schedule never drifts.
#[derive(Debug)]
pub struct RateScheduler {
    origin: Instant,
    /// Nominal instant of the first measured tick.
    measured_origin: Instant,
    deadline: Instant,
    rate: u64,
    warmup_ticks: u64,
    total_ticks: u64,
    next_index: u64,
}

impl RateScheduler {
    /// A scheduler for `rate` requests per second over `duration`, preceded
    /// by `warmup_ticks` unmeasured ticks at the same rate. The measured tick
    /// count is `rate * duration` rounded to the nearest integer. A zero rate
    /// produces no ticks at all.
    #[must_use]
    pub fn new(rate: u64, duration: Duration, warmup_ticks: u64) -> Self {
        let origin = Instant::now();
        let measured_ticks = if rate == 0 {
            0
        } else {
            let nanos = u128::from(rate).saturating_mul(duration.as_nanos());
            u64::try_from((nanos.saturating_add(500_000_000)) / 1_000_000_000).unwrap_or(u64::MAX)
        };
        let warmup_ticks = if rate == 0 { 0 } else { warmup_ticks };
        let measured_origin = origin + offset_for(warmup_ticks, rate);
        Self {
            origin,
            measured_origin,
            deadline: measured_origin + duration,
            rate,
            warmup_ticks,
            total_ticks: warmup_ticks.saturating_add(measured_ticks),
            next_index: 0,
        }
    }

    #[must_use]
    pub fn nominal(&self, index: u64) -> Instant {
        self.origin + offset_for(index, self.rate)
    }

    /// Nominal instant of the first measured tick; the measured window is
    /// `[measured_origin, measured_origin + duration)`.
    #[must_use]
    pub const fn measured_origin(&self) -> Instant {
        self.measured_origin
    }

    #[must_use]
    pub const fn measured_ticks(&self) -> u64 {
        self.total_ticks - self.warmup_ticks
    }

    /// Wall-clock time since the start of the measured window.
    #[must_use]
    pub fn measured_elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.measured_origin)
    }

    /// Wait for the next tick. Sleeps until the nominal instant when it is
    /// still ahead; fires immediately (marked late) when it has passed.
    /// Returns `None` once every tick has been issued or the measured window
    /// has closed.
    pub async fn next_tick(&mut self) -> Option<Tick> {
        if self.next_index >= self.total_ticks {
            return None;
        }
        let index = self.next_index;
        let warmup = index < self.warmup_ticks;
        let nominal = self.nominal(index);
        let now = Instant::now();
        if !warmup && now >= self.deadline {
            return None;
        }
        let late = now > nominal;
        if !late {
            tokio::time::sleep_until(nominal).await;
        }
        self.next_index = index.saturating_add(1);
        Some(Tick {
            index,
            nominal,
            warmup,
            late,
        })
    }
}

fn offset_for(index: u64, rate: u64) -> Duration {
    if rate == 0 {
        return Duration::ZERO;
    }
    let nanos = u128::from(index).saturating_mul(1_000_000_000) / u128::from(rate);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
