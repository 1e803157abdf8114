/// Throughput one worker process is expected to sustain comfortably.
pub const PER_WORKER_TARGET_RPS: u64 = 2_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPlan {
    pub count: usize,
    pub reason: SizingReason,
}

/// How the worker count was arrived at, echoed in the startup banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingReason {
    Manual,
    Auto { demand: usize, cap: usize },
    CpuFallback { cpus: usize },
}

impl std::fmt::Display for SizingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizingReason::Manual => write!(f, "user override"),
            SizingReason::Auto { demand, cap } => {
                write!(
                    f,
                    "auto-sized for ~{PER_WORKER_TARGET_RPS} req/s per worker (demand {demand}, cap {cap})"
                )
            }
            SizingReason::CpuFallback { cpus } => write!(f, "one per CPU ({cpus} available)"),
        }
    }
}

/// Pick the worker process count. An explicit request always wins. With
/// auto-sizing on, demand is `ceil(total_rps / 2500)` capped at
/// `max_workers` (default twice the CPU count); with it off, one worker
/// per CPU.
#[must_use]
pub fn choose_workers(
    requested: Option<usize>,
    auto: bool,
    total_rps: u64,
    max_workers: Option<usize>,
    cpus: usize,
) -> WorkerPlan {
    if let Some(count) = requested {
        return WorkerPlan {
            count: count.max(1),
            reason: SizingReason::Manual,
        };
    }
    let cpus = cpus.max(1);
    if !auto {
        return WorkerPlan {
            count: cpus,
            reason: SizingReason::CpuFallback { cpus },
        };
    }
    let cap = max_workers
        .unwrap_or_else(|| cpus.saturating_mul(2))
        .max(1);
    let demand = usize::try_from(total_rps.div_ceil(PER_WORKER_TARGET_RPS))
        .unwrap_or(usize::MAX)
        .max(1);
    WorkerPlan {
        count: demand.min(cap),
        reason: SizingReason::Auto { demand, cap },
    }
}

/// CPUs visible to this process, 1 when detection fails.
#[must_use]
pub fn available_cpus() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

#[cfg(test)]
mod tests {
    use super::{SizingReason, choose_workers};

    #[test]
    fn scales_with_target_rate() {
        assert_eq!(choose_workers(None, true, 15_000, None, 8).count, 6);
        assert_eq!(choose_workers(None, true, 2_500, None, 8).count, 1);
        assert_eq!(choose_workers(None, true, 2_501, None, 8).count, 2);
        assert_eq!(choose_workers(None, true, 1, None, 8).count, 1);
    }

    #[test]
    fn cap_defaults_to_twice_the_cpus() {
        let plan = choose_workers(None, true, 1_000_000, None, 4);
        assert_eq!(plan.count, 8);
        assert_eq!(plan.reason, SizingReason::Auto { demand: 400, cap: 8 });
    }

    #[test]
    fn explicit_cap_overrides_the_default() {
        assert_eq!(choose_workers(None, true, 1_000_000, Some(3), 4).count, 3);
        assert_eq!(choose_workers(None, true, 100, Some(3), 4).count, 1);
    }

    #[test]
    fn manual_count_skips_sizing() {
        let plan = choose_workers(Some(12), true, 100, Some(2), 4);
        assert_eq!(plan.count, 12);
        assert_eq!(plan.reason, SizingReason::Manual);
    }

    #[test]
    fn disabled_sizing_falls_back_to_cpus() {
        let plan = choose_workers(None, false, 1_000_000, None, 4);
        assert_eq!(plan.count, 4);
        assert_eq!(plan.reason, SizingReason::CpuFallback { cpus: 4 });
    }
}
