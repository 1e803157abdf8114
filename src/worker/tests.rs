use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::Instant;

use super::governor::AdmissionGovernor;
use super::runner::run_worker;
use super::scheduler::RateScheduler;
use crate::args::HttpMethod;
use crate::config::{RequestBody, RunConfig};
use crate::error::AppResult;
use crate::http::{DispatchOutcome, RequestDispatch};
use crate::metrics::ErrorKind;

fn test_config(rps: u64, duration: Duration, concurrency: usize) -> RunConfig {
    RunConfig {
        url: "http://localhost:8080/".to_owned(),
        method: HttpMethod::Get,
        headers: Vec::new(),
        body: RequestBody::Empty,
        total_rps: rps,
        duration,
        warmup: 0,
        concurrency,
        timeout: Duration::from_secs(10),
        insecure: false,
        read_body: true,
        progress: false,
    }
}

/// Responds with a fixed status after a fixed simulated latency.
struct FixedLatency {
    latency: Duration,
    status: u16,
}

#[async_trait]
impl RequestDispatch for FixedLatency {
    async fn dispatch(&self) -> DispatchOutcome {
        tokio::time::sleep(self.latency).await;
        DispatchOutcome {
            status: Some(self.status),
            bytes: 128,
            error: None,
        }
    }
}

/// Times out three requests in every ten, succeeds quickly otherwise.
struct FlakyTransport {
    calls: AtomicU64,
    timeout: Duration,
}

#[async_trait]
impl RequestDispatch for FlakyTransport {
    async fn dispatch(&self) -> DispatchOutcome {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if call % 10 < 3 {
            tokio::time::sleep(self.timeout).await;
            DispatchOutcome {
                status: None,
                bytes: 0,
                error: Some(ErrorKind::Timeout),
            }
        } else {
            tokio::time::sleep(Duration::from_millis(10)).await;
            DispatchOutcome {
                status: Some(200),
                bytes: 128,
                error: None,
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn scheduler_issues_exact_tick_count() {
    let mut scheduler = RateScheduler::new(1_000, Duration::from_secs(10), 0);
    assert_eq!(scheduler.measured_ticks(), 10_000);

    let mut issued = 0u64;
    let mut late = 0u64;
    while let Some(tick) = scheduler.next_tick().await {
        assert_eq!(tick.index, issued);
        issued += 1;
        if tick.late {
            late += 1;
        }
    }
    assert_eq!(issued, 10_000);
    assert_eq!(late, 0);
}

#[tokio::test(start_paused = true)]
async fn nominal_instants_never_drift() {
    let scheduler = RateScheduler::new(1_000, Duration::from_secs(10), 0);
    let origin = scheduler.nominal(0);
    assert_eq!(scheduler.nominal(5_000), origin + Duration::from_secs(5));
    assert_eq!(scheduler.nominal(10_000), origin + Duration::from_secs(10));
    assert_eq!(scheduler.nominal(1), origin + Duration::from_millis(1));
}

#[tokio::test(start_paused = true)]
async fn late_ticks_fire_immediately_without_shifting_the_schedule() -> AppResult<()> {
    let mut scheduler = RateScheduler::new(10, Duration::from_secs(1), 0);
    let first = scheduler.next_tick().await;
    assert!(matches!(first, Some(tick) if !tick.late));

    // stall the loop for half the window
    tokio::time::advance(Duration::from_millis(450)).await;

    let mut late = 0u64;
    let mut issued = 1u64;
    while let Some(tick) = scheduler.next_tick().await {
        issued += 1;
        if tick.late {
            late += 1;
            // a late tick fires at once instead of waiting
            assert!(Instant::now() > tick.nominal);
        }
    }
    assert_eq!(issued, 10);
    assert_eq!(late, 4);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn measured_window_closes_at_the_deadline() {
    let mut scheduler = RateScheduler::new(10, Duration::from_secs(1), 0);
    assert!(scheduler.next_tick().await.is_some());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(scheduler.next_tick().await.is_none());
    assert!(scheduler.next_tick().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn warmup_ticks_precede_the_measured_window() {
    let mut scheduler = RateScheduler::new(100, Duration::from_secs(1), 50);
    assert_eq!(scheduler.measured_ticks(), 100);
    assert_eq!(
        scheduler.measured_origin(),
        scheduler.nominal(0) + Duration::from_millis(500)
    );

    let mut warmup_seen = 0u64;
    let mut measured_seen = 0u64;
    while let Some(tick) = scheduler.next_tick().await {
        if tick.warmup {
            assert_eq!(measured_seen, 0, "warmup must come first");
            warmup_seen += 1;
        } else {
            measured_seen += 1;
        }
    }
    assert_eq!(warmup_seen, 50);
    assert_eq!(measured_seen, 100);
}

#[tokio::test(start_paused = true)]
async fn zero_rate_issues_no_ticks() {
    let mut scheduler = RateScheduler::new(0, Duration::from_secs(5), 10);
    assert_eq!(scheduler.measured_ticks(), 0);
    assert!(scheduler.next_tick().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn governor_caps_in_flight_work() -> AppResult<()> {
    let governor = Arc::new(AdmissionGovernor::new(4));
    let in_flight = Arc::new(AtomicI64::new(0));
    let peak = Arc::new(AtomicI64::new(0));

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let governor = Arc::clone(&governor);
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        tasks.push(tokio::spawn(async move {
            let permit = governor.admit(true).await?;
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            drop(permit);
            Ok::<(), crate::error::AppError>(())
        }));
    }
    for task in tasks {
        task.await??;
    }

    assert!(peak.load(Ordering::SeqCst) <= 4);
    assert_eq!(governor.delayed_ticks(), 16);
    governor.drain().await?;
    assert_eq!(governor.in_flight(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn run_delivers_the_target_request_count() -> AppResult<()> {
    let config = test_config(1_000, Duration::from_secs(5), 256);
    let dispatcher = Arc::new(FixedLatency {
        latency: Duration::from_millis(10),
        status: 200,
    });
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let summary = run_worker(&config, 1_000, dispatcher, None, shutdown_rx).await?;
    drop(shutdown_tx);

    assert_eq!(summary.total_requests, 5_000);
    assert_eq!(summary.successful_requests, 5_000);
    assert_eq!(summary.failed_requests, 0);
    assert_eq!(summary.late_ticks, 0);
    assert_eq!(summary.delayed_ticks, 0);
    assert!(!summary.partial);
    assert_eq!(summary.status_counts.get(&200), Some(&5_000));

    // simulated latency is exactly 10ms, the histogram rounds within 0.1%
    let p50 = summary.sketch.percentile_micros(50.0);
    assert!((9_990..=10_020).contains(&p50), "p50 was {p50}");
    assert!((summary.sketch.mean_micros() - 10_000.0).abs() < 1.0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn timeouts_land_in_the_error_histogram() -> AppResult<()> {
    let config = test_config(1_000, Duration::from_secs(5), 2_048);
    let dispatcher = Arc::new(FlakyTransport {
        calls: AtomicU64::new(0),
        timeout: Duration::from_secs(1),
    });
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let summary = run_worker(&config, 1_000, dispatcher, None, shutdown_rx).await?;
    drop(shutdown_tx);

    assert_eq!(summary.total_requests, 5_000);
    assert_eq!(summary.failed_requests, 1_500);
    assert_eq!(summary.successful_requests, 3_500);
    assert_eq!(summary.error_counts.get(&ErrorKind::Timeout), Some(&1_500));
    // latency samples come only from completed exchanges
    assert_eq!(summary.sketch.count(), 3_500);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_produces_a_partial_summary() -> AppResult<()> {
    let config = test_config(100, Duration::from_secs(30), 256);
    let dispatcher = Arc::new(FixedLatency {
        latency: Duration::from_millis(5),
        status: 200,
    });
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(shutdown_tx.send(()));
    });

    let summary = run_worker(&config, 100, dispatcher, None, shutdown_rx).await?;

    assert!(summary.partial);
    assert!(summary.total_requests < 1_000, "run was cut short");
    assert!(summary.total_requests > 300, "ran for roughly five seconds");
    assert!(summary.duration <= Duration::from_secs(6));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn warmup_requests_stay_out_of_the_summary() -> AppResult<()> {
    let mut config = test_config(100, Duration::from_secs(2), 256);
    config.warmup = 50;
    let dispatcher = Arc::new(FixedLatency {
        latency: Duration::from_millis(5),
        status: 200,
    });
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let summary = run_worker(&config, 100, dispatcher, None, shutdown_rx).await?;
    drop(shutdown_tx);

    assert_eq!(summary.total_requests, 200);
    assert_eq!(summary.sketch.count(), 200);
    Ok(())
}
