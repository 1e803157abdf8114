use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use super::governor::AdmissionGovernor;
use super::scheduler::RateScheduler;
use super::ShutdownReceiver;
use crate::config::{PROGRESS_INTERVAL, RunConfig};
use crate::error::AppResult;
use crate::http::RequestDispatch;
use crate::metrics::{OutcomeRecord, SampleRecorder, WorkerSummary};

/// Drive one worker's full run: warmup, the measured open-loop window, then
/// a drain of in-flight requests. Returns the worker's summary; `partial` is
/// set when a shutdown signal cut the run short.
///
/// # Errors
///
/// Fails if the recorder task fails or admission breaks down.
pub async fn run_worker<D>(
    config: &RunConfig,
    rate: u64,
    dispatcher: Arc<D>,
    progress: Option<mpsc::Sender<WorkerSummary>>,
    mut shutdown: ShutdownReceiver,
) -> AppResult<WorkerSummary>
where
    D: RequestDispatch + 'static,
{
    let mut scheduler = RateScheduler::new(rate, config.duration, config.warmup);
    let governor = Arc::new(AdmissionGovernor::new(config.concurrency));
    let late_ticks = Arc::new(AtomicU64::new(0));

    let capacity = config.concurrency.saturating_mul(2).max(64);
    let (record_tx, record_rx) = mpsc::channel::<OutcomeRecord>(capacity);
    let recorder_task = tokio::spawn(accumulate(
        record_rx,
        progress,
        scheduler.measured_origin(),
        config.duration,
        Arc::clone(&late_ticks),
        Arc::clone(&governor),
    ));

    debug!(rate, warmup = config.warmup, "dispatch loop starting");
    let mut interrupted = false;
    loop {
        let maybe_tick = tokio::select! {
            biased;
            () = wait_for_shutdown(&mut shutdown) => {
                interrupted = true;
                break;
            }
            tick = scheduler.next_tick() => tick,
        };
        let Some(tick) = maybe_tick else { break };

        if tick.late && !tick.warmup {
            late_ticks.fetch_add(1, Ordering::Relaxed);
        }
        let permit = governor.admit(!tick.warmup).await?;

        let record_tx = if tick.warmup {
            None
        } else {
            Some(record_tx.clone())
        };
        let dispatcher = Arc::clone(&dispatcher);
        let scheduled = tick.nominal;
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = dispatcher.dispatch().await;
            if let Some(tx) = record_tx {
                let record = OutcomeRecord {
                    scheduled,
                    completed: Instant::now(),
                    latency: started.elapsed(),
                    status: outcome.status,
                    bytes: outcome.bytes,
                    error: outcome.error,
                };
                drop(tx.send(record).await);
            }
            drop(permit);
        });
    }

    debug!(in_flight = governor.in_flight(), "draining in-flight requests");
    governor.drain().await?;
    drop(record_tx);
    let recorder = recorder_task.await??;

    let elapsed = scheduler.measured_elapsed().min(config.duration);
    let summary = recorder.snapshot(
        elapsed,
        late_ticks.load(Ordering::Relaxed),
        governor.delayed_ticks(),
        interrupted,
    );
    debug!(
        total = summary.total_requests,
        late = summary.late_ticks,
        delayed = summary.delayed_ticks,
        "worker finished"
    );
    Ok(summary)
}

/// Resolve when a shutdown signal arrives. A dropped sender means no signal
/// can ever arrive, so the run continues to its natural end.
async fn wait_for_shutdown(shutdown: &mut ShutdownReceiver) {
    use tokio::sync::broadcast::error::RecvError;
    match shutdown.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => std::future::pending::<()>().await,
    }
}

/// Fold settled requests into the recorder, emitting a live snapshot on each
/// progress interval when a progress channel is attached.
async fn accumulate(
    mut records: mpsc::Receiver<OutcomeRecord>,
    progress: Option<mpsc::Sender<WorkerSummary>>,
    origin: Instant,
    duration: Duration,
    late_ticks: Arc<AtomicU64>,
    governor: Arc<AdmissionGovernor>,
) -> AppResult<SampleRecorder> {
    let mut recorder = SampleRecorder::new()?;
    let Some(progress) = progress else {
        while let Some(record) = records.recv().await {
            recorder.record(&record)?;
        }
        return Ok(recorder);
    };

    let mut ticker = tokio::time::interval_at(Instant::now() + PROGRESS_INTERVAL, PROGRESS_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            maybe_record = records.recv() => match maybe_record {
                Some(record) => recorder.record(&record)?,
                None => break,
            },
            _ = ticker.tick() => {
                let elapsed = Instant::now()
                    .saturating_duration_since(origin)
                    .min(duration);
                let snapshot = recorder.snapshot(
                    elapsed,
                    late_ticks.load(Ordering::Relaxed),
                    governor.delayed_ticks(),
                    true,
                );
                // progress is best-effort; a slow consumer never stalls folding
                drop(progress.try_send(snapshot));
            }
        }
    }
    Ok(recorder)
}
