use std::collections::BTreeMap;
use std::io::Write as _;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::PROGRESS_INTERVAL;
use crate::protocol::WireSummary;

/// Print a live progress line from the latest snapshot of each worker.
/// Ends when every worker stream has closed.
pub fn spawn_progress_printer(
    duration: Duration,
    mut snapshots: mpsc::Receiver<(usize, WireSummary)>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        let mut latest: BTreeMap<usize, WireSummary> = BTreeMap::new();
        let mut ticker = tokio::time::interval_at(started + PROGRESS_INTERVAL, PROGRESS_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                maybe = snapshots.recv() => match maybe {
                    Some((index, summary)) => {
                        latest.insert(index, summary);
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    print_line(&latest, started.elapsed(), duration);
                }
            }
        }
        // move past the carriage-returned progress line
        println!();
    })
}

fn print_line(latest: &BTreeMap<usize, WireSummary>, elapsed: Duration, duration: Duration) {
    let total: u64 = latest.values().map(|s| s.total_requests).sum();
    let window = duration.as_secs_f64();
    let elapsed = elapsed.as_secs_f64().min(window);
    let percent = if window > 0.0 {
        (elapsed / window * 100.0).min(100.0)
    } else {
        100.0
    };
    let remaining = (window - elapsed).max(0.0);
    let rate = if elapsed > 0.0 { total as f64 / elapsed } else { 0.0 };
    print!(
        "\r[{percent:5.1}%] elapsed {elapsed:6.1}s | remaining {remaining:6.1}s | requests {total} | {rate:.1} req/s   "
    );
    drop(std::io::stdout().flush());
}
