mod process;
mod progress;
mod report;
mod sizing;

pub use process::{WorkerHandle, spawn_workers};
pub use progress::spawn_progress_printer;
pub use report::{format_bytes, group_digits, print_report};
pub use sizing::{PER_WORKER_TARGET_RPS, SizingReason, WorkerPlan, available_cpus, choose_workers};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::args::HammerArgs;
use crate::config::{RunConfig, rate_share};
use crate::error::AppResult;
use crate::http::preflight_resolve;
use crate::metrics::GlobalSummary;
use crate::sinks::write_csv;

/// Run a full load test: validate the configuration, size and spawn the
/// worker fleet, merge their reports, and present the result.
///
/// # Errors
///
/// Fails on configuration problems detected before launch, or when no worker
/// manages to produce a report.
pub async fn run(args: &HammerArgs) -> AppResult<()> {
    let config = RunConfig::from_args(args)?;
    preflight_resolve(&config.url)?;

    let plan = choose_workers(
        args.workers.map(|w| w.get()),
        args.auto_workers_enabled(),
        config.total_rps,
        args.max_workers.map(|w| w.get()),
        available_cpus(),
    );
    let shares: Vec<u64> = (0..plan.count)
        .map(|index| rate_share(config.total_rps, plan.count, index))
        .collect();

    println!(
        "pulsehammer v{} | {} {}",
        env!("CARGO_PKG_VERSION"),
        config.method.as_str(),
        config.url
    );
    println!(
        "{} req/s for {:.0}s across {} workers ({})",
        config.total_rps,
        config.duration.as_secs_f64(),
        plan.count,
        plan.reason
    );

    // Ctrl-C reaches the whole process group; workers drain and report
    // partials while the coordinator stays up to merge them.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, waiting for workers to drain");
        }
    });

    let (progress_tx, printer) = if config.progress {
        let (tx, rx) = mpsc::channel(plan.count.saturating_mul(4).max(16));
        (
            Some(tx),
            Some(spawn_progress_printer(config.duration, rx)),
        )
    } else {
        (None, None)
    };

    let handles = spawn_workers(&config, &shares, progress_tx.clone()).await?;
    drop(progress_tx);

    let mut global = GlobalSummary::new(plan.count)?;
    for handle in handles {
        let index = handle.index;
        match handle.collect().await {
            Ok(Some(wire)) => global.absorb(&wire.to_summary()?)?,
            Ok(None) => {
                warn!(index, "worker exited without a report");
                global.note_missing_worker();
            }
            Err(err) => {
                warn!(index, %err, "worker failed");
                global.note_missing_worker();
            }
        }
    }
    if let Some(printer) = printer {
        drop(printer.await);
    }

    global.require_reports()?;
    print_report(&global);

    if let Some(path) = args.csv.as_deref() {
        write_csv(path, &global).await?;
        println!("\n[export] results saved to: {path}");
    }
    Ok(())
}
