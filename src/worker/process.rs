use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use super::runner::run_worker;
use crate::error::{AppError, AppResult, ValidationError, WorkerError};
use crate::http::{HttpDispatcher, build_client};
use crate::metrics::WorkerSummary;
use crate::protocol::{
    self, ConfigMessage, ErrorMessage, ReportMessage, StreamMessage, WireMessage, WireSummary,
};

/// Hidden CLI flag that switches the binary into worker mode.
pub const WORKER_FLAG: &str = "--worker";

/// Entry point for a worker process. Reads its configuration as the first
/// line on stdin, runs the load loop, and writes snapshots and the final
/// report as JSON lines on stdout. stdout carries nothing but wire messages;
/// logs go to stderr.
///
/// # Errors
///
/// Fails on a missing or malformed configuration, or when the run itself
/// fails; the failure is also reported on the wire before returning.
pub async fn run_worker_process() -> AppResult<()> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let message = protocol::read_message(&mut stdin).await?;
    let WireMessage::Config(config_message) = message else {
        return Err(AppError::validation(ValidationError::WorkerConfigMissing));
    };
    let ConfigMessage {
        worker_index,
        rate,
        config,
    } = *config_message;
    debug!(worker_index, rate, "worker configured");

    let client = build_client(&config)?;
    let dispatcher = Arc::new(HttpDispatcher::new(&config, client)?);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, finishing early");
            drop(shutdown_tx.send(()));
        }
    });

    // one task owns stdout so snapshots and the report never interleave
    let (wire_tx, mut wire_rx) = mpsc::channel::<WireMessage>(16);
    let writer_task = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = wire_rx.recv().await {
            protocol::write_message(&mut stdout, &message).await?;
        }
        Ok::<(), AppError>(())
    });

    let progress = if config.progress {
        let (tx, mut rx) = mpsc::channel::<WorkerSummary>(4);
        let stream_tx = wire_tx.clone();
        tokio::spawn(async move {
            while let Some(summary) = rx.recv().await {
                match WireSummary::from_summary(&summary) {
                    Ok(summary) => {
                        drop(stream_tx.try_send(WireMessage::Stream(Box::new(StreamMessage {
                            worker_index,
                            summary,
                        }))));
                    }
                    Err(err) => warn!(%err, "dropping undecodable progress snapshot"),
                }
            }
        });
        Some(tx)
    } else {
        None
    };

    let result = run_worker(&config, rate, dispatcher, progress, shutdown_rx).await;
    let (message, outcome) = match result {
        Ok(summary) => (
            WireMessage::Report(Box::new(ReportMessage {
                worker_index,
                summary: WireSummary::from_summary(&summary)?,
            })),
            Ok(()),
        ),
        Err(err) => (
            WireMessage::Error(ErrorMessage {
                worker_index,
                message: err.to_string(),
            }),
            Err(err),
        ),
    };
    wire_tx
        .send(message)
        .await
        .map_err(|_send| AppError::worker(WorkerError::ConnectionClosed))?;
    drop(wire_tx);
    writer_task.await??;
    outcome
}
