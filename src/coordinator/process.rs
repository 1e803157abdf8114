use std::process::Stdio;

use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::RunConfig;
use crate::error::{AppError, AppResult, WorkerError};
use crate::protocol::{self, ConfigMessage, WireMessage, WireSummary};
use crate::worker::WORKER_FLAG;

/// A spawned worker process plus the task draining its stdout.
pub struct WorkerHandle {
    pub index: usize,
    child: Child,
    reader: JoinHandle<AppResult<Option<WireSummary>>>,
}

/// Spawn one worker per rate share. Each worker is this same executable in
/// worker mode; it receives its configuration as a single line on stdin and
/// reports back on stdout. stderr is inherited so worker logs reach the
/// terminal.
///
/// # Errors
///
/// Fails when the executable path cannot be determined, a spawn fails, or a
/// configuration cannot be delivered.
pub async fn spawn_workers(
    config: &RunConfig,
    shares: &[u64],
    progress: Option<mpsc::Sender<(usize, WireSummary)>>,
) -> AppResult<Vec<WorkerHandle>> {
    let exe = std::env::current_exe()
        .map_err(|err| AppError::worker(WorkerError::CurrentExe { source: err }))?;

    let mut handles = Vec::with_capacity(shares.len());
    for (index, rate) in shares.iter().copied().enumerate() {
        let mut child = Command::new(&exe)
            .arg(WORKER_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| AppError::worker(WorkerError::SpawnWorker { index, source: err }))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::worker(WorkerError::StdinUnavailable { index }))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::worker(WorkerError::StdoutUnavailable { index }))?;

        let message = WireMessage::Config(Box::new(ConfigMessage {
            worker_index: index,
            rate,
            config: config.clone(),
        }));
        protocol::write_message(&mut stdin, &message).await?;
        // the worker reads exactly one line; the pipe can close after it
        drop(stdin);

        debug!(index, rate, "worker spawned");
        let reader = tokio::spawn(read_worker_stream(index, stdout, progress.clone()));
        handles.push(WorkerHandle {
            index,
            child,
            reader,
        });
    }
    Ok(handles)
}

/// Drain one worker's stdout until its final report or EOF. `Ok(None)` means
/// the worker died without reporting; the run continues as partial.
async fn read_worker_stream(
    index: usize,
    stdout: ChildStdout,
    progress: Option<mpsc::Sender<(usize, WireSummary)>>,
) -> AppResult<Option<WireSummary>> {
    let mut reader = BufReader::new(stdout);
    loop {
        match protocol::read_message(&mut reader).await {
            Ok(WireMessage::Stream(stream)) => {
                if let Some(tx) = &progress {
                    drop(tx.try_send((stream.worker_index, stream.summary)));
                }
            }
            Ok(WireMessage::Report(report)) => return Ok(Some(report.summary)),
            Ok(WireMessage::Error(error)) => {
                return Err(AppError::worker(WorkerError::WorkerFailed {
                    index: error.worker_index,
                    message: error.message,
                }));
            }
            Ok(WireMessage::Config(_)) => {
                warn!(index, "ignoring config message from worker");
            }
            Err(AppError::Worker(WorkerError::ConnectionClosed)) => return Ok(None),
            Err(err) => return Err(err),
        }
    }
}

impl WorkerHandle {
    /// Wait for the worker to finish and hand back its final summary, if it
    /// produced one.
    ///
    /// # Errors
    ///
    /// Fails when the worker reported a fatal error or its stream broke in a
    /// way other than plain EOF.
    pub async fn collect(self) -> AppResult<Option<WireSummary>> {
        let result = self.reader.await?;
        let mut child = self.child;
        match child.wait().await {
            Ok(status) if !status.success() => {
                warn!(index = self.index, %status, "worker exited abnormally");
            }
            Ok(_) => {}
            Err(err) => warn!(index = self.index, %err, "failed to reap worker"),
        }
        result
    }
}
