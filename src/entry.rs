use clap::Parser;
use clap::error::ErrorKind;

use crate::args::HammerArgs;
use crate::error::AppResult;
use crate::worker::WORKER_FLAG;
use crate::{coordinator, logger, worker};

/// Process entry point. Dispatches to worker mode when spawned by a
/// coordinator, otherwise parses the CLI and runs the coordinator.
///
/// # Errors
///
/// Propagates any failure from either mode; the caller maps it to an exit
/// code.
pub fn run() -> AppResult<()> {
    if std::env::args().nth(1).as_deref() == Some(WORKER_FLAG) {
        return run_worker_mode();
    }

    let args = match HammerArgs::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            drop(err.print());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    logger::init_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(coordinator::run(&args))
}

/// Workers run a single-threaded runtime; each handles one core's worth of
/// load and the coordinator scales by process count.
fn run_worker_mode() -> AppResult<()> {
    logger::init_logging(false);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(worker::run_worker_process())
}
