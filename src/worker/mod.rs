mod governor;
mod process;
mod runner;
mod scheduler;

#[cfg(test)]
mod tests;

pub use governor::AdmissionGovernor;
pub use process::{WORKER_FLAG, run_worker_process};
pub use runner::run_worker;
pub use scheduler::{RateScheduler, Tick};

/// One-shot shutdown signal fanned out to the scheduling loop.
pub type ShutdownSender = tokio::sync::broadcast::Sender<()>;
pub type ShutdownReceiver = tokio::sync::broadcast::Receiver<()>;
