use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::error::{AppError, AppResult, WorkerError};

/// Caps in-flight requests for one worker. A tick that arrives while the cap
/// is exhausted waits for a permit instead of being dropped; the wait is
/// counted so the report can show how often admission throttled the schedule.
#[derive(Debug)]
pub struct AdmissionGovernor {
    permits: Arc<Semaphore>,
    cap: usize,
    delayed_ticks: AtomicU64,
}

impl AdmissionGovernor {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            permits: Arc::new(Semaphore::new(cap)),
            cap,
            delayed_ticks: AtomicU64::new(0),
        }
    }

    /// Acquire a permit for one dispatch, waiting when the cap is exhausted.
    /// Waits are recorded in the delayed-tick counter when `record` is set;
    /// warmup ticks pass `false`.
    ///
    /// # Errors
    ///
    /// Fails only if the semaphore is closed, which the governor never does.
    pub async fn admit(&self, record: bool) -> AppResult<OwnedSemaphorePermit> {
        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => Ok(permit),
            Err(TryAcquireError::NoPermits) => {
                if record {
                    self.delayed_ticks.fetch_add(1, Ordering::Relaxed);
                }
                Arc::clone(&self.permits)
                    .acquire_owned()
                    .await
                    .map_err(|_closed| AppError::worker(WorkerError::AdmissionClosed))
            }
            Err(TryAcquireError::Closed) => Err(AppError::worker(WorkerError::AdmissionClosed)),
        }
    }

    /// Wait for every outstanding permit to come back, i.e. for all in-flight
    /// requests to settle.
    ///
    /// # Errors
    ///
    /// Fails only if the semaphore is closed.
    pub async fn drain(&self) -> AppResult<()> {
        let cap = u32::try_from(self.cap).unwrap_or(u32::MAX);
        let _all = self
            .permits
            .acquire_many(cap)
            .await
            .map_err(|_closed| AppError::worker(WorkerError::AdmissionClosed))?;
        Ok(())
    }

    #[must_use]
    pub fn delayed_ticks(&self) -> u64 {
        self.delayed_ticks.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.cap.saturating_sub(self.permits.available_permits())
    }
}
