mod recorder;
mod sketch;
mod summary;
mod types;


pub use recorder::SampleRecorder;
pub use sketch::{LatencySketch, Moments};
pub use summary::{GlobalSummary, LatencyStats, WorkerSummary};
pub use types::{ErrorKind, OutcomeRecord};
