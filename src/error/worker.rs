use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to locate current executable: {source}")]
    CurrentExe {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to spawn worker {index}: {source}")]
    SpawnWorker {
        index: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("Worker {index} has no stdin handle.")]
    StdinUnavailable { index: usize },
    #[error("Worker {index} has no stdout handle.")]
    StdoutUnavailable { index: usize },
    #[error("Failed to serialize {context}: {source}")]
    Serialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to deserialize {context}: {source}")]
    Deserialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error while trying to {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Worker channel closed.")]
    ConnectionClosed,
    #[error("Admission semaphore closed while dispatching.")]
    AdmissionClosed,
    #[error("Wire message exceeds {max_bytes} bytes.")]
    WireMessageTooLarge { max_bytes: usize },
    #[error("Wire message was not valid UTF-8: {source}")]
    WireMessageInvalidUtf8 {
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("Worker {index} failed: {message}")]
    WorkerFailed { index: usize, message: String },
    #[error("No worker produced a summary.")]
    NoSummaries,
}
