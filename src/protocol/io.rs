use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::types::WireMessage;
use crate::error::{AppError, AppResult, WorkerError};

/// Upper bound on a single wire line. A serialized histogram for a long run
/// stays far below this; anything larger is a protocol violation.
pub const MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// Read one newline-delimited message.
///
/// # Errors
///
/// Fails on EOF, an oversized line, invalid UTF-8, or undecodable JSON.
pub async fn read_message<R>(reader: &mut R) -> AppResult<WireMessage>
where
    R: AsyncBufRead + Unpin,
{
    let mut buffer = Vec::with_capacity(256);
    let mut limited = reader.take(MAX_MESSAGE_BYTES as u64 + 1);
    let read = limited
        .read_until(b'\n', &mut buffer)
        .await
        .map_err(|err| {
            AppError::worker(WorkerError::Io {
                context: "read wire message",
                source: err,
            })
        })?;
    if read == 0 {
        return Err(AppError::worker(WorkerError::ConnectionClosed));
    }
    if read > MAX_MESSAGE_BYTES {
        return Err(AppError::worker(WorkerError::WireMessageTooLarge {
            max_bytes: MAX_MESSAGE_BYTES,
        }));
    }

    let text = std::str::from_utf8(&buffer)
        .map_err(|err| AppError::worker(WorkerError::WireMessageInvalidUtf8 { source: err }))?;
    let trimmed = text.trim_end_matches(['\r', '\n']);
    serde_json::from_str(trimmed).map_err(|err| {
        AppError::worker(WorkerError::Deserialize {
            context: "wire message",
            source: err,
        })
    })
}

/// Write one message as a single JSON line and flush it.
///
/// # Errors
///
/// Fails if serialization or the underlying write fails.
pub async fn write_message<W>(writer: &mut W, message: &WireMessage) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(message).map_err(|err| {
        AppError::worker(WorkerError::Serialize {
            context: "wire message",
            source: err,
        })
    })?;
    line.push(b'\n');
    writer.write_all(&line).await.map_err(|err| {
        AppError::worker(WorkerError::Io {
            context: "write wire message",
            source: err,
        })
    })?;
    writer.flush().await.map_err(|err| {
        AppError::worker(WorkerError::Io {
            context: "flush wire message",
            source: err,
        })
    })
}
