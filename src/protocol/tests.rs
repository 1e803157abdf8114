use std::time::Duration;

use tokio::time::Instant;

use super::{ConfigMessage, ReportMessage, WireMessage, WireSummary, read_message, write_message};
use crate::args::HttpMethod;
use crate::config::{RequestBody, RunConfig};
use crate::error::{AppError, AppResult, WorkerError};
use crate::metrics::{OutcomeRecord, SampleRecorder};

fn sample_config() -> RunConfig {
    RunConfig {
        url: "http://localhost:8080/".to_owned(),
        method: HttpMethod::Get,
        headers: vec![("X-Run".to_owned(), "1".to_owned())],
        body: RequestBody::Empty,
        total_rps: 1_000,
        duration: Duration::from_secs(5),
        warmup: 0,
        concurrency: 256,
        timeout: Duration::from_secs(10),
        insecure: false,
        read_body: true,
        progress: false,
    }
}

fn sample_summary() -> AppResult<WireSummary> {
    let mut recorder = SampleRecorder::new()?;
    let now = Instant::now();
    for latency_ms in [10u64, 12, 15] {
        recorder.record(&OutcomeRecord {
            scheduled: now,
            completed: now,
            latency: Duration::from_millis(latency_ms),
            status: Some(200),
            bytes: 512,
            error: None,
        })?;
    }
    WireSummary::from_summary(&recorder.snapshot(Duration::from_secs(5), 1, 2, false))
}

#[tokio::test]
async fn config_message_roundtrips() -> AppResult<()> {
    let mut buffer = Vec::new();
    let message = WireMessage::Config(Box::new(ConfigMessage {
        worker_index: 3,
        rate: 2_500,
        config: sample_config(),
    }));
    write_message(&mut buffer, &message).await?;
    assert_eq!(buffer.iter().filter(|b| **b == b'\n').count(), 1);

    let mut reader = buffer.as_slice();
    match read_message(&mut reader).await? {
        WireMessage::Config(config) => {
            assert_eq!(config.worker_index, 3);
            assert_eq!(config.rate, 2_500);
            assert_eq!(config.config.url, "http://localhost:8080/");
        }
        other => panic!("unexpected message: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn report_carries_the_full_summary() -> AppResult<()> {
    let mut buffer = Vec::new();
    let message = WireMessage::Report(Box::new(ReportMessage {
        worker_index: 0,
        summary: sample_summary()?,
    }));
    write_message(&mut buffer, &message).await?;

    let mut reader = buffer.as_slice();
    let WireMessage::Report(report) = read_message(&mut reader).await? else {
        panic!("expected a report");
    };
    let summary = report.summary.to_summary()?;
    assert_eq!(summary.total_requests, 3);
    assert_eq!(summary.successful_requests, 3);
    assert_eq!(summary.sketch.count(), 3);
    assert_eq!(summary.late_ticks, 1);
    assert_eq!(summary.delayed_ticks, 2);
    Ok(())
}

#[tokio::test]
async fn reads_messages_in_sequence() -> AppResult<()> {
    let mut buffer = Vec::new();
    for index in 0..3 {
        let message = WireMessage::Stream(Box::new(super::StreamMessage {
            worker_index: index,
            summary: sample_summary()?,
        }));
        write_message(&mut buffer, &message).await?;
    }

    let mut reader = buffer.as_slice();
    for expected in 0..3 {
        let WireMessage::Stream(stream) = read_message(&mut reader).await? else {
            panic!("expected a stream snapshot");
        };
        assert_eq!(stream.worker_index, expected);
    }
    assert!(matches!(
        read_message(&mut reader).await,
        Err(AppError::Worker(WorkerError::ConnectionClosed))
    ));
    Ok(())
}

#[tokio::test]
async fn rejects_garbage_lines() {
    let mut reader = "this is not json\n".as_bytes();
    assert!(matches!(
        read_message(&mut reader).await,
        Err(AppError::Worker(WorkerError::Deserialize { .. }))
    ));
}
