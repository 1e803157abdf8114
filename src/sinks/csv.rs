use std::fmt::Write as _;

use crate::error::AppResult;
use crate::metrics::GlobalSummary;

/// Export the final report as a two-column CSV: a metric section, the status
/// code histogram, and (when present) the error type histogram, separated by
/// blank lines.
///
/// # Errors
///
/// Fails when the file cannot be written.
pub async fn write_csv(path: &str, summary: &GlobalSummary) -> AppResult<()> {
    let content = render(summary);
    tokio::fs::write(path, content).await?;
    Ok(())
}

fn render(summary: &GlobalSummary) -> String {
    let duration = summary.duration.as_secs_f64();
    let stats = summary.latency_stats();
    let mut out = String::new();

    out.push_str("Metric,Value\n");
    append(&mut out, "Total Requests", summary.total_requests.to_string());
    append(&mut out, "Duration (s)", format!("{duration:.3}"));
    append(
        &mut out,
        "Throughput (req/s)",
        format!("{:.2}", summary.achieved_rps()),
    );
    append(&mut out, "Success", summary.successful_requests.to_string());
    append(&mut out, "Failures", summary.failed_requests.to_string());
    append(
        &mut out,
        "Success Rate (%)",
        format!("{:.2}", summary.success_rate()),
    );
    append(&mut out, "Total Bytes", summary.bytes_total.to_string());

    if summary.sketch.count() > 0 {
        append(&mut out, "Latency Min (s)", seconds(stats.min as f64));
        append(&mut out, "Latency Avg (s)", seconds(stats.mean));
        append(&mut out, "Latency Median (s)", seconds(stats.median as f64));
        append(&mut out, "Latency Max (s)", seconds(stats.max as f64));
        append(&mut out, "Latency StdDev (s)", seconds(stats.std_dev));
        append(&mut out, "Latency P50 (s)", seconds(stats.p50 as f64));
        append(&mut out, "Latency P90 (s)", seconds(stats.p90 as f64));
        append(&mut out, "Latency P95 (s)", seconds(stats.p95 as f64));
        append(&mut out, "Latency P99 (s)", seconds(stats.p99 as f64));
    }

    out.push_str("\nStatus Code,Count\n");
    for (code, count) in &summary.status_counts {
        drop(writeln!(out, "{code},{count}"));
    }

    if !summary.error_counts.is_empty() {
        out.push_str("\nError Type,Count\n");
        for (kind, count) in &summary.error_counts {
            drop(writeln!(out, "{kind},{count}"));
        }
    }
    out
}

fn append(out: &mut String, metric: &str, value: String) {
    drop(writeln!(out, "{metric},{value}"));
}

fn seconds(micros: f64) -> String {
    format!("{:.4}", micros / 1_000_000.0)
}
