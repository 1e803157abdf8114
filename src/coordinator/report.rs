use crate::metrics::GlobalSummary;

const RULE: &str = "============================================================";

/// Print the final console report.
pub fn print_report(summary: &GlobalSummary) {
    let duration = summary.duration.as_secs_f64();
    let throughput_bytes = if duration > 0.0 {
        summary.bytes_total as f64 / duration
    } else {
        0.0
    };
    let total = summary.total_requests;
    let fail_rate = if total == 0 {
        0.0
    } else {
        summary.failed_requests as f64 / total as f64 * 100.0
    };
    let stats = summary.latency_stats();

    println!("\n{RULE}");
    if summary.partial {
        println!("== Load Test Report (partial) ==");
    } else {
        println!("== Load Test Report ==");
    }
    println!("{RULE}");
    println!("Total requests      : {}", group_digits(total));
    println!("Duration            : {duration:.3} s");
    println!("Throughput          : {:.2} req/s", summary.achieved_rps());
    println!("Data transferred    : {}", format_bytes(summary.bytes_total as f64));
    println!("Transfer rate       : {}/s", format_bytes(throughput_bytes));
    println!(
        "Success             : {} ({:.2}%)",
        group_digits(summary.successful_requests),
        summary.success_rate()
    );
    println!(
        "Failures            : {} ({fail_rate:.2}%)",
        group_digits(summary.failed_requests)
    );
    if summary.late_ticks > 0 || summary.delayed_ticks > 0 {
        println!(
            "Schedule pressure   : {} late ticks, {} delayed by admission",
            group_digits(summary.late_ticks),
            group_digits(summary.delayed_ticks)
        );
    }
    if summary.workers_reporting < summary.workers_expected {
        println!(
            "Workers reporting   : {}/{}",
            summary.workers_reporting, summary.workers_expected
        );
    }

    println!("\nLatency (seconds):");
    println!(
        "  min/avg/median   : {:.4} / {:.4} / {:.4}",
        seconds(stats.min as f64),
        seconds(stats.mean),
        seconds(stats.median as f64)
    );
    println!(
        "  max/stdev        : {:.4} / {:.4}",
        seconds(stats.max as f64),
        seconds(stats.std_dev)
    );
    println!(
        "  p50/p90/p95/p99  : {:.4} / {:.4} / {:.4} / {:.4}",
        seconds(stats.p50 as f64),
        seconds(stats.p90 as f64),
        seconds(stats.p95 as f64),
        seconds(stats.p99 as f64)
    );

    println!("\nStatus codes:");
    for (code, count) in &summary.status_counts {
        println!("  {code}: {}", group_digits(*count));
    }

    if !summary.error_counts.is_empty() {
        println!("\nError types:");
        let mut errors: Vec<_> = summary.error_counts.iter().collect();
        errors.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in errors {
            println!("  {kind}: {}", group_digits(*count));
        }
    }
    println!("{RULE}");
}

const fn seconds(micros: f64) -> f64 {
    micros / 1_000_000.0
}

/// Human-readable byte count, B through TB.
#[must_use]
pub fn format_bytes(mut bytes: f64) -> String {
    for unit in ["B", "KB", "MB", "GB"] {
        if bytes < 1024.0 {
            return format!("{bytes:.2} {unit}");
        }
        bytes /= 1024.0;
    }
    format!("{bytes:.2} TB")
}

/// Thousands separators, `1234567` to `1,234,567`.
#[must_use]
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
