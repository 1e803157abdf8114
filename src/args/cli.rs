use clap::Parser;
use std::time::Duration;

use super::parsers::{parse_duration_arg, parse_header, parse_positive_u64, parse_positive_usize};
use super::types::{HttpMethod, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[command(
    version,
    about = "High-RPS open-loop HTTP bench - fires requests at a fixed target rate across multiple worker processes."
)]
pub struct HammerArgs {
    /// Target URL for the load test
    pub url: String,

    /// HTTP method to use
    #[arg(long, short = 'X', default_value = "get", ignore_case = true)]
    pub method: HttpMethod,

    /// Duration of the measured run (supports ms/s/m/h; bare numbers are seconds)
    #[arg(
        long = "duration",
        short = 'D',
        default_value = "30s",
        value_parser = parse_duration_arg
    )]
    pub duration: Duration,

    /// Target total requests per second across all workers (open-loop)
    #[arg(long = "rps", value_parser = parse_positive_u64)]
    pub rps: PositiveU64,

    /// Number of worker processes (default: auto-sized from --rps)
    #[arg(long = "workers", short = 'w', value_parser = parse_positive_usize)]
    pub workers: Option<PositiveUsize>,

    /// Enable auto worker sizing (default)
    #[arg(long = "auto-workers", overrides_with = "no_auto_workers")]
    pub auto_workers: bool,

    /// Disable auto worker sizing (fall back to one worker per CPU)
    #[arg(long = "no-auto-workers")]
    pub no_auto_workers: bool,

    /// Upper bound for auto-sized workers (default: 2x available CPUs)
    #[arg(long = "max-workers", value_parser = parse_positive_usize)]
    pub max_workers: Option<PositiveUsize>,

    /// Per-worker in-flight request cap
    #[arg(
        long = "concurrency",
        short = 'c',
        default_value = "256",
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(
        long = "timeout",
        short = 't',
        default_value = "10s",
        value_parser = parse_duration_arg
    )]
    pub timeout: Duration,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Raw request body
    #[arg(long = "data")]
    pub data: Option<String>,

    /// JSON request body (sets Content-Type: application/json)
    #[arg(long = "json", conflicts_with_all = ["data", "data_file"])]
    pub json: Option<String>,

    /// Request body from file
    #[arg(long = "data-file", conflicts_with = "data")]
    pub data_file: Option<String>,

    /// Warmup request count per worker (excluded from the report)
    #[arg(long = "warmup", default_value = "0")]
    pub warmup: u64,

    /// Disable TLS certificate verification
    #[arg(long = "insecure")]
    pub insecure: bool,

    /// Do not read full response bodies
    #[arg(long = "no-read-body")]
    pub no_read_body: bool,

    /// Export the final report to a CSV file
    #[arg(long = "csv")]
    pub csv: Option<String>,

    /// Show live progress while the run executes
    #[arg(long = "progress")]
    pub progress: bool,

    /// Enable verbose logging (debug level unless PULSEHAMMER_LOG/RUST_LOG overrides)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl HammerArgs {
    /// Whether auto worker sizing applies. `--no-auto-workers` wins when both
    /// flags are given; the default is auto.
    #[must_use]
    pub const fn auto_workers_enabled(&self) -> bool {
        !self.no_auto_workers
    }
}
