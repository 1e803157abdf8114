use clap::Parser;
use std::time::Duration;

use super::HammerArgs;
use super::parsers::parse_duration_arg;
use crate::error::AppResult;

fn parse(argv: &[&str]) -> Result<HammerArgs, clap::Error> {
    let mut full = vec!["pulsehammer"];
    full.extend_from_slice(argv);
    HammerArgs::try_parse_from(full)
}

#[test]
fn parses_minimal_invocation() -> AppResult<()> {
    let args = parse(&["http://localhost:8080/health", "--rps", "1000"])?;
    assert_eq!(args.url, "http://localhost:8080/health");
    assert_eq!(args.rps.get(), 1000);
    assert_eq!(args.duration, Duration::from_secs(30));
    assert_eq!(args.concurrency.get(), 256);
    assert_eq!(args.timeout, Duration::from_secs(10));
    assert_eq!(args.warmup, 0);
    assert!(args.auto_workers_enabled());
    Ok(())
}

#[test]
fn rps_is_required() {
    assert!(parse(&["http://localhost/"]).is_err());
}

#[test]
fn rejects_zero_rps() {
    assert!(parse(&["http://localhost/", "--rps", "0"]).is_err());
}

#[test]
fn parses_short_flags() -> AppResult<()> {
    let args = parse(&[
        "http://localhost/",
        "--rps",
        "500",
        "-X",
        "post",
        "-D",
        "90s",
        "-w",
        "4",
        "-c",
        "128",
        "-t",
        "2s",
    ])?;
    assert_eq!(args.method.as_str(), "POST");
    assert_eq!(args.duration, Duration::from_secs(90));
    assert_eq!(args.workers.map(|w| w.get()), Some(4));
    assert_eq!(args.concurrency.get(), 128);
    assert_eq!(args.timeout, Duration::from_secs(2));
    Ok(())
}

#[test]
fn headers_are_repeatable() -> AppResult<()> {
    let args = parse(&[
        "http://localhost/",
        "--rps",
        "10",
        "-H",
        "X-One: 1",
        "-H",
        "X-Two: 2",
        "-H",
        "X-One: again",
    ])?;
    assert_eq!(args.headers.len(), 3);
    assert_eq!(args.headers[0], ("X-One".to_owned(), "1".to_owned()));
    assert_eq!(args.headers[2], ("X-One".to_owned(), "again".to_owned()));
    Ok(())
}

#[test]
fn rejects_malformed_header() {
    assert!(parse(&["http://localhost/", "--rps", "10", "-H", "NoColon"]).is_err());
}

#[test]
fn json_conflicts_with_data() {
    let result = parse(&[
        "http://localhost/",
        "--rps",
        "10",
        "--data",
        "x",
        "--json",
        "{}",
    ]);
    assert!(result.is_err());
}

#[test]
fn no_auto_workers_disables_sizing() -> AppResult<()> {
    let args = parse(&["http://localhost/", "--rps", "10", "--no-auto-workers"])?;
    assert!(!args.auto_workers_enabled());
    Ok(())
}

#[test]
fn duration_units() -> AppResult<()> {
    assert_eq!(parse_duration_arg("250ms")?, Duration::from_millis(250));
    assert_eq!(parse_duration_arg("15")?, Duration::from_secs(15));
    assert_eq!(parse_duration_arg("2m")?, Duration::from_secs(120));
    assert_eq!(parse_duration_arg("1h")?, Duration::from_secs(3600));
    assert!(parse_duration_arg("0s").is_err());
    assert!(parse_duration_arg("abc").is_err());
    assert!(parse_duration_arg("10d").is_err());
    Ok(())
}
