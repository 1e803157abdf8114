use clap::Parser;

use super::{HttpDispatcher, build_client, preflight_resolve};
use crate::args::HammerArgs;
use crate::config::RunConfig;
use crate::error::AppResult;

fn config_for(argv: &[&str]) -> AppResult<RunConfig> {
    let mut full = vec!["pulsehammer"];
    full.extend_from_slice(argv);
    let args = HammerArgs::try_parse_from(full)?;
    RunConfig::from_args(&args)
}

#[test]
fn preflight_resolves_localhost() -> AppResult<()> {
    preflight_resolve("http://localhost:8080/health")
}

#[test]
fn preflight_rejects_url_without_host() {
    assert!(preflight_resolve("file:///tmp/x").is_err());
}

#[test]
fn preflight_rejects_unresolvable_host() {
    assert!(preflight_resolve("http://host.invalid/").is_err());
}

#[test]
fn json_body_sets_content_type() -> AppResult<()> {
    let config = config_for(&["http://localhost/", "--rps", "10", "--json", "{\"a\":1}"])?;
    let dispatcher = HttpDispatcher::new(&config, build_client(&config)?)?;
    assert!(
        dispatcher
            .headers()
            .iter()
            .any(|(name, value)| name == "Content-Type" && value == "application/json")
    );
    Ok(())
}

#[test]
fn json_body_respects_existing_content_type() -> AppResult<()> {
    let config = config_for(&[
        "http://localhost/",
        "--rps",
        "10",
        "--json",
        "{}",
        "-H",
        "content-type: application/vnd.custom+json",
    ])?;
    let dispatcher = HttpDispatcher::new(&config, build_client(&config)?)?;
    let content_types: Vec<_> = dispatcher
        .headers()
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .collect();
    assert_eq!(content_types.len(), 1);
    assert_eq!(content_types[0].1, "application/vnd.custom+json");
    Ok(())
}
