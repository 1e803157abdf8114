use tracing_subscriber::EnvFilter;

/// Initialize tracing. Filter precedence: `PULSEHAMMER_LOG`, then
/// `RUST_LOG`, then a default derived from `--verbose`. Logs go to stderr;
/// stdout is reserved for the report (and, in worker mode, the wire).
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "pulsehammer=debug"
    } else {
        "pulsehammer=info"
    };
    let filter = std::env::var("PULSEHAMMER_LOG")
        .or_else(|_unset| std::env::var("RUST_LOG"))
        .map_or_else(
            |_unset| EnvFilter::new(default_directive),
            |directives| EnvFilter::new(directives),
        );

    drop(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
    );
}
