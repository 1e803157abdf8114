use std::net::ToSocketAddrs;

use reqwest::Client;
use url::Url;

use crate::config::RunConfig;
use crate::error::{AppError, AppResult, HttpError};

/// Build the shared HTTP client for a worker. One client per worker process,
/// connection pooling handles reuse across requests.
///
/// # Errors
///
/// Fails if the underlying TLS or connector setup fails.
pub fn build_client(config: &RunConfig) -> AppResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.timeout)
        .pool_max_idle_per_host(config.concurrency)
        .tcp_nodelay(true)
        .danger_accept_invalid_certs(config.insecure)
        .user_agent(concat!("pulsehammer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))
}

/// Resolve the target host once before any request is fired. An unresolvable
/// host is a fatal configuration error, not ten thousand connection errors.
///
/// # Errors
///
/// Fails on an unparseable URL, a missing host, or a host that does not
/// resolve to any address.
pub fn preflight_resolve(url: &str) -> AppResult<()> {
    let parsed = Url::parse(url).map_err(|err| {
        AppError::http(HttpError::InvalidUrl {
            url: url.to_owned(),
            source: err,
        })
    })?;
    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::http(HttpError::MissingHost {
            url: url.to_owned(),
        }))?;
    let port = parsed.port_or_known_default().unwrap_or(80);

    let mut addresses = (host, port).to_socket_addrs().map_err(|err| {
        AppError::http(HttpError::ResolveHost {
            host: host.to_owned(),
            port,
            source: err,
        })
    })?;
    if addresses.next().is_none() {
        return Err(AppError::http(HttpError::NoAddressesResolved {
            host: host.to_owned(),
        }));
    }
    Ok(())
}
