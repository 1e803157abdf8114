use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Method};

use crate::config::{RequestBody, RunConfig};
use crate::error::{AppError, AppResult, HttpError};
use crate::metrics::ErrorKind;

/// What one dispatched request produced. Latency is measured by the caller
/// around `dispatch`.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOutcome {
    pub status: Option<u16>,
    pub bytes: u64,
    pub error: Option<ErrorKind>,
}

/// The seam between the scheduling loop and the transport. Tests swap in
/// mock dispatchers with scripted latencies and failures.
#[async_trait]
pub trait RequestDispatch: Send + Sync {
    async fn dispatch(&self) -> DispatchOutcome;
}

/// Real transport. Holds the prepared pieces of the request so the per-tick
/// cost is one builder pass over them.
pub struct HttpDispatcher {
    client: Client,
    method: Method,
    url: reqwest::Url,
    headers: Vec<(String, String)>,
    body: Option<String>,
    read_body: bool,
}

impl HttpDispatcher {
    /// # Errors
    ///
    /// Fails if the URL does not parse.
    pub fn new(config: &RunConfig, client: Client) -> AppResult<Self> {
        let url: reqwest::Url = config.url.parse().map_err(|err| {
            AppError::http(HttpError::InvalidUrl {
                url: config.url.clone(),
                source: err,
            })
        })?;

        let mut headers = config.headers.clone();
        let body = match &config.body {
            RequestBody::Empty => None,
            RequestBody::Raw { content } => Some(content.clone()),
            RequestBody::Json { content } => {
                let has_content_type = headers
                    .iter()
                    .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
                if !has_content_type {
                    headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
                }
                Some(content.clone())
            }
        };

        Ok(Self {
            client,
            method: config.method.into(),
            url,
            headers,
            body,
            read_body: config.read_body,
        })
    }

    #[cfg(test)]
    pub(crate) fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

#[async_trait]
impl RequestDispatch for HttpDispatcher {
    async fn dispatch(&self) -> DispatchOutcome {
        let mut request = self.client.request(self.method.clone(), self.url.clone());
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                return DispatchOutcome {
                    status: None,
                    bytes: 0,
                    error: Some(ErrorKind::from_reqwest(&err)),
                };
            }
        };

        let status = response.status().as_u16();
        let mut bytes = 0u64;
        let mut stream = response.bytes_stream();
        loop {
            match stream.next().await {
                Some(Ok(chunk)) => {
                    bytes = bytes.saturating_add(chunk.len() as u64);
                    if !self.read_body {
                        break;
                    }
                }
                Some(Err(err)) => {
                    return DispatchOutcome {
                        status: Some(status),
                        bytes,
                        error: Some(ErrorKind::from_reqwest(&err)),
                    };
                }
                None => break,
            }
        }

        DispatchOutcome {
            status: Some(status),
            bytes,
            error: None,
        }
    }
}
