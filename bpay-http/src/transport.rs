//! The HTTP POST underneath every API call.
//!
//! [`Transport`] is the seam between the client and the network. The default
//! [`ReqwestTransport`] sends the body string untouched, since those exact
//! bytes are what the signature covers. No retries happen at this level.

use std::error::Error as StdError;
use std::time::Duration;

use http::HeaderMap;
use reqwest::Client;
use url::Url;

use crate::error::{ClientBuildError, TransportFailure};

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl RawResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one signed request.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// POSTs `body` to `url` with `headers`.
    ///
    /// Any HTTP status is a successful exchange; only the absence of a
    /// response is an error.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFailure`] if no response could be obtained.
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: String,
    ) -> Result<RawResponse, TransportFailure>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh client and no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a pre-configured client (proxies, TLS roots, pools).
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Creates a transport whose client is built with `connect_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError::Http`] if the client cannot be built.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(ClientBuildError::Http)?;
        Ok(Self::with_client(client))
    }

    /// Sets a total timeout for every request.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: String,
    ) -> Result<RawResponse, TransportFailure> {
        let mut req = self.client.post(url.clone()).headers(headers.clone()).body(body);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let response = req.send().await.map_err(|e| failure(&e, url, None))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| failure(&e, url, Some(status)))?;
        Ok(RawResponse { status, body })
    }
}

/// Maps a `reqwest` error onto the two failure shapes.
fn failure(err: &reqwest::Error, url: &Url, status: Option<u16>) -> TransportFailure {
    let code = os_error_code(err)
        .or_else(|| err.status().map(|s| i32::from(s.as_u16())))
        .or_else(|| status.map(i32::from))
        .unwrap_or(0);
    if err.is_connect() {
        TransportFailure::HostNotFound {
            code,
            url: url.to_string(),
        }
    } else {
        TransportFailure::Transport {
            code,
            message: error_chain(err),
        }
    }
}

/// First OS error number found along the source chain.
fn os_error_code(err: &(dyn StdError + 'static)) -> Option<i32> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(code) = e
            .downcast_ref::<std::io::Error>()
            .and_then(std::io::Error::raw_os_error)
        {
            return Some(code);
        }
        current = e.source();
    }
    None
}

/// The error and its sources joined by `": "`.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        message.push_str(": ");
        message.push_str(&e.to_string());
        current = e.source();
    }
    message
}
