//! HTTP transport hook used by the manifest fetcher.
//!
//! The fetcher only needs `GET url + headers → {status, body}`. Connection
//! handling, TLS, redirects, proxies and timeouts live behind
//! [`Transport`]. [`ReqwestTransport`] is the default implementation and
//! [`RetryTransport`] an opt-in wrapper for retry/backoff.

use crate::version::USER_AGENT;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Raw registry response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to get any response at all.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Issues registry GET requests.
pub trait Transport: Send + Sync {
    /// GET `url` with `headers`.
    fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for &T {
    fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        (**self).get(url, headers)
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        (**self).get(url, headers)
    }
}

/// Transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Create a transport with registry-friendly defaults.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .default_headers(default_headers)
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Wrap an existing client (custom TLS, proxy, or pooling settings).
    #[must_use]
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Get the HTTP client.
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.http
    }
}

impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<TransportResponse, TransportError> {
        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header '{name}': {e}")))?;
            header_map.insert(name, value);
        }

        let response = self.http.get(url).headers(header_map).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(TransportResponse { status, body })
    }
}

/// Wrapper that retries transport errors and 5xx responses.
///
/// The manifest fetcher itself never retries; wrap the transport in this to
/// opt in.
#[derive(Debug, Clone)]
pub struct RetryTransport<T> {
    inner: T,
    max_retries: u32,
    min_backoff: Duration,
}

impl<T: Transport> RetryTransport<T> {
    /// Retry up to `max_retries` times with a 100ms initial backoff.
    #[must_use]
    pub fn new(inner: T, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            min_backoff: Duration::from_millis(100),
        }
    }

    /// Set the initial backoff; it doubles after every attempt.
    #[must_use]
    pub fn with_min_backoff(mut self, backoff: Duration) -> Self {
        self.min_backoff = backoff;
        self
    }

    /// Get the wrapped transport.
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for RetryTransport<T> {
    async fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<TransportResponse, TransportError> {
        let mut backoff = self.min_backoff;
        let mut attempt = 0;

        loop {
            let result = self.inner.get(url, headers).await;
            let retryable = match &result {
                Ok(resp) => resp.status >= 500,
                Err(TransportError::InvalidRequest(_)) => false,
                Err(_) => true,
            };

            if !retryable || attempt >= self.max_retries {
                return result;
            }

            attempt += 1;
            match &result {
                Ok(resp) => warn!(url, status = resp.status, attempt, "Retrying registry request"),
                Err(e) => warn!(url, error = %e, attempt, "Retrying registry request"),
            }
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed sequence of outcomes.
    struct Scripted {
        outcomes: Mutex<Vec<Result<u16, &'static str>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<u16, &'static str>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl Transport for Scripted {
        async fn get(
            &self,
            _url: &str,
            _headers: &BTreeMap<String, String>,
        ) -> Result<TransportResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;
            let next = self.outcomes.lock().unwrap().pop().expect("script exhausted");
            next.map(|status| TransportResponse {
                status,
                body: Bytes::from_static(b"{}"),
            })
            .map_err(|msg| TransportError::Connect(msg.to_string()))
        }
    }

    fn retrying(script: &Scripted, max_retries: u32) -> RetryTransport<&Scripted> {
        RetryTransport::new(script, max_retries).with_min_backoff(Duration::from_millis(1))
    }

    #[test]
    fn test_response_is_success() {
        let ok = TransportResponse {
            status: 204,
            body: Bytes::new(),
        };
        let redirect = TransportResponse {
            status: 304,
            body: Bytes::new(),
        };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }

    #[test]
    fn test_client_creation() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[tokio::test]
    async fn test_retry_recovers_from_errors() {
        let script = Scripted::new(vec![Err("refused"), Ok(503), Ok(200)]);
        let resp = retrying(&script, 3).get("http://x/foo/1.0.0", &BTreeMap::new()).await;
        assert_eq!(resp.unwrap().status, 200);
        assert_eq!(script.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let script = Scripted::new(vec![Ok(500), Ok(502)]);
        let resp = retrying(&script, 1).get("http://x/foo/1.0.0", &BTreeMap::new()).await;
        assert_eq!(resp.unwrap().status, 502);
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_skips_client_errors() {
        let script = Scripted::new(vec![Ok(404)]);
        let resp = retrying(&script, 3).get("http://x/foo/1.0.0", &BTreeMap::new()).await;
        assert_eq!(resp.unwrap().status, 404);
        assert_eq!(script.calls(), 1);
    }
}
