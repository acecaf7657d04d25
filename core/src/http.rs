//! HTTP transport types and the blocking transport used by default.
//!
//! # Design
//! Requests and responses are plain data. `FetcherClient` builds
//! `HttpRequest` values and parses `HttpResponse` values without touching the
//! network; a `Transport` executes the round-trip in between. The fetcher
//! service only answers GET, so a request is just a URL plus headers.
//!
//! `UreqTransport` is the production transport. It turns status-code errors
//! off so that 4xx/5xx come back as data and the client decides what they
//! mean, the same way the parse side treats every other response. Bodies
//! are read as raw bytes with no size cap: listings are unpaginated and can
//! be large, and turning bytes into text is a decoding concern for the
//! client, not a transport failure.

use std::time::Duration;

use crate::error::FetcherError;

/// Boxed error produced by a transport when the round-trip itself fails.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, FetcherError> {
        std::str::from_utf8(&self.body)
            .map_err(|e| FetcherError::Decode(format!("body is not valid UTF-8: {e}")))
    }
}

/// Executes one request. Implementations must be safe to share across
/// threads; the client never issues more than one call per operation.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder.call()?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
