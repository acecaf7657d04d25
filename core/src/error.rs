//! Error types for the fetcher client.
//!
//! # Design
//! Every transport-level failure collapses into `Connection`, carrying the URL
//! that was attempted. Non-2xx statuses land there too, since the service
//! contract has no error payloads worth distinguishing. `ServiceUnavailable`
//! is reserved for the startup heartbeat so callers can tell "never came up"
//! apart from "a request failed".

use thiserror::Error;

/// Errors returned by `FetcherClient` operations.
#[derive(Debug, Error)]
pub enum FetcherError {
    /// The startup heartbeat did not get `200 ok` from the service.
    #[error("fetcher service unavailable at {url}: {cause}")]
    ServiceUnavailable { url: String, cause: String },

    /// The request could not be completed, or the service answered non-2xx.
    #[error("connection error with url {url}: {cause}")]
    Connection { url: String, cause: String },

    /// The response body did not parse as a count or as a JSON object.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The caller handed in a value of the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Client options could not be read or parsed.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl FetcherError {
    /// The URL the failed request was sent to, if the error came from a request.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetcherError::ServiceUnavailable { url, .. } | FetcherError::Connection { url, .. } => {
                Some(url)
            }
            _ => None,
        }
    }
}
