//! Blocking client for the fetcher service.
//!
//! # Design
//! `FetcherClient` holds the service URL and a shared `Transport`, nothing
//! else, so it is cheap to clone and safe to use from several threads. Each
//! request is split into a `build_*` step that produces an `HttpRequest` and a
//! `parse_*` step that consumes the `HttpResponse`; both are pure and public,
//! so a caller with its own HTTP stack can drive them directly. The domain
//! operations glue the two together through the transport, one request per
//! call, with no retry.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientOptions;
use crate::error::FetcherError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::query::{build_query, QueryParams, ResourceCategory, REGISTERED_STATUS};
use crate::types::{ApiResponse, ObjectsResponse};

/// Body the service answers the heartbeat with.
pub const HEARTBEAT_BODY: &str = "ok";

/// Path of the service's version document.
pub const VERSION_PATH: &str = "/about/version.json";

#[derive(Clone)]
pub struct FetcherClient {
    service_url: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for FetcherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherClient")
            .field("service_url", &self.service_url)
            .finish_non_exhaustive()
    }
}

impl FetcherClient {
    /// Create a client using the blocking `ureq` transport.
    ///
    /// Unless `skip_heartbeat` is set, the service is probed once and
    /// construction fails with `ServiceUnavailable` if it does not answer
    /// `200 ok`.
    pub fn new(options: ClientOptions) -> Result<Self, FetcherError> {
        let transport = UreqTransport::new(options.timeout());
        Self::with_transport(options, transport)
    }

    /// Create a client over any transport. Heartbeat rules are the same as
    /// for [`FetcherClient::new`].
    pub fn with_transport(
        options: ClientOptions,
        transport: impl Transport + 'static,
    ) -> Result<Self, FetcherError> {
        let client = Self {
            service_url: options.service_url,
            transport: Arc::new(transport),
        };
        if !options.skip_heartbeat {
            client.heartbeat()?;
        }
        debug!(service_url = %client.service_url, "fetcher client ready");
        Ok(client)
    }

    /// The endpoint exactly as configured.
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// `path` appended to the endpoint, dropping one trailing `/` from the
    /// endpoint so the two never double up.
    fn url_for(&self, path: &str) -> String {
        let base = self
            .service_url
            .strip_suffix('/')
            .unwrap_or(&self.service_url);
        format!("{base}{path}")
    }

    /// Probe the service root. Never fails; any problem reads as "not alive".
    pub fn is_alive(&self) -> bool {
        self.heartbeat().is_ok()
    }

    fn heartbeat(&self) -> Result<(), FetcherError> {
        let request = self.build_heartbeat();
        let response = self.transport.execute(&request).map_err(|e| {
            warn!(url = %request.url, error = %e, "heartbeat failed");
            FetcherError::ServiceUnavailable {
                url: request.url.clone(),
                cause: e.to_string(),
            }
        })?;
        self.parse_heartbeat(&request, &response)
    }

    // -- building ---------------------------------------------------------

    pub fn build_heartbeat(&self) -> HttpRequest {
        HttpRequest::get(self.service_url.as_str())
    }

    pub fn build_service_version(&self) -> HttpRequest {
        HttpRequest::get(self.url_for(VERSION_PATH))
    }

    pub fn build_request(
        &self,
        category: ResourceCategory,
        identifier: &str,
        params: &QueryParams,
    ) -> HttpRequest {
        HttpRequest::get(self.url_for(&build_query(category, identifier, params)))
    }

    // -- parsing ----------------------------------------------------------

    pub fn parse_heartbeat(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> Result<(), FetcherError> {
        if response.status == 200 && response.body == HEARTBEAT_BODY.as_bytes() {
            return Ok(());
        }
        warn!(url = %request.url, status = response.status, "service did not answer ok");
        Err(FetcherError::ServiceUnavailable {
            url: request.url.clone(),
            cause: status_cause(response),
        })
    }

    /// Parse the body of a `rows=0` request.
    pub fn parse_count(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> Result<u64, FetcherError> {
        check_status(request, response)?;
        let body = response.text()?.trim();
        body.parse()
            .map_err(|e| FetcherError::Decode(format!("count body {body:?}: {e}")))
    }

    pub fn parse_objects(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> Result<ObjectsResponse, FetcherError> {
        check_status(request, response)?;
        ObjectsResponse::from_json_str(response.text()?)
    }

    pub fn parse_service_version(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> Result<Value, FetcherError> {
        check_status(request, response)?;
        serde_json::from_str(response.text()?).map_err(|e| FetcherError::Decode(e.to_string()))
    }

    // -- execution --------------------------------------------------------

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, FetcherError> {
        debug!(url = %request.url, "GET");
        let response = self.transport.execute(request).map_err(|e| {
            warn!(url = %request.url, error = %e, "request failed");
            FetcherError::Connection {
                url: request.url.clone(),
                cause: e.to_string(),
            }
        })?;
        debug!(url = %request.url, status = response.status, bytes = response.body.len(), "response");
        Ok(response)
    }

    /// Run one query. `count_only` decides whether the body is read as a
    /// bare integer or as a JSON listing.
    pub fn execute(
        &self,
        category: ResourceCategory,
        identifier: &str,
        params: &QueryParams,
    ) -> Result<ApiResponse, FetcherError> {
        let request = self.build_request(category, identifier, params);
        let response = self.send(&request)?;
        if params.count_only {
            self.parse_count(&request, &response).map(ApiResponse::Count)
        } else {
            self.parse_objects(&request, &response)
                .map(ApiResponse::Objects)
        }
    }

    fn fetch_objects(
        &self,
        category: ResourceCategory,
        identifier: &str,
        params: QueryParams,
    ) -> Result<ObjectsResponse, FetcherError> {
        let request = self.build_request(category, identifier, &params.without_count_only());
        let response = self.send(&request)?;
        self.parse_objects(&request, &response)
    }

    fn fetch_count(
        &self,
        category: ResourceCategory,
        identifier: &str,
        params: QueryParams,
    ) -> Result<u64, FetcherError> {
        let request = self.build_request(category, identifier, &params.with_count_only());
        let response = self.send(&request)?;
        self.parse_count(&request, &response)
    }

    // -- collections ------------------------------------------------------

    /// A collection and the objects it holds.
    pub fn get_collection(
        &self,
        collection: &str,
        params: &QueryParams,
    ) -> Result<ObjectsResponse, FetcherError> {
        self.fetch_objects(ResourceCategory::Collections, collection, params.clone())
    }

    pub fn get_count_for_collection(
        &self,
        collection: &str,
        params: &QueryParams,
    ) -> Result<u64, FetcherError> {
        self.fetch_count(ResourceCategory::Collections, collection, params.clone())
    }

    pub fn list_all_collections(
        &self,
        params: &QueryParams,
    ) -> Result<ObjectsResponse, FetcherError> {
        self.fetch_objects(ResourceCategory::Collections, "", params.clone())
    }

    pub fn list_registered_collections(
        &self,
        params: &QueryParams,
    ) -> Result<ObjectsResponse, FetcherError> {
        self.fetch_objects(
            ResourceCategory::Collections,
            "",
            params.clone().with_status(REGISTERED_STATUS),
        )
    }

    pub fn total_collection_count(&self, params: &QueryParams) -> Result<u64, FetcherError> {
        self.fetch_count(ResourceCategory::Collections, "", params.clone())
    }

    // -- APOs -------------------------------------------------------------

    /// An APO and the objects it governs.
    pub fn get_apo(&self, apo: &str, params: &QueryParams) -> Result<ObjectsResponse, FetcherError> {
        self.fetch_objects(ResourceCategory::Apos, apo, params.clone())
    }

    pub fn get_count_for_apo(&self, apo: &str, params: &QueryParams) -> Result<u64, FetcherError> {
        self.fetch_count(ResourceCategory::Apos, apo, params.clone())
    }

    pub fn list_all_apos(&self, params: &QueryParams) -> Result<ObjectsResponse, FetcherError> {
        self.fetch_objects(ResourceCategory::Apos, "", params.clone())
    }

    pub fn list_registered_apos(
        &self,
        params: &QueryParams,
    ) -> Result<ObjectsResponse, FetcherError> {
        self.fetch_objects(
            ResourceCategory::Apos,
            "",
            params.clone().with_status(REGISTERED_STATUS),
        )
    }

    pub fn total_apo_count(&self, params: &QueryParams) -> Result<u64, FetcherError> {
        self.fetch_count(ResourceCategory::Apos, "", params.clone())
    }

    // -- service ----------------------------------------------------------

    /// The service's `about/version.json` document.
    pub fn service_version(&self) -> Result<Value, FetcherError> {
        let request = self.build_service_version();
        let response = self.send(&request)?;
        self.parse_service_version(&request, &response)
    }
}

fn status_cause(response: &HttpResponse) -> String {
    format!(
        "HTTP {}: {}",
        response.status,
        String::from_utf8_lossy(&response.body)
    )
}

/// Non-2xx answers are treated like any other failed round-trip.
fn check_status(request: &HttpRequest, response: &HttpResponse) -> Result<(), FetcherError> {
    if response.is_success() {
        return Ok(());
    }
    warn!(url = %request.url, status = response.status, "unexpected status");
    Err(FetcherError::Connection {
        url: request.url.clone(),
        cause: status_cause(response),
    })
}
