//! Blocking client for the DOR fetcher metadata service.
//!
//! # Overview
//! The fetcher service answers GET requests about collections and
//! administrative policy objects (APOs) and the objects each one governs.
//! Listings can be narrowed by modification time and registration status, or
//! reduced to a bare count with `rows=0`.
//!
//! # Design
//! - `FetcherClient` holds the service URL and a `Transport`; it carries no
//!   per-request state and can be shared between threads.
//! - Every request is a pure `build_*` step, one transport round-trip, and a
//!   pure `parse_*` step. `UreqTransport` is the default round-trip.
//! - `QueryParams` is the closed set of parameters the service accepts, and
//!   always serializes in the same order.
//! - Listings are decoded into a key-ordered JSON map and shape-checked once,
//!   then flattened into druids on demand.
//!
//! ```no_run
//! use dor_fetcher::{ClientOptions, DruidOptions, FetcherClient, QueryParams};
//!
//! # fn main() -> Result<(), dor_fetcher::FetcherError> {
//! let client = FetcherClient::new(ClientOptions::default())?;
//! let since = QueryParams::new().with_first_modified("2014-01-01T00:00:00Z");
//! let collection = client.get_collection("druid:yg867hg1375", &since)?;
//! for druid in collection.druids(DruidOptions::no_prefix()) {
//!     println!("{druid}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod druid;
pub mod error;
pub mod http;
pub mod query;
pub mod types;

pub use client::FetcherClient;
pub use config::ClientOptions;
pub use druid::{druid_array, normalize_druid, DruidOptions};
pub use error::FetcherError;
pub use http::{HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use query::{build_query, QueryParams, ResourceCategory};
pub use types::{ApiResponse, ObjectRecord, ObjectsResponse};
