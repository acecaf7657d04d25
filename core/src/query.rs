//! Path and query-string construction.
//!
//! # Design
//! `QueryParams` is the whole parameter vocabulary the service understands.
//! Loosely typed input (a JSON object from a config file, a form, a script)
//! goes through `QueryParams::from_value`, which keeps the known keys and
//! drops everything else, so an unsupported key can never reach the wire.
//! Serialization order is the field order below, independent of how the
//! input was assembled.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FetcherError;

/// Parameter names the service accepts, in the order they are serialized.
pub const SUPPORTED_PARAMS: [&str; 4] = ["first_modified", "last_modified", "count_only", "status"];

/// What `count_only` becomes on the wire: ask for zero rows, get a count.
pub const COUNT_ONLY_TOKEN: &str = "rows=0";

/// Status value used by the `list_registered_*` operations.
pub const REGISTERED_STATUS: &str = "registered";

/// Which sub-resource of the service a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    Collections,
    Apos,
}

impl ResourceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceCategory::Collections => "collections",
            ResourceCategory::Apos => "apos",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters and flags for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Only objects changed at or after this timestamp.
    pub first_modified: Option<String>,
    /// Only objects changed at or before this timestamp.
    pub last_modified: Option<String>,
    /// Return a bare count instead of the object listing.
    #[serde(deserialize_with = "null_as_false")]
    pub count_only: bool,
    /// Workflow status filter, e.g. `registered`.
    pub status: Option<String>,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from a JSON object, ignoring keys outside
    /// [`SUPPORTED_PARAMS`]. `null` values are treated as absent.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, FetcherError> {
        if !value.is_object() {
            return Err(FetcherError::InvalidArgument(format!(
                "query parameters must be a JSON object, got {value}"
            )));
        }
        Self::deserialize(value).map_err(|e| FetcherError::InvalidArgument(e.to_string()))
    }

    pub fn with_first_modified(mut self, timestamp: impl Into<String>) -> Self {
        self.first_modified = Some(timestamp.into());
        self
    }

    pub fn with_last_modified(mut self, timestamp: impl Into<String>) -> Self {
        self.last_modified = Some(timestamp.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_count_only(mut self) -> Self {
        self.count_only = true;
        self
    }

    pub(crate) fn without_count_only(mut self) -> Self {
        self.count_only = false;
        self
    }

    /// Render as `?k=v&...`, or an empty string when nothing is set.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::with_capacity(SUPPORTED_PARAMS.len());
        if let Some(value) = &self.first_modified {
            pairs.push(format!("first_modified={}", urlencoding::encode(value)));
        }
        if let Some(value) = &self.last_modified {
            pairs.push(format!("last_modified={}", urlencoding::encode(value)));
        }
        if self.count_only {
            pairs.push(COUNT_ONLY_TOKEN.to_string());
        }
        if let Some(value) = &self.status {
            pairs.push(format!("status={}", urlencoding::encode(value)));
        }

        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        }
    }
}

/// Percent-encode one path segment. `:` is legal in a segment and is kept
/// so druids stay readable on the wire.
fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).replace("%3A", ":")
}

/// Path plus query string for a request, relative to the service root.
///
/// An empty `identifier` addresses the whole category. The identifier is
/// encoded as a single path segment, so `/`, `?` or `#` inside it cannot
/// change the request.
pub fn build_query(category: ResourceCategory, identifier: &str, params: &QueryParams) -> String {
    let mut target = format!("/{category}");
    if !identifier.is_empty() {
        target.push('/');
        target.push_str(&encode_segment(identifier));
    }
    target.push_str(&params.to_query_string());
    target
}
