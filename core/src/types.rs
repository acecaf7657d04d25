//! Decoded responses from the fetcher service.
//!
//! # Design
//! A full response is a JSON object whose keys name object categories
//! (`collections`, `items`, `adminpolicies`, ...) plus one reserved key,
//! `counts`. Category names are open-ended, so the body is kept as a
//! key-ordered `serde_json::Map` rather than a fixed struct, and its shape is
//! checked once at decode time: every non-`counts` key must hold an array of
//! objects whose `druid`, when present, is a string. Everything downstream
//! can then walk the map without re-checking.
//!
//! `counts` has been seen both as a plain object and as an array of
//! single-key objects, so it is accepted in any shape and only read through
//! [`ObjectsResponse::count`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FetcherError;

/// Reserved top-level key holding per-category and total counts.
pub const COUNTS_KEY: &str = "counts";

/// Field holding an object's identifier inside a record.
pub const DRUID_FIELD: &str = "druid";

/// Result of `FetcherClient::execute`.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Body of a `rows=0` request.
    Count(u64),
    /// Body of a full listing.
    Objects(ObjectsResponse),
}

impl ApiResponse {
    pub fn as_count(&self) -> Option<u64> {
        match self {
            ApiResponse::Count(count) => Some(*count),
            ApiResponse::Objects(_) => None,
        }
    }

    pub fn as_objects(&self) -> Option<&ObjectsResponse> {
        match self {
            ApiResponse::Objects(objects) => Some(objects),
            ApiResponse::Count(_) => None,
        }
    }
}

/// A decoded, shape-checked listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObjectsResponse {
    inner: Map<String, Value>,
}

impl ObjectsResponse {
    /// Decode a response body, rejecting anything that is not a listing.
    pub fn from_json_str(body: &str) -> Result<Self, FetcherError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| FetcherError::Decode(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, FetcherError> {
        let inner = match value {
            Value::Object(inner) => inner,
            other => {
                return Err(FetcherError::Decode(format!(
                    "expected a JSON object, got {other}"
                )));
            }
        };

        for (category, entry) in &inner {
            if category == COUNTS_KEY {
                continue;
            }
            let records = entry.as_array().ok_or_else(|| {
                FetcherError::Decode(format!("category `{category}` is not an array"))
            })?;
            for (index, record) in records.iter().enumerate() {
                let Some(fields) = record.as_object() else {
                    return Err(FetcherError::Decode(format!(
                        "record {index} of `{category}` is not an object"
                    )));
                };
                match fields.get(DRUID_FIELD) {
                    None | Some(Value::Null | Value::String(_)) => {}
                    Some(other) => {
                        return Err(FetcherError::Decode(format!(
                            "record {index} of `{category}` has a non-string druid: {other}"
                        )));
                    }
                }
            }
        }

        Ok(Self { inner })
    }

    /// Category names in document order, `counts` excluded.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.inner
            .keys()
            .map(String::as_str)
            .filter(|key| *key != COUNTS_KEY)
    }

    /// Raw records of one category, in document order. Empty when the
    /// category is absent or is the reserved counts key.
    pub fn raw_records(&self, category: &str) -> &[Value] {
        if category == COUNTS_KEY {
            return &[];
        }
        self.inner
            .get(category)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Typed records of one category.
    pub fn records(&self, category: &str) -> Result<Vec<ObjectRecord>, FetcherError> {
        self.raw_records(category)
            .iter()
            .map(|record| {
                ObjectRecord::deserialize(record).map_err(|e| FetcherError::Decode(e.to_string()))
            })
            .collect()
    }

    /// Raw `counts` section, whatever its encoding.
    pub fn counts(&self) -> Option<&Value> {
        self.inner.get(COUNTS_KEY)
    }

    /// One entry of the `counts` section, e.g. `items` or `total_count`.
    pub fn count(&self, name: &str) -> Option<u64> {
        match self.counts()? {
            Value::Object(counts) => counts.get(name)?.as_u64(),
            Value::Array(entries) => entries.iter().find_map(|entry| entry.get(name)?.as_u64()),
            _ => None,
        }
    }

    pub fn total_count(&self) -> Option<u64> {
        self.count("total_count")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.inner
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.inner
    }

    /// Raw `druid` values in encounter order: categories, then records.
    pub(crate) fn raw_druids(&self) -> impl Iterator<Item = &str> {
        self.categories()
            .flat_map(move |category| self.raw_records(category))
            .filter_map(|record| record.get(DRUID_FIELD)?.as_str())
    }
}

/// Typed view of one record. Fields the service adds beyond these are kept
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(default)]
    pub druid: Option<String>,
    #[serde(default)]
    pub latest_change: Option<String>,
    #[serde(default, deserialize_with = "titles")]
    pub title: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn titles<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(title)) => vec![title],
        Some(OneOrMany::Many(titles)) => titles,
    })
}
