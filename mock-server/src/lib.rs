use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub druid: String,
    pub latest_change: String,
    pub title: Vec<String>,
}

impl ObjectRecord {
    pub fn new(druid: &str, latest_change: &str, title: &str) -> Self {
        Self {
            druid: druid.to_string(),
            latest_change: latest_change.to_string(),
            title: vec![title.to_string()],
        }
    }
}

/// A collection or APO together with what it governs.
#[derive(Clone, Debug)]
pub struct Governor {
    pub record: ObjectRecord,
    pub registered: bool,
    pub collections: Vec<ObjectRecord>,
    pub items: Vec<ObjectRecord>,
}

/// Everything the stub knows, including what it answers on `/`.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub heartbeat: String,
    pub version: Value,
    pub collections: Vec<Governor>,
    pub apos: Vec<Governor>,
}

impl Catalog {
    /// Two collections and two APOs; one of each is registered.
    pub fn sample() -> Self {
        let stafford = ObjectRecord::new(
            "druid:yg867hg1375",
            "2013-11-11T23:34:29Z",
            "Francis E. Stafford photographs, 1909-1933",
        );
        let albums = vec![
            ObjectRecord::new("druid:jf275fd6276", "2013-11-11T23:34:29Z", "Album A"),
            ObjectRecord::new("druid:nz353cp1092", "2013-12-01T10:00:00Z", "Album E"),
            ObjectRecord::new("druid:tc552kq0798", "2014-01-15T08:30:00Z", "Album D"),
            ObjectRecord::new("druid:th998nk0722", "2014-02-20T12:00:00Z", "Album C"),
            ObjectRecord::new("druid:ww689vs6534", "2014-03-05T16:45:00Z", "Album B"),
        ];

        Self {
            heartbeat: "ok".to_string(),
            version: json!({"app": "dor-fetcher-service", "version": "1.7.3"}),
            collections: vec![
                Governor {
                    record: stafford.clone(),
                    registered: false,
                    collections: Vec::new(),
                    items: albums.clone(),
                },
                Governor {
                    record: ObjectRecord::new(
                        "druid:ab123cd4567",
                        "2014-02-01T00:00:00Z",
                        "Registered, not yet populated",
                    ),
                    registered: true,
                    collections: Vec::new(),
                    items: Vec::new(),
                },
            ],
            apos: vec![
                Governor {
                    record: ObjectRecord::new(
                        "druid:qv648vd4392",
                        "2013-10-01T00:00:00Z",
                        "Stafford APO",
                    ),
                    registered: true,
                    collections: vec![stafford],
                    items: albums,
                },
                Governor {
                    record: ObjectRecord::new("druid:zx485kb6348", "2014-04-01T00:00:00Z", "Unused APO"),
                    registered: false,
                    collections: Vec::new(),
                    items: Vec::new(),
                },
            ],
        }
    }

    /// Same catalog, answering the heartbeat with `body`.
    pub fn with_heartbeat(mut self, body: &str) -> Self {
        self.heartbeat = body.to_string();
        self
    }
}

/// Query parameters the service honors. Anything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct Filters {
    pub first_modified: Option<String>,
    pub last_modified: Option<String>,
    pub status: Option<String>,
    pub rows: Option<u32>,
}

impl Filters {
    /// Whether `record` changed inside the requested window. Timestamps are
    /// ISO 8601 UTC, so string order is time order.
    pub fn admits(&self, record: &ObjectRecord) -> bool {
        let after_first = self
            .first_modified
            .as_deref()
            .map_or(true, |first| record.latest_change.as_str() >= first);
        let before_last = self
            .last_modified
            .as_deref()
            .map_or(true, |last| record.latest_change.as_str() <= last);
        after_first && before_last
    }

    pub fn count_only(&self) -> bool {
        self.rows == Some(0)
    }

    fn status_admits(&self, governor: &Governor) -> bool {
        match self.status.as_deref() {
            Some("registered") => governor.registered,
            _ => true,
        }
    }

    fn select(&self, records: &[ObjectRecord]) -> Vec<ObjectRecord> {
        records.iter().filter(|r| self.admits(r)).cloned().collect()
    }
}

pub type Db = Arc<Catalog>;

pub fn app() -> Router {
    app_with(Catalog::sample())
}

pub fn app_with(catalog: Catalog) -> Router {
    Router::new()
        .route("/", get(heartbeat))
        .route("/about/version.json", get(version))
        .route("/collections", get(list_collections))
        .route("/collections/{druid}", get(get_collection))
        .route("/apos", get(list_apos))
        .route("/apos/{druid}", get(get_apo))
        .with_state(Arc::new(catalog))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Catalog::sample()).await
}

pub async fn run_with(listener: TcpListener, catalog: Catalog) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(catalog)).await
}

/// Build a listing body, or a bare count for `rows=0`. Empty sections are
/// left out.
fn listing(filters: &Filters, sections: Vec<(&str, Vec<ObjectRecord>)>) -> Response {
    let sections: Vec<_> = sections
        .into_iter()
        .filter(|(_, records)| !records.is_empty())
        .collect();
    let total: usize = sections.iter().map(|(_, records)| records.len()).sum();
    if filters.count_only() {
        return total.to_string().into_response();
    }

    let mut body = Map::new();
    let mut counts = Map::new();
    for (name, records) in sections {
        counts.insert(name.to_string(), json!(records.len()));
        body.insert(name.to_string(), json!(records));
    }
    counts.insert("total_count".to_string(), json!(total));
    body.insert("counts".to_string(), Value::Object(counts));
    Json(Value::Object(body)).into_response()
}

fn find<'a>(governors: &'a [Governor], druid: &str) -> Option<&'a Governor> {
    governors
        .iter()
        .find(|g| g.record.druid == druid || g.record.druid.strip_prefix("druid:") == Some(druid))
}

fn detail(self_key: &str, governor: &Governor, filters: &Filters) -> Response {
    let own = if filters.admits(&governor.record) {
        vec![governor.record.clone()]
    } else {
        Vec::new()
    };
    let mut sections = vec![(self_key, own)];
    if self_key != "collections" {
        sections.push(("collections", filters.select(&governor.collections)));
    }
    sections.push(("items", filters.select(&governor.items)));
    listing(filters, sections)
}

fn list(key: &str, governors: &[Governor], filters: &Filters) -> Response {
    let records: Vec<ObjectRecord> = governors
        .iter()
        .filter(|g| filters.status_admits(g) && filters.admits(&g.record))
        .map(|g| g.record.clone())
        .collect();
    listing(filters, vec![(key, records)])
}

async fn heartbeat(State(db): State<Db>) -> String {
    tracing::debug!("heartbeat");
    db.heartbeat.clone()
}

async fn version(State(db): State<Db>) -> Json<Value> {
    Json(db.version.clone())
}

async fn list_collections(State(db): State<Db>, Query(filters): Query<Filters>) -> Response {
    tracing::debug!(?filters, "list collections");
    list("collections", &db.collections, &filters)
}

async fn get_collection(
    State(db): State<Db>,
    Path(druid): Path<String>,
    Query(filters): Query<Filters>,
) -> Result<Response, StatusCode> {
    tracing::debug!(%druid, ?filters, "get collection");
    let governor = find(&db.collections, &druid).ok_or(StatusCode::NOT_FOUND)?;
    Ok(detail("collections", governor, &filters))
}

async fn list_apos(State(db): State<Db>, Query(filters): Query<Filters>) -> Response {
    tracing::debug!(?filters, "list apos");
    list("adminpolicies", &db.apos, &filters)
}

async fn get_apo(
    State(db): State<Db>,
    Path(druid): Path<String>,
    Query(filters): Query<Filters>,
) -> Result<Response, StatusCode> {
    tracing::debug!(%druid, ?filters, "get apo");
    let governor = find(&db.apos, &druid).ok_or(StatusCode::NOT_FOUND)?;
    Ok(detail("adminpolicies", governor, &filters))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(latest_change: &str) -> ObjectRecord {
        ObjectRecord::new("druid:aa111bb2222", latest_change, "Test")
    }

    #[test]
    fn record_serializes_to_json() {
        let json = serde_json::to_value(record("2014-01-01T00:00:00Z")).unwrap();
        assert_eq!(json["druid"], "druid:aa111bb2222");
        assert_eq!(json["latest_change"], "2014-01-01T00:00:00Z");
        assert_eq!(json["title"][0], "Test");
    }

    #[test]
    fn filters_without_bounds_admit_everything() {
        assert!(Filters::default().admits(&record("1999-01-01T00:00:00Z")));
    }

    #[test]
    fn filters_bounds_are_inclusive() {
        let filters = Filters {
            first_modified: Some("2014-01-01T00:00:00Z".to_string()),
            last_modified: Some("2014-02-01T00:00:00Z".to_string()),
            ..Filters::default()
        };
        assert!(filters.admits(&record("2014-01-01T00:00:00Z")));
        assert!(filters.admits(&record("2014-02-01T00:00:00Z")));
        assert!(!filters.admits(&record("2013-12-31T23:59:59Z")));
        assert!(!filters.admits(&record("2014-02-01T00:00:01Z")));
    }

    #[test]
    fn only_rows_zero_means_count() {
        assert!(!Filters::default().count_only());
        let filters = Filters {
            rows: Some(0),
            ..Filters::default()
        };
        assert!(filters.count_only());
        let filters = Filters {
            rows: Some(10),
            ..Filters::default()
        };
        assert!(!filters.count_only());
    }

    #[test]
    fn find_accepts_bare_and_prefixed_druids() {
        let catalog = Catalog::sample();
        assert!(find(&catalog.collections, "druid:yg867hg1375").is_some());
        assert!(find(&catalog.collections, "yg867hg1375").is_some());
        assert!(find(&catalog.collections, "druid:zz999zz9999").is_none());
    }

    #[test]
    fn sample_catalog_answers_ok() {
        assert_eq!(Catalog::sample().heartbeat, "ok");
        assert_eq!(Catalog::sample().with_heartbeat("not-ok").heartbeat, "not-ok");
    }
}
