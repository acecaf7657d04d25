//! Flattening a listing into a list of druids.

use serde::Deserialize;

use crate::error::FetcherError;
use crate::types::{ApiResponse, ObjectsResponse};

/// Prefix carried by fully qualified druids.
pub const DRUID_PREFIX: &str = "druid:";

/// Options for [`druid_array`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DruidOptions {
    /// Strip the leading `druid:` from every identifier.
    pub no_prefix: bool,
}

impl DruidOptions {
    pub fn no_prefix() -> Self {
        Self { no_prefix: true }
    }
}

/// Lowercase a druid and, if asked, drop its `druid:` prefix.
pub fn normalize_druid(raw: &str, options: DruidOptions) -> String {
    let druid = raw.to_lowercase();
    if options.no_prefix {
        if let Some(bare) = druid.strip_prefix(DRUID_PREFIX) {
            return bare.to_string();
        }
    }
    druid
}

impl ObjectsResponse {
    /// Every druid in the listing, categories in document order and records
    /// in order within each category. Records without a druid are skipped.
    pub fn druids(&self, options: DruidOptions) -> Vec<String> {
        self.raw_druids()
            .map(|raw| normalize_druid(raw, options))
            .collect()
    }
}

/// Druids of a full response. A count response has none to give and is
/// rejected.
pub fn druid_array(
    response: &ApiResponse,
    options: DruidOptions,
) -> Result<Vec<String>, FetcherError> {
    match response {
        ApiResponse::Objects(objects) => Ok(objects.druids(options)),
        ApiResponse::Count(count) => Err(FetcherError::InvalidArgument(format!(
            "cannot list druids of a count response ({count})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stafford() -> ObjectsResponse {
        ObjectsResponse::from_json_str(
            r#"{"collection":[{"druid":"druid:yg867hg1375","latest_change":"2013-11-11T23:34:29Z","title":["Francis E. Stafford photographs, 1909-1933"]}],"item":[{"druid":"druid:jf275fd6276","latest_change":"2013-11-11T23:34:29Z","title":["Album A: Photographs of Chinas natural landscapes, urban scenes, cultural landmarks, social customs, and people."]},{"druid":"druid:nz353cp1092","latest_change":"2013-11-11T23:34:29Z","title":["Album E: Photographs of the Seventh Day Adventist Church missionaries in China"]},{"druid":"druid:tc552kq0798","latest_change":"2013-11-11T23:34:29Z","title":["Album D: Photographs of Chinas natural landscapes, urban scenes, cultural landmarks, social customs, and people."]},{"druid":"druid:th998nk0722","latest_change":"2013-11-11T23:34:29Z","title":["Album C: Photographs of the Chinese Revolution of 1911 and the Shanghai Commercial Press"]},{"druid":"druid:ww689vs6534","latest_change":"2013-11-11T23:34:29Z","title":["Album B: Photographs of Chinas natural landscapes, urban scenes, cultural landmarks, social customs, and people."]}],"counts":[{"collection":1},{"item":5},{"total_count":6}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn lists_druids_in_document_order() {
        assert_eq!(
            stafford().druids(DruidOptions::default()),
            vec![
                "druid:yg867hg1375",
                "druid:jf275fd6276",
                "druid:nz353cp1092",
                "druid:tc552kq0798",
                "druid:th998nk0722",
                "druid:ww689vs6534",
            ]
        );
    }

    #[test]
    fn strips_prefix_on_request() {
        assert_eq!(
            stafford().druids(DruidOptions::no_prefix()),
            vec![
                "yg867hg1375",
                "jf275fd6276",
                "nz353cp1092",
                "tc552kq0798",
                "th998nk0722",
                "ww689vs6534",
            ]
        );
    }

    #[test]
    fn counts_contribute_nothing() {
        let response = ObjectsResponse::from_value(json!({
            "collection": [{"druid": "druid:A"}],
            "item": [{"druid": "druid:B"}],
            "counts": [{"collection": 1}, {"item": 1}, {"total_count": 2}]
        }))
        .unwrap();
        assert_eq!(
            response.druids(DruidOptions::default()),
            vec!["druid:a", "druid:b"]
        );
    }

    #[test]
    fn uppercase_prefix_is_lowercased_then_stripped() {
        assert_eq!(normalize_druid("DRUID:A", DruidOptions::no_prefix()), "a");
        assert_eq!(normalize_druid("DRUID:A", DruidOptions::default()), "druid:a");
    }

    #[test]
    fn bare_druid_is_left_alone() {
        assert_eq!(normalize_druid("ab123cd4567", DruidOptions::no_prefix()), "ab123cd4567");
    }

    #[test]
    fn records_without_druid_are_skipped() {
        let response = ObjectsResponse::from_value(json!({
            "items": [
                {"druid": "druid:a"},
                {"title": "no identifier"},
                {"druid": null},
                {"druid": "druid:b"}
            ]
        }))
        .unwrap();
        assert_eq!(
            response.druids(DruidOptions::default()),
            vec!["druid:a", "druid:b"]
        );
    }

    #[test]
    fn druid_array_rejects_counts() {
        let err = druid_array(&ApiResponse::Count(11), DruidOptions::default()).unwrap_err();
        assert!(matches!(err, FetcherError::InvalidArgument(_)));
    }

    #[test]
    fn druid_array_accepts_listings() {
        let response = ApiResponse::Objects(stafford());
        let druids = druid_array(&response, DruidOptions::no_prefix()).unwrap();
        assert_eq!(druids.len(), 6);
        assert_eq!(druids[0], "yg867hg1375");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: DruidOptions = serde_json::from_value(json!({})).unwrap();
        assert!(!options.no_prefix);
        let options: DruidOptions = serde_json::from_value(json!({"no_prefix": true})).unwrap();
        assert!(options.no_prefix);
    }
}
