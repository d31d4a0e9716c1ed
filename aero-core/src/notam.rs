//! NOTAM request parameters, payload extraction and per-station results.
//!
//! NOTAM providers differ in URL parameters and JSON shapes. Requests carry
//! several alias parameters at once, and records stay provider-shaped.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::station::StationCode;
use crate::types::{AeroError, RawReport, Result};

/// Wrapper keys probed for the record list, in order.
pub const NOTAM_LIST_KEYS: &[&str] = &["notams", "items", "data", "results"];

pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Extract the NOTAM record list from a provider payload.
///
/// Accepts a bare list or an object wrapping the list under one of
/// [`NOTAM_LIST_KEYS`]. Non-object elements are dropped. Any other shape is
/// an error: an empty result would read as "no NOTAMs".
pub fn extract_notam_list(payload: &Value) -> Result<Vec<RawReport>> {
    let list = match payload {
        Value::Array(items) => items,
        Value::Object(obj) => NOTAM_LIST_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array))
            .ok_or(AeroError::NotamShape)?,
        _ => return Err(AeroError::NotamShape),
    };

    Ok(list
        .iter()
        .filter_map(|item| item.as_object().cloned())
        .collect())
}

/// UTC timestamp at second precision with a `Z` suffix.
pub fn utc_iso_seconds(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Query parameters for one station's NOTAM request.
///
/// The location is sent under every common alias, with an "effective
/// before now" bound and paging hints.
pub fn notam_query(
    station: &StationCode,
    now: DateTime<Utc>,
    page_size: u32,
) -> Vec<(&'static str, String)> {
    let code = station.to_string();
    let page = page_size.to_string();
    vec![
        ("location", code.clone()),
        ("icaoLocation", code.clone()),
        ("airport", code),
        ("effectiveBefore", utc_iso_seconds(now)),
        ("pageSize", page.clone()),
        ("limit", page),
        ("active", "true".to_string()),
    ]
}

// ---------------------------------------------------------------------------
// Batch results
// ---------------------------------------------------------------------------

/// NOTAMs for a set of stations, with failures kept per station.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotamBatch {
    pub records: BTreeMap<StationCode, Vec<RawReport>>,
    pub errors: BTreeMap<StationCode, String>,
}

impl NotamBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_records(&mut self, station: StationCode, records: Vec<RawReport>) {
        self.errors.remove(&station);
        self.records.insert(station, records);
    }

    pub fn insert_error(&mut self, station: StationCode, error: impl Into<String>) {
        self.records.remove(&station);
        self.errors.insert(station, error.into());
    }

    pub fn records_for(&self, station: &StationCode) -> Option<&[RawReport]> {
        self.records.get(station).map(Vec::as_slice)
    }

    pub fn error_for(&self, station: &StationCode) -> Option<&str> {
        self.errors.get(station).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Drop entries for stations outside `stations`.
    pub fn retain_stations(&mut self, stations: &[StationCode]) {
        self.records.retain(|code, _| stations.contains(code));
        self.errors.retain(|code, _| stations.contains(code));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn code(s: &str) -> StationCode {
        StationCode::new(s).unwrap()
    }

    #[test]
    fn test_extract_bare_list() {
        let payload = json!([{"id": "A1/24"}, "junk", {"id": "A2/24"}]);
        let list = extract_notam_list(&payload).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1]["id"], "A2/24");
    }

    #[test]
    fn test_extract_wrapped() {
        for key in NOTAM_LIST_KEYS {
            let mut obj = RawReport::new();
            obj.insert(key.to_string(), json!([{"id": "A1/24"}]));
            obj.insert("total".into(), json!(1));
            let payload = Value::Object(obj);
            assert_eq!(extract_notam_list(&payload).unwrap().len(), 1, "key {key}");
        }
    }

    #[test]
    fn test_extract_wrapper_priority() {
        let payload = json!({"data": [{"id": 2}], "notams": [{"id": 1}, {"id": 3}]});
        assert_eq!(extract_notam_list(&payload).unwrap().len(), 2);
    }

    #[test]
    fn test_extract_empty_list_is_ok() {
        assert!(extract_notam_list(&json!({"items": []})).unwrap().is_empty());
    }

    #[test]
    fn test_extract_unknown_shape() {
        assert!(matches!(
            extract_notam_list(&json!({"message": "rate limited"})),
            Err(AeroError::NotamShape)
        ));
        assert!(matches!(
            extract_notam_list(&json!("nope")),
            Err(AeroError::NotamShape)
        ));
    }

    #[test]
    fn test_utc_iso_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(utc_iso_seconds(at), "2024-03-09T14:05:07Z");
    }

    #[test]
    fn test_notam_query() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let params = notam_query(&code("KCLT"), at, 50);
        let get = |name: &str| {
            params
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("location"), Some("KCLT"));
        assert_eq!(get("icaoLocation"), Some("KCLT"));
        assert_eq!(get("airport"), Some("KCLT"));
        assert_eq!(get("effectiveBefore"), Some("2024-03-09T14:05:07Z"));
        assert_eq!(get("pageSize"), Some("50"));
        assert_eq!(get("limit"), Some("50"));
        assert_eq!(get("active"), Some("true"));
    }

    #[test]
    fn test_batch_records_and_errors() {
        let mut batch = NotamBatch::new();
        batch.insert_records(code("KCLT"), vec![RawReport::new()]);
        batch.insert_error(code("KINT"), "HTTP 500");
        assert_eq!(batch.records_for(&code("KCLT")).map(<[_]>::len), Some(1));
        assert_eq!(batch.error_for(&code("KINT")), Some("HTTP 500"));
        assert!(batch.has_errors());

        batch.insert_records(code("KINT"), vec![]);
        assert!(!batch.has_errors());
    }

    #[test]
    fn test_batch_retain() {
        let mut batch = NotamBatch::new();
        batch.insert_records(code("KCLT"), vec![]);
        batch.insert_error(code("KRUQ"), "timeout");
        batch.retain_stations(&[code("KCLT")]);
        assert_eq!(batch.records.len(), 1);
        assert!(batch.errors.is_empty());
    }
}
