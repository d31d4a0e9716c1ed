//! Report payload normalization and the per-refresh snapshot.
//!
//! A snapshot is assembled once per refresh from the fetched METAR and TAF
//! collections and never mutated afterwards. Readers share it behind an
//! `Arc` and compute metrics from it on demand.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::notam::NotamBatch;
use crate::station::StationCode;
use crate::types::{RawReport, ReportKind};

/// Wrapper keys probed for the record list. The endpoint's own name is
/// probed after these.
pub const REPORT_LIST_KEYS: &[&str] = &["data", "results"];

/// Record fields identifying the station, in priority order.
pub const STATION_ID_KEYS: &[&str] = &["icaoId", "stationId"];

/// Normalize a weather endpoint payload into a list of records.
///
/// Accepts a bare list, or an object wrapping the list under `data`,
/// `results` or the endpoint name. Unrecognized shapes give an empty list;
/// non-object elements are dropped.
pub fn normalize_report_list(payload: &Value, kind: ReportKind) -> Vec<RawReport> {
    let list = match payload {
        Value::Array(items) => Some(items),
        Value::Object(obj) => REPORT_LIST_KEYS
            .iter()
            .copied()
            .chain(std::iter::once(kind.endpoint()))
            .find_map(|k| obj.get(k).and_then(Value::as_array)),
        _ => None,
    };

    list.map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect()
    })
    .unwrap_or_default()
}

/// Station identifier of a record, upper-cased.
///
/// Prefers `icaoId`, falls back to `stationId`. `None` when neither holds a
/// valid station code.
pub fn station_of(record: &RawReport) -> Option<StationCode> {
    STATION_ID_KEYS
        .iter()
        .filter_map(|k| record.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .and_then(StationCode::normalize)
}

/// Key records by station, keeping only configured stations.
///
/// Records without an identifying field are dropped. A later record for the
/// same station replaces an earlier one.
pub fn key_by_station(
    records: Vec<RawReport>,
    stations: &[StationCode],
) -> BTreeMap<StationCode, RawReport> {
    records
        .into_iter()
        .filter_map(|record| station_of(&record).map(|code| (code, record)))
        .filter(|(code, _)| stations.contains(code))
        .collect()
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything fetched in one refresh cycle.
///
/// Every key in `metar`, `taf` and `notams` is one of `stations`. A station
/// missing from a map simply has no report of that kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSnapshot {
    pub stations: Vec<StationCode>,
    pub metar: BTreeMap<StationCode, RawReport>,
    pub taf: BTreeMap<StationCode, RawReport>,
    pub notams: Option<NotamBatch>,
    pub fetched_at: DateTime<Utc>,
}

impl ReportSnapshot {
    /// Assemble a snapshot from fetched record lists.
    pub fn assemble(
        stations: Vec<StationCode>,
        metars: Vec<RawReport>,
        tafs: Vec<RawReport>,
        notams: Option<NotamBatch>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let metar = key_by_station(metars, &stations);
        let taf = key_by_station(tafs, &stations);
        let notams = notams.map(|mut batch| {
            batch.retain_stations(&stations);
            batch
        });
        ReportSnapshot {
            stations,
            metar,
            taf,
            notams,
            fetched_at,
        }
    }

    pub fn metar(&self, station: &StationCode) -> Option<&RawReport> {
        self.metar.get(station)
    }

    pub fn taf(&self, station: &StationCode) -> Option<&RawReport> {
        self.taf.get(station)
    }

    pub fn has_station(&self, station: &StationCode) -> bool {
        self.stations.contains(station)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
