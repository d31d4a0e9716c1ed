//! Named per-station metrics computed from a snapshot.
//!
//! Each metric yields a [`Reading`]: a value (or none), a unit and an
//! attribute map. Readings are computed when asked for, always from the
//! snapshot passed in, so they can never go stale relative to it.

use serde::Serialize;
use serde_json::{json, Value};

use crate::derive::{density_altitude_for, flight_category};
use crate::elevation::ElevationTable;
use crate::metar;
use crate::snapshot::ReportSnapshot;
use crate::station::StationCode;
use crate::types::{Ceiling, RawReport};

// ---------------------------------------------------------------------------
// Metric catalogue
// ---------------------------------------------------------------------------

/// Every metric exposed per station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    MetarRaw,
    TafRaw,
    FlightCategory,
    WindDir,
    WindSpeed,
    WindGust,
    Visibility,
    Ceiling,
    Altimeter,
    Temp,
    Dewpoint,
    DensityAltitude,
    Wx,
    NotamCount,
}

/// Metrics in presentation order.
pub const ALL_METRICS: &[MetricKind] = &[
    MetricKind::MetarRaw,
    MetricKind::TafRaw,
    MetricKind::FlightCategory,
    MetricKind::WindDir,
    MetricKind::WindSpeed,
    MetricKind::WindGust,
    MetricKind::Visibility,
    MetricKind::Ceiling,
    MetricKind::Altimeter,
    MetricKind::Temp,
    MetricKind::DensityAltitude,
    MetricKind::Dewpoint,
    MetricKind::Wx,
    MetricKind::NotamCount,
];

impl MetricKind {
    pub fn key(&self) -> &'static str {
        match self {
            MetricKind::MetarRaw => "metar_raw",
            MetricKind::TafRaw => "taf_raw",
            MetricKind::FlightCategory => "flight_category",
            MetricKind::WindDir => "wind_dir",
            MetricKind::WindSpeed => "wind_speed",
            MetricKind::WindGust => "wind_gust",
            MetricKind::Visibility => "visibility",
            MetricKind::Ceiling => "ceiling",
            MetricKind::Altimeter => "altimeter",
            MetricKind::Temp => "temp",
            MetricKind::Dewpoint => "dewpoint",
            MetricKind::DensityAltitude => "density_altitude",
            MetricKind::Wx => "wx",
            MetricKind::NotamCount => "notam_count",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::MetarRaw => "METAR (raw)",
            MetricKind::TafRaw => "TAF (raw)",
            MetricKind::FlightCategory => "Flight category",
            MetricKind::WindDir => "Wind direction",
            MetricKind::WindSpeed => "Wind speed",
            MetricKind::WindGust => "Wind gust",
            MetricKind::Visibility => "Visibility",
            MetricKind::Ceiling => "Ceiling",
            MetricKind::Altimeter => "Altimeter",
            MetricKind::Temp => "Temperature",
            MetricKind::Dewpoint => "Dewpoint",
            MetricKind::DensityAltitude => "Density Altitude",
            MetricKind::Wx => "Weather",
            MetricKind::NotamCount => "NOTAMs",
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            MetricKind::WindDir => Some("°"),
            MetricKind::WindSpeed | MetricKind::WindGust => Some("kn"),
            MetricKind::Visibility => Some("mi"),
            MetricKind::Ceiling | MetricKind::DensityAltitude => Some("ft"),
            MetricKind::Altimeter => Some("inHg"),
            MetricKind::Temp | MetricKind::Dewpoint => Some("°C"),
            _ => None,
        }
    }

    pub fn from_key(key: &str) -> Option<MetricKind> {
        ALL_METRICS.iter().copied().find(|m| m.key() == key)
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// A metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Text(String),
    Integer(i64),
    Number(f64),
    /// No ceiling layer reported.
    Clear,
}

impl Serialize for MetricValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Text(s) => serializer.serialize_str(s),
            MetricValue::Integer(i) => serializer.serialize_i64(*i),
            MetricValue::Number(f) => serializer.serialize_f64(*f),
            MetricValue::Clear => serializer.serialize_str("Clear"),
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Text(s) => write!(f, "{s}"),
            MetricValue::Integer(i) => write!(f, "{i}"),
            MetricValue::Number(n) => write!(f, "{n}"),
            MetricValue::Clear => write!(f, "Clear"),
        }
    }
}

/// One metric for one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub station: StationCode,
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub value: Option<MetricValue>,
    pub attributes: RawReport,
}

/// Compute one metric for one station.
///
/// METAR-derived metrics have no value when the station has no METAR in
/// the snapshot.
pub fn read_metric(
    snapshot: &ReportSnapshot,
    elevations: &ElevationTable,
    station: &StationCode,
    kind: MetricKind,
) -> Reading {
    let metar = snapshot.metar(station);
    let mut attributes = RawReport::new();

    let value = match kind {
        MetricKind::MetarRaw => {
            if let Some(report) = metar {
                attributes = report.clone();
            }
            metar.and_then(metar::raw_metar_text).map(MetricValue::Text)
        }
        MetricKind::TafRaw => {
            let taf = snapshot.taf(station);
            if let Some(report) = taf {
                attributes = report.clone();
            }
            taf.and_then(metar::raw_taf_text).map(MetricValue::Text)
        }
        MetricKind::NotamCount => notam_reading(snapshot, station, &mut attributes),
        _ => metar.and_then(|report| metar_value(report, elevations, station, kind)),
    };

    Reading {
        station: station.clone(),
        key: kind.key(),
        name: kind.name(),
        unit: kind.unit(),
        value,
        attributes,
    }
}

fn metar_value(
    report: &RawReport,
    elevations: &ElevationTable,
    station: &StationCode,
    kind: MetricKind,
) -> Option<MetricValue> {
    match kind {
        MetricKind::FlightCategory => flight_category(report).map(MetricValue::Text),
        MetricKind::WindDir => metar::wind_dir_deg(report).map(MetricValue::Integer),
        MetricKind::WindSpeed => metar::wind_speed_kt(report).map(MetricValue::Integer),
        MetricKind::WindGust => metar::wind_gust_kt(report).map(MetricValue::Integer),
        MetricKind::Visibility => metar::visibility_sm(report).map(MetricValue::Number),
        MetricKind::Ceiling => Some(match metar::ceiling(report) {
            Ceiling::Feet(ft) => MetricValue::Number(ft),
            Ceiling::Clear => MetricValue::Clear,
        }),
        MetricKind::Altimeter => metar::altimeter_inhg(report).map(MetricValue::Number),
        MetricKind::Temp => metar::temp_c(report).map(MetricValue::Number),
        MetricKind::Dewpoint => metar::dewpoint_c(report).map(MetricValue::Number),
        MetricKind::DensityAltitude => {
            density_altitude_for(report, elevations.get(station)).map(MetricValue::Integer)
        }
        MetricKind::Wx => metar::wx_string(report).map(MetricValue::Text),
        MetricKind::MetarRaw | MetricKind::TafRaw | MetricKind::NotamCount => None,
    }
}

fn notam_reading(
    snapshot: &ReportSnapshot,
    station: &StationCode,
    attributes: &mut RawReport,
) -> Option<MetricValue> {
    let batch = snapshot.notams.as_ref()?;
    if let Some(error) = batch.error_for(station) {
        attributes.insert("error".into(), json!(error));
        return None;
    }
    let records = batch.records_for(station)?;
    attributes.insert(
        "notams".into(),
        Value::Array(records.iter().cloned().map(Value::Object).collect()),
    );
    Some(MetricValue::Integer(records.len() as i64))
}

/// Every metric for one station, in presentation order.
///
/// `notam_count` is only included when the snapshot carries NOTAMs.
pub fn read_station(
    snapshot: &ReportSnapshot,
    elevations: &ElevationTable,
    station: &StationCode,
) -> Vec<Reading> {
    ALL_METRICS
        .iter()
        .filter(|kind| **kind != MetricKind::NotamCount || snapshot.notams.is_some())
        .map(|kind| read_metric(snapshot, elevations, station, *kind))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
