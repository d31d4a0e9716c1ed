//! Decode individual METAR/TAF fields from provider records.
//!
//! Each extractor takes one station's raw record and returns the decoded
//! value or `None`. Providers name the same field differently, so every
//! logical field has an ordered alias list resolved by [`first_present`]:
//! the first alias present with a non-null value wins.
//!
//! Units:
//! - wind direction in degrees, speed and gust in knots
//! - visibility in statute miles
//! - altimeter in inHg
//! - temperature and dewpoint in °C
//! - cloud bases and ceiling in feet AGL

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::coerce::{first_present, float_field, int_field, round_to, to_float};
use crate::types::{Ceiling, CloudCover, CloudLayer, RawReport};

// ---------------------------------------------------------------------------
// Alias tables
// ---------------------------------------------------------------------------

pub const WIND_DIR_KEYS: &[&str] = &["wdir", "windDir", "wdirDegrees", "wind_dir_degrees"];
pub const WIND_SPEED_KEYS: &[&str] = &["wspd", "windSpeed", "wspdKt", "wind_speed_kt"];
pub const WIND_GUST_KEYS: &[&str] = &["wgst", "windGust", "wgstKt", "wind_gust_kt"];
pub const VIS_SM_KEYS: &[&str] = &["visib", "vis", "visibility", "visSm"];
pub const VIS_METERS_KEYS: &[&str] = &["visibilityMeters", "visMeters", "vis_m"];
pub const ALTIMETER_KEYS: &[&str] = &["altim", "altimHg", "altimeter", "altim_inhg", "qnh", "QNH"];
pub const TEMP_KEYS: &[&str] = &["temp", "tempC", "temperature", "tmpc"];
pub const DEWPOINT_KEYS: &[&str] = &["dewp", "dewpoint", "dewpC", "dwpc"];
pub const WX_KEYS: &[&str] = &["wxString", "presentWeather", "wx"];
pub const RAW_METAR_KEYS: &[&str] = &["rawOb", "rawText", "text", "metar"];
pub const RAW_TAF_KEYS: &[&str] = &["rawTAF", "rawText", "text", "taf"];
pub const CLOUD_BASE_KEYS: &[&str] = &["base_ft_agl", "base"];

/// Highest numbered legacy `cldCvg{n}`/`cldBas{n}` pair probed.
const LEGACY_CLOUD_SLOTS: usize = 6;

// ---------------------------------------------------------------------------
// Unit constants
// ---------------------------------------------------------------------------

pub const METERS_PER_STATUTE_MILE: f64 = 1609.344;
pub const HPA_PER_INHG: f64 = 33.863_886_666_7;

/// CAVOK means visibility of 10 km or more (~6.2 SM).
pub const CAVOK_VISIBILITY_SM: f64 = 6.2;

/// Altimeter numbers above this are hPa, not inHg.
const ALTIMETER_HPA_THRESHOLD: f64 = 80.0;

// ---------------------------------------------------------------------------
// Wind
// ---------------------------------------------------------------------------

/// Wind direction in degrees. `"VRB"` and other non-numeric values are `None`.
pub fn wind_dir_deg(report: &RawReport) -> Option<i64> {
    int_field(report, WIND_DIR_KEYS)
}

pub fn wind_speed_kt(report: &RawReport) -> Option<i64> {
    int_field(report, WIND_SPEED_KEYS)
}

pub fn wind_gust_kt(report: &RawReport) -> Option<i64> {
    int_field(report, WIND_GUST_KEYS)
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// `P6SM`, `10SM`, `1 1/2SM`, `3/4SM` or `M1/4SM`.
///
/// The `P` (more than) and `M` (less than) prefixes are dropped; the bound
/// itself is reported.
static VIS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[PM]?(\d+)(?:\s+(\d+)/(\d+))?|M?(\d+)/(\d+))SM\b").expect("valid regex")
});

/// Visibility in statute miles.
///
/// Priority chain:
/// 1. structured statute-mile field (`"10+"` reads as 10)
/// 2. meters field, converted
/// 3. the `SM` group of the raw report text
/// 4. `CAVOK` in the raw report text → 6.2
pub fn visibility_sm(report: &RawReport) -> Option<f64> {
    if let Some(vis) = first_present(report, VIS_SM_KEYS).and_then(statute_miles_value) {
        return Some(vis);
    }

    if let Some(meters) = float_field(report, VIS_METERS_KEYS) {
        return Some(meters / METERS_PER_STATUTE_MILE);
    }

    first_present(report, RAW_METAR_KEYS)
        .and_then(Value::as_str)
        .and_then(parse_visibility_sm)
}

/// Numeric statute miles, tolerating the `"10+"` style of "or more".
fn statute_miles_value(value: &Value) -> Option<f64> {
    if let Some(f) = to_float(value) {
        return Some(f);
    }
    let s = value.as_str()?.trim();
    s.strip_suffix('+')
        .and_then(|n| n.trim().parse::<f64>().ok())
        .filter(|f| f.is_finite())
}

/// Parse visibility from raw report text (`10SM`, `P6SM`, `1 1/2SM`, `3/4SM`,
/// `M1/4SM`).
///
/// Falls back to 6.2 SM when the text contains `CAVOK`.
pub fn parse_visibility_sm(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }

    let Some(caps) = VIS_RE.captures(raw) else {
        return raw.contains("CAVOK").then_some(CAVOK_VISIBILITY_SM);
    };

    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());

    let mut vis = number(1).unwrap_or(0.0);
    if let (Some(num), Some(den)) = (number(2), number(3)) {
        if den != 0.0 {
            vis += num / den;
        }
    } else if let (Some(num), Some(den)) = (number(4), number(5)) {
        if den != 0.0 {
            vis += num / den;
        }
    }

    Some(vis)
}

// ---------------------------------------------------------------------------
// Altimeter
// ---------------------------------------------------------------------------

static ALTIM_A_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bA(\d{4})\b").expect("valid regex"));
static ALTIM_Q_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bQ(\d{4})\b").expect("valid regex"));

/// Altimeter setting in inHg, rounded to 2 decimals.
pub fn altimeter_inhg(report: &RawReport) -> Option<f64> {
    first_present(report, ALTIMETER_KEYS).and_then(altimeter_to_inhg)
}

/// Convert one altimeter value to inHg.
///
/// Strings may be raw tokens (`A3011` → 30.11, `Q1013` → hPa converted) or
/// numeric text. Numbers above 80 are treated as hPa; smaller numbers are
/// already inHg.
pub fn altimeter_to_inhg(value: &Value) -> Option<f64> {
    let number = match value {
        Value::String(s) => {
            let token = s.trim().to_ascii_uppercase();
            if let Some(caps) = ALTIM_A_RE.captures(&token) {
                let hundredths: f64 = caps[1].parse().ok()?;
                return Some(round_to(hundredths / 100.0, 2));
            }
            if let Some(caps) = ALTIM_Q_RE.captures(&token) {
                let hpa: f64 = caps[1].parse().ok()?;
                return Some(round_to(hpa / HPA_PER_INHG, 2));
            }
            token.parse::<f64>().ok().filter(|f| f.is_finite())?
        }
        other => to_float(other)?,
    };

    if number > ALTIMETER_HPA_THRESHOLD {
        Some(round_to(number / HPA_PER_INHG, 2))
    } else {
        Some(round_to(number, 2))
    }
}

// ---------------------------------------------------------------------------
// Temperature / weather
// ---------------------------------------------------------------------------

pub fn temp_c(report: &RawReport) -> Option<f64> {
    float_field(report, TEMP_KEYS)
}

pub fn dewpoint_c(report: &RawReport) -> Option<f64> {
    float_field(report, DEWPOINT_KEYS)
}

/// Present-weather phenomena as one space-separated string.
pub fn wx_string(report: &RawReport) -> Option<String> {
    let text = match first_present(report, WX_KEYS)? {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.trim().to_string()),
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

// ---------------------------------------------------------------------------
// Raw text
// ---------------------------------------------------------------------------

pub fn raw_metar_text(report: &RawReport) -> Option<String> {
    raw_text(report, RAW_METAR_KEYS)
}

pub fn raw_taf_text(report: &RawReport) -> Option<String> {
    raw_text(report, RAW_TAF_KEYS)
}

fn raw_text(report: &RawReport, keys: &[&str]) -> Option<String> {
    match first_present(report, keys)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Clouds and ceiling
// ---------------------------------------------------------------------------

/// Decode the reported cloud layers.
///
/// Reads the `clouds` list (`{cover, base_ft_agl | base}` objects). When no
/// list is present, falls back to numbered `cldCvg{n}`/`cldBas{n}` fields.
/// Returns `None` when the record carries no cloud information at all, and
/// an empty list when it reports none. Layers with an unknown cover are
/// skipped.
pub fn cloud_layers(report: &RawReport) -> Option<Vec<CloudLayer>> {
    match report.get("clouds") {
        Some(Value::Array(items)) => Some(items.iter().filter_map(layer_from_object).collect()),
        Some(Value::Null) | None => legacy_cloud_layers(report),
        Some(_) => Some(Vec::new()),
    }
}

fn layer_from_object(item: &Value) -> Option<CloudLayer> {
    let obj = item.as_object()?;
    let cover = CloudCover::parse(obj.get("cover")?.as_str()?)?;
    Some(CloudLayer {
        cover,
        base_ft_agl: float_field(obj, CLOUD_BASE_KEYS),
    })
}

fn legacy_cloud_layers(report: &RawReport) -> Option<Vec<CloudLayer>> {
    let mut seen = false;
    let mut layers = Vec::new();

    for n in 1..=LEGACY_CLOUD_SLOTS {
        let Some(cover) = report.get(&format!("cldCvg{n}")).and_then(Value::as_str) else {
            continue;
        };
        seen = true;
        if let Some(cover) = CloudCover::parse(cover) {
            layers.push(CloudLayer {
                cover,
                base_ft_agl: report.get(&format!("cldBas{n}")).and_then(to_float),
            });
        }
    }

    seen.then_some(layers)
}

/// Lowest base among BKN/OVC/VV layers, else [`Ceiling::Clear`].
///
/// Ceiling layers without a known base are ignored.
pub fn ceiling_from_layers(layers: &[CloudLayer]) -> Ceiling {
    layers
        .iter()
        .filter(|l| l.cover.is_ceiling())
        .filter_map(|l| l.base_ft_agl)
        .min_by(|a, b| a.total_cmp(b))
        .map_or(Ceiling::Clear, Ceiling::Feet)
}

/// Ceiling for a report; a report without cloud data is `Clear`.
pub fn ceiling(report: &RawReport) -> Ceiling {
    cloud_layers(report)
        .map(|layers| ceiling_from_layers(&layers))
        .unwrap_or(Ceiling::Clear)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
