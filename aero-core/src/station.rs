//! ICAO station codes and station-list parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{AeroError, Result};

/// A validated 4-character uppercase alphanumeric airport identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationCode(String);

impl StationCode {
    /// Validate an already-normalized code (`^[A-Z0-9]{4}$`).
    pub fn new(code: &str) -> Option<StationCode> {
        let valid = code.len() == 4
            && code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        valid.then(|| StationCode(code.to_string()))
    }

    /// Trim and upper-case before validating.
    pub fn normalize(input: &str) -> Option<StationCode> {
        StationCode::new(&input.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StationCode {
    type Err = AeroError;

    fn from_str(s: &str) -> Result<Self> {
        StationCode::normalize(s).ok_or_else(|| AeroError::InvalidStations(vec![s.to_string()]))
    }
}

impl AsRef<str> for StationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for StationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StationCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a comma- or semicolon-separated station list.
///
/// Entries are trimmed and upper-cased; empty entries are ignored. If any
/// entry is invalid the whole batch is rejected. The result is deduplicated
/// and sorted.
pub fn parse_station_list(input: &str) -> Result<Vec<StationCode>> {
    let entries: Vec<&str> = input
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    normalize_stations(entries)
}

/// Validate, deduplicate and sort a collection of station entries.
pub fn normalize_stations<I, S>(entries: I) -> Result<Vec<StationCode>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut codes = Vec::new();
    let mut invalid = Vec::new();

    for entry in entries {
        let entry = entry.as_ref();
        match StationCode::normalize(entry) {
            Some(code) => codes.push(code),
            None => invalid.push(entry.trim().to_string()),
        }
    }

    if !invalid.is_empty() {
        return Err(AeroError::InvalidStations(invalid));
    }
    if codes.is_empty() {
        return Err(AeroError::NoStations);
    }

    codes.sort();
    codes.dedup();
    Ok(codes)
}

/// Join codes the way the weather endpoint expects (`KCLT,KINT`).
pub fn join_codes(stations: &[StationCode]) -> String {
    stations
        .iter()
        .map(StationCode::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
