//! Shared types, error enum, and decoded report types for aero-core.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// All errors produced by aero-core.
#[derive(Debug, Error)]
pub enum AeroError {
    /// Marker `invalid_icao`: at least one entry of a station list is not a
    /// 4-character alphanumeric code. Carries every offending entry.
    #[error("invalid_icao: {}", .0.join(", "))]
    InvalidStations(Vec<String>),
    #[error("invalid_icao: no station codes given")]
    NoStations,
    #[error("unexpected NOTAM payload shape (expected list or object with notams/items/data/results)")]
    NotamShape,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AeroError>;

/// One provider record (METAR, TAF or NOTAM), exactly as returned.
///
/// Keys vary by provider and version, so records stay untyped until a
/// field is read.
pub type RawReport = Map<String, Value>;

// ---------------------------------------------------------------------------
// Report kinds
// ---------------------------------------------------------------------------

/// Weather report collections fetched per refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Metar,
    Taf,
}

impl ReportKind {
    /// Endpoint path segment, also used as a wrapper key in responses.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ReportKind::Metar => "metar",
            ReportKind::Taf => "taf",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

// ---------------------------------------------------------------------------
// Cloud layers
// ---------------------------------------------------------------------------

/// Sky cover reported for one cloud layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudCover {
    FEW,
    SCT,
    BKN,
    OVC,
    VV,
    CLR,
    SKC,
}

impl CloudCover {
    /// Parse a cover token. Case-insensitive; unknown tokens give `None`.
    pub fn parse(token: &str) -> Option<CloudCover> {
        match token.trim().to_ascii_uppercase().as_str() {
            "FEW" => Some(CloudCover::FEW),
            "SCT" => Some(CloudCover::SCT),
            "BKN" => Some(CloudCover::BKN),
            "OVC" => Some(CloudCover::OVC),
            "VV" => Some(CloudCover::VV),
            "CLR" => Some(CloudCover::CLR),
            "SKC" => Some(CloudCover::SKC),
            _ => None,
        }
    }

    /// BKN, OVC and VV layers constitute a ceiling.
    pub fn is_ceiling(&self) -> bool {
        matches!(self, CloudCover::BKN | CloudCover::OVC | CloudCover::VV)
    }
}

/// One decoded cloud layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudLayer {
    pub cover: CloudCover,
    pub base_ft_agl: Option<f64>,
}

/// Ceiling height, or `Clear` when no layer constitutes a ceiling.
///
/// `Clear` is not 0 ft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ceiling {
    Feet(f64),
    Clear,
}

impl Ceiling {
    pub fn feet(&self) -> Option<f64> {
        match self {
            Ceiling::Feet(ft) => Some(*ft),
            Ceiling::Clear => None,
        }
    }
}

impl fmt::Display for Ceiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ceiling::Feet(ft) => write!(f, "{ft}"),
            Ceiling::Clear => f.write_str("Clear"),
        }
    }
}

// ---------------------------------------------------------------------------
// Flight category
// ---------------------------------------------------------------------------

/// FAA flight category computed from ceiling and visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightCategory {
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
}

impl FlightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightCategory::Vfr => "VFR",
            FlightCategory::Mvfr => "MVFR",
            FlightCategory::Ifr => "IFR",
            FlightCategory::Lifr => "LIFR",
        }
    }
}

impl fmt::Display for FlightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_cover_parse() {
        assert_eq!(CloudCover::parse("bkn"), Some(CloudCover::BKN));
        assert_eq!(CloudCover::parse(" OVC "), Some(CloudCover::OVC));
        assert_eq!(CloudCover::parse("CAVOK"), None);
    }

    #[test]
    fn test_cloud_cover_is_ceiling() {
        assert!(CloudCover::VV.is_ceiling());
        assert!(CloudCover::BKN.is_ceiling());
        assert!(!CloudCover::SCT.is_ceiling());
        assert!(!CloudCover::CLR.is_ceiling());
    }

    #[test]
    fn test_ceiling_display() {
        assert_eq!(Ceiling::Clear.to_string(), "Clear");
        assert_eq!(Ceiling::Feet(1800.0).to_string(), "1800");
        assert_eq!(Ceiling::Clear.feet(), None);
    }

    #[test]
    fn test_invalid_stations_message() {
        let err = AeroError::InvalidStations(vec!["KC".into(), "K$LT".into()]);
        assert_eq!(err.to_string(), "invalid_icao: KC, K$LT");
    }

    #[test]
    fn test_report_kind_endpoint() {
        assert_eq!(ReportKind::Metar.endpoint(), "metar");
        assert_eq!(ReportKind::Taf.to_string(), "taf");
    }
}
