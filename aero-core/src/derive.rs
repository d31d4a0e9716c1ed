//! Derived metrics: flight category and density altitude.
//!
//! Pure functions over one station's METAR record. The density altitude
//! chain uses the standard rule-of-thumb approximations:
//!
//! ```text
//! PA  = elevation + (29.92 - altimeter) * 1000
//! ISA = 15 - 2 * (PA / 1000)
//! DA  = PA + 120 * (OAT - ISA)
//! ```

use serde_json::Value;

use crate::coerce::first_present;
use crate::metar::{altimeter_inhg, ceiling_from_layers, cloud_layers, temp_c, visibility_sm};
use crate::types::{FlightCategory, RawReport};

pub const FLIGHT_CATEGORY_KEYS: &[&str] = &["fltCat", "flightCategory", "fltcat"];

/// Standard sea-level pressure, inHg.
pub const STANDARD_ALTIMETER_INHG: f64 = 29.92;

/// Stand-in for "no ceiling" when classifying.
pub const UNLIMITED_CEILING_FT: f64 = 99_999.0;

/// Stand-in for missing visibility when classifying.
pub const UNLIMITED_VISIBILITY_SM: f64 = 99.0;

// ---------------------------------------------------------------------------
// Flight category
// ---------------------------------------------------------------------------

/// Classify from ceiling (ft) and visibility (SM) with FAA thresholds.
///
/// Missing inputs count as unlimited; with both missing there is nothing to
/// classify and the result is `None`.
pub fn classify_flight_category(
    ceiling_ft: Option<f64>,
    visibility_sm: Option<f64>,
) -> Option<FlightCategory> {
    if ceiling_ft.is_none() && visibility_sm.is_none() {
        return None;
    }

    let ceiling = ceiling_ft.unwrap_or(UNLIMITED_CEILING_FT);
    let vis = visibility_sm.unwrap_or(UNLIMITED_VISIBILITY_SM);

    let category = if ceiling < 500.0 || vis < 1.0 {
        FlightCategory::Lifr
    } else if ceiling < 1000.0 || vis < 3.0 {
        FlightCategory::Ifr
    } else if ceiling < 3000.0 || vis < 5.0 {
        FlightCategory::Mvfr
    } else {
        FlightCategory::Vfr
    };
    Some(category)
}

/// Flight category for a METAR record.
///
/// A provider-supplied category wins (trimmed, upper-cased, verbatim).
/// Otherwise it is computed from the reported clouds and visibility. Cloud
/// data reporting no ceiling counts as an unlimited ceiling; a record with
/// neither cloud data nor visibility yields `None`.
pub fn flight_category(report: &RawReport) -> Option<String> {
    if let Some(Value::String(cat)) = first_present(report, FLIGHT_CATEGORY_KEYS) {
        let cat = cat.trim();
        if !cat.is_empty() {
            return Some(cat.to_ascii_uppercase());
        }
    }

    let ceiling_ft = cloud_layers(report).map(|layers| {
        ceiling_from_layers(&layers)
            .feet()
            .unwrap_or(UNLIMITED_CEILING_FT)
    });

    classify_flight_category(ceiling_ft, visibility_sm(report)).map(|c| c.to_string())
}

// ---------------------------------------------------------------------------
// Density altitude
// ---------------------------------------------------------------------------

/// Pressure altitude in feet.
pub fn pressure_altitude_ft(field_elevation_ft: f64, altimeter_inhg: f64) -> f64 {
    field_elevation_ft + (STANDARD_ALTIMETER_INHG - altimeter_inhg) * 1000.0
}

/// ISA temperature (°C) at an altitude: 15 °C minus 2 °C per 1000 ft.
pub fn isa_temp_c_at_ft(altitude_ft: f64) -> f64 {
    15.0 - 2.0 * (altitude_ft / 1000.0)
}

/// Density altitude in feet, unrounded.
pub fn density_altitude_ft(field_elevation_ft: f64, altimeter_inhg: f64, oat_c: f64) -> f64 {
    let pa = pressure_altitude_ft(field_elevation_ft, altimeter_inhg);
    pa + 120.0 * (oat_c - isa_temp_c_at_ft(pa))
}

/// Density altitude for a METAR record, rounded to the nearest foot.
///
/// `None` unless the field elevation, altimeter and temperature are all
/// known.
pub fn density_altitude_for(report: &RawReport, field_elevation_ft: Option<f64>) -> Option<i64> {
    let elevation = field_elevation_ft?;
    let altimeter = altimeter_inhg(report)?;
    let oat = temp_c(report)?;
    Some(density_altitude_ft(elevation, altimeter, oat).round() as i64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> RawReport {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_classify_thresholds() {
        use FlightCategory::*;
        assert_eq!(classify_flight_category(Some(400.0), Some(5.0)), Some(Lifr));
        assert_eq!(classify_flight_category(Some(5000.0), Some(0.5)), Some(Lifr));
        assert_eq!(classify_flight_category(Some(500.0), Some(10.0)), Some(Ifr));
        assert_eq!(classify_flight_category(Some(999.0), Some(10.0)), Some(Ifr));
        assert_eq!(classify_flight_category(Some(1000.0), Some(10.0)), Some(Mvfr));
        assert_eq!(classify_flight_category(Some(5000.0), Some(4.0)), Some(Mvfr));
        assert_eq!(classify_flight_category(Some(3000.0), Some(5.0)), Some(Vfr));
    }

    #[test]
    fn test_classify_missing_inputs() {
        assert_eq!(classify_flight_category(None, None), None);
        assert_eq!(
            classify_flight_category(None, Some(2.0)),
            Some(FlightCategory::Ifr)
        );
        assert_eq!(
            classify_flight_category(Some(800.0), None),
            Some(FlightCategory::Ifr)
        );
    }

    #[test]
    fn test_flight_category_explicit() {
        let r = record(json!({"fltCat": " mvfr ", "visib": 10}));
        assert_eq!(flight_category(&r), Some("MVFR".into()));

        let r = record(json!({"flightCategory": "", "visib": 0.5}));
        assert_eq!(flight_category(&r), Some("LIFR".into()));
    }

    #[test]
    fn test_flight_category_computed() {
        let r = record(json!({
            "visib": 6,
            "clouds": [{"cover": "BKN", "base": 2500}, {"cover": "OVC", "base": 1800}]
        }));
        assert_eq!(flight_category(&r), Some("MVFR".into()));
    }

    #[test]
    fn test_flight_category_clear_skies() {
        let r = record(json!({"clouds": [{"cover": "CLR"}]}));
        assert_eq!(flight_category(&r), Some("VFR".into()));
    }

    #[test]
    fn test_flight_category_from_raw_less_than_visibility() {
        let r = record(json!({"rawOb": "KCLT 121552Z 00000KT M1/4SM FG VV001 A2992"}));
        assert_eq!(flight_category(&r), Some("LIFR".into()));
    }

    #[test]
    fn test_flight_category_unknown() {
        assert_eq!(flight_category(&record(json!({"temp": 20}))), None);
    }

    #[test]
    fn test_pressure_altitude() {
        assert_eq!(pressure_altitude_ft(748.0, 29.92), 748.0);
        assert!((pressure_altitude_ft(0.0, 30.12) - -200.0).abs() < 1e-6);
    }

    #[test]
    fn test_isa_temp() {
        assert_eq!(isa_temp_c_at_ft(0.0), 15.0);
        assert_eq!(isa_temp_c_at_ft(5000.0), 5.0);
    }

    #[test]
    fn test_density_altitude_chain() {
        // PA 748, ISA 13.504, DA = 748 + 120 * 16.496 = 2727.52
        let da = density_altitude_ft(748.0, 29.92, 30.0);
        assert!((da - 2727.52).abs() < 1e-6);

        let r = record(json!({"altim": 1013.2, "temp": 30}));
        assert_eq!(density_altitude_for(&r, Some(748.0)), Some(2728));
    }

    #[test]
    fn test_density_altitude_prerequisites() {
        let r = record(json!({"altim": 29.92, "temp": 30}));
        assert_eq!(density_altitude_for(&r, None), None);

        let r = record(json!({"temp": 30}));
        assert_eq!(density_altitude_for(&r, Some(748.0)), None);

        let r = record(json!({"altim": "A2992"}));
        assert_eq!(density_altitude_for(&r, Some(748.0)), None);
    }
}
