//! REST API route handlers.
//!
//! Station codes in paths are normalized before lookup, so `/api/stations/kclt`
//! and `/api/stations/KCLT` are the same resource.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use aero_core::{read_metric, read_station, MetricKind, ReportSnapshot, StationCode};

use crate::web::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({"error": message.into()}))).into_response()
}

/// Resolve a path code to a configured station and the current snapshot.
fn lookup(state: &AppState, code: &str) -> Result<(StationCode, Arc<ReportSnapshot>), Response> {
    let station = StationCode::normalize(code)
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, format!("invalid_icao: {code}")))?;
    if !state.stations.contains(&station) {
        return Err(error(
            StatusCode::NOT_FOUND,
            format!("station {station} is not configured"),
        ));
    }
    let snapshot = state
        .snapshot
        .borrow()
        .clone()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "no data yet"))?;
    Ok((station, snapshot))
}

// ---------------------------------------------------------------------------
// Station endpoints
// ---------------------------------------------------------------------------

/// GET /api/stations: configured codes and last refresh time.
pub async fn api_stations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.borrow().clone();
    Json(json!({
        "stations": state.stations,
        "ready": snapshot.is_some(),
        "fetched_at": snapshot.map(|s| s.fetched_at),
    }))
}

/// GET /api/stations/:code: every reading for one station.
pub async fn api_station(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    let (station, snapshot) = match lookup(&state, &code) {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let readings = read_station(&snapshot, &state.elevations, &station);
    Json(json!({
        "station": station,
        "fetched_at": snapshot.fetched_at,
        "readings": readings,
    }))
    .into_response()
}

/// GET /api/stations/:code/:metric: one reading.
pub async fn api_station_metric(
    State(state): State<Arc<AppState>>,
    Path((code, metric)): Path<(String, String)>,
) -> Response {
    let (station, snapshot) = match lookup(&state, &code) {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let kind = match MetricKind::from_key(&metric) {
        Some(MetricKind::NotamCount) if snapshot.notams.is_none() => None,
        other => other,
    };
    let Some(kind) = kind else {
        return error(StatusCode::NOT_FOUND, format!("unknown metric: {metric}"));
    };

    Json(read_metric(&snapshot, &state.elevations, &station, kind)).into_response()
}

// ---------------------------------------------------------------------------
// NOTAM endpoint
// ---------------------------------------------------------------------------

/// GET /api/notams/:code: provider-shaped NOTAM records for one station.
///
/// A station whose NOTAM fetch failed this cycle answers 502 with the
/// recorded error.
pub async fn api_notams(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    let (station, snapshot) = match lookup(&state, &code) {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let Some(batch) = snapshot.notams.as_ref() else {
        return error(StatusCode::NOT_FOUND, "NOTAM endpoint not configured");
    };
    if let Some(message) = batch.error_for(&station) {
        return error(StatusCode::BAD_GATEWAY, message);
    }

    let records: Vec<Value> = batch
        .records_for(&station)
        .unwrap_or_default()
        .iter()
        .cloned()
        .map(Value::Object)
        .collect();
    Json(json!({
        "station": station,
        "fetched_at": snapshot.fetched_at,
        "count": records.len(),
        "notams": records,
    }))
    .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use tokio::sync::watch;
    use tower::ServiceExt;

    use aero_core::snapshot::normalize_report_list;
    use aero_core::{ElevationTable, NotamBatch, RawReport, ReportKind};

    fn code(s: &str) -> StationCode {
        StationCode::new(s).unwrap()
    }

    fn snapshot(notams: Option<NotamBatch>) -> ReportSnapshot {
        let metars = normalize_report_list(
            &json!([{
                "icaoId": "KCLT",
                "rawOb": "KCLT 121552Z 00000KT 10SM CLR 30/18 A2992",
                "altim": 29.92,
                "temp": 30,
                "visib": 10,
                "clouds": []
            }]),
            ReportKind::Metar,
        );
        ReportSnapshot::assemble(
            vec![code("KCLT"), code("KINT")],
            metars,
            Vec::new(),
            notams,
            Utc::now(),
        )
    }

    fn state(snapshot: Option<ReportSnapshot>) -> Arc<AppState> {
        let (_tx, rx) = watch::channel(snapshot.map(Arc::new));
        Arc::new(AppState {
            snapshot: rx,
            elevations: ElevationTable::builtin(),
            stations: vec![code("KCLT"), code("KINT")],
        })
    }

    async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
        let response = crate::web::build_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_api_stations() {
        let (status, json) = get(state(Some(snapshot(None))), "/api/stations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stations"], json!(["KCLT", "KINT"]));
        assert_eq!(json["ready"], true);
        assert!(json["fetched_at"].is_string());
    }

    #[tokio::test]
    async fn test_api_stations_before_first_refresh() {
        let (status, json) = get(state(None), "/api/stations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ready"], false);
        assert!(json["fetched_at"].is_null());
    }

    #[tokio::test]
    async fn test_api_station_not_ready() {
        let (status, _) = get(state(None), "/api/stations/KCLT").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_api_station_readings() {
        let (status, json) = get(state(Some(snapshot(None))), "/api/stations/kclt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["station"], "KCLT");

        let readings = json["readings"].as_array().unwrap();
        assert!(readings.iter().all(|r| r["key"] != "notam_count"));
        let by_key = |key: &str| readings.iter().find(|r| r["key"] == key).unwrap().clone();
        assert_eq!(by_key("flight_category")["value"], "VFR");
        assert_eq!(by_key("ceiling")["value"], "Clear");
        assert_eq!(by_key("density_altitude")["value"], 2728);
        assert_eq!(by_key("density_altitude")["unit"], "ft");
    }

    #[tokio::test]
    async fn test_api_station_without_metar() {
        let (status, json) = get(state(Some(snapshot(None))), "/api/stations/KINT/temp").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["value"].is_null());
    }

    #[tokio::test]
    async fn test_api_station_metric() {
        let (status, json) = get(
            state(Some(snapshot(None))),
            "/api/stations/KCLT/altimeter",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["value"], 29.92);
        assert_eq!(json["unit"], "inHg");
    }

    #[tokio::test]
    async fn test_api_unknown_metric() {
        let (status, _) = get(state(Some(snapshot(None))), "/api/stations/KCLT/humidity").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(
            state(Some(snapshot(None))),
            "/api/stations/KCLT/notam_count",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_station_bad_and_unknown_codes() {
        let (status, json) = get(state(Some(snapshot(None))), "/api/stations/KC-T").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().starts_with("invalid_icao"));

        let (status, _) = get(state(Some(snapshot(None))), "/api/stations/KRUQ").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_notams() {
        let mut record = RawReport::new();
        record.insert("id".into(), json!("A0001/26"));
        let mut batch = NotamBatch::new();
        batch.insert_records(code("KCLT"), vec![record]);
        batch.insert_error(code("KINT"), "NOTAM request timed out for KINT");
        let st = state(Some(snapshot(Some(batch))));

        let (status, json) = get(st.clone(), "/api/notams/KCLT").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["notams"][0]["id"], "A0001/26");

        let (status, json) = get(st.clone(), "/api/notams/KINT").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json["error"].as_str().unwrap().contains("KINT"));

        let (status, json) = get(st, "/api/stations/KCLT/notam_count").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["value"], 1);
    }

    #[tokio::test]
    async fn test_api_notams_not_configured() {
        let (status, _) = get(state(Some(snapshot(None))), "/api/notams/KCLT").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_no_store_header() {
        let response = crate::web::build_router(state(None))
            .oneshot(Request::builder().uri("/api/stations").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "no-store"
        );
    }
}
