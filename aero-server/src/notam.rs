//! NOTAM retrieval from a provider REST endpoint.
//!
//! Provider-agnostic: the location goes out under several parameter names
//! at once, and the response may be a bare list or one of several wrapper
//! objects. Records are returned exactly as the provider sent them.

use std::time::Duration;

use aero_core::config::NotamConfig;
use aero_core::notam::{extract_notam_list, notam_query};
use aero_core::{NotamBatch, RawReport, StationCode};
use chrono::Utc;
use futures_util::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::weather::USER_AGENT;

/// Header carrying the optional static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Client for one NOTAM provider.
#[derive(Clone)]
pub struct NotamClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    page_size: u32,
}

impl NotamClient {
    pub fn new(config: &NotamConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        NotamClient {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(config.timeout_secs),
            page_size: config.page_size,
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            match HeaderValue::from_str(key) {
                Ok(value) => {
                    headers.insert(API_KEY_HEADER, value);
                }
                Err(_) => warn!("NOTAM api_key is not a valid header value; sending without it"),
            }
        }
        headers
    }

    /// Fetch the active NOTAMs for one station.
    pub async fn fetch_station(&self, station: &StationCode) -> Result<Vec<RawReport>, FetchError> {
        let params = notam_query(station, Utc::now(), self.page_size);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .headers(self.headers())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(station, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::NotamStatus {
                station: station.clone(),
                status: status.as_u16(),
                url: self.base_url.clone(),
            });
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| self.transport_error(station, e))?;

        extract_notam_list(&payload).map_err(|_| {
            debug!(%station, %payload, "raw NOTAM payload");
            FetchError::NotamShape {
                station: station.clone(),
                url: self.base_url.clone(),
            }
        })
    }

    /// Fetch NOTAMs for every station concurrently.
    ///
    /// A failing station does not abort the others; its error is recorded
    /// in the batch and logged.
    pub async fn fetch_bulk(&self, stations: &[StationCode]) -> NotamBatch {
        self.collect(stations, None).await
    }

    /// Like [`fetch_bulk`](Self::fetch_bulk), but stations still pending at
    /// `deadline` are recorded as timed out.
    pub async fn fetch_bulk_until(&self, stations: &[StationCode], deadline: Instant) -> NotamBatch {
        self.collect(stations, Some(deadline)).await
    }

    async fn collect(&self, stations: &[StationCode], deadline: Option<Instant>) -> NotamBatch {
        let results = join_all(
            stations
                .iter()
                .map(|s| self.fetch_station_until(s, deadline)),
        )
        .await;

        let mut batch = NotamBatch::new();
        for (station, result) in stations.iter().zip(results) {
            match result {
                Ok(records) => {
                    debug!(%station, count = records.len(), "fetched NOTAMs");
                    batch.insert_records(station.clone(), records);
                }
                Err(e) => {
                    warn!(%station, error = %e, "NOTAM fetch failed");
                    batch.insert_error(station.clone(), e.to_string());
                }
            }
        }
        batch
    }

    async fn fetch_station_until(
        &self,
        station: &StationCode,
        deadline: Option<Instant>,
    ) -> Result<Vec<RawReport>, FetchError> {
        let Some(deadline) = deadline else {
            return self.fetch_station(station).await;
        };
        tokio::time::timeout_at(deadline, self.fetch_station(station))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::NotamTimeout {
                    station: station.clone(),
                    url: self.base_url.clone(),
                })
            })
    }

    fn transport_error(&self, station: &StationCode, source: reqwest::Error) -> FetchError {
        let station = station.clone();
        let url = self.base_url.clone();
        if source.is_timeout() {
            FetchError::NotamTimeout { station, url }
        } else {
            FetchError::Notam {
                station,
                url,
                source,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use crate::test_support::spawn_provider;

    fn code(s: &str) -> StationCode {
        StationCode::new(s).unwrap()
    }

    fn config(base_url: String, api_key: Option<&str>) -> NotamConfig {
        NotamConfig {
            base_url,
            api_key: api_key.map(str::to_string),
            timeout_secs: 5,
            page_size: 25,
        }
    }

    async fn echo(
        headers: AxumHeaders,
        Query(q): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        Json(json!({
            "notams": [{
                "location": q.get("location"),
                "icaoLocation": q.get("icaoLocation"),
                "airport": q.get("airport"),
                "effectiveBefore": q.get("effectiveBefore"),
                "pageSize": q.get("pageSize"),
                "limit": q.get("limit"),
                "active": q.get("active"),
                "apiKey": headers.get("x-api-key").and_then(|v| v.to_str().ok()),
            }]
        }))
    }

    #[tokio::test]
    async fn test_fetch_station_params_and_key() {
        let base = spawn_provider(Router::new().route("/notams", get(echo))).await;
        let client = NotamClient::new(&config(format!("{base}/notams"), Some("k-123")));

        let records = client.fetch_station(&code("KCLT")).await.unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r["location"], "KCLT");
        assert_eq!(r["icaoLocation"], "KCLT");
        assert_eq!(r["airport"], "KCLT");
        assert_eq!(r["pageSize"], "25");
        assert_eq!(r["limit"], "25");
        assert_eq!(r["active"], "true");
        assert_eq!(r["apiKey"], "k-123");
        let effective = r["effectiveBefore"].as_str().unwrap();
        assert!(effective.ends_with('Z') && effective.len() == 20, "{effective}");
    }

    #[tokio::test]
    async fn test_fetch_station_without_key() {
        let base = spawn_provider(Router::new().route("/notams", get(echo))).await;
        let client = NotamClient::new(&config(format!("{base}/notams"), None));
        let records = client.fetch_station(&code("KINT")).await.unwrap();
        assert!(records[0]["apiKey"].is_null());
    }

    #[tokio::test]
    async fn test_fetch_station_status_error() {
        let app = Router::new().route("/notams", get(|| async { StatusCode::UNAUTHORIZED }));
        let base = spawn_provider(app).await;
        let url = format!("{base}/notams");
        let client = NotamClient::new(&config(url.clone(), None));

        let err = client.fetch_station(&code("KCLT")).await.unwrap_err();
        match &err {
            FetchError::NotamStatus {
                station,
                status,
                url: u,
            } => {
                assert_eq!(station.as_str(), "KCLT");
                assert_eq!(*status, 401);
                assert_eq!(u, &url);
            }
            other => panic!("expected NotamStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_station_bad_shape() {
        let app = Router::new().route(
            "/notams",
            get(|| async { Json(json!({"message": "unknown"})) }),
        );
        let base = spawn_provider(app).await;
        let client = NotamClient::new(&config(format!("{base}/notams"), None));
        let err = client.fetch_station(&code("KCLT")).await.unwrap_err();
        assert!(matches!(err, FetchError::NotamShape { .. }));
    }

    #[tokio::test]
    async fn test_fetch_station_timeout() {
        let app = Router::new().route(
            "/notams",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!([]))
            }),
        );
        let base = spawn_provider(app).await;
        let mut cfg = config(format!("{base}/notams"), None);
        cfg.timeout_secs = 1;
        let client = NotamClient::new(&cfg);
        let err = client.fetch_station(&code("KCLT")).await.unwrap_err();
        assert!(matches!(err, FetchError::NotamTimeout { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_fetch_bulk_collects_per_station_errors() {
        let app = Router::new().route(
            "/notams",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("location").map(String::as_str) == Some("KINT") {
                    return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response();
                }
                Json(json!([{"id": "1/001"}, {"id": "1/002"}])).into_response()
            }),
        );
        let base = spawn_provider(app).await;
        let client = NotamClient::new(&config(format!("{base}/notams"), None));

        let batch = client.fetch_bulk(&[code("KCLT"), code("KINT")]).await;
        assert_eq!(batch.records_for(&code("KCLT")).map(<[_]>::len), Some(2));
        assert!(batch.records_for(&code("KINT")).is_none());
        let error = batch.error_for(&code("KINT")).unwrap();
        assert!(error.contains("KINT") && error.contains("HTTP 500"), "{error}");
    }

    #[tokio::test]
    async fn test_fetch_bulk_until_deadline() {
        let app = Router::new().route(
            "/notams",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("location").map(String::as_str) == Some("KINT") {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Json(json!([{"id": "1/001"}]))
            }),
        );
        let base = spawn_provider(app).await;
        let client = NotamClient::new(&config(format!("{base}/notams"), None));

        let deadline = Instant::now() + Duration::from_millis(500);
        let batch = client
            .fetch_bulk_until(&[code("KCLT"), code("KINT")], deadline)
            .await;
        assert_eq!(batch.records_for(&code("KCLT")).map(<[_]>::len), Some(1));
        let error = batch.error_for(&code("KINT")).unwrap();
        assert!(error.contains("timed out for KINT"), "{error}");
    }
}
