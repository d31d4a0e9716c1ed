//! METAR/TAF retrieval from the weather data endpoint.
//!
//! `GET {base}/{metar|taf}?ids=KCLT,KINT&format=json`. A 204 means no
//! reports (common for TAF) and is not an error; any other non-200 status
//! fails the fetch.

use std::time::Duration;

use aero_core::config::WeatherConfig;
use aero_core::snapshot::normalize_report_list;
use aero_core::station::join_codes;
use aero_core::{RawReport, ReportKind, StationCode};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::error::{excerpt, FetchError, BODY_EXCERPT_CHARS};

pub const USER_AGENT: &str = concat!("aeroweather/", env!("CARGO_PKG_VERSION"));

/// Client for the METAR/TAF endpoints.
#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self::with_client(client, config)
    }

    pub fn with_client(client: reqwest::Client, config: &WeatherConfig) -> Self {
        WeatherClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Fetch one report collection for `stations`.
    pub async fn fetch(
        &self,
        kind: ReportKind,
        stations: &[StationCode],
    ) -> Result<Vec<RawReport>, FetchError> {
        let endpoint = kind.endpoint();
        let url = format!("{}/{endpoint}", self.base_url);
        let ids = join_codes(stations);

        let resp = self
            .client
            .get(&url)
            .query(&[("ids", ids.as_str()), ("format", "json")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            debug!(endpoint, "no content");
            return Ok(Vec::new());
        }
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                endpoint,
                status: status.as_u16(),
                body: excerpt(&body, BODY_EXCERPT_CHARS),
            });
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| transport_error(endpoint, e))?;
        let records = normalize_report_list(&payload, kind);
        debug!(endpoint, records = records.len(), "fetched reports");
        Ok(records)
    }

    /// Fetch METAR and TAF collections concurrently. Both must succeed.
    pub async fn fetch_reports(
        &self,
        stations: &[StationCode],
    ) -> Result<(Vec<RawReport>, Vec<RawReport>), FetchError> {
        tokio::try_join!(
            self.fetch(ReportKind::Metar, stations),
            self.fetch(ReportKind::Taf, stations),
        )
    }
}

fn transport_error(endpoint: &'static str, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout { endpoint }
    } else {
        FetchError::Http { endpoint, source }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
