//! Errors from fetching provider data.

use std::time::Duration;

use aero_core::StationCode;
use thiserror::Error;

/// Maximum response body characters carried in a status error.
pub const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{endpoint} request failed: {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} request timed out")]
    Timeout { endpoint: &'static str },
    #[error("{endpoint} HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("NOTAM request timed out for {station} (base_url={url})")]
    NotamTimeout { station: StationCode, url: String },
    #[error("NOTAM request failed for {station}: HTTP {status} (base_url={url})")]
    NotamStatus {
        station: StationCode,
        status: u16,
        url: String,
    },
    #[error("NOTAM request failed for {station} (base_url={url}): {source}")]
    Notam {
        station: StationCode,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected NOTAM payload shape for {station} (base_url={url})")]
    NotamShape { station: StationCode, url: String },
    #[error("refresh exceeded {0:?}")]
    RefreshTimeout(Duration),
}

/// First `max` characters of a response body.
pub fn excerpt(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
