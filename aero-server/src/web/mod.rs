//! Web server: axum JSON API over the published report snapshot.
//!
//! Handlers never fetch. They read whatever snapshot the refresh loop last
//! published and compute readings on demand.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use http::{header, HeaderValue};
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use aero_core::{ElevationTable, StationCode};

use crate::refresh::SnapshotRx;

pub mod routes;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub snapshot: SnapshotRx,
    pub elevations: ElevationTable,
    pub stations: Vec<StationCode>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/stations", get(routes::api_stations))
        .route("/api/stations/:code", get(routes::api_station))
        .route("/api/stations/:code/:metric", get(routes::api_station_metric))
        .route("/api/notams/:code", get(routes::api_notams))
        .with_state(state)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
}

/// Serve the API until `shutdown` fires.
pub async fn serve(
    state: Arc<AppState>,
    host: &str,
    port: u16,
    mut shutdown: watch::Receiver<()>,
) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("aeroweather API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await
}
