//! Timed refresh of the report snapshot.
//!
//! Each cycle fetches METAR, TAF and (when configured) NOTAMs concurrently,
//! assembles one immutable [`ReportSnapshot`] and publishes it through a
//! watch channel. Readers only ever see complete snapshots. A failed cycle
//! publishes nothing, so the last good snapshot stays current until the
//! next tick.

use std::sync::Arc;
use std::time::Duration;

use aero_core::config::Config;
use aero_core::{ReportSnapshot, StationCode};
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::error::FetchError;
use crate::notam::NotamClient;
use crate::weather::WeatherClient;

/// Latest published snapshot; `None` until the first successful refresh.
pub type SnapshotRx = watch::Receiver<Option<Arc<ReportSnapshot>>>;

pub struct Coordinator {
    stations: Vec<StationCode>,
    weather: WeatherClient,
    notams: Option<NotamClient>,
    interval: Duration,
    timeout: Duration,
    tx: watch::Sender<Option<Arc<ReportSnapshot>>>,
}

impl Coordinator {
    /// Build from a validated config.
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            config.stations.clone(),
            WeatherClient::new(&config.weather),
            config.notam.as_ref().map(NotamClient::new),
            Duration::from_secs(config.scan_interval_secs),
            Duration::from_secs(config.refresh_timeout_secs),
        )
    }

    pub fn from_parts(
        stations: Vec<StationCode>,
        weather: WeatherClient,
        notams: Option<NotamClient>,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        let (tx, _) = watch::channel(None);
        Coordinator {
            stations,
            weather,
            notams,
            interval,
            timeout,
            tx,
        }
    }

    pub fn stations(&self) -> &[StationCode] {
        &self.stations
    }

    pub fn subscribe(&self) -> SnapshotRx {
        self.tx.subscribe()
    }

    /// Run one fetch cycle and build a snapshot without publishing it.
    ///
    /// METAR/TAF and NOTAMs share one deadline. Weather past the deadline
    /// fails the cycle; NOTAM stations still pending at the deadline are
    /// recorded as timed out and the snapshot is built without them.
    pub async fn refresh(&self) -> Result<ReportSnapshot, FetchError> {
        let deadline = Instant::now() + self.timeout;

        let reports = tokio::time::timeout_at(deadline, self.weather.fetch_reports(&self.stations));
        let notams = async {
            match &self.notams {
                Some(client) => Some(client.fetch_bulk_until(&self.stations, deadline).await),
                None => None,
            }
        };
        let (reports, notams) = tokio::join!(reports, notams);
        let (metars, tafs) = reports.map_err(|_| FetchError::RefreshTimeout(self.timeout))??;

        Ok(ReportSnapshot::assemble(
            self.stations.clone(),
            metars,
            tafs,
            notams,
            Utc::now(),
        ))
    }

    /// Refresh and, on success, replace the published snapshot.
    pub async fn refresh_and_publish(&self) -> Result<Arc<ReportSnapshot>, FetchError> {
        match self.refresh().await {
            Ok(snapshot) => {
                let notam_errors = snapshot
                    .notams
                    .as_ref()
                    .map_or(0, |batch| batch.errors.len());
                info!(
                    stations = snapshot.stations.len(),
                    metars = snapshot.metar.len(),
                    tafs = snapshot.taf.len(),
                    notam_errors,
                    "refresh complete"
                );
                let snapshot = Arc::new(snapshot);
                self.tx.send_replace(Some(Arc::clone(&snapshot)));
                Ok(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "refresh failed; keeping last snapshot");
                Err(e)
            }
        }
    }

    /// Refresh on every interval tick until `shutdown` fires.
    ///
    /// The first tick is immediate. A slow cycle delays the next tick
    /// instead of bunching up missed ones.
    pub async fn run(&self, mut shutdown: watch::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            stations = %aero_core::station::join_codes(&self.stations),
            interval_secs = self.interval.as_secs(),
            "refresh loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.refresh_and_publish().await;
                }
                _ = shutdown.changed() => {
                    info!("refresh loop stopped");
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
