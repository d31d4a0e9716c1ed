//! aero-core: METAR/TAF normalization and derivation library.
//!
//! No async and no network, just extraction and math over provider JSON. This
//! crate is the shared core used by `aero-server` (refresh daemon, CLI and
//! JSON API).

pub mod coerce;
pub mod config;
pub mod derive;
pub mod elevation;
pub mod metar;
pub mod metrics;
pub mod notam;
pub mod snapshot;
pub mod station;
pub mod types;

// Re-export commonly used types at crate root
pub use elevation::ElevationTable;
pub use metrics::{read_metric, read_station, MetricKind, MetricValue, Reading};
pub use notam::NotamBatch;
pub use snapshot::ReportSnapshot;
pub use station::{parse_station_list, StationCode};
pub use types::*;
