//! Configuration file management for aeroweather.
//!
//! Reads/writes `~/.aeroweather/config.yaml` with the station list, refresh
//! interval, provider endpoints and field elevation overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::elevation::ElevationTable;
use crate::notam::DEFAULT_PAGE_SIZE;
use crate::station::{normalize_stations, parse_station_list, StationCode};
use crate::types::{AeroError, Result};

pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://aviationweather.gov/api/data";

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_stations")]
    pub stations: Vec<StationCode>,
    pub scan_interval_secs: u64,
    pub refresh_timeout_secs: u64,
    pub weather: WeatherConfig,
    pub notam: Option<NotamConfig>,
    pub elevations_ft: BTreeMap<StationCode, f64>,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// NOTAM provider settings. NOTAMs are only fetched when this is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotamConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stations: Vec::new(),
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            weather: WeatherConfig::default(),
            notam: None,
            elevations_ft: BTreeMap::new(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            base_url: DEFAULT_WEATHER_BASE_URL.into(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl Config {
    /// Reject configurations that must never reach the fetch layer.
    pub fn validate(&self) -> Result<()> {
        if self.stations.is_empty() {
            return Err(AeroError::NoStations);
        }
        if self.scan_interval_secs == 0 {
            return Err(AeroError::Config("scan_interval_secs must be > 0".into()));
        }
        if self.refresh_timeout_secs == 0 {
            return Err(AeroError::Config("refresh_timeout_secs must be > 0".into()));
        }
        if self.weather.base_url.trim().is_empty() {
            return Err(AeroError::Config("weather.base_url is empty".into()));
        }
        if let Some(notam) = &self.notam {
            if notam.base_url.trim().is_empty() {
                return Err(AeroError::Config("notam.base_url is empty".into()));
            }
        }
        Ok(())
    }

    /// Built-in elevations with the configured overrides applied.
    pub fn elevation_table(&self) -> ElevationTable {
        ElevationTable::with_overrides(&self.elevations_ft)
    }
}

/// Station lists may be written as a YAML list or a `"KCLT, KINT"` string.
fn deserialize_stations<'de, D>(deserializer: D) -> std::result::Result<Vec<StationCode>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stations {
        List(Vec<String>),
        Text(String),
    }

    let parsed = match Stations::deserialize(deserializer)? {
        Stations::Text(s) if s.trim().is_empty() => return Ok(Vec::new()),
        Stations::List(v) if v.is_empty() => return Ok(Vec::new()),
        Stations::Text(s) => parse_station_list(&s),
        Stations::List(v) => normalize_stations(v),
    };
    parsed.map_err(serde::de::Error::custom)
}

// ---------------------------------------------------------------------------
// File locations
// ---------------------------------------------------------------------------

/// Get the config directory path (`~/.aeroweather/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".aeroweather")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load config from `~/.aeroweather/config.yaml`.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_file())
}

/// Load config from `path`. Returns the default config if the file doesn't
/// exist; a malformed file is an error.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Parse YAML config text. An empty document is the default config.
pub fn parse_config(text: &str) -> Result<Config> {
    if text.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Save config to `~/.aeroweather/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(&path, config)?;
    Ok(path)
}

/// Save config to `path`, creating parent directories.
pub fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let text = format!("# aeroweather configuration\n{}", serde_yaml::to_string(config)?);
    std::fs::write(path, text)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
