//! aeroweather: METAR/TAF/NOTAM refresh daemon, CLI and JSON API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use comfy_table::{Cell, Table};
use tokio::sync::watch;
use tracing::info;

use aero_core::config::{self, Config, NotamConfig, DEFAULT_HTTP_TIMEOUT_SECS};
use aero_core::notam::DEFAULT_PAGE_SIZE;
use aero_core::station::join_codes;
use aero_core::{parse_station_list, read_station, AeroError, MetricValue, Reading};

mod error;
mod logging;
mod notam;
mod refresh;
mod weather;
mod web;

#[cfg(test)]
mod test_support;

use notam::NotamClient;
use refresh::Coordinator;

#[derive(Parser)]
#[command(
    name = "aeroweather",
    version,
    about = "Aviation weather (METAR/TAF/NOTAM) fetcher and API"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true, env = "AEROWEATHER_CONFIG")]
    config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the config file.
#[derive(Args, Default)]
struct SourceArgs {
    /// Station list, comma or semicolon separated (e.g. "KCLT, KINT")
    #[arg(long)]
    stations: Option<String>,

    /// NOTAM provider URL; enables NOTAM fetching
    #[arg(long)]
    notam_url: Option<String>,

    /// NOTAM provider API key, sent as x-api-key
    #[arg(long, env = "AEROWEATHER_NOTAM_API_KEY", hide_env_values = true)]
    notam_api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one refresh and print every reading
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Print readings as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Fetch NOTAMs and print per-station counts
    Notams {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Run the refresh loop until Ctrl-C
    Run {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Run the refresh loop and serve the JSON API
    Serve {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate a station list and print it normalized
    Stations {
        /// Comma or semicolon separated codes
        list: String,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(config::config_file);

    match cli.command {
        Commands::Fetch { source, json } => {
            cmd_fetch(load(&config_path, &source), json).await;
        }
        Commands::Notams { source } => cmd_notams(load(&config_path, &source)).await,
        Commands::Run { source } => cmd_run(load(&config_path, &source)).await,
        Commands::Serve { source, host, port } => {
            let mut config = load(&config_path, &source);
            if let Some(host) = host {
                config.dashboard.host = host;
            }
            if let Some(port) = port {
                config.dashboard.port = port;
            }
            cmd_serve(config).await;
        }
        Commands::Stations { list } => cmd_stations(&list),
        Commands::Config { init } => cmd_config(&config_path, init),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

// ---------------------------------------------------------------------------
// Config resolution
// ---------------------------------------------------------------------------

/// Load the config file, apply flag overrides and validate before any fetch.
fn load(path: &std::path::Path, source: &SourceArgs) -> Config {
    let config = config::load_config_from(path)
        .unwrap_or_else(|e| fail(format!("{}: {e}", path.display())));
    let config = apply_overrides(config, source).unwrap_or_else(|e| fail(e));
    config.validate().unwrap_or_else(|e| fail(e));
    config
}

fn apply_overrides(mut config: Config, source: &SourceArgs) -> Result<Config, AeroError> {
    if let Some(list) = &source.stations {
        config.stations = parse_station_list(list)?;
    }
    if let Some(url) = &source.notam_url {
        match config.notam.as_mut() {
            Some(notam) => notam.base_url = url.clone(),
            None => {
                config.notam = Some(NotamConfig {
                    base_url: url.clone(),
                    api_key: None,
                    timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
                    page_size: DEFAULT_PAGE_SIZE,
                })
            }
        }
    }
    if let (Some(key), Some(notam)) = (&source.notam_api_key, config.notam.as_mut()) {
        notam.api_key = Some(key.clone());
    }
    Ok(config)
}

/// Ctrl-C flips the returned receiver.
fn shutdown_signal() -> watch::Receiver<()> {
    let (tx, rx) = watch::channel(());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        let _ = tx.send(());
    });
    rx
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_fetch(config: Config, json: bool) {
    let coordinator = Coordinator::new(&config);
    let snapshot = coordinator
        .refresh()
        .await
        .unwrap_or_else(|e| fail(e));
    let elevations = config.elevation_table();

    let readings: Vec<Reading> = snapshot
        .stations
        .iter()
        .flat_map(|station| read_station(&snapshot, &elevations, station))
        .collect();

    if json {
        match serde_json::to_string_pretty(&readings) {
            Ok(text) => println!("{text}"),
            Err(e) => fail(e),
        }
        return;
    }

    println!();
    println!(
        "Fetched {} METAR, {} TAF for {} at {}",
        snapshot.metar.len(),
        snapshot.taf.len(),
        join_codes(&snapshot.stations),
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%SZ"),
    );
    println!();
    print_readings(&readings);
}

async fn cmd_notams(config: Config) {
    let Some(notam_config) = config.notam.as_ref() else {
        fail("no NOTAM endpoint configured (set notam.base_url or pass --notam-url)");
    };
    let batch = NotamClient::new(notam_config)
        .fetch_bulk(&config.stations)
        .await;

    let mut table = Table::new();
    table.set_header(vec!["Station", "NOTAMs", "Error"]);
    for station in &config.stations {
        table.add_row(vec![
            Cell::new(station),
            Cell::new(
                batch
                    .records_for(station)
                    .map(|r| r.len().to_string())
                    .unwrap_or("-".into()),
            ),
            Cell::new(batch.error_for(station).unwrap_or("")),
        ]);
    }
    println!("{table}");

    if batch.records.is_empty() {
        std::process::exit(1);
    }
}

async fn cmd_run(config: Config) {
    let coordinator = Coordinator::new(&config);
    coordinator.run(shutdown_signal()).await;
}

async fn cmd_serve(config: Config) {
    let coordinator = Arc::new(Coordinator::new(&config));
    let state = Arc::new(web::AppState {
        snapshot: coordinator.subscribe(),
        elevations: config.elevation_table(),
        stations: coordinator.stations().to_vec(),
    });
    let shutdown = shutdown_signal();

    let refresher = Arc::clone(&coordinator);
    let refresh_shutdown = shutdown.clone();
    let refresh_task = tokio::spawn(async move { refresher.run(refresh_shutdown).await });

    if let Err(e) = web::serve(
        state,
        &config.dashboard.host,
        config.dashboard.port,
        shutdown,
    )
    .await
    {
        tracing::error!(error = %e, "API server failed");
        refresh_task.abort();
        fail(e);
    }
    let _ = refresh_task.await;
}

fn cmd_stations(list: &str) {
    match parse_station_list(list) {
        Ok(codes) => println!("{}", join_codes(&codes)),
        Err(e) => fail(e),
    }
}

fn cmd_config(path: &std::path::Path, init: bool) {
    if init {
        if path.exists() {
            fail(format!("{} already exists", path.display()));
        }
        config::save_config_to(path, &Config::default()).unwrap_or_else(|e| fail(e));
        println!("Wrote {}", path.display());
        println!("Add your stations before running `aeroweather run`.");
        return;
    }

    let mut config = config::load_config_from(path)
        .unwrap_or_else(|e| fail(format!("{}: {e}", path.display())));
    if let Some(key) = config.notam.as_mut().and_then(|n| n.api_key.as_mut()) {
        *key = "********".into();
    }

    println!("# {}{}", path.display(), if path.exists() { "" } else { " (not found, defaults)" });
    match serde_yaml::to_string(&config) {
        Ok(text) => print!("{text}"),
        Err(e) => fail(e),
    }
}

fn print_readings(readings: &[Reading]) {
    let mut table = Table::new();
    table.set_header(vec!["Station", "Metric", "Value", "Unit"]);

    for reading in readings {
        let value = match &reading.value {
            Some(MetricValue::Number(n)) => format!("{n:.2}")
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string(),
            Some(MetricValue::Text(t)) if reading.key.ends_with("_raw") => truncate(t, 60),
            Some(v) => v.to_string(),
            None => "-".into(),
        };
        table.add_row(vec![
            Cell::new(&reading.station),
            Cell::new(reading.name),
            Cell::new(value),
            Cell::new(reading.unit.unwrap_or("")),
        ]);
    }

    println!("{table}");
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
