// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/quakecast-rs

//! Quakecast - Short-Term Earthquake Probability Engine
//!
//! Polls public earthquake feeds into a local catalog, keeps a
//! Gutenberg-Richter fit of it up to date and answers probability queries.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use quakecast::{
    feeds::usgs, synthetic::SyntheticCatalog, CatalogSource, CatalogStore, Config, FeedPoller,
    ForecastService, Forecaster, MemoryCatalog, PredictionRequest, VERSION,
};

/// Demo catalogs are centred on New Delhi
const DEMO_CENTRE: (f64, f64) = (28.61, 77.21);

/// Quakecast - Short-Term Earthquake Probability Engine
#[derive(Parser, Debug)]
#[command(name = "quakecast")]
#[command(author = "Quakecast Project")]
#[command(version = VERSION)]
#[command(about = "Short-term earthquake probabilities from live catalogs")]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long, global = true)]
    trace: bool,

    /// Demo mode with a synthetic catalog instead of live feeds
    #[arg(long, global = true)]
    demo: bool,

    /// Data directory; the catalog database lives here
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll feeds and keep the model fit until Ctrl+C
    Serve,

    /// Print the probability for one location as JSON
    Predict {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Threshold magnitude M0
        #[arg(long, default_value_t = 5.5)]
        magnitude: f64,

        #[arg(long, default_value_t = 30.0)]
        window_days: f64,

        #[arg(long, default_value_t = 500.0)]
        radius_km: f64,

        /// Plain Poisson probability, no short-term boost
        #[arg(long)]
        no_multiplier: bool,
    },

    /// Print the current fit as JSON
    Status,

    /// Load a USGS GeoJSON file into the catalog
    Ingest {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging; stdout is reserved for JSON output. RUST_LOG wins
    // over the file unless a verbosity flag was given.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(env) if !(args.debug || args.trace) => env,
        _ => EnvFilter::new(config.log_directive(args.debug, args.trace)),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Quakecast v{}", VERSION);

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if let Some(data_dir) = args.data_dir {
        config.database.path = data_dir.join("catalog.db");
        config.data_dir = data_dir;
    }

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    match args.command {
        Command::Serve => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(config))
        }
        Command::Predict { lat, lon, magnitude, window_days, radius_km, no_multiplier } => {
            let request = PredictionRequest {
                magnitude,
                window_days,
                radius_km,
                use_multiplier: !no_multiplier,
                ..PredictionRequest::at(lat, lon)
            };
            let forecaster = Forecaster::new(open_source(&config, None)?.0, config.model.clone());
            forecaster.recompute();
            println!("{}", serde_json::to_string_pretty(&forecaster.predict(&request))?);
            Ok(())
        }
        Command::Status => {
            let forecaster = Forecaster::new(open_source(&config, None)?.0, config.model.clone());
            println!("{}", serde_json::to_string_pretty(&*forecaster.recompute())?);
            Ok(())
        }
        Command::Ingest { file } => {
            let store = CatalogStore::open(&config.database)?;
            let body: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let events = usgs::parse_geojson(&body);
            let stored = store.upsert_events(&events, config.feeds.min_magnitude_for_storage)?;
            info!("Stored {} of {} events from {:?}", stored, events.len(), file);
            println!("{}", stored);
            Ok(())
        }
    }
}

/// Catalog the core reads from, plus the store when one backs it
fn open_source(
    config: &Config,
    wake: Option<Arc<Notify>>,
) -> Result<(Arc<dyn CatalogSource>, Option<Arc<CatalogStore>>)> {
    if config.demo_mode {
        let (lat, lon) = DEMO_CENTRE;
        let events = SyntheticCatalog::new(lat, lon).seed(config.model.bootstrap_seed).generate();
        info!("Demo catalog with {} synthetic events", events.len());
        let source: Arc<dyn CatalogSource> = Arc::new(MemoryCatalog::with_events(events));
        return Ok((source, None));
    }

    let mut store = CatalogStore::open(&config.database)?;
    if let Some(wake) = wake {
        store = store.with_refresh_signal(wake);
    }
    let store = Arc::new(store);
    info!("Catalog holds {} events", store.count()?);
    let source: Arc<dyn CatalogSource> = store.clone();
    Ok((source, Some(store)))
}

/// Run the feed poller and recompute loop until Ctrl+C
async fn serve(config: Config) -> Result<()> {
    let wake = Arc::new(Notify::new());
    let (source, store) = open_source(&config, Some(Arc::clone(&wake)))?;

    let forecaster = Arc::new(Forecaster::new(source, config.model.clone()));
    let service = ForecastService::new(forecaster, config.scheduler.clone());

    let (shutdown, _) = broadcast::channel(4);
    let mut handles = service.start(&shutdown).await;

    if let Some(store) = store {
        let poller = FeedPoller::new(&config.feeds, store, wake)?;
        let rx = shutdown.subscribe();
        handles.push(tokio::spawn(async move { poller.run(rx).await }));
    }

    info!("Quakecast running, press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received, cleaning up...");
    let _ = shutdown.send(());
    for handle in handles {
        handle.await?;
    }

    let last = service.status();
    info!("Quakecast shutdown complete (last fit v{})", last.version);
    Ok(())
}
