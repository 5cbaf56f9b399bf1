//! Analysis server for parcel and property datasets.
//!
//! Loads optional Parquet datasets at startup and serves radius analysis,
//! GeoJSON export, bounds and summary endpoints over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geoimob::api::{build_router, AppState};
use geoimob::config::Config;
use geoimob::engine::SpatialEngine;
use geoimob::models::DatasetKind;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Parcel and property radius analysis server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// Parcels Parquet file to load at startup
    #[arg(long)]
    lotes: Option<PathBuf>,

    /// Properties Parquet file to load at startup
    #[arg(long)]
    imoveis: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(path) = args.lotes {
        config.preload.lotes = Some(path);
    }
    if let Some(path) = args.imoveis {
        config.preload.imoveis = Some(path);
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("geoimob analysis server v{}", env!("CARGO_PKG_VERSION"));

    let engine = SpatialEngine::new(config.attributes.clone());

    let preloads = [
        (DatasetKind::Parcels, config.preload.lotes.as_ref()),
        (DatasetKind::Properties, config.preload.imoveis.as_ref()),
    ];
    for (kind, path) in preloads {
        let Some(path) = path else { continue };
        info!("Preloading {} from {}", kind, path.display());
        let summary = engine
            .store()
            .load_file(kind, path)
            .with_context(|| format!("Failed to preload {} from {}", kind, path.display()))?;
        if summary.records_count == 0 {
            warn!("{} is empty", path.display());
        }
    }

    let listen = config.server.listen.clone();
    let state = Arc::new(AppState::new(engine, config.server));
    let app = build_router(state);

    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}
