//! Cadenza generation service - main entry point
//!
//! Wires up the synthesis engine, stitcher, publisher, status store,
//! and job manager, then serves the HTTP API.

use anyhow::{Context, Result};
use cadenza_gen::api::{self, AppContext};
use cadenza_gen::config::Config;
use cadenza_gen::jobs::{JobManager, StatusStore};
use cadenza_gen::publish::ArtifactPublisher;
use cadenza_gen::synth::{SectionSynthesizer, ToneEngine};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cadenza-gen
#[derive(Parser, Debug)]
#[command(name = "cadenza-gen")]
#[command(about = "Music generation service for Cadenza")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "CADENZA_PORT")]
    port: u16,

    /// Directory receiving published audio artifacts
    #[arg(short, long, default_value = "outputs", env = "CADENZA_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Worker pool size (synthesis is compute heavy; keep this small)
    #[arg(short, long, default_value = "2", env = "CADENZA_WORKERS")]
    workers: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadenza_gen=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config {
        port: args.port,
        output_dir: args.output_dir,
        workers: args.workers,
        ..Config::default()
    };

    info!("Starting Cadenza generation service on port {}", config.port);
    info!("Artifact directory: {}", config.output_dir.display());

    let engine = Arc::new(ToneEngine::new(config.sample_rate, config.channels));
    let synthesizer = Arc::new(SectionSynthesizer::new(engine, config.synthesis_timeout));
    let publisher = Arc::new(
        ArtifactPublisher::new(&config.output_dir)
            .context("Failed to initialize artifact directory")?,
    );
    let store = Arc::new(StatusStore::new());

    let manager = Arc::new(JobManager::start(
        &config,
        Arc::clone(&store),
        synthesizer,
        Arc::clone(&publisher),
    ));
    info!("Job manager initialized ({} workers)", manager.pool_size());

    let ctx = AppContext {
        manager,
        store,
        publisher,
    };

    api::server::run(&config, ctx).await.context("Server error")?;
    Ok(())
}
