//! Channel queue player (cqm-ap) - Main entry point
//!
//! Queues the clips named on the command line, plays each channel's clips
//! one after another on the simulated backend, and exits once every channel
//! is idle or a shutdown signal arrives.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cqm_ap::cli::ClipSpec;
use cqm_ap::config::TomlConfig;
use cqm_ap::events::{EventBus, QueueEvent};
use cqm_ap::playback::SimulatedBackend;
use cqm_ap::{QueueHandle, QueueService};

/// How often the main task checks whether all channels went idle
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Command-line arguments for cqm-ap
#[derive(Parser, Debug)]
#[command(name = "cqm-ap")]
#[command(about = "Per-channel FIFO audio clip player")]
#[command(version)]
struct Args {
    /// Config file (overrides CQM_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated length of every clip, in milliseconds
    #[arg(long)]
    clip_duration_ms: Option<u64>,

    /// Event bus buffer size
    #[arg(long)]
    event_capacity: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print queue events to stdout as JSON lines
    #[arg(long)]
    json_events: bool,

    /// Clips to queue, as LOCATOR or CHANNEL=LOCATOR
    #[arg(required = true, value_name = "CLIP")]
    clips: Vec<ClipSpec>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(ms) = args.clip_duration_ms {
        config.player.clip_duration_ms = ms;
    }
    if let Some(capacity) = args.event_capacity {
        config.player.event_capacity = capacity;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate().context("Invalid configuration")?;

    // RUST_LOG wins over the configured level
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cqm_ap={level},cqm_common={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        clips = args.clips.len(),
        clip_duration_ms = config.player.clip_duration_ms,
        "Starting channel queue player"
    );

    let event_bus = EventBus::new(config.player.event_capacity);
    let logger = tokio::spawn(log_events(event_bus.subscribe(), args.json_events));

    let backend = SimulatedBackend::new(config.clip_duration());
    let (handle, service) = QueueService::spawn(backend, event_bus);

    for clip in &args.clips {
        let clip_id = handle
            .enqueue(clip.locator.clone(), clip.channel)
            .await
            .with_context(|| format!("Failed to enqueue {}", clip))?;
        info!(channel = %clip.channel, %clip_id, locator = %clip.locator, "Queued clip");
    }

    tokio::select! {
        result = wait_until_idle(&handle) => {
            result?;
            info!("All channels idle");
        }
        _ = shutdown_signal() => {
            handle.stop_all().await.context("Failed to stop channels")?;
        }
    }

    handle.shutdown().await.context("Failed to stop queue service")?;
    service.await.context("Queue service task panicked")?;
    logger.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Resolve once no channel has anything playing or queued
async fn wait_until_idle(handle: &QueueHandle) -> Result<()> {
    let mut interval = tokio::time::interval(IDLE_POLL_INTERVAL);
    loop {
        interval.tick().await;
        let snapshots = handle.snapshot().await?;
        if snapshots.iter().all(|s| s.is_idle() && s.is_empty()) {
            return Ok(());
        }
    }
}

/// Write queue events to the log, or to stdout as JSON lines
async fn log_events(mut rx: broadcast::Receiver<QueueEvent>, json: bool) {
    loop {
        match rx.recv().await {
            Ok(event) if json => match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to serialize event: {}", e),
            },
            Ok(event) => info!(
                event = event.event_type(),
                channel = %event.channel(),
                "{:?}",
                event
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event logger lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
