//! Behavior Monitor server
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (./monitor.toml if present)
//! cargo run --release
//!
//! # Explicit config and bind address
//! ./behavior-monitor --config monitor.toml --addr 127.0.0.1:8000
//! ```
//!
//! # Environment Variables
//!
//! - `MONITOR_CONFIG`: path to the TOML config file
//! - `MONITOR_SERVER_ADDR`: override `server.addr`
//! - `MONITOR_DB_PATH`: override `storage.path`
//! - `OPENAI_API_KEY`: advisory API key (name set by `advisory.api_key_env`)
//! - `RUST_LOG`: logging level (default: info)
//! - `RESET_DB`: set to "true" to wipe the observation log on startup

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use behavior_monitor::advisory::{AdvisoryGenerator, OpenAiAdvisor, TemplateAdvisor};
use behavior_monitor::api::{create_app, ApiState};
use behavior_monitor::storage::{ObservationLog, SledObservationLog};
use behavior_monitor::MonitorConfig;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "behavior-monitor")]
#[command(about = "Behavior monitoring backend: movement, feeding, drinking and rest")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides MONITOR_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the server address (default: "0.0.0.0:8000")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the sled database directory
    #[arg(long, value_name = "DIR")]
    db_path: Option<PathBuf>,

    /// Delete the observation log on startup.
    /// WARNING: This is destructive and cannot be undone!
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,
}

// ============================================================================
// Startup
// ============================================================================

/// Config file, then env overrides, then CLI flags.
fn resolve_config(args: &CliArgs) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MonitorConfig::load(),
    };

    config.apply_env_overrides();
    config.apply_overrides(
        args.addr.clone(),
        args.db_path.as_ref().map(|p| p.display().to_string()),
    );
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Check if database reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    if let Ok(val) = std::env::var("RESET_DB") {
        let val_lower = val.to_lowercase();
        return val_lower == "true" || val_lower == "1" || val_lower == "yes";
    }
    false
}

/// Remove the observation log directory and everything in it.
fn reset_data_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        info!(path = %path.display(), "Observation log does not exist, nothing to reset");
        return Ok(());
    }

    warn!(path = %path.display(), "RESET_DB requested, wiping observation log");
    std::fs::remove_dir_all(path)
        .with_context(|| format!("Failed to remove {}", path.display()))?;
    warn!("Observation log removed; a fresh one will be created");
    Ok(())
}

/// OpenAI backend when an API key is available, templates otherwise.
fn select_generator(config: &MonitorConfig) -> Result<Arc<dyn AdvisoryGenerator>> {
    let clock = config.clock();
    let advisory = &config.advisory;

    match advisory.api_key() {
        Some(key) => {
            let advisor = OpenAiAdvisor::new(
                &advisory.base_url,
                &advisory.model,
                &key,
                clock,
                config.advisory_timeout(),
            )
            .context("Failed to build advisory HTTP client")?;
            info!(model = %advisory.model, base_url = %advisory.base_url, "Advisory: chat completions");
            Ok(Arc::new(advisor))
        }
        None => {
            info!(
                env = %advisory.api_key_env,
                "Advisory: no API key set, using template advice"
            );
            Ok(Arc::new(TemplateAdvisor::new(clock, config.metrics.schema)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = resolve_config(&args)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        schema = %config.metrics.schema,
        utc_offset_hours = config.metrics.utc_offset_hours,
        window_days = config.metrics.baseline_window_days,
        "Behavior Monitor starting"
    );

    if should_reset_db(args.reset_db) {
        reset_data_directory(&config.storage.path)?;
    }

    if let Some(parent) = config.storage.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let sled_log = SledObservationLog::open(&config.storage.path)
        .with_context(|| format!("Failed to open observation log at {}", config.storage.path.display()))?;
    let log: Arc<dyn ObservationLog> = Arc::new(sled_log.clone());

    let generator = select_generator(&config)?;
    let state = ApiState::from_config(&config, log, generator);
    let app = create_app(state, &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "HTTP server listening");

    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await;

    if let Err(e) = sled_log.flush() {
        error!(error = %e, "Failed to flush observation log");
    }

    match result {
        Ok(()) => {
            info!("Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Server error");
            Err(e).context("HTTP server failed")
        }
    }
}
