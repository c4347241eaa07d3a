//! Native messaging host for Tab Goblin.
//!
//! The browser extension launches this binary and talks to it over
//! stdin/stdout using length-prefixed JSON frames. The host owns the game
//! engine and the persisted state document; the extension UI only sends
//! intents and renders what comes back.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `goblin-config.yaml` (or `GOBLIN_CONFIG`)
//! 2. Initialize structured logging to stderr (stdout carries frames)
//! 3. Resolve the data directory and open the JSON file store
//! 4. Build the engine and hatch a goblin on first install
//! 5. Run the event loop until the browser closes the pipe or Ctrl-C

mod bus;
mod error;
mod host;
mod native;
mod scheduler;

use std::path::PathBuf;

use directories::ProjectDirs;
use goblin_core::config::LoggingConfig;
use goblin_core::{GameConfig, GameEngine, SystemClock};
use goblin_store::{JsonFileBackend, StateStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bus::{ChannelBus, NOTIFICATION_CAPACITY};
use crate::error::HostError;
use crate::host::Host;

/// Config file looked up in the working directory when `GOBLIN_CONFIG` is
/// not set.
const DEFAULT_CONFIG_FILE: &str = "goblin-config.yaml";

/// Application entry point for the native messaging host.
///
/// # Errors
///
/// Returns an error if configuration, storage or the output pipe fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("goblin-host starting");
    match &config_source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    // 3. Open the store.
    let data_dir = resolve_data_dir(&config)?;
    let backend = JsonFileBackend::open(&data_dir)?;
    info!(data_dir = %data_dir.display(), "State store opened");

    // 4. Build the engine.
    let bus = ChannelBus::new(NOTIFICATION_CAPACITY);
    let notifications = bus.subscribe();
    let mut engine = GameEngine::new(
        StateStore::new(Box::new(backend)),
        Box::new(bus.clone()),
        Box::new(SystemClock),
        config,
    );
    bus.forward_state_changes(&mut engine);

    if engine.ensure_initialized()? {
        info!("First run, default state written");
    }
    let state = engine.state();
    info!(
        name = %state.pet.name,
        level = %state.pet.level,
        health = state.pet.health,
        mood = %state.pet.mood,
        "Goblin loaded"
    );

    // 5. Run.
    let host = Host::new(engine, notifications);
    host.attach_reader(tokio::io::stdin());
    let end = host.run(tokio::io::stdout(), shutdown_signal()).await?;

    info!(reason = ?end, "goblin-host shutdown complete");
    Ok(())
}

/// Load configuration from `GOBLIN_CONFIG` or `goblin-config.yaml`.
///
/// An explicitly configured path must exist; the default file is optional.
/// Returns the config and the path it came from, if any.
fn load_config() -> Result<(GameConfig, Option<PathBuf>), HostError> {
    let explicit = std::env::var_os("GOBLIN_CONFIG").map(PathBuf::from);
    let path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if explicit.is_some() || path.exists() {
        let config = GameConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        let mut config = GameConfig::default();
        config.storage.apply_env_overrides();
        Ok((config, None))
    }
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.with_ansi(false).init();
    }
}

/// The configured data directory, or the platform data directory.
fn resolve_data_dir(config: &GameConfig) -> Result<PathBuf, HostError> {
    if let Some(dir) = &config.storage.data_dir {
        return Ok(dir.clone());
    }
    ProjectDirs::from("dev", "tabgoblin", "tab-goblin")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| HostError::DataDir {
            message: "no home directory for the current user".to_owned(),
        })
}

/// Completes on Ctrl-C. If the handler cannot be installed the host runs
/// until the browser closes the pipe.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
    info!("Interrupted");
}
