//! KeyShow entry point.
//!
//! Wires together the keyboard listener, the display coordinator, and the
//! overlay context, then runs until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load settings (config.toml + CLI overrides)
//!  └─ KeyboardListener::start()     -- WH_KEYBOARD_LL hook thread, or demo
//!  └─ spawn_overlay_context()       -- owns the overlay sink
//!  └─ DisplayCoordinator::run()     -- debounce, schedules hides
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use keyshow_overlay::application::display_coordinator::DisplayCoordinator;
use keyshow_overlay::application::overlay_context::spawn_overlay_context;
use keyshow_overlay::infrastructure::keyboard_capture::demo::DemoKeyboardListener;
use keyshow_overlay::infrastructure::keyboard_capture::KeyboardListener;
use keyshow_overlay::infrastructure::overlay::console::ConsoleOverlay;
use keyshow_overlay::infrastructure::storage::config::{
    load_settings, save_config, save_config_to, SettingsHandle,
};

/// Shows the most recently pressed key combination.
#[derive(Debug, Parser)]
#[command(name = "keyshow", version, about)]
struct Args {
    /// Settings file (defaults to the platform config directory).
    #[arg(long, env = "KEYSHOW_CONFIG")]
    config: Option<PathBuf>,

    /// How long a key combination stays visible, in milliseconds.
    #[arg(long, env = "KEYSHOW_DURATION_MS", value_parser = clap::value_parser!(u64).range(1..))]
    duration_ms: Option<u64>,

    /// Use the demo listener instead of the system keyboard hook.
    #[arg(long)]
    demo: bool,

    /// Log level when RUST_LOG is not set.
    #[arg(long)]
    log_level: Option<String>,

    /// Write the effective settings (file plus overrides) back to the config file and exit.
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Settings are loaded before logging so the configured level applies;
    // problems are reported once the subscriber is up.
    let (mut config, config_problem) = load_settings(args.config.as_deref());
    if let Some(ms) = args.duration_ms {
        config.display.duration_ms = ms;
    }

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    // Structured logging. `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    info!("KeyShow starting");
    if let Some(problem) = config_problem {
        warn!("{problem}; using default settings");
    }
    info!(
        duration_ms = config.display.duration_ms,
        position = ?config.display.position,
        "settings loaded"
    );

    if args.save_config {
        let written = match args.config.as_deref() {
            Some(path) => save_config_to(path, &config),
            None => save_config(&config),
        };
        written.context("failed to write settings")?;
        info!("settings written");
        return Ok(());
    }

    let settings = SettingsHandle::new(config);
    let listener = select_listener(args.demo);

    let events = match listener.start() {
        Ok(rx) => rx,
        Err(e) => {
            error!("failed to start keyboard listener: {e}");
            return Err(e).context("keyboard listener could not be started");
        }
    };

    let (overlay, overlay_task) = spawn_overlay_context(ConsoleOverlay::stdout());
    let coordinator = DisplayCoordinator::new(overlay, Arc::new(settings.clone()));
    let coordinator_task = tokio::spawn(coordinator.run(events));

    info!("KeyShow ready.  Press Ctrl-C to exit.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutdown signal received");

    // Stopping the listener closes the event channel, which ends the coordinator.
    listener.stop();
    coordinator_task
        .await
        .context("display coordinator task failed")?;

    // The overlay context finishes once the last pending hide has fired.
    let grace = settings.snapshot().display_duration() * 2;
    if tokio::time::timeout(grace, overlay_task).await.is_err() {
        warn!("overlay did not settle within {grace:?}");
    }

    info!("KeyShow stopped");
    Ok(())
}

fn select_listener(demo: bool) -> Box<dyn KeyboardListener> {
    #[cfg(target_os = "windows")]
    if !demo {
        return Box::new(keyshow_overlay::infrastructure::keyboard_capture::windows::WindowsKeyboardListener::new());
    }

    if !demo {
        info!("no system keyboard hook on this platform; using the demo listener");
    }
    Box::new(DemoKeyboardListener::default())
}
