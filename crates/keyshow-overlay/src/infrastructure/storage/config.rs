//! TOML-based settings persistence for KeyShow.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\KeyShow\config.toml`
//! - Linux:    `~/.config/keyshow/config.toml`
//! - macOS:    `~/Library/Application Support/KeyShow/config.toml`
//!
//! ```toml
//! [display]
//! duration_ms = 500
//! position = "BottomRight"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section, or
//! a file from an older version all load cleanly.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::display_coordinator::DisplayDurationSource;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The display duration must be a positive number of milliseconds.
    #[error("display duration must be positive, got {0} ms")]
    InvalidDuration(u64),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level settings stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Overlay behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// How long a key combination stays visible after its last press.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    /// Screen corner the host window anchors the overlay to.
    #[serde(default)]
    pub position: OverlayPosition,
}

/// Screen corner for the overlay window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum OverlayPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_duration_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            position: OverlayPosition::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Checks values serde cannot express.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDuration`] if `display.duration_ms` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.duration_ms == 0 {
            return Err(ConfigError::InvalidDuration(0));
        }
        Ok(())
    }

    pub fn display_duration(&self) -> Duration {
        Duration::from_millis(self.display.duration_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::InvalidDuration`] if the duration is zero.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Loads settings from `explicit`, or from the default platform location.
///
/// Never fails: any problem (no config dir, unreadable or malformed file,
/// invalid values) yields `AppConfig::default()` together with a description
/// of the problem, for the caller to log once logging is up.
pub fn load_settings(explicit: Option<&Path>) -> (AppConfig, Option<String>) {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_file_path() {
            Ok(path) => path,
            Err(e) => return (AppConfig::default(), Some(e.to_string())),
        },
    };
    match load_config_from(&path) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(format!("{}: {e}", path.display()))),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Persists `config` to the default platform location.
///
/// # Errors
///
/// See [`config_file_path`] and [`save_config_to`].
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&config_file_path()?, config)
}

/// Resolves the platform config directory including the `KeyShow` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("KeyShow"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keyshow"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("KeyShow")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Live settings ─────────────────────────────────────────────────────────────

/// Shared, updatable settings read by the running application.
///
/// The display coordinator reads the duration once per key event, so an
/// update takes effect on the next key press and never retroactively.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl SettingsHandle {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Returns a copy of the current settings.
    pub fn snapshot(&self) -> AppConfig {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the display duration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDuration`] if `duration_ms` is zero; the current
    /// value is kept.
    pub fn set_display_duration_ms(&self, duration_ms: u64) -> Result<(), ConfigError> {
        if duration_ms == 0 {
            return Err(ConfigError::InvalidDuration(duration_ms));
        }
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .display
            .duration_ms = duration_ms;
        Ok(())
    }
}

impl DisplayDurationSource for SettingsHandle {
    fn display_duration(&self) -> Duration {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .display_duration()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
