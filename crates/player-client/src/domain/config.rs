//! Player configuration.
//!
//! Settings come from three layers, lowest precedence first:
//!
//! 1. built-in defaults ([`PlayerConfig::default`]);
//! 2. an optional TOML file passed with `--config`;
//! 3. command-line flags and their `PLAYER_*` environment fallbacks, applied
//!    by `main.rs` on top of the result.
//!
//! # File format
//!
//! ```toml
//! [connection]
//! server_url = "ws://127.0.0.1:8000/ws"
//! reconnect_base_ms = 1000
//! max_reconnect_attempts = 5
//!
//! [session]
//! command_timeout_secs = 120   # 0 disables the timeout
//! fps_window = 10
//! stats_interval_ms = 500
//! default_max_steps = 50
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field is optional; a missing field takes its default through the
//! `#[serde(default = "...")]` helpers, so an empty file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use player_core::domain::connection::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── File schema ───────────────────────────────────────────────────────────────

/// On-disk representation of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionSection {
    /// WebSocket endpoint of the remote host.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Backoff base: attempt `n` waits `base * 2^(n-1)`.
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSection {
    /// Seconds to wait for an `ai_response`; `0` waits forever.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_fps_window")]
    pub fps_window: usize,
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
    #[serde(default = "default_max_steps")]
    pub default_max_steps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_server_url() -> String {
    "ws://127.0.0.1:8000/ws".to_string()
}
fn default_reconnect_base_ms() -> u64 {
    1000
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_command_timeout_secs() -> u64 {
    120
}
fn default_fps_window() -> usize {
    10
}
fn default_stats_interval_ms() -> u64 {
    500
}
fn default_max_steps() -> u32 {
    50
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            reconnect_base_ms: default_reconnect_base_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            command_timeout_secs: default_command_timeout_secs(),
            fps_window: default_fps_window(),
            stats_interval_ms: default_stats_interval_ms(),
            default_max_steps: default_max_steps(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl ConfigFile {
    /// Parses config TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if the text is not valid for the schema.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads the file at `path`, returning defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] for file-system errors other than "not found",
    /// [`ConfigError::Parse`] for malformed TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path: path.to_path_buf(), source }),
        }
    }
}

// ── Runtime config ────────────────────────────────────────────────────────────

/// Resolved runtime settings for one player process.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub server_url: String,
    pub reconnect: ReconnectPolicy,
    /// `None` disables the command response timeout.
    pub command_timeout: Option<Duration>,
    pub fps_window: usize,
    /// Period of the `Stats` session event.
    pub stats_interval: Duration,
    pub default_max_steps: u32,
    pub log_level: String,
    /// Where `snapshot` writes the rendered surface as PNG.
    pub snapshot_path: Option<PathBuf>,
}

impl PlayerConfig {
    /// Converts a seconds value where `0` means "no timeout".
    pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
        (secs > 0).then(|| Duration::from_secs(secs))
    }
}

impl From<ConfigFile> for PlayerConfig {
    fn from(file: ConfigFile) -> Self {
        Self {
            server_url: file.connection.server_url,
            reconnect: ReconnectPolicy {
                base: Duration::from_millis(file.connection.reconnect_base_ms),
                max_attempts: file.connection.max_reconnect_attempts,
            },
            command_timeout: Self::timeout_from_secs(file.session.command_timeout_secs),
            fps_window: file.session.fps_window.max(1),
            stats_interval: Duration::from_millis(file.session.stats_interval_ms.max(1)),
            default_max_steps: file.session.default_max_steps.max(1),
            log_level: file.logging.level,
            snapshot_path: None,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        ConfigFile::default().into()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
