//! Web player: headless thin client for a remotely controlled desktop.
//!
//! The binary connects to the remote host over WebSocket, renders the
//! streamed frames into an in-memory surface and reads operator commands
//! from stdin.  Session events are printed to stdout, logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! web-player [OPTIONS]
//!
//! Options:
//!   --config <PATH>                   TOML config file (missing file = defaults)
//!   --server-url <URL>                ws:// endpoint of the remote host
//!   --reconnect-base-ms <MS>          first reconnect delay, doubled per attempt
//!   --max-reconnect-attempts <N>      automatic attempts before giving up
//!   --command-timeout-secs <SECS>     ai command timeout, 0 disables
//!   --log-level <LEVEL>               used when RUST_LOG is not set
//!   --snapshot <PATH>                 PNG written by `snapshot` and on exit
//! ```
//!
//! # Precedence
//!
//! Built-in defaults, then the config file, then environment variables, then
//! CLI flags.
//!
//! | Variable                         | Default                  |
//! |----------------------------------|--------------------------|
//! | `PLAYER_SERVER_URL`              | `ws://127.0.0.1:8000/ws` |
//! | `PLAYER_RECONNECT_BASE_MS`       | `1000`                   |
//! | `PLAYER_MAX_RECONNECT_ATTEMPTS`  | `5`                      |
//! | `PLAYER_COMMAND_TIMEOUT_SECS`    | `120`                    |
//! | `PLAYER_LOG_LEVEL`               | `info`                   |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use player_client::application::{Session, SessionEvent, Surface};
use player_client::domain::{ConfigFile, PlayerConfig};
use player_client::infrastructure::console::{parse_line, render_event, ConsoleCommand, HELP};
use player_client::infrastructure::{RasterSurface, WsTransport};
use player_core::domain::connection::TransportEvent;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Headless web player.
///
/// Every flag is optional and overrides the config file.
#[derive(Debug, Parser)]
#[command(name = "web-player", about = "Headless thin client for a remotely controlled desktop", version)]
struct Cli {
    /// TOML config file.  A missing file yields the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// WebSocket endpoint of the remote host.
    #[arg(long, env = "PLAYER_SERVER_URL")]
    server_url: Option<String>,

    /// Delay before the first reconnect attempt, in milliseconds.
    #[arg(long, env = "PLAYER_RECONNECT_BASE_MS")]
    reconnect_base_ms: Option<u64>,

    /// Number of automatic reconnect attempts before giving up.
    #[arg(long, env = "PLAYER_MAX_RECONNECT_ATTEMPTS")]
    max_reconnect_attempts: Option<u32>,

    /// Seconds to wait for an `ai_response`; 0 waits forever.
    #[arg(long, env = "PLAYER_COMMAND_TIMEOUT_SECS")]
    command_timeout_secs: Option<u64>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, env = "PLAYER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Where to write the rendered surface as PNG.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

impl Cli {
    /// Resolves the effective [`PlayerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// the server URL is not a `ws://` URL.
    fn into_config(self) -> anyhow::Result<PlayerConfig> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)
                .with_context(|| format!("failed to load config file '{}'", path.display()))?,
            None => ConfigFile::default(),
        };
        let mut config = PlayerConfig::from(file);

        if let Some(url) = self.server_url {
            config.server_url = url;
        }
        if let Some(ms) = self.reconnect_base_ms {
            config.reconnect.base = Duration::from_millis(ms);
        }
        if let Some(attempts) = self.max_reconnect_attempts {
            config.reconnect.max_attempts = attempts;
        }
        if let Some(secs) = self.command_timeout_secs {
            config.command_timeout = PlayerConfig::timeout_from_secs(secs);
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config.snapshot_path = self.snapshot;

        // The connector is built without TLS support.
        if !config.server_url.starts_with("ws://") {
            anyhow::bail!("server url must be a ws:// URL: '{}'", config.server_url);
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. CLI arguments and the config file are resolved into a [`PlayerConfig`].
/// 2. `tracing_subscriber` is initialised; `RUST_LOG` wins over the
///    configured level.
/// 3. The transport and the session are built and the first connect starts.
/// 4. One loop multiplexes transport events, session events, stdin lines,
///    the stats timer and Ctrl+C until `quit` or Ctrl+C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // Logs go to stderr so that stdout carries only console output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with_writer(std::io::stderr)
        .init();

    info!(url = %config.server_url, "web player starting");

    let transport = Arc::new(WsTransport::new(config.server_url.clone(), config.reconnect));
    let mut transport_events = transport.subscribe();
    let mut session = Session::new(&config, RasterSurface::new(), Arc::clone(&transport));
    let mut session_events = session.subscribe();
    session.connect();

    // Ctrl+C is turned into a one-shot signal for the main loop.
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                error!("failed to listen for Ctrl+C signal: {e}");
                // Keep the sender alive so the main loop does not exit.
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut stats_tick = tokio::time::interval(config.stats_interval);

    loop {
        tokio::select! {
            Some(event) = transport_events.recv() => session.handle_event(event).await,

            Some(event) = session_events.recv() => match event {
                SessionEvent::Stats(stats) => debug!(fps = stats.fps, resolution = %stats.resolution, frames = stats.frames, "stats"),
                other => println!("{}", render_event(&other)),
            },

            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(ConsoleCommand::Session(control))) => session.apply(control),
                    Ok(Some(ConsoleCommand::Status)) => {
                        println!("{} | {}", session.connection_state(), render_event(&SessionEvent::Stats(session.stats())));
                    }
                    Ok(Some(ConsoleCommand::Snapshot)) => match config.snapshot_path.as_deref() {
                        Some(path) => write_snapshot(session.pipeline().surface(), path),
                        None => println!("no snapshot path configured (use --snapshot <PATH>)"),
                    },
                    Ok(Some(ConsoleCommand::Help)) => println!("{HELP}"),
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Err(e) => println!("{e}"),
                },
                Ok(None) => {
                    debug!("stdin closed");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("failed to read stdin: {e}");
                    stdin_open = false;
                }
            },

            _ = stats_tick.tick() => {
                session.publish_stats();
                session.poll_timeouts(Instant::now());
            }

            _ = &mut shutdown_rx => break,
        }
    }

    if let Some(path) = config.snapshot_path.as_deref() {
        write_snapshot(session.pipeline().surface(), path);
    }

    session.disconnect();
    // Give the close handshake a moment to complete.
    let _ = tokio::time::timeout(Duration::from_secs(1), async {
        while let Some(event) = transport_events.recv().await {
            if matches!(event, TransportEvent::Closed { .. }) {
                break;
            }
        }
    })
    .await;

    info!("web player stopped");
    Ok(())
}

fn write_snapshot(surface: &RasterSurface, path: &Path) {
    if surface.size().is_empty() {
        println!("nothing to snapshot yet");
        return;
    }
    match surface.save_png(path) {
        Ok(()) => println!("snapshot written to {}", path.display()),
        Err(e) => println!("failed to write snapshot: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
