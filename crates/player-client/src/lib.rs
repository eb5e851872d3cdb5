//! player-client library crate.
//!
//! The thin client of the web player: it keeps one WebSocket connection to
//! the remote host, draws the streamed frames, turns local input into remote
//! actions and drives the command and goal automation flows.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Remote host (JSON over WebSocket)
//!         ↕
//! [player-client]
//!   ├── domain/           PlayerConfig and its TOML schema
//!   ├── application/      Session orchestrator, frame pipeline, event fan-out
//!   └── infrastructure/
//!         ├── transport/  WebSocket connection + reconnect (tokio-tungstenite)
//!         ├── surface/    In-memory raster surface, recording mock
//!         └── console/    Operator command parser and event renderer
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O beyond reading its config file.
//! - `application` depends on `domain` and `player-core`; it sees the
//!   transport and the surface only through traits.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tungstenite`.

/// Domain layer: configuration.
pub mod domain;

/// Application layer: session orchestration and frame handling.
pub mod application;

/// Infrastructure layer: WebSocket transport, surfaces and console.
pub mod infrastructure;
