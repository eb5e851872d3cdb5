//! Domain types owned by the client process.
//!
//! The interaction state machines live in `player_core::domain`; this module
//! only adds what is specific to running the player as a process, which is
//! its configuration.

pub mod config;

pub use config::{ConfigError, ConfigFile, PlayerConfig};
