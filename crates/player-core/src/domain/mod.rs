//! Domain logic for the web player.
//!
//! This module contains pure interaction logic with no infrastructure
//! dependencies: no sockets, no async runtime, no image codec.
//!
//! # Why keep these state machines free of I/O? (for beginners)
//!
//! Each interaction the player supports (turning pointer events into remote
//! actions, correlating a command with its response, tracking an automation
//! run) is a small state machine.  Keeping them synchronous and handing their
//! outbound traffic to a [`crate::sink::MessageSink`] means every transition
//! can be tested by feeding events in and inspecting what came out, without
//! starting a server.
//!
//! The client crate owns the clock, the socket and the display surface and
//! drives these types from its event loop.

/// Local display ↔ remote surface coordinate mapping.
pub mod geometry;

/// Rolling frames-per-second estimate.
pub mod fps;

/// Connection lifecycle states, transport events and reconnect backoff.
pub mod connection;

/// Pointer / wheel / key event disambiguation into remote actions.
pub mod gesture;

/// Single-flight natural-language command coordinator.
pub mod command;

/// Goal automation run tracking and history reconciliation.
pub mod automation;
