//! # player-core
//!
//! Shared library for the web player containing the JSON wire protocol, the
//! local-to-remote coordinate model, and the interaction state machines that
//! sit between a local display surface and a remotely controlled desktop.
//!
//! This crate has zero dependencies on sockets, async runtimes, or image
//! codecs.  Everything here can be driven synchronously from tests.
//!
//! # Architecture overview
//!
//! The web player is a thin client: the remote host streams rendered frames,
//! the player displays them, and local pointer/keyboard gestures are turned
//! into normalized remote-coordinate actions sent back over the same channel.
//! Two control-plane flows ride alongside: a single natural-language command
//! request/response cycle, and a server-driven goal automation run that
//! streams step status.
//!
//! - **`protocol`** – The typed JSON messages exchanged with the host and the
//!   codec that turns them into text frames and back.
//!
//! - **`domain`** – Pure interaction logic: coordinate mapping, the FPS
//!   estimator, reconnect backoff, the gesture disambiguation state machine,
//!   and the command / automation coordinators.
//!
//! - **`keymap`** – Which local key presses are forwarded to the remote host
//!   and how modifier combinations are spelled on the wire.
//!
//! - **`sink`** – The [`MessageSink`] seam through which every component emits
//!   outbound messages.  The client crate implements it on top of WebSocket.

pub mod domain;
pub mod keymap;
pub mod protocol;
pub mod sink;

// Re-export the most-used types at the crate root so callers can write
// `player_core::OutboundMessage` instead of the full module path.
pub use domain::geometry::{map_to_remote, CoordinateMapper, LocalPoint, RemotePoint, SurfaceSize};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Action, InboundMessage, OutboundMessage};
pub use sink::MessageSink;
