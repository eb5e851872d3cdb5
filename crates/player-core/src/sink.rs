//! Outbound message seam.
//!
//! Every component that produces traffic for the remote host (the gesture
//! translator via the session, the command coordinator, the automation
//! coordinator) hands its messages to a [`MessageSink`].  The production
//! implementation is the WebSocket transport in `player-client`; tests use
//! a recording sink.
//!
//! # Send-or-drop
//!
//! `send` never queues.  When the channel is not open the message is dropped
//! and `false` is returned; the caller decides whether that drop changes its
//! own state (the command coordinator does, gestures do not).

use crate::protocol::messages::OutboundMessage;

/// Something that can transmit an [`OutboundMessage`] to the remote host.
pub trait MessageSink: Send + Sync {
    /// Serializes and transmits `message` if the channel is open.
    ///
    /// Returns `true` when the message was handed to the open connection,
    /// `false` when it was dropped.
    fn send(&self, message: &OutboundMessage) -> bool;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
