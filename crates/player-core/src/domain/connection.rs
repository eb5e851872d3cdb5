//! Connection lifecycle vocabulary shared by the transport and the session.
//!
//! The socket itself lives in the client crate; this module only defines the
//! states, the events the transport publishes, and the reconnect policy, so
//! that the backoff arithmetic can be tested without a network.

use std::time::Duration;

use crate::protocol::messages::InboundMessage;

/// WebSocket close code for a normal, intentional closure.
///
/// The player sends it on manual disconnect, and a peer close carrying it
/// suppresses automatic reconnection.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Reason string sent with the manual-disconnect close frame.
pub const MANUAL_CLOSE_REASON: &str = "User disconnected";

/// Default backoff base.
pub const DEFAULT_RECONNECT_BASE: Duration = Duration::from_millis(1000);

/// Default number of automatic reconnect attempts before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Lifecycle state of the transport's single underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Never connected, or reset after a manual disconnect.
    #[default]
    Idle,
    /// A connection attempt is in progress (including a scheduled retry).
    Connecting,
    Open,
    /// A manual close frame was sent and the peer's reply is pending.
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events published by the transport, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The underlying connection opened.
    Opened,
    /// A well-formed inbound message arrived.  Malformed frames never reach
    /// subscribers.
    Message(InboundMessage),
    /// A transport-level error.  Does not by itself trigger reconnection.
    Error(String),
    /// The connection closed.  `code` is `None` when the socket dropped
    /// without a close frame or the connection never opened.
    Closed { code: Option<u16>, reason: String },
    /// An automatic reconnect attempt will fire after `delay`.
    ReconnectScheduled { attempt: u32, delay: Duration },
    /// Automatic reconnection gave up; a manual connect is required.
    ReconnectExhausted { attempts: u32 },
}

/// Returns `true` when a close should start the reconnect policy.
///
/// A manual disconnect never reconnects; neither does a peer close carrying
/// [`NORMAL_CLOSURE`].
pub fn should_reconnect(manual_close: bool, code: Option<u16>) -> bool {
    !manual_close && code != Some(NORMAL_CLOSURE)
}

/// Exponential backoff parameters: `delay(n) = base * 2^(n-1)` for attempt
/// `n` in `1..=max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Delay before attempt number `attempt` (1-based).  Attempt 0 is
    /// treated as attempt 1; the exponent saturates instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << exponent)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { base: DEFAULT_RECONNECT_BASE, max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS }
    }
}

/// Attempt counter driven by the transport.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectBackoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    /// Advances to the next attempt and returns `(attempt, delay)`, or `None`
    /// once `max_attempts` have been used.
    pub fn next_attempt(&mut self) -> Option<(u32, Duration)> {
        if self.attempts >= self.policy.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some((self.attempts, self.policy.delay_for(self.attempts)))
    }

    /// Called on every successful open and on every manual connect.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
