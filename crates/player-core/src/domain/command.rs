//! Single-flight natural-language command coordinator.
//!
//! At most one `ai_command` is outstanding at a time.  The coordinator is
//! `Idle` until a command is submitted and sent, then `Awaiting` until one
//! of these resolves it:
//!
//! - the host's `ai_response` (success or failure),
//! - the optional response timeout elapsing,
//! - the connection closing.
//!
//! Every resolution produces a [`CommandOutcome`] for display and returns
//! the coordinator to `Idle`.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::protocol::messages::{AiResponse, OutboundMessage};
use crate::sink::MessageSink;

/// Shown when a successful response carries no rationale.
pub const DEFAULT_THOUGHT: &str = "analysis complete";
/// Shown when a successful response carries no action.
pub const DEFAULT_ACTION: &str = "done";
/// Shown when a failed response carries no error text.
pub const DEFAULT_ERROR: &str = "an error occurred";
/// Failure text synthesized when the connection drops mid-request.
pub const CONNECTION_LOST: &str = "connection lost";

/// Local reasons a submit is rejected before or while sending.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("instruction is empty")]
    EmptyInstruction,

    #[error("a command is already awaiting its response")]
    AlreadyInFlight,

    /// The transport was not open; nothing was sent.
    #[error("failed to send the command")]
    SendFailed,
}

/// Result of one command cycle, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded {
        /// Free-text rationale from the model.
        thought: String,
        /// Action descriptor, e.g. `click({"x":10,"y":20})`.
        action: String,
    },
    Failed { error: String },
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Converts an `ai_response` payload into an outcome, filling in the
    /// display fallbacks.
    pub fn from_response(response: &AiResponse) -> Self {
        if !response.success {
            return Self::Failed {
                error: non_empty(response.error.as_deref()).unwrap_or(DEFAULT_ERROR).to_string(),
            };
        }

        let thought = non_empty(response.thought.as_deref()).unwrap_or(DEFAULT_THOUGHT).to_string();
        let action = match non_empty(response.action_type.as_deref()) {
            Some(kind) => {
                let params = response
                    .action_params
                    .as_ref()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "{}".to_string());
                format!("{kind}({params})")
            }
            None => DEFAULT_ACTION.to_string(),
        };
        Self::Succeeded { thought, action }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Awaiting { instruction: String, submitted_at: Instant },
}

/// Tracks the one in-flight command request.
#[derive(Debug, Clone)]
pub struct CommandCoordinator {
    state: State,
    timeout: Option<Duration>,
}

impl CommandCoordinator {
    /// `timeout = None` waits for the response indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { state: State::Idle, timeout }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, State::Awaiting { .. })
    }

    /// The instruction currently awaiting its response.
    pub fn pending_instruction(&self) -> Option<&str> {
        match &self.state {
            State::Awaiting { instruction, .. } => Some(instruction),
            State::Idle => None,
        }
    }

    /// Validates and sends `instruction`.
    ///
    /// The instruction is trimmed.  On success the coordinator is `Awaiting`;
    /// on any error it is unchanged.
    ///
    /// # Errors
    ///
    /// - [`CommandError::EmptyInstruction`] for a blank instruction.
    /// - [`CommandError::AlreadyInFlight`] while a request is outstanding.
    /// - [`CommandError::SendFailed`] when the sink dropped the message.
    pub fn submit(&mut self, instruction: &str, sink: &dyn MessageSink, now: Instant) -> Result<(), CommandError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(CommandError::EmptyInstruction);
        }
        if self.is_awaiting() {
            debug!("command submit ignored: a request is already in flight");
            return Err(CommandError::AlreadyInFlight);
        }
        if !sink.send(&OutboundMessage::ai_command(instruction)) {
            warn!("command not sent: transport is not open");
            return Err(CommandError::SendFailed);
        }
        info!(chars = instruction.chars().count(), "command sent");
        self.state = State::Awaiting { instruction: instruction.to_string(), submitted_at: now };
        Ok(())
    }

    /// Resolves the cycle with the host's answer.
    ///
    /// Always returns to `Idle`.  A response arriving while `Idle` (after a
    /// timeout or a reconnect) is still converted for display.
    pub fn on_response(&mut self, response: &AiResponse) -> CommandOutcome {
        if !self.is_awaiting() {
            debug!("ai_response received with no command in flight");
        }
        self.state = State::Idle;
        CommandOutcome::from_response(response)
    }

    /// Synthesizes a failure if the outstanding request is older than the
    /// configured timeout.
    pub fn poll_timeout(&mut self, now: Instant) -> Option<CommandOutcome> {
        let timeout = self.timeout?;
        let State::Awaiting { submitted_at, .. } = &self.state else {
            return None;
        };
        let waited = now.saturating_duration_since(*submitted_at);
        if waited < timeout {
            return None;
        }
        warn!(waited_secs = waited.as_secs(), "command timed out waiting for a response");
        self.state = State::Idle;
        Some(CommandOutcome::Failed { error: format!("no response within {}s", timeout.as_secs()) })
    }

    /// Resolves an outstanding request as failed because the connection
    /// closed.  Returns `None` when nothing was in flight.
    pub fn on_connection_lost(&mut self) -> Option<CommandOutcome> {
        if !self.is_awaiting() {
            return None;
        }
        self.state = State::Idle;
        Some(CommandOutcome::Failed { error: CONNECTION_LOST.to_string() })
    }
}

impl Default for CommandCoordinator {
    fn default() -> Self {
        Self::new(None)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
