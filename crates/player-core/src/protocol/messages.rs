//! JSON message types for the player ↔ host WebSocket protocol.
//!
//! Every message is a JSON object carried in one WebSocket text frame.  The
//! `"type"` field identifies the message; all other fields are flattened into
//! the same object.  For example:
//!
//! ```json
//! {"type":"action","action_type":"click","x":200,"y":100}
//! {"type":"goal_automation","action":"stop"}
//! ```
//!
//! Serde's `#[serde(tag = "...")]` attribute handles the discriminants, and
//! nested tagged enums (`Action`, `AutomationRequest`) add their own
//! discriminant field to the same flat object.
//!
//! # Why separate outbound and inbound types?
//!
//! The two directions carry different information: the player sends actions
//! and control requests, the host sends frames and status.  Two distinct
//! enums make it a compile-time error to build a host-only message on the
//! player side.
//!
//! Inbound decoding is done by hand in [`crate::protocol::codec`] rather than
//! by deriving `Deserialize` on [`InboundMessage`], because the host also
//! sends untyped action acknowledgements that have no `"type"` field.

use serde::{Deserialize, Serialize};

// ── Player → host ─────────────────────────────────────────────────────────────

/// All messages the player sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A remote input action.  The `action_type` field comes from [`Action`].
    Action(Action),

    /// Natural-language instruction for the host's AI model.
    AiCommand {
        /// The trimmed instruction text.
        instruction: String,
    },

    /// Start or stop a goal automation run.  The `action` field comes from
    /// [`AutomationRequest`].
    GoalAutomation(AutomationRequest),

    /// Stream configuration pass-through.
    Config {
        setting: ConfigSetting,
        value: u32,
    },
}

impl OutboundMessage {
    /// Wraps an [`Action`] in its `{"type":"action"}` envelope.
    pub fn action(action: Action) -> Self {
        Self::Action(action)
    }

    pub fn ai_command(instruction: impl Into<String>) -> Self {
        Self::AiCommand { instruction: instruction.into() }
    }

    pub fn goal_start(goal: impl Into<String>, max_steps: u32) -> Self {
        Self::GoalAutomation(AutomationRequest::Start { goal: goal.into(), max_steps })
    }

    pub fn goal_stop() -> Self {
        Self::GoalAutomation(AutomationRequest::Stop)
    }

    /// Builds a config message, clamping `value` into the range the host
    /// accepts for `setting`.
    pub fn config(setting: ConfigSetting, value: u32) -> Self {
        Self::Config { setting, value: setting.clamp(value) }
    }

    /// Short type name for log lines (never includes instruction text).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Action(action) => action.kind(),
            Self::AiCommand { .. } => "ai_command",
            Self::GoalAutomation(AutomationRequest::Start { .. }) => "goal_automation.start",
            Self::GoalAutomation(AutomationRequest::Stop) => "goal_automation.stop",
            Self::Config { .. } => "config",
        }
    }
}

/// A discrete remote input action in remote logical coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum Action {
    Click { x: i32, y: i32 },
    DoubleClick { x: i32, y: i32 },
    RightClick { x: i32, y: i32 },
    Drag { start_x: i32, start_y: i32, end_x: i32, end_y: i32 },
    Scroll { x: i32, y: i32, direction: ScrollDirection },
    /// Space-joined, lower-case key combination, e.g. `"ctrl shift t"`.
    Hotkey { key: String },
    /// Literal text entry.  Only ever sent explicitly, never built from raw
    /// key events.
    Type { text: String },
}

impl Action {
    /// The wire value of `action_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::DoubleClick { .. } => "double_click",
            Self::RightClick { .. } => "right_click",
            Self::Drag { .. } => "drag",
            Self::Scroll { .. } => "scroll",
            Self::Hotkey { .. } => "hotkey",
            Self::Type { .. } => "type",
        }
    }
}

/// Vertical scroll direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Negative vertical delta scrolls up; zero and positive scroll down.
    pub fn from_delta(delta_y: f64) -> Self {
        if delta_y < 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// Goal automation control request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AutomationRequest {
    Start { goal: String, max_steps: u32 },
    Stop,
}

/// Stream settings the host accepts through `{"type":"config"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSetting {
    /// JPEG quality percentage.
    Quality,
    /// Capture frame rate.
    Fps,
}

impl ConfigSetting {
    /// Clamps `value` into the range the host applies for this setting.
    pub fn clamp(self, value: u32) -> u32 {
        match self {
            Self::Quality => value.clamp(10, 100),
            Self::Fps => value.clamp(1, 60),
        }
    }
}

// ── Host → player ─────────────────────────────────────────────────────────────

/// All messages the host sends to the player.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `"screen"` – one rendered frame.
    Screen(ScreenFrame),
    /// `"status"` – connection / configuration notices.
    Status(StatusNotice),
    /// `"ai_response"` – answer to the in-flight `ai_command`.
    AiResponse(AiResponse),
    /// `"automation_status"` – streamed goal automation progress.
    AutomationStatus(AutomationStatus),
    /// `"error"` – generic host-side failure.
    Error(ServerError),
    /// Untyped `{status, message, code}` acknowledgement of an action.
    ActionResult(ActionResult),
}

impl InboundMessage {
    /// The wire discriminant, for log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Screen(_) => "screen",
            Self::Status(_) => "status",
            Self::AiResponse(_) => "ai_response",
            Self::AutomationStatus(_) => "automation_status",
            Self::Error(_) => "error",
            Self::ActionResult(_) => "action_result",
        }
    }
}

/// One rendered frame of the remote surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenFrame {
    /// Remote logical surface width in pixels.
    pub width: u32,
    /// Remote logical surface height in pixels.
    pub height: u32,
    /// Base64-encoded image payload (JPEG or PNG).
    pub data: String,
    /// Host capture time in seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusNotice {
    /// Machine-readable status, e.g. `"connected"` or `"config_updated"`.
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Result of an `ai_command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub success: bool,
    #[serde(default)]
    pub thought: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_params: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Snapshot of the host's automation runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationStatus {
    pub is_running: bool,
    #[serde(default)]
    pub current_step: u32,
    #[serde(default)]
    pub max_steps: u32,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub goal_status: Option<GoalStatus>,
    #[serde(default)]
    pub last_action: Option<LastAction>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalStatus {
    #[serde(default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub progress_description: String,
    #[serde(default)]
    pub confidence: f64,
}

/// The most recent step the host executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastAction {
    /// Step number; only positive values are recorded in history.
    pub step: i64,
    #[serde(default)]
    pub action_type: String,
    #[serde(default)]
    pub thought: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Acknowledgement the host sends after executing (or failing) an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: ActionResultStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionResultStatus {
    Success,
    Error,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
