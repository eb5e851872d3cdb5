//! Wire protocol: typed messages and the JSON text codec.
//!
//! The host speaks JSON objects over WebSocket text frames, one logical
//! message per frame, discriminated by a `"type"` field.

pub mod codec;
pub mod messages;

pub use codec::{decode_message, encode_message, ProtocolError};
pub use messages::{
    Action, ActionResult, ActionResultStatus, AiResponse, AutomationRequest, AutomationStatus,
    ConfigSetting, GoalStatus, InboundMessage, LastAction, OutboundMessage, ScreenFrame,
    ScrollDirection, ServerError, StatusNotice,
};
