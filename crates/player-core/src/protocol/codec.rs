//! Text codec for the player ↔ host protocol.
//!
//! Outbound messages are plain serde serialization.  Inbound decoding reads
//! the frame into a [`serde_json::Value`] first and dispatches on the
//! `"type"` discriminant by hand:
//!
//! ```text
//! {"type":"screen",...}            → InboundMessage::Screen
//! {"type":"status",...}            → InboundMessage::Status
//! {"type":"ai_response",...}       → InboundMessage::AiResponse
//! {"type":"automation_status",...} → InboundMessage::AutomationStatus
//! {"type":"error",...}             → InboundMessage::Error
//! {"status":"success"|"error",...} → InboundMessage::ActionResult   (no "type")
//! ```
//!
//! Any failure is a [`ProtocolError`]; the caller logs it and drops the frame.
//! A bad frame never affects the connection.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{InboundMessage, OutboundMessage};

/// Errors from encoding or decoding a protocol frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The text was not valid JSON.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON value was not an object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The object had neither a `"type"` nor an action-acknowledgement shape.
    #[error("message has no \"type\" field")]
    MissingType,

    /// The `"type"` discriminant is not one the player understands.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// A known message type had missing or ill-typed fields.
    #[error("invalid \"{kind}\" payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Serializes an outbound message into the text of one WebSocket frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] if serialization fails (it cannot for the
/// message types defined here, but the signature keeps the codec honest).
pub fn encode_message(message: &OutboundMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Parses the text of one inbound WebSocket frame.
///
/// # Errors
///
/// See [`ProtocolError`] for the failure cases.
pub fn decode_message(text: &str) -> Result<InboundMessage, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;

    let Value::Object(ref object) = value else {
        return Err(ProtocolError::NotAnObject(json_kind(&value)));
    };

    let kind = match object.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(_) => return Err(ProtocolError::MissingType),
        None if object.contains_key("status") => {
            return payload("action_result", value).map(InboundMessage::ActionResult);
        }
        None => return Err(ProtocolError::MissingType),
    };

    match kind.as_str() {
        "screen" => payload("screen", value).map(InboundMessage::Screen),
        "status" => payload("status", value).map(InboundMessage::Status),
        "ai_response" => payload("ai_response", value).map(InboundMessage::AiResponse),
        "automation_status" => {
            payload("automation_status", value).map(InboundMessage::AutomationStatus)
        }
        "error" => payload("error", value).map(InboundMessage::Error),
        _ => Err(ProtocolError::UnknownType(kind)),
    }
}

/// Deserializes the payload struct for a known message kind.
///
/// Extra fields (including `"type"` itself) are ignored by serde.
fn payload<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|source| ProtocolError::InvalidPayload { kind, source })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
