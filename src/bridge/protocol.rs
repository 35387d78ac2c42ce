//! Display-surface wire messages
//!
//! Every message is a JSON object tagged by `"type"`.

use crate::error::ProtocolError;
use crate::navigation::{JumpTarget, Position};
use crate::types::{Action, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages the display surface sends to the preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    /// The surface can render; unblocks the first `Start`
    Ready,
    Action { action: Action },
    JumpTo { target: JumpTarget },
}

/// Messages the preview sends to the display surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Full replacement state
    UpdateState { state: State },
    RevealPosition { position: Position },
    NavigationFailed { message: String },
}

impl OutboundMessage {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// Same shape as `InboundMessage`, with the action left undecoded so an
// unknown kind can be told apart from a broken envelope
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Envelope {
    Ready,
    Action { action: Value },
    JumpTo { target: JumpTarget },
}

/// Decode one inbound message
///
/// An action whose `kind` is missing or not one of [`Action::KINDS`] yields
/// [`ProtocolError::UnknownAction`]; anything else that does not decode is
/// [`ProtocolError::Malformed`].
pub fn decode_inbound(raw: &str) -> Result<InboundMessage, ProtocolError> {
    match serde_json::from_str::<Envelope>(raw)? {
        Envelope::Ready => Ok(InboundMessage::Ready),
        Envelope::JumpTo { target } => Ok(InboundMessage::JumpTo { target }),
        Envelope::Action { action } => {
            let kind = action
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if !Action::KINDS.contains(&kind.as_str()) {
                return Err(ProtocolError::UnknownAction { kind });
            }
            let action = serde_json::from_value(action)?;
            Ok(InboundMessage::Action { action })
        }
    }
}
