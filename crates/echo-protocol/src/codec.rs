//! Two-phase frame decoding and deterministic encoding.
//!
//! Phase one reads only the `type` field. If it is missing or unknown the
//! frame is reported as unsupported without looking at the rest of it.
//! Phase two parses the whole frame against the schema of that one type.

use serde::Deserialize;

use crate::message::{Message, MessageKind};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("unsupported message: {reason}")]
    Unsupported { reason: String },

    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DecodeError::Unsupported { .. })
    }
}

/// Just enough of a frame to find out what it is.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: Option<serde_json::Value>,
}

fn peek_kind(frame: &str) -> Result<MessageKind, DecodeError> {
    let envelope: Envelope = serde_json::from_str(frame).map_err(DecodeError::Malformed)?;
    match envelope.kind {
        None | Some(serde_json::Value::Null) => Err(DecodeError::Unsupported {
            reason: "missing `type` field".into(),
        }),
        Some(serde_json::Value::String(tag)) => {
            tag.parse::<MessageKind>()
                .map_err(|_| DecodeError::Unsupported {
                    reason: format!("unknown type `{tag}`"),
                })
        }
        Some(other) => Err(DecodeError::Unsupported {
            reason: format!("`type` is not a string: {other}"),
        }),
    }
}

/// Decode one text frame.
pub fn decode(frame: &str) -> Result<Message, DecodeError> {
    let kind = peek_kind(frame)?;
    let message: Message = serde_json::from_str(frame)
        .map_err(|source| DecodeError::InvalidPayload { kind, source })?;
    debug_assert_eq!(message.kind(), kind);
    Ok(message)
}

/// Encode a message as a single JSON object, `type` first.
pub fn encode(message: &Message) -> String {
    // Only strings and small integers: serialization cannot fail.
    serde_json::to_string(message).expect("message serialization is infallible")
}
