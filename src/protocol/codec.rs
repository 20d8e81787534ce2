//! Wire codec for protocol envelopes.
//!
//! Pure transforms between raw bytes/lines and envelope types. Both
//! transports decode through here so malformed input surfaces as a
//! `ProtocolError::ParseError` instead of crashing the transport.

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::types::{JsonRpcRequest, JsonRpcResponse, Message};
use serde::Serialize;
use serde_json::Value;

/// Decode a single wire message (one line on the stdio transport).
///
/// Tries request first, then response, mirroring how peers interleave
/// both on a bidirectional stream.
pub fn decode_message(raw: &str) -> ProtocolResult<Message> {
    if let Ok(request) = serde_json::from_str::<JsonRpcRequest>(raw) {
        return Ok(Message::Request(request));
    }
    match serde_json::from_str::<JsonRpcResponse>(raw) {
        Ok(response) => Ok(Message::Response(response)),
        Err(_) => Err(ProtocolError::ParseError),
    }
}

/// Decode an HTTP POST body: a single request envelope or a JSON array
/// of envelopes. Returns envelopes in body order.
pub fn decode_body(raw: &[u8]) -> ProtocolResult<Vec<JsonRpcRequest>> {
    let value: Value = serde_json::from_slice(raw).map_err(|_| ProtocolError::ParseError)?;

    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(ProtocolError::InvalidRequest("Empty batch".into()));
            }
            items
                .into_iter()
                .map(|item| {
                    serde_json::from_value::<JsonRpcRequest>(item)
                        .map_err(|_| ProtocolError::ParseError)
                })
                .collect()
        }
        Value::Object(_) => {
            let request = serde_json::from_value::<JsonRpcRequest>(value)
                .map_err(|_| ProtocolError::ParseError)?;
            Ok(vec![request])
        }
        _ => Err(ProtocolError::ParseError),
    }
}

/// Encode an envelope for the wire.
pub fn encode<T: Serialize>(envelope: &T) -> ProtocolResult<String> {
    serde_json::to_string(envelope)
        .map_err(|e| ProtocolError::InternalError(e.to_string().into()))
}
