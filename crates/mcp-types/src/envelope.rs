use serde::Deserialize;
use serde::Serialize;

use crate::id::RequestId;

pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC error object, as carried in a [`RawMessage`]'s `error` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// The wire shape of a single JSON-RPC message, before classification.
///
/// JSON-RPC carries no explicit discriminant — a message is a request,
/// response, error, or notification purely by which of `id`/`method`/
/// `result`/`error` are present (spec §4.1). `id` is kept as a raw
/// [`serde_json::Value`] rather than [`RequestId`] so the parser can reject
/// `true`/`1.5`/structural ids with a specific diagnosis instead of having
/// serde silently fail to deserialize the whole message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

impl RawMessage {
    pub fn request(id: RequestId, method: impl Into<String>, params: serde_json::Value) -> Self {
        RawMessage {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Some(id_to_value(&id)),
            method: Some(method.into()),
            params: Some(params),
            result: None,
            error: None,
        }
    }

    pub fn notification(method: impl Into<String>, params: serde_json::Value) -> Self {
        RawMessage {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: None,
            method: Some(method.into()),
            params: Some(params),
            result: None,
            error: None,
        }
    }

    pub fn response(id: RequestId, result: serde_json::Value) -> Self {
        RawMessage {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Some(id_to_value(&id)),
            method: None,
            params: None,
            result: Some(result),
            error: None,
        }
    }

    pub fn error_response(id: RequestId, error: JsonRpcErrorObject) -> Self {
        RawMessage {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Some(id_to_value(&id)),
            method: None,
            params: None,
            result: None,
            error: Some(error),
        }
    }
}

fn id_to_value(id: &RequestId) -> serde_json::Value {
    match id {
        RequestId::String(s) => serde_json::Value::String(s.clone()),
        RequestId::Integer(n) => serde_json::Value::Number((*n).into()),
    }
}

/// A decoded frame: either a single [`RawMessage`] or a JSON-RPC batch. The
/// transport layer deals only in frames; batch fan-out/fan-in happens in
/// `mcp-protocol`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frame {
    Single(RawMessage),
    Batch(Vec<RawMessage>),
}
