use mcp_types::request::ClientRequest;
use mcp_types::request::ServerRequest;
use mcp_types::notification::ClientNotification;
use mcp_types::notification::ServerNotification;
use mcp_types::envelope::JsonRpcErrorObject;
use mcp_types::envelope::RawMessage;
use mcp_types::id::RequestId;

use crate::error::ProtocolError;

/// A structurally valid inbound request: `id`/`method` present, `id` of a
/// legal type. Does not yet know whether `method` names anything real.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub id: RequestId,
    pub method: String,
    pub params: serde_json::Value,
}

/// A structurally valid inbound notification: `method` present, no `id` key
/// at all (spec §4.1 — not even `id: null`).
#[derive(Debug, Clone)]
pub struct NotificationEnvelope {
    pub method: String,
    pub params: serde_json::Value,
}

/// A structurally valid inbound response: `id` present, exactly one of
/// `result`/`error`.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub id: RequestId,
    pub outcome: Result<serde_json::Value, JsonRpcErrorObject>,
}

#[derive(Debug, Clone)]
pub enum Classified {
    Request(RequestEnvelope),
    Response(ResponseEnvelope),
    Notification(NotificationEnvelope),
}

fn value_to_request_id(value: &serde_json::Value) -> Option<RequestId> {
    match value {
        serde_json::Value::String(s) => Some(RequestId::String(s.clone())),
        serde_json::Value::Number(n) => n.as_i64().map(RequestId::Integer),
        _ => None,
    }
}

/// Classify a raw wire message into request/response/notification, per the
/// "Classify" step of spec §4.3's read loop. JSON-RPC has no discriminant
/// field, so classification is purely presence/absence of `id`/`method`/
/// `result`/`error` (spec §4.1).
pub fn classify(raw: &RawMessage) -> Result<Classified, ProtocolError> {
    let has_method = raw.method.is_some();
    let has_result = raw.result.is_some();
    let has_error = raw.error.is_some();

    match (&raw.id, has_method, has_result, has_error) {
        (Some(id_value), true, false, false) => {
            let id = value_to_request_id(id_value).ok_or_else(|| {
                ProtocolError::InvalidRequest(format!(
                    "request id must be a string or integer, got {id_value}"
                ))
            })?;
            Ok(Classified::Request(RequestEnvelope {
                id,
                #[allow(clippy::unwrap_used)]
                method: raw.method.clone().unwrap(),
                params: raw.params.clone().unwrap_or(serde_json::Value::Null),
            }))
        }
        (Some(id_value), false, true, false) => {
            let id = value_to_request_id(id_value).ok_or_else(|| {
                ProtocolError::InvalidRequest(format!(
                    "response id must be a string or integer, got {id_value}"
                ))
            })?;
            #[allow(clippy::unwrap_used)]
            Ok(Classified::Response(ResponseEnvelope {
                id,
                outcome: Ok(raw.result.clone().unwrap()),
            }))
        }
        (Some(id_value), false, false, true) => {
            let id = value_to_request_id(id_value).ok_or_else(|| {
                ProtocolError::InvalidRequest(format!(
                    "response id must be a string or integer, got {id_value}"
                ))
            })?;
            #[allow(clippy::unwrap_used)]
            Ok(Classified::Response(ResponseEnvelope {
                id,
                outcome: Err(raw.error.clone().unwrap()),
            }))
        }
        (Some(_), false, true, true) => Err(ProtocolError::InvalidRequest(
            "response carries both result and error".to_string(),
        )),
        (None, true, false, false) => Ok(Classified::Notification(NotificationEnvelope {
            #[allow(clippy::unwrap_used)]
            method: raw.method.clone().unwrap(),
            params: raw.params.clone().unwrap_or(serde_json::Value::Null),
        })),
        _ => Err(ProtocolError::InvalidRequest(
            "message is neither a valid request, response, nor notification".to_string(),
        )),
    }
}

pub fn is_valid_request(raw: &RawMessage) -> bool {
    matches!(classify(raw), Ok(Classified::Request(_)))
}

pub fn is_valid_response(raw: &RawMessage) -> bool {
    matches!(classify(raw), Ok(Classified::Response(_)))
}

pub fn is_valid_notification(raw: &RawMessage) -> bool {
    matches!(classify(raw), Ok(Classified::Notification(_)))
}

const CLIENT_REQUEST_METHODS: &[&str] = &[
    mcp_types::lifecycle::METHOD_INITIALIZE,
    mcp_types::lifecycle::METHOD_PING,
    mcp_types::tools::METHOD_LIST_TOOLS,
    mcp_types::tools::METHOD_CALL_TOOL,
    mcp_types::prompts::METHOD_LIST_PROMPTS,
    mcp_types::prompts::METHOD_GET_PROMPT,
    mcp_types::resources::METHOD_LIST_RESOURCES,
    mcp_types::resources::METHOD_LIST_RESOURCE_TEMPLATES,
    mcp_types::resources::METHOD_READ_RESOURCE,
    mcp_types::resources::METHOD_SUBSCRIBE,
    mcp_types::resources::METHOD_UNSUBSCRIBE,
    mcp_types::lifecycle::METHOD_SET_LEVEL,
    mcp_types::completion::METHOD_COMPLETE,
];

const SERVER_REQUEST_METHODS: &[&str] = &[
    mcp_types::lifecycle::METHOD_PING,
    mcp_types::roots::METHOD_LIST_ROOTS,
    mcp_types::sampling::METHOD_CREATE_MESSAGE,
    mcp_types::elicitation::METHOD_ELICIT,
];

fn tagged_value(method: &str, params: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "method": method, "params": params })
}

/// `parse_request`, specialized to requests a server receives from a client.
/// Unknown methods yield [`ProtocolError::MethodNotFound`]; known methods
/// whose params don't match the schema yield [`ProtocolError::InvalidParams`]
/// (spec §4.1).
pub fn parse_client_request(env: &RequestEnvelope) -> Result<ClientRequest, ProtocolError> {
    let value = tagged_value(&env.method, &env.params);
    serde_json::from_value::<ClientRequest>(value).map_err(|e| {
        if CLIENT_REQUEST_METHODS.contains(&env.method.as_str()) {
            ProtocolError::InvalidParams(format!("{}: {e}", env.method))
        } else {
            ProtocolError::MethodNotFound(env.method.clone())
        }
    })
}

/// `parse_request`, specialized to requests a client receives from a server.
pub fn parse_server_request(env: &RequestEnvelope) -> Result<ServerRequest, ProtocolError> {
    let value = tagged_value(&env.method, &env.params);
    serde_json::from_value::<ServerRequest>(value).map_err(|e| {
        if SERVER_REQUEST_METHODS.contains(&env.method.as_str()) {
            ProtocolError::InvalidParams(format!("{}: {e}", env.method))
        } else {
            ProtocolError::MethodNotFound(env.method.clone())
        }
    })
}

/// `parse_notification` on the server side: unknown methods are silently
/// dropped (`None`), matching spec §4.1's "Unknown methods ... `None` for
/// notifications".
pub fn parse_client_notification(env: &NotificationEnvelope) -> Option<ClientNotification> {
    let value = tagged_value(&env.method, &env.params);
    serde_json::from_value::<ClientNotification>(value).ok()
}

/// `parse_notification` on the client side.
pub fn parse_server_notification(env: &NotificationEnvelope) -> Option<ServerNotification> {
    let value = tagged_value(&env.method, &env.params);
    serde_json::from_value::<ServerNotification>(value).ok()
}

/// `parse_response(original_request)` for a response to a [`ClientRequest`]
/// the server sent and is now hearing back about (used by the client-side
/// coordinator). A decode failure is `InternalError` with a diagnostic
/// payload, per spec §4.1.
pub fn parse_result_for_client_request(
    original: &ClientRequest,
    result: serde_json::Value,
) -> Result<mcp_types::result::ServerResult, ProtocolError> {
    use mcp_types::result::ServerResult;

    let mismatch = |e: serde_json::Error| {
        ProtocolError::InternalError(format!(
            "result for {} did not match the expected shape: {e}",
            original.method()
        ))
    };

    match original {
        ClientRequest::Initialize(_) => serde_json::from_value(result)
            .map(ServerResult::Initialize)
            .map_err(mismatch),
        ClientRequest::Ping(_)
        | ClientRequest::Subscribe(_)
        | ClientRequest::Unsubscribe(_)
        | ClientRequest::SetLevel(_) => serde_json::from_value(result)
            .map(ServerResult::Empty)
            .map_err(mismatch),
        ClientRequest::ListTools(_) => serde_json::from_value(result)
            .map(ServerResult::ListTools)
            .map_err(mismatch),
        ClientRequest::CallTool(_) => serde_json::from_value(result)
            .map(ServerResult::CallTool)
            .map_err(mismatch),
        ClientRequest::ListPrompts(_) => serde_json::from_value(result)
            .map(ServerResult::ListPrompts)
            .map_err(mismatch),
        ClientRequest::GetPrompt(_) => serde_json::from_value(result)
            .map(ServerResult::GetPrompt)
            .map_err(mismatch),
        ClientRequest::ListResources(_) => serde_json::from_value(result)
            .map(ServerResult::ListResources)
            .map_err(mismatch),
        ClientRequest::ListResourceTemplates(_) => serde_json::from_value(result)
            .map(ServerResult::ListResourceTemplates)
            .map_err(mismatch),
        ClientRequest::ReadResource(_) => serde_json::from_value(result)
            .map(ServerResult::ReadResource)
            .map_err(mismatch),
        ClientRequest::Complete(_) => serde_json::from_value(result)
            .map(ServerResult::Complete)
            .map_err(mismatch),
    }
}

/// `parse_response(original_request)` for a response to a [`ServerRequest`]
/// (used server-side, hearing back from the client on e.g. `sampling/createMessage`).
pub fn parse_result_for_server_request(
    original: &ServerRequest,
    result: serde_json::Value,
) -> Result<mcp_types::result::ClientResult, ProtocolError> {
    use mcp_types::result::ClientResult;

    let mismatch = |e: serde_json::Error| {
        ProtocolError::InternalError(format!(
            "result for {} did not match the expected shape: {e}",
            original.method()
        ))
    };

    match original {
        ServerRequest::Ping(_) => serde_json::from_value(result)
            .map(ClientResult::Empty)
            .map_err(mismatch),
        ServerRequest::ListRoots(_) => serde_json::from_value(result)
            .map(ClientResult::ListRoots)
            .map_err(mismatch),
        ServerRequest::CreateMessage(_) => serde_json::from_value(result)
            .map(ClientResult::CreateMessage)
            .map_err(mismatch),
        ServerRequest::Elicit(_) => serde_json::from_value(result)
            .map(ClientResult::Elicit)
            .map_err(mismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_from_json(v: serde_json::Value) -> Result<RawMessage, serde_json::Error> {
        serde_json::from_value(v)
    }

    #[test]
    fn classifies_request() -> Result<(), serde_json::Error> {
        let raw = raw_from_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "ping",
            "params": {},
        }))?;
        match classify(&raw)? {
            Classified::Request(env) => {
                assert_eq!(env.id, RequestId::Integer(1));
                assert_eq!(env.method, "ping");
            }
            other => panic!("expected Request, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn classifies_notification_with_no_id_key() -> Result<(), serde_json::Error> {
        let raw = raw_from_json(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
        }))?;
        assert!(is_valid_notification(&raw));
        assert!(!is_valid_request(&raw));
        Ok(())
    }

    #[test]
    fn rejects_bool_id() -> Result<(), serde_json::Error> {
        let raw = raw_from_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": true,
            "method": "ping",
        }))?;
        assert!(classify(&raw).is_err());
        Ok(())
    }

    #[test]
    fn rejects_response_with_both_result_and_error() -> Result<(), serde_json::Error> {
        let raw = raw_from_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {},
            "error": { "code": -32603, "message": "oops" },
        }))?;
        assert!(classify(&raw).is_err());
        Ok(())
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let env = RequestEnvelope {
            id: RequestId::Integer(1),
            method: "bogus/method".to_string(),
            params: serde_json::json!({}),
        };
        assert_matches::assert_matches!(
            parse_client_request(&env),
            Err(ProtocolError::MethodNotFound(_))
        );
    }

    #[test]
    fn known_method_bad_params_is_invalid_params() {
        let env = RequestEnvelope {
            id: RequestId::Integer(1),
            method: mcp_types::tools::METHOD_CALL_TOOL.to_string(),
            params: serde_json::json!({ "no_name_field": true }),
        };
        assert_matches::assert_matches!(
            parse_client_request(&env),
            Err(ProtocolError::InvalidParams(_))
        );
    }

    #[test]
    fn unknown_notification_method_drops_silently() {
        let env = NotificationEnvelope {
            method: "notifications/unknown_thing".to_string(),
            params: serde_json::json!({}),
        };
        assert!(parse_client_notification(&env).is_none());
    }

    #[test]
    fn initialize_result_round_trips_through_parse_response() -> Result<(), serde_json::Error> {
        let original = ClientRequest::Initialize(mcp_types::lifecycle::InitializeParams {
            protocol_version: mcp_types::ProtocolVersion::latest(),
            capabilities: Default::default(),
            client_info: Default::default(),
        });
        let result_json = serde_json::json!({
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "serverInfo": { "name": "srv", "version": "0" },
        });
        let parsed = parse_result_for_client_request(&original, result_json)?;
        assert_matches::assert_matches!(parsed, mcp_types::result::ServerResult::Initialize(_));
        Ok(())
    }
}
