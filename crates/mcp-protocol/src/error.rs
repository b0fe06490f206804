use mcp_types::JsonRpcErrorObject;
use thiserror::Error;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const PROTOCOL_VERSION_MISMATCH: i64 = -32000;
pub const REQUEST_TIMEOUT: i64 = -32001;
pub const CANCELLED: i64 = -32002;
pub const NO_STREAM: i64 = -32003;
pub const CONNECTION_ERROR: i64 = -32004;

/// The error taxonomy from spec §7. `thiserror` gives each leaf a `Display`
/// without hand-writing `fmt::Display`; conversion to the wire
/// `JsonRpcErrorObject` lives in [`ProtocolError::to_json_rpc`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    ParseError(String),
    #[error("malformed envelope: {0}")]
    InvalidRequest(String),
    #[error("method not found: {0}")]
    MethodNotFound(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("internal error: {0}")]
    InternalError(String),
    #[error("protocol version mismatch: server supports {expected}, peer requested {actual}")]
    ProtocolVersionMismatch { expected: String, actual: String },
    #[error("request cancelled")]
    Cancelled,
    #[error("request timed out")]
    RequestTimeout,
    #[error("no matching stream for this message")]
    NoStream,
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error(transparent)]
    OAuth(#[from] OAuthError),
}

impl ProtocolError {
    pub fn code(&self) -> i64 {
        match self {
            ProtocolError::ParseError(_) => PARSE_ERROR,
            ProtocolError::InvalidRequest(_) => INVALID_REQUEST,
            ProtocolError::MethodNotFound(_) => METHOD_NOT_FOUND,
            ProtocolError::InvalidParams(_) => INVALID_PARAMS,
            ProtocolError::InternalError(_) => INTERNAL_ERROR,
            ProtocolError::ProtocolVersionMismatch { .. } => PROTOCOL_VERSION_MISMATCH,
            ProtocolError::Cancelled => CANCELLED,
            ProtocolError::RequestTimeout => REQUEST_TIMEOUT,
            ProtocolError::NoStream => NO_STREAM,
            ProtocolError::ConnectionError(_) => CONNECTION_ERROR,
            ProtocolError::OAuth(_) => INTERNAL_ERROR,
        }
    }

    pub fn to_json_rpc(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}

/// OAuth subkinds (spec §7's "OAuth subkinds" row). Kept as a nested enum
/// rather than flattened into [`ProtocolError`] so `mcp-oauth` can name its
/// failures precisely without polluting the top-level taxonomy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OAuthError {
    #[error("protected resource / authorization server discovery failed: {0}")]
    Discovery(String),
    #[error("dynamic client registration failed: {0}")]
    Registration(String),
    #[error("authorization code exchange failed: {0}")]
    TokenExchange(String),
    #[error("token refresh failed: {0}")]
    TokenRefresh(String),
    #[error("authorization request could not be built: {0}")]
    Authorization(String),
    #[error("PKCE parameter generation failed: {0}")]
    Pkce(String),
    #[error("state token validation failed")]
    StateValidation,
    #[error("authorization callback error: {0}")]
    AuthorizationCallback(String),
}
