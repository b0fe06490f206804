use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_protocol::parser::NotificationEnvelope;
use mcp_protocol::parser::RequestEnvelope;
use mcp_types::notification::ClientNotification;
use mcp_types::notification::ServerNotification;
use mcp_types::request::Capability;
use mcp_types::request::ClientRequest;
use mcp_types::request::ServerRequest;
use mcp_types::result::ClientResult;
use mcp_types::result::ServerResult;
use mcp_types::ClientCapabilities;
use mcp_types::RequestId;
use mcp_types::ServerCapabilities;

/// A request type this side can send to its peer. Bridges back to
/// `mcp-protocol`'s untagged result parsing, which needs the original
/// request to know which result variant to decode into (spec §4.1
/// `parse_response(original_request)`).
pub trait OutboundRequest: Clone + serde::Serialize + Send + Sync + 'static {
    type Result: Send + 'static;

    fn method(&self) -> &'static str;
    fn parse_result(&self, value: serde_json::Value) -> Result<Self::Result, ProtocolError>;

    /// Whether this is the handshake request itself — exempt from both the
    /// "peer must already be known" and "peer must already be initialized"
    /// send preconditions (spec §4.3). Only `ClientRequest::Initialize`
    /// overrides this; a server never initiates the handshake.
    fn is_initialize(&self) -> bool {
        false
    }
}

impl OutboundRequest for ClientRequest {
    type Result = ServerResult;

    fn method(&self) -> &'static str {
        ClientRequest::method(self)
    }

    fn parse_result(&self, value: serde_json::Value) -> Result<ServerResult, ProtocolError> {
        mcp_protocol::parser::parse_result_for_client_request(self, value)
    }

    fn is_initialize(&self) -> bool {
        matches!(self, ClientRequest::Initialize(_))
    }
}

impl OutboundRequest for ServerRequest {
    type Result = ClientResult;

    fn method(&self) -> &'static str {
        ServerRequest::method(self)
    }

    fn parse_result(&self, value: serde_json::Value) -> Result<ClientResult, ProtocolError> {
        mcp_protocol::parser::parse_result_for_server_request(self, value)
    }
}

/// The coordinator's sole typed boundary for inbound requests (spec §9:
/// "Dynamic per-method dispatch becomes a sum-typed request variant plus
/// exhaustive match"). One implementation per side; the session façade
/// implements this and matches exhaustively over `InReq`.
#[async_trait]
pub trait Dispatcher<InReq>: Send + Sync {
    type Result: serde::Serialize + Send;

    async fn dispatch(&self, peer_id: &str, request: InReq) -> Result<Self::Result, ProtocolError>;
}

/// Fans out a single notification method to every handler registered for
/// it, sequentially in registration order (spec §5 "Ordering guarantees").
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn handle(&self, peer_id: &str, params: serde_json::Value);
}

/// An inbound request type, parseable from the wire and self-describing for
/// capability gating (spec §3 invariant 5).
pub trait InboundRequest: Sized + Send + 'static {
    fn method(&self) -> &'static str;
    fn required_capability(&self) -> Option<Capability>;
    fn parse(env: &RequestEnvelope) -> Result<Self, ProtocolError>;
}

impl InboundRequest for ClientRequest {
    fn method(&self) -> &'static str {
        ClientRequest::method(self)
    }

    fn required_capability(&self) -> Option<Capability> {
        ClientRequest::required_capability(self)
    }

    fn parse(env: &RequestEnvelope) -> Result<Self, ProtocolError> {
        mcp_protocol::parser::parse_client_request(env)
    }
}

impl InboundRequest for ServerRequest {
    fn method(&self) -> &'static str {
        ServerRequest::method(self)
    }

    fn required_capability(&self) -> Option<Capability> {
        ServerRequest::required_capability(self)
    }

    fn parse(env: &RequestEnvelope) -> Result<Self, ProtocolError> {
        mcp_protocol::parser::parse_server_request(env)
    }
}

/// An inbound notification type: parseable (dropping unknown methods per
/// spec §4.1) and able to identify itself as a cancellation so the
/// coordinator can special-case it (spec §4.3 "Cancellation semantics").
pub trait InboundNotification: Sized + Send + 'static {
    fn parse(env: &NotificationEnvelope) -> Option<Self>;
    fn method(&self) -> &'static str;
    fn as_cancelled_request_id(&self) -> Option<&RequestId>;
}

impl InboundNotification for ClientNotification {
    fn parse(env: &NotificationEnvelope) -> Option<Self> {
        mcp_protocol::parser::parse_client_notification(env)
    }

    fn method(&self) -> &'static str {
        ClientNotification::method(self)
    }

    fn as_cancelled_request_id(&self) -> Option<&RequestId> {
        match self {
            ClientNotification::Cancelled(params) => Some(&params.request_id),
            _ => None,
        }
    }
}

impl InboundNotification for ServerNotification {
    fn parse(env: &NotificationEnvelope) -> Option<Self> {
        mcp_protocol::parser::parse_server_notification(env)
    }

    fn method(&self) -> &'static str {
        ServerNotification::method(self)
    }

    fn as_cancelled_request_id(&self) -> Option<&RequestId> {
        match self {
            ServerNotification::Cancelled(params) => Some(&params.request_id),
            _ => None,
        }
    }
}

/// Capabilities advertised by *this* side, used to gate inbound requests
/// against [`InboundRequest::required_capability`] (spec §3 invariant 5 —
/// gating is against what this side advertises, not the peer's).
pub trait CapabilityGate: Send + Sync + 'static {
    fn allows(&self, capability: Capability) -> bool;
}

impl CapabilityGate for ServerCapabilities {
    fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Tools => self.tools.is_some(),
            Capability::Prompts => self.prompts.is_some(),
            Capability::Resources => self.resources.is_some(),
            Capability::Logging => self.logging.is_some(),
            Capability::Completions => self.completions.is_some(),
            Capability::Roots | Capability::Sampling | Capability::Elicitation => false,
        }
    }
}

impl CapabilityGate for ClientCapabilities {
    fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Roots => self.roots.is_some(),
            Capability::Sampling => self.sampling.is_some(),
            Capability::Elicitation => self.elicitation.is_some(),
            Capability::Tools
            | Capability::Prompts
            | Capability::Resources
            | Capability::Logging
            | Capability::Completions => false,
        }
    }
}
