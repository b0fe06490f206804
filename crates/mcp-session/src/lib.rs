//! The session coordinator: peer registry, message coordinator, feature
//! manager traits, and the server/client session façades that wire them
//! together (spec §4.2–§4.3, SPEC_FULL §4.8).

pub mod coordinator;
pub mod dispatch;
pub mod facade;
pub mod managers;
pub mod registry;

pub use coordinator::MessageCoordinator;
pub use dispatch::CapabilityGate;
pub use dispatch::Dispatcher;
pub use dispatch::InboundNotification;
pub use dispatch::InboundRequest;
pub use dispatch::NotificationHandler;
pub use dispatch::OutboundRequest;
pub use facade::ClientSessionDispatcher;
pub use facade::ServerSessionDispatcher;
pub use registry::PeerRegistry;
pub use registry::PeerState;

use std::sync::Arc;

use mcp_transport::transport::Transport;
use mcp_types::capabilities::ClientCapabilities;
use mcp_types::capabilities::ServerCapabilities;
use mcp_types::notification::ClientNotification;
use mcp_types::notification::ServerNotification;
use mcp_types::request::ClientRequest;
use mcp_types::request::ServerRequest;

/// The server-side coordinator: tracks connected clients, dispatches their
/// `ClientRequest`s, and sends `ServerRequest`s back out.
pub type ServerCoordinator = MessageCoordinator<
    ClientCapabilities,
    ServerRequest,
    ClientRequest,
    ClientNotification,
    ServerSessionDispatcher,
    ServerCapabilities,
>;

/// The client-side coordinator: tracks connected servers, dispatches their
/// `ServerRequest`s, and sends `ClientRequest`s back out.
pub type ClientCoordinator = MessageCoordinator<
    ServerCapabilities,
    ClientRequest,
    ServerRequest,
    ServerNotification,
    ClientSessionDispatcher,
    ClientCapabilities,
>;

pub fn new_server_coordinator(
    transport: Arc<dyn Transport>,
    dispatcher: ServerSessionDispatcher,
    own_capabilities: ServerCapabilities,
) -> ServerCoordinator {
    MessageCoordinator::new(transport, dispatcher, own_capabilities)
}

pub fn new_client_coordinator(
    transport: Arc<dyn Transport>,
    dispatcher: ClientSessionDispatcher,
    own_capabilities: ClientCapabilities,
) -> ClientCoordinator {
    MessageCoordinator::new(transport, dispatcher, own_capabilities)
}
