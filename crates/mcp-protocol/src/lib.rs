//! Validates JSON-RPC envelopes against the MCP method table and converts
//! between the wire representation (`mcp_types::envelope::RawMessage`) and
//! the typed request/notification/result sum types in `mcp-types`.
//!
//! Dispatch, peer state, and transport all live above this crate; this crate
//! only classifies and parses.

pub mod error;
pub mod parser;
pub mod version;

pub use error::OAuthError;
pub use error::ProtocolError;
pub use parser::classify;
pub use parser::is_valid_notification;
pub use parser::is_valid_request;
pub use parser::is_valid_response;
pub use parser::parse_client_notification;
pub use parser::parse_client_request;
pub use parser::parse_result_for_client_request;
pub use parser::parse_result_for_server_request;
pub use parser::parse_server_notification;
pub use parser::parse_server_request;
pub use parser::Classified;
pub use parser::NotificationEnvelope;
pub use parser::RequestEnvelope;
pub use parser::ResponseEnvelope;
pub use version::check_protocol_version;
