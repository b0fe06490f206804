//! Wire types for the Model Context Protocol: the JSON-RPC 2.0 envelope,
//! the per-method request/notification/result sum types, and the capability
//! and content schemas they carry.
//!
//! This crate only describes shapes — parsing rules, dispatch, and
//! validation live in `mcp-protocol`.

pub mod capabilities;
pub mod completion;
pub mod content;
pub mod elicitation;
pub mod envelope;
pub mod id;
pub mod lifecycle;
pub mod notification;
pub mod prompts;
pub mod request;
pub mod resources;
pub mod result;
pub mod roots;
pub mod sampling;
pub mod tools;

pub use capabilities::ClientCapabilities;
pub use capabilities::Implementation;
pub use capabilities::ProtocolVersion;
pub use capabilities::ServerCapabilities;
pub use content::Content;
pub use content::Role;
pub use envelope::Frame;
pub use envelope::JsonRpcErrorObject;
pub use envelope::RawMessage;
pub use envelope::JSONRPC_VERSION;
pub use id::RequestId;
pub use id::RequestIdGenerator;
pub use notification::ClientNotification;
pub use notification::ServerNotification;
pub use request::Capability;
pub use request::ClientRequest;
pub use request::ServerRequest;
pub use result::ClientResult;
pub use result::ServerResult;
