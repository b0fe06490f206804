//! Transports that deliver framed JSON-RPC messages between MCP peers:
//! newline-delimited stdio and the streamable HTTP transport (spec §2, §4.4,
//! §4.5, §6).

pub mod http;
pub mod stdio;
pub mod transport;

pub use stdio::StdioTransport;
pub use stdio::STDIO_PEER_ID;
pub use transport::PeerMessage;
pub use transport::Transport;
