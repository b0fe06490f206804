//! Streamable HTTP transport (spec §4.4/§4.5): session tracking, SSE stream
//! multiplexing, and the server/client halves built on top of them.

pub mod client;
pub mod server;
pub mod session;
pub mod stream;

pub use client::HttpClientTransport;
pub use server::StreamableHttpServer;
pub use session::Session;
pub use session::SessionManager;
pub use session::SESSION_HEADER;
pub use stream::Stream;
pub use stream::StreamItem;
pub use stream::StreamManager;
