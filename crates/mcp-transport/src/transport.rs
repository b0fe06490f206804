use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::envelope::Frame;
use tokio_stream::wrappers::ReceiverStream;

/// An inbound message from some peer, already deframed from whatever the
/// wire transport looks like. `peer_id` is opaque to the transport itself —
/// the coordinator assigns it meaning.
#[derive(Debug, Clone)]
pub struct PeerMessage {
    pub peer_id: String,
    pub frame: Frame,
}

/// Delivers framed messages per peer and accepts outbound ones (spec §2
/// "Transport (stdio, HTTP)"). Implementors own their own stream lifecycle;
/// the coordinator only calls `peer_messages`/`send`/`close`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Take the inbound message stream. Implementations only support taking
    /// this once; a second call returns `None`. `&self` (not `&mut self`) so
    /// coordinators can hold the transport behind an `Arc<dyn Transport>`.
    fn peer_messages(&self) -> Option<ReceiverStream<PeerMessage>>;

    async fn send(&self, peer_id: &str, frame: Frame) -> Result<(), ProtocolError>;

    fn is_open(&self) -> bool;

    async fn close(&self);
}
