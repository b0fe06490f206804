use std::collections::HashMap;

use mcp_protocol::error::ProtocolError;
use mcp_types::capabilities::Implementation;
use mcp_types::capabilities::ProtocolVersion;
use mcp_types::id::RequestId;
use mcp_types::lifecycle::LoggingLevel;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::dispatch::OutboundRequest;

/// Work we owe the peer: a handler task spawned for one of its inbound
/// requests, tracked so `notifications/cancelled` can abort it (spec §4.2).
pub struct TrackedInbound {
    pub method: String,
    pub handle: JoinHandle<()>,
}

/// A completion slot we are waiting on for a request we sent the peer.
/// `slot` is `None` once resolved — resolution is idempotent (invariant 3).
pub struct TrackedOutbound<Out: OutboundRequest> {
    pub request: Out,
    slot: Option<oneshot::Sender<Result<serde_json::Value, ProtocolError>>>,
}

/// One record per connected peer (spec §3 "Peer state"). `Capabilities` is
/// the type advertised by *that peer*: `ClientCapabilities` when this
/// registry tracks clients-of-a-server, `ServerCapabilities` when it tracks
/// servers-of-a-client. `Out` is the request type this side sends to that
/// peer, used only to type `requests_to_peer`'s stored originals.
pub struct PeerState<Capabilities, Out: OutboundRequest> {
    pub capabilities: Option<Capabilities>,
    pub info: Option<Implementation>,
    pub protocol_version: Option<ProtocolVersion>,
    pub initialized: bool,
    pub log_level: Option<LoggingLevel>,
    pub requests_from_peer: HashMap<RequestId, TrackedInbound>,
    pub requests_to_peer: HashMap<RequestId, TrackedOutbound<Out>>,
}

impl<Capabilities, Out: OutboundRequest> Default for PeerState<Capabilities, Out> {
    fn default() -> Self {
        PeerState {
            capabilities: None,
            info: None,
            protocol_version: None,
            initialized: false,
            log_level: None,
            requests_from_peer: HashMap::new(),
            requests_to_peer: HashMap::new(),
        }
    }
}

/// Pure in-memory `peer_id -> PeerState` map (spec §4.2). All operations are
/// O(1) and non-blocking; callers hold the coordinator's single-threaded
/// loop or a mutex around the whole map, never a lock spanning I/O.
pub struct PeerRegistry<Capabilities, Out: OutboundRequest> {
    peers: HashMap<String, PeerState<Capabilities, Out>>,
}

impl<Capabilities, Out: OutboundRequest> PeerRegistry<Capabilities, Out> {
    pub fn new() -> Self {
        PeerRegistry { peers: HashMap::new() }
    }

    pub fn register(&mut self, peer_id: impl Into<String>) -> &mut PeerState<Capabilities, Out> {
        self.peers.entry(peer_id.into()).or_default()
    }

    pub fn unregister(&mut self, peer_id: &str) -> Option<PeerState<Capabilities, Out>> {
        self.peers.remove(peer_id)
    }

    pub fn get(&self, peer_id: &str) -> Option<&PeerState<Capabilities, Out>> {
        self.peers.get(peer_id)
    }

    pub fn get_mut(&mut self, peer_id: &str) -> Option<&mut PeerState<Capabilities, Out>> {
        self.peers.get_mut(peer_id)
    }

    pub fn count(&self) -> usize {
        self.peers.len()
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn peer_ids(&self) -> Vec<String> {
        self.peers.keys().cloned().collect()
    }

    pub fn track_request_from_peer(
        &mut self,
        peer_id: &str,
        request_id: RequestId,
        method: impl Into<String>,
        handle: JoinHandle<()>,
    ) {
        if let Some(peer) = self.peers.get_mut(peer_id) {
            peer.requests_from_peer.insert(
                request_id,
                TrackedInbound {
                    method: method.into(),
                    handle,
                },
            );
        }
    }

    pub fn untrack_request_from_peer(
        &mut self,
        peer_id: &str,
        request_id: &RequestId,
    ) -> Option<TrackedInbound> {
        self.peers
            .get_mut(peer_id)
            .and_then(|peer| peer.requests_from_peer.remove(request_id))
    }

    pub fn track_request_to_peer(
        &mut self,
        peer_id: &str,
        request_id: RequestId,
        request: Out,
        slot: oneshot::Sender<Result<serde_json::Value, ProtocolError>>,
    ) {
        if let Some(peer) = self.peers.get_mut(peer_id) {
            peer.requests_to_peer.insert(
                request_id,
                TrackedOutbound {
                    request,
                    slot: Some(slot),
                },
            );
        }
    }

    pub fn untrack_request_to_peer(
        &mut self,
        peer_id: &str,
        request_id: &RequestId,
    ) -> Option<TrackedOutbound<Out>> {
        self.peers
            .get_mut(peer_id)
            .and_then(|peer| peer.requests_to_peer.remove(request_id))
    }

    /// Resolves the slot for `request_id` if it is still pending. Idempotent:
    /// a second call (the slot already gone) is a no-op, not an error.
    pub fn resolve_request_to_peer(
        &mut self,
        peer_id: &str,
        request_id: &RequestId,
        outcome: Result<serde_json::Value, ProtocolError>,
    ) -> bool {
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return false;
        };
        let Some(tracked) = peer.requests_to_peer.get_mut(request_id) else {
            return false;
        };
        let Some(slot) = tracked.slot.take() else {
            return false;
        };
        let _ = slot.send(outcome);
        true
    }

    /// Cancels every inbound handler task and resolves every outbound slot
    /// with an internal error, then drops the record (spec §4.2, invariant 4).
    pub fn cleanup_peer(&mut self, peer_id: &str) {
        let Some(mut peer) = self.peers.remove(peer_id) else {
            return;
        };
        for (_, tracked) in peer.requests_from_peer.drain() {
            tracked.handle.abort();
        }
        for (_, mut tracked) in peer.requests_to_peer.drain() {
            if let Some(slot) = tracked.slot.take() {
                let _ = slot.send(Err(ProtocolError::InternalError(
                    "peer torn down while request was in flight".to_string(),
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_types::request::ClientRequest;

    #[test]
    fn request_id_lives_in_exactly_one_map_at_a_time() {
        let mut registry: PeerRegistry<mcp_types::ClientCapabilities, ClientRequest> =
            PeerRegistry::new();
        registry.register("peer-1");
        let (tx, _rx) = oneshot::channel();
        registry.track_request_to_peer(
            "peer-1",
            RequestId::Integer(1),
            ClientRequest::Ping(mcp_types::lifecycle::EmptyParams::default()),
            tx,
        );
        let Some(peer) = registry.get("peer-1") else {
            panic!("peer-1 registered above, lookup cannot miss");
        };
        assert!(peer.requests_to_peer.contains_key(&RequestId::Integer(1)));
        assert!(!peer.requests_from_peer.contains_key(&RequestId::Integer(1)));
    }

    #[test]
    fn resolving_an_already_resolved_slot_is_a_silent_no_op() {
        let mut registry: PeerRegistry<mcp_types::ClientCapabilities, ClientRequest> =
            PeerRegistry::new();
        registry.register("peer-1");
        let (tx, _rx) = oneshot::channel();
        registry.track_request_to_peer("peer-1", RequestId::Integer(1), ClientRequest::Ping(mcp_types::lifecycle::EmptyParams::default()), tx);

        let first = registry.resolve_request_to_peer(
            "peer-1",
            &RequestId::Integer(1),
            Ok(serde_json::json!({})),
        );
        assert!(first);

        let second = registry.resolve_request_to_peer(
            "peer-1",
            &RequestId::Integer(1),
            Ok(serde_json::json!({})),
        );
        assert!(!second);
    }

    #[test]
    fn cleanup_resolves_pending_slots_with_internal_error() {
        let mut registry: PeerRegistry<mcp_types::ClientCapabilities, ClientRequest> =
            PeerRegistry::new();
        registry.register("peer-1");
        let (tx, mut rx) = oneshot::channel();
        registry.track_request_to_peer("peer-1", RequestId::Integer(1), ClientRequest::Ping(mcp_types::lifecycle::EmptyParams::default()), tx);

        registry.cleanup_peer("peer-1");

        let Ok(outcome) = rx.try_recv() else {
            panic!("cleanup resolves every pending slot synchronously");
        };
        assert!(matches!(outcome, Err(ProtocolError::InternalError(_))));
        assert!(!registry.contains("peer-1"));
    }
}
