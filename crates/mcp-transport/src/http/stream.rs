use std::collections::HashMap;
use std::sync::Arc;

use mcp_protocol::error::ProtocolError;
use mcp_types::envelope::Frame;
use mcp_types::id::RequestId;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Pushed into a stream's queue to unblock its SSE generator without
/// sending a real message (spec §4.4 "close-sentinel").
pub enum StreamItem {
    Frame(Frame),
    Close,
}

/// One SSE stream held open for a client. `originating_request_id` is
/// `Some` for a response stream (spawned from a POST carrying a request)
/// and `None` for a server stream (spawned from a bare GET).
pub struct Stream {
    pub stream_id: Uuid,
    pub originating_request_id: Option<RequestId>,
    sender: mpsc::Sender<StreamItem>,
}

impl Stream {
    pub async fn push(&self, item: StreamItem) -> Result<(), ProtocolError> {
        self.sender
            .send(item)
            .await
            .map_err(|_| ProtocolError::ConnectionError("stream receiver dropped".to_string()))
    }
}

struct ClientStreams {
    streams: Vec<Arc<Stream>>,
}

/// Owns all SSE streams for all clients, keyed by `client_id` (spec §4.4).
/// Routing: a message carrying an `originating_request_id` goes to the
/// unique stream awaiting that id and auto-closes it once the response
/// frame ships; anything else goes to any open stream for the client
/// without closing it.
#[derive(Default, Clone)]
pub struct StreamManager {
    by_client: Arc<RwLock<HashMap<Uuid, ClientStreams>>>,
}

pub const STREAM_QUEUE_CAPACITY: usize = 32;

impl StreamManager {
    pub fn new() -> Self {
        StreamManager::default()
    }

    pub async fn open_stream(
        &self,
        client_id: Uuid,
        originating_request_id: Option<RequestId>,
    ) -> (Arc<Stream>, mpsc::Receiver<StreamItem>) {
        let (tx, rx) = mpsc::channel(STREAM_QUEUE_CAPACITY);
        let stream = Arc::new(Stream {
            stream_id: Uuid::new_v4(),
            originating_request_id,
            sender: tx,
        });
        let mut by_client = self.by_client.write().await;
        by_client
            .entry(client_id)
            .or_insert_with(|| ClientStreams { streams: Vec::new() })
            .streams
            .push(stream.clone());
        (stream, rx)
    }

    pub async fn close_stream(&self, client_id: Uuid, stream_id: Uuid) {
        let mut by_client = self.by_client.write().await;
        if let Some(client_streams) = by_client.get_mut(&client_id) {
            client_streams.streams.retain(|s| s.stream_id != stream_id);
            if client_streams.streams.is_empty() {
                by_client.remove(&client_id);
            }
        }
    }

    /// Route an outbound frame per spec §4.4. If the frame is a response
    /// whose id matches a stream's `originating_request_id`, it is sent
    /// there and that stream is closed. Otherwise it is sent to any open
    /// stream for the client. `NoStream` if none match.
    pub async fn route(
        &self,
        client_id: Uuid,
        originating_request_id: Option<&RequestId>,
        frame: Frame,
    ) -> Result<(), ProtocolError> {
        let by_client = self.by_client.read().await;
        let client_streams = by_client
            .get(&client_id)
            .ok_or(ProtocolError::NoStream)?;

        if let Some(request_id) = originating_request_id {
            let target = client_streams
                .streams
                .iter()
                .find(|s| s.originating_request_id.as_ref() == Some(request_id))
                .ok_or(ProtocolError::NoStream)?
                .clone();
            drop(by_client);
            target.push(StreamItem::Frame(frame)).await?;
            target.push(StreamItem::Close).await?;
            self.close_stream(client_id, target.stream_id).await;
            return Ok(());
        }

        let target = client_streams
            .streams
            .first()
            .ok_or(ProtocolError::NoStream)?
            .clone();
        drop(by_client);
        target.push(StreamItem::Frame(frame)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_types::envelope::RawMessage;

    fn response_frame(id: i64) -> Frame {
        Frame::Single(RawMessage::response(
            RequestId::Integer(id),
            serde_json::json!({"ok": true}),
        ))
    }

    #[tokio::test]
    async fn routing_with_no_streams_for_client_is_no_stream_error() {
        let manager = StreamManager::new();
        let result = manager
            .route(Uuid::new_v4(), None, response_frame(1))
            .await;
        assert_eq!(result, Err(ProtocolError::NoStream));
    }

    #[tokio::test]
    async fn response_stream_auto_closes_after_matching_response() -> Result<(), Box<dyn std::error::Error>> {
        let manager = StreamManager::new();
        let client_id = Uuid::new_v4();
        let request_id = RequestId::Integer(1);
        let (_stream, mut rx) = manager
            .open_stream(client_id, Some(request_id.clone()))
            .await;

        manager
            .route(client_id, Some(&request_id), response_frame(1))
            .await?;

        let first = rx.recv().await.ok_or("expected frame item")?;
        assert!(matches!(first, StreamItem::Frame(_)));
        let second = rx.recv().await.ok_or("expected close sentinel")?;
        assert!(matches!(second, StreamItem::Close));

        let result = manager
            .route(client_id, Some(&request_id), response_frame(1))
            .await;
        assert_eq!(result, Err(ProtocolError::NoStream));
        Ok(())
    }

    #[tokio::test]
    async fn notification_goes_to_any_open_stream_without_closing_it() -> Result<(), Box<dyn std::error::Error>> {
        let manager = StreamManager::new();
        let client_id = Uuid::new_v4();
        let (_stream, mut rx) = manager.open_stream(client_id, None).await;

        let notification = Frame::Single(RawMessage::notification(
            "notifications/progress",
            serde_json::json!({}),
        ));
        manager.route(client_id, None, notification).await?;

        let item = rx.recv().await.ok_or("expected frame item")?;
        assert!(matches!(item, StreamItem::Frame(_)));

        // Stream is still open: a second message should route fine.
        let second = Frame::Single(RawMessage::notification(
            "notifications/progress",
            serde_json::json!({}),
        ));
        manager.route(client_id, None, second).await?;
        Ok(())
    }
}
