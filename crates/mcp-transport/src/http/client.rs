use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use mcp_protocol::error::ProtocolError;
use mcp_types::envelope::Frame;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tokio_stream::wrappers::ReceiverStream;

use crate::http::session::SESSION_HEADER;
use crate::transport::PeerMessage;
use crate::transport::Transport;

const PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";
const ACCEPT_VALUE: &str = "application/json, text/event-stream";

/// One server endpoint's half of the streamable HTTP transport (spec §4.5).
/// Holds the endpoint URL, an optional session id persisted from
/// `initialize`, and the unified inbound queue every POST/GET response
/// ultimately feeds.
pub struct HttpClientTransport {
    http: reqwest::Client,
    endpoint: String,
    protocol_version: String,
    session_id: RwLock<Option<String>>,
    inbound_tx: mpsc::Sender<PeerMessage>,
    inbound_rx: std::sync::Mutex<Option<mpsc::Receiver<PeerMessage>>>,
    open: Arc<AtomicBool>,
    peer_id: String,
}

impl HttpClientTransport {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, protocol_version: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let (tx, rx) = mpsc::channel(64);
        HttpClientTransport {
            http,
            peer_id: endpoint.clone(),
            endpoint,
            protocol_version: protocol_version.into(),
            session_id: RwLock::new(None),
            inbound_tx: tx,
            inbound_rx: std::sync::Mutex::new(Some(rx)),
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }

    async fn post_frame(&self, frame: &Frame) -> Result<reqwest::Response, ProtocolError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, ACCEPT_VALUE)
            .header(PROTOCOL_VERSION_HEADER, &self.protocol_version)
            .json(frame)
            .timeout(std::time::Duration::from_secs(30));

        if let Some(session_id) = self.session_id().await {
            request = request.header(SESSION_HEADER, session_id);
        }

        request
            .send()
            .await
            .map_err(|e| ProtocolError::ConnectionError(e.to_string()))
    }

    fn is_initialize(frame: &Frame) -> bool {
        matches!(
            frame,
            Frame::Single(msg) if msg.method.as_deref() == Some(mcp_types::lifecycle::METHOD_INITIALIZE)
        )
    }

    async fn handle_json_response(&self, response: reqwest::Response) -> Result<(), ProtocolError> {
        let frame: Frame = response
            .json()
            .await
            .map_err(|e| ProtocolError::ConnectionError(e.to_string()))?;
        self.enqueue(frame).await
    }

    async fn handle_sse_response(&self, response: reqwest::Response) -> Result<(), ProtocolError> {
        let tx = self.inbound_tx.clone();
        let peer_id = self.peer_id.clone();
        let open = self.open.clone();
        tokio::spawn(async move {
            let mut stream = response.bytes_stream().eventsource();
            while let Some(event) = stream.next().await {
                if !open.load(Ordering::SeqCst) {
                    break;
                }
                let Ok(event) = event else { break };
                let Ok(frame) = serde_json::from_str::<Frame>(&event.data) else {
                    continue;
                };
                if tx
                    .send(PeerMessage {
                        peer_id: peer_id.clone(),
                        frame,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });
        Ok(())
    }

    async fn enqueue(&self, frame: Frame) -> Result<(), ProtocolError> {
        self.inbound_tx
            .send(PeerMessage {
                peer_id: self.peer_id.clone(),
                frame,
            })
            .await
            .map_err(|_| ProtocolError::ConnectionError("inbound receiver dropped".to_string()))
    }

    async fn persist_session_id(&self, response: &reqwest::Response) {
        if let Some(value) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.session_id.write().await = Some(value.to_string());
        }
    }

    pub async fn disconnect(&self) {
        if let Some(session_id) = self.session_id().await {
            let _ = self
                .http
                .delete(&self.endpoint)
                .header(SESSION_HEADER, session_id)
                .timeout(std::time::Duration::from_secs(10))
                .send()
                .await;
        }
        self.open.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for HttpClientTransport {
    fn peer_messages(&self) -> Option<ReceiverStream<PeerMessage>> {
        self.inbound_rx
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .map(ReceiverStream::new)
    }

    async fn send(&self, _peer_id: &str, frame: Frame) -> Result<(), ProtocolError> {
        let is_init = Self::is_initialize(&frame);
        let response = self.post_frame(&frame).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            *self.session_id.write().await = None;
            return Err(ProtocolError::ConnectionError(
                "session expired (404); re-initialize required".to_string(),
            ));
        }

        if !status.is_success() {
            return Err(ProtocolError::ConnectionError(format!(
                "unexpected status {status}"
            )));
        }

        if is_init {
            self.persist_session_id(&response).await;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.contains("text/event-stream") {
            self.handle_sse_response(response).await
        } else if content_type.contains("application/json") {
            self.handle_json_response(response).await
        } else {
            Ok(())
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.disconnect().await;
    }
}
