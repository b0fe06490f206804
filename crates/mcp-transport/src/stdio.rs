use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::envelope::Frame;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_stream::wrappers::ReceiverStream;

use crate::transport::PeerMessage;
use crate::transport::Transport;

/// Every stdio peer has the same identity: there is exactly one counterparty
/// on the other end of the pipe.
pub const STDIO_PEER_ID: &str = "stdio";

/// Newline-delimited JSON over an arbitrary `AsyncRead`/`AsyncWrite` pair —
/// in production, a child process's stdout/stdin. Invalid JSON lines are
/// logged and skipped rather than tearing down the transport (spec §6
/// "invalid JSON lines logged to stderr and skipped").
pub struct StdioTransport<W> {
    writer: Arc<Mutex<W>>,
    receiver: std::sync::Mutex<Option<mpsc::Receiver<PeerMessage>>>,
    open: Arc<AtomicBool>,
    reader_task: tokio::task::JoinHandle<()>,
}

impl<W: AsyncWrite + Unpin + Send + 'static> StdioTransport<W> {
    pub fn new<R>(reader: R, writer: W) -> Self
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        let open = Arc::new(AtomicBool::new(true));
        let open_for_task = open.clone();
        let reader_task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Frame>(&line) {
                            Ok(frame) => {
                                let message = PeerMessage {
                                    peer_id: STDIO_PEER_ID.to_string(),
                                    frame,
                                };
                                if tx.send(message).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, line = %line, "skipping invalid JSON line on stdio transport");
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdio read error, closing transport");
                        break;
                    }
                }
            }
            open_for_task.store(false, Ordering::SeqCst);
        });

        StdioTransport {
            writer: Arc::new(Mutex::new(writer)),
            receiver: std::sync::Mutex::new(Some(rx)),
            open,
            reader_task,
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + 'static> Transport for StdioTransport<W> {
    fn peer_messages(&self) -> Option<ReceiverStream<PeerMessage>> {
        self.receiver
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .map(ReceiverStream::new)
    }

    async fn send(&self, _peer_id: &str, frame: Frame) -> Result<(), ProtocolError> {
        let line = serde_json::to_string(&frame)
            .map_err(|e| ProtocolError::InternalError(format!("failed to encode frame: {e}")))?;
        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ProtocolError::ConnectionError(e.to_string()))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| ProtocolError::ConnectionError(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| ProtocolError::ConnectionError(e.to_string()))
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.reader_task.abort();
    }
}
