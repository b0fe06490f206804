use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::Sse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use futures::stream::Stream;
use futures::StreamExt;
use mcp_types::envelope::Frame;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::http::session::SessionManager;
use crate::http::session::SESSION_HEADER;
use crate::http::stream::StreamItem;
use crate::http::stream::StreamManager;
use crate::transport::PeerMessage;

const PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";

/// What the router hands to application code for every inbound POST/GET —
/// the coordinator's transport glue lives downstream of this, not in
/// `mcp-transport` itself (spec §4.4 describes the server-side mechanics;
/// wiring them to a running coordinator is `mcp-session`'s job).
#[derive(Clone)]
pub struct StreamableHttpServer {
    pub sessions: SessionManager,
    pub streams: StreamManager,
    inbound: mpsc::Sender<PeerMessage>,
}

impl StreamableHttpServer {
    pub fn new(inbound: mpsc::Sender<PeerMessage>) -> Self {
        StreamableHttpServer {
            sessions: SessionManager::new(),
            streams: StreamManager::new(),
            inbound,
        }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route(
                "/",
                get(handle_get).post(handle_post).delete(handle_delete),
            )
            .with_state(Arc::new(self))
    }
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
}

fn missing_protocol_version(headers: &HeaderMap) -> bool {
    headers.get(PROTOCOL_VERSION_HEADER).is_none()
}

async fn handle_post(
    State(server): State<Arc<StreamableHttpServer>>,
    headers: HeaderMap,
    Json(frame): Json<Frame>,
) -> Response {
    if missing_protocol_version(&headers) {
        return (StatusCode::BAD_REQUEST, "missing MCP-Protocol-Version header").into_response();
    }

    let wants_sse = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false);

    let is_initialize = matches!(
        &frame,
        Frame::Single(msg) if msg.method.as_deref() == Some(mcp_types::lifecycle::METHOD_INITIALIZE)
    );

    let session = if is_initialize {
        server.sessions.create_session().await
    } else {
        match session_id_from_headers(&headers) {
            Some(id) => match server.sessions.get(id).await {
                Some(session) => session,
                None => return StatusCode::NOT_FOUND.into_response(),
            },
            None => return (StatusCode::BAD_REQUEST, "missing Mcp-Session-Id").into_response(),
        }
    };

    let request_id = match &frame {
        Frame::Single(msg) => msg
            .id
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        Frame::Batch(_) => None,
    };

    let peer_id = session.session_id.to_string();
    if server
        .inbound
        .send(PeerMessage { peer_id, frame })
        .await
        .is_err()
    {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    if !wants_sse || request_id.is_none() {
        let mut response = StatusCode::ACCEPTED.into_response();
        if is_initialize {
            if let Ok(value) = session.session_id.to_string().parse() {
                response.headers_mut().insert(SESSION_HEADER, value);
            }
        }
        return response;
    }

    let (_stream, rx) = server
        .streams
        .open_stream(session.client_id, request_id)
        .await;
    sse_response(rx, Some(session.session_id))
}

async fn handle_get(
    State(server): State<Arc<StreamableHttpServer>>,
    headers: HeaderMap,
) -> Response {
    let Some(session_id) = session_id_from_headers(&headers) else {
        return (StatusCode::BAD_REQUEST, "missing Mcp-Session-Id").into_response();
    };
    let Some(session) = server.sessions.get(session_id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let (_stream, rx) = server.streams.open_stream(session.client_id, None).await;
    sse_response(rx, None)
}

async fn handle_delete(
    State(server): State<Arc<StreamableHttpServer>>,
    headers: HeaderMap,
) -> Response {
    let Some(session_id) = session_id_from_headers(&headers) else {
        return (StatusCode::BAD_REQUEST, "missing Mcp-Session-Id").into_response();
    };
    if server.sessions.remove(session_id).await {
        StatusCode::OK.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

fn sse_response(
    rx: mpsc::Receiver<StreamItem>,
    session_id: Option<Uuid>,
) -> Response {
    let event_stream = ReceiverStream::new(rx).take_while(|item| {
        futures::future::ready(!matches!(item, StreamItem::Close))
    });
    let events = to_sse_events(event_stream);
    let mut response = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    if let Some(session_id) = session_id {
        if let Ok(value) = session_id.to_string().parse() {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
    }
    response
}

fn to_sse_events(
    stream: impl Stream<Item = StreamItem> + Send + 'static,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    stream.filter_map(|item| async move {
        match item {
            StreamItem::Frame(frame) => serde_json::to_string(&frame)
                .ok()
                .map(|body| Ok(Event::default().data(body))),
            StreamItem::Close => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_header_roundtrips_through_a_header_value() -> Result<(), Box<dyn std::error::Error>> {
        let mut headers = HeaderMap::new();
        let id = Uuid::new_v4();
        headers.insert(SESSION_HEADER, id.to_string().parse()?);
        assert_eq!(session_id_from_headers(&headers), Some(id));
        Ok(())
    }

    #[test]
    fn missing_protocol_version_header_is_detected() {
        let headers = HeaderMap::new();
        assert!(missing_protocol_version(&headers));
    }
}
