//! End-to-end coordinator tests: two coordinators wired together over
//! in-process channel transports, standing in for a real stdio pipe the way
//! the teacher's `mcp-server/tests/common/mcp_process.rs` stands in a real
//! child process (spec §8 scenarios 1-4).

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_session::facade::ClientSessionDispatcher;
use mcp_session::facade::ServerSessionDispatcher;
use mcp_session::managers::tools::InMemoryToolsManager;
use mcp_session::new_client_coordinator;
use mcp_session::new_server_coordinator;
use mcp_session::registry::PeerRegistry;
use mcp_transport::transport::PeerMessage;
use mcp_transport::transport::Transport;
use mcp_types::capabilities::ClientCapabilities;
use mcp_types::capabilities::Implementation;
use mcp_types::capabilities::ProtocolVersion;
use mcp_types::capabilities::ServerCapabilities;
use mcp_types::capabilities::ToolsCapability;
use mcp_types::content::Content;
use mcp_types::envelope::Frame;
use mcp_types::lifecycle::InitializeParams;
use mcp_types::request::ClientRequest;
use mcp_types::result::ServerResult;
use mcp_types::tools::CallToolParams;
use mcp_types::tools::CallToolResult;
use mcp_types::tools::ListToolsParams;
use mcp_types::tools::Tool;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_stream::wrappers::ReceiverStream;

const PEER: &str = "peer";

/// An in-process, channel-backed `Transport` standing in for a real pipe.
struct ChannelTransport {
    outbound: mpsc::Sender<PeerMessage>,
    inbound: StdMutex<Option<mpsc::Receiver<PeerMessage>>>,
    open: AtomicBool,
}

impl ChannelTransport {
    fn new(outbound: mpsc::Sender<PeerMessage>, inbound: mpsc::Receiver<PeerMessage>) -> Self {
        ChannelTransport {
            outbound,
            inbound: StdMutex::new(Some(inbound)),
            open: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn peer_messages(&self) -> Option<ReceiverStream<PeerMessage>> {
        self.inbound
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .map(ReceiverStream::new)
    }

    async fn send(&self, _peer_id: &str, frame: Frame) -> Result<(), ProtocolError> {
        self.outbound
            .send(PeerMessage { peer_id: PEER.to_string(), frame })
            .await
            .map_err(|_| ProtocolError::ConnectionError("peer disconnected".to_string()))
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

fn paired_transports() -> (ChannelTransport, ChannelTransport) {
    let (client_to_server_tx, client_to_server_rx) = mpsc::channel(32);
    let (server_to_client_tx, server_to_client_rx) = mpsc::channel(32);
    let client = ChannelTransport::new(client_to_server_tx, server_to_client_rx);
    let server = ChannelTransport::new(server_to_client_tx, client_to_server_rx);
    (client, server)
}

fn echo_tool() -> Tool {
    Tool {
        name: "echo".to_string(),
        description: Some("echoes its input".to_string()),
        input_schema: serde_json::json!({"type": "object"}),
    }
}

async fn start_session() -> (mcp_session::ClientCoordinator, mcp_session::ServerCoordinator, Arc<InMemoryToolsManager>) {
    let (client_transport, server_transport) = paired_transports();

    let tools = Arc::new(InMemoryToolsManager::new());
    tools
        .register(
            echo_tool(),
            Box::new(|_peer, args| {
                Box::pin(async move {
                    CallToolResult {
                        content: vec![Content::text(args.map(|v| v.to_string()).unwrap_or_default())],
                        is_error: false,
                    }
                })
            }),
        )
        .await;
    tools
        .register(
            Tool {
                name: "slow".to_string(),
                description: Some("never finishes within a test's patience".to_string()),
                input_schema: serde_json::json!({"type": "object"}),
            },
            Box::new(|_peer, _args| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    CallToolResult { content: vec![], is_error: false }
                })
            }),
        )
        .await;

    let mut server_dispatcher = ServerSessionDispatcher::new(
        Arc::new(Mutex::new(PeerRegistry::new())),
        Implementation {
            name: "test-server".to_string(),
            version: "0.1.0".to_string(),
            title: None,
        },
        ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: Some(false) }),
            ..Default::default()
        },
    );
    server_dispatcher.tools = Some(tools.clone());

    let client_dispatcher = ClientSessionDispatcher::new(Arc::new(Mutex::new(PeerRegistry::new())));

    let server_coordinator = new_server_coordinator(
        Arc::new(server_transport),
        server_dispatcher,
        ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: Some(false) }),
            ..Default::default()
        },
    );
    let client_coordinator =
        new_client_coordinator(Arc::new(client_transport), client_dispatcher, ClientCapabilities::default());

    let Ok(()) = server_coordinator.start().await else {
        panic!("server transport starts cleanly in tests");
    };
    let Ok(()) = client_coordinator.start().await else {
        panic!("client transport starts cleanly in tests");
    };

    (client_coordinator, server_coordinator, tools)
}

async fn initialize(client: &mcp_session::ClientCoordinator) -> ServerResult {
    let outcome = client
        .send_request_to_peer(
            PEER,
            ClientRequest::Initialize(InitializeParams {
                protocol_version: ProtocolVersion::latest(),
                capabilities: ClientCapabilities::default(),
                client_info: Implementation {
                    name: "test-client".to_string(),
                    version: "0.1.0".to_string(),
                    title: None,
                },
            }),
            Some(Duration::from_secs(5)),
        )
        .await;
    let Ok(result) = outcome else {
        panic!("initialize succeeds against a freshly started server");
    };
    result
}

/// Scenario 1: a client that completes the handshake can then send further
/// requests — proving the coordinator marks its own outbound registry entry
/// initialized after a successful `initialize` round-trip.
#[tokio::test]
async fn initialize_then_call_tool_round_trips() {
    let (client, _server, _tools) = start_session().await;

    let initialize_result = initialize(&client).await;
    assert!(matches!(initialize_result, ServerResult::Initialize(_)));

    let outcome = client
        .send_request_to_peer(
            PEER,
            ClientRequest::ListTools(ListToolsParams { cursor: None }),
            Some(Duration::from_secs(5)),
        )
        .await;
    let Ok(ServerResult::ListTools(listed)) = outcome else {
        panic!("tools/list after initialize must succeed");
    };
    assert_eq!(listed.tools.len(), 1);

    let outcome = client
        .send_request_to_peer(
            PEER,
            ClientRequest::CallTool(CallToolParams {
                name: "echo".to_string(),
                arguments: Some(serde_json::json!("hi")),
            }),
            Some(Duration::from_secs(5)),
        )
        .await;
    let Ok(ServerResult::CallTool(result)) = outcome else {
        panic!("tools/call after initialize must succeed");
    };
    assert!(!result.is_error);
}

/// Scenario: requests sent before the handshake completes are rejected
/// locally without ever touching the transport.
#[tokio::test]
async fn requests_before_initialize_are_rejected() {
    let (client, _server, _tools) = start_session().await;

    let outcome = client
        .send_request_to_peer(
            PEER,
            ClientRequest::ListTools(ListToolsParams { cursor: None }),
            Some(Duration::from_secs(5)),
        )
        .await;
    assert!(matches!(outcome, Err(ProtocolError::InvalidRequest(_))));
}

/// Scenario 2: a protocol version mismatch is rejected and leaves the peer
/// uninitialized rather than panicking or hanging. The mismatch is detected
/// and coded on the server side (spec §7's `ProtocolVersionMismatch`); once
/// it crosses the wire as a JSON-RPC error object the client sees it as a
/// generic protocol error carrying the server's message, the same way the
/// teacher's own client surfaces peer-side JSON-RPC errors.
#[tokio::test]
async fn mismatched_protocol_version_is_rejected_end_to_end() {
    let (client, _server, _tools) = start_session().await;

    let outcome = client
        .send_request_to_peer(
            PEER,
            ClientRequest::Initialize(InitializeParams {
                protocol_version: ProtocolVersion("1999-01-01".to_string()),
                capabilities: ClientCapabilities::default(),
                client_info: Implementation::default(),
            }),
            Some(Duration::from_secs(5)),
        )
        .await;
    let Err(ProtocolError::InternalError(message)) = outcome else {
        panic!("a version mismatch surfaces to the client as a coded protocol error");
    };
    assert!(message.contains("protocol version mismatch"));
}

/// Scenario 3: cancelling an in-flight outbound request resolves it locally
/// with `Cancelled` instead of waiting out the full timeout.
#[tokio::test]
async fn cancelling_an_in_flight_request_resolves_it_as_cancelled() {
    let (client, _server, _tools) = start_session().await;
    initialize(&client).await;

    let client = Arc::new(client);
    let slow_call = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .send_request_to_peer(
                    PEER,
                    ClientRequest::CallTool(CallToolParams {
                        name: "slow".to_string(),
                        arguments: None,
                    }),
                    Some(Duration::from_secs(10)),
                )
                .await
        })
    };

    let request_id = loop {
        let ids: Vec<_> = {
            let registry = client.registry();
            let registry = registry.lock().await;
            registry
                .get(PEER)
                .map(|peer| peer.requests_to_peer.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default()
        };
        if let Some(id) = ids.into_iter().next() {
            break id;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };

    let cancelled = client.cancel_request_to_peer(PEER, request_id).await;
    assert!(cancelled);

    let Ok(outcome) = slow_call.await else {
        panic!("the spawned send task does not panic");
    };
    assert!(matches!(outcome, Err(ProtocolError::Cancelled)));
}

/// Scenario 4: two concurrent requests resolve against their own ids, not
/// each other's.
#[tokio::test]
async fn concurrent_requests_correlate_to_their_own_responses() {
    let (client, _server, _tools) = start_session().await;
    initialize(&client).await;

    let client = Arc::new(client);
    let a = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .send_request_to_peer(
                    PEER,
                    ClientRequest::CallTool(CallToolParams {
                        name: "echo".to_string(),
                        arguments: Some(serde_json::json!("first")),
                    }),
                    Some(Duration::from_secs(5)),
                )
                .await
        })
    };
    let b = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .send_request_to_peer(
                    PEER,
                    ClientRequest::CallTool(CallToolParams {
                        name: "echo".to_string(),
                        arguments: Some(serde_json::json!("second")),
                    }),
                    Some(Duration::from_secs(5)),
                )
                .await
        })
    };

    let Ok(a) = a.await else {
        panic!("task a does not panic");
    };
    let Ok(b) = b.await else {
        panic!("task b does not panic");
    };
    let Ok(ServerResult::CallTool(a)) = a else {
        panic!("first call_tool must succeed");
    };
    let Ok(ServerResult::CallTool(b)) = b else {
        panic!("second call_tool must succeed");
    };
    let Content::Text { text: a_text } = &a.content[0] else {
        panic!("echo tool always returns text content");
    };
    let Content::Text { text: b_text } = &b.content[0] else {
        panic!("echo tool always returns text content");
    };
    assert!(a_text.contains("first"));
    assert!(b_text.contains("second"));
}
