use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use mcp_protocol::error::ProtocolError;
use mcp_transport::transport::Transport;
use mcp_transport::PeerMessage;
use mcp_types::envelope::Frame;
use mcp_types::envelope::RawMessage;
use mcp_types::id::RequestId;
use mcp_types::id::RequestIdGenerator;
use mcp_types::lifecycle;
use tokio::sync::oneshot;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

use crate::dispatch::CapabilityGate;
use crate::dispatch::Dispatcher;
use crate::dispatch::InboundNotification;
use crate::dispatch::InboundRequest;
use crate::dispatch::NotificationHandler;
use crate::dispatch::OutboundRequest;
use crate::registry::PeerRegistry;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The session coordinator: one read loop per transport, a peer registry,
/// a typed dispatcher, and notification fan-out (spec §4.3). Generic over
/// the peer's capability type (`PeerCaps`), the request type this side
/// sends out (`Out`), the request type this side receives (`In`), the
/// notification type this side receives (`Notif`), the dispatcher
/// implementing `In`'s handling, and this side's own capability set used
/// for gating.
pub struct MessageCoordinator<PeerCaps, Out, In, Notif, D, OwnCaps>
where
    Out: OutboundRequest,
    In: InboundRequest + OutboundRequest,
    Notif: InboundNotification,
    D: Dispatcher<In, Result = In::Result>,
    OwnCaps: CapabilityGate,
{
    transport: Arc<dyn Transport>,
    registry: Arc<Mutex<PeerRegistry<PeerCaps, Out>>>,
    dispatcher: Arc<D>,
    own_capabilities: Arc<OwnCaps>,
    notification_handlers: Arc<Mutex<HashMap<&'static str, Vec<Arc<dyn NotificationHandler>>>>>,
    id_generator: Arc<RequestIdGenerator>,
    running: Arc<AtomicBool>,
    read_loop: Mutex<Option<JoinHandle<()>>>,
    _marker: std::marker::PhantomData<(In, Notif)>,
}

impl<PeerCaps, Out, In, Notif, D, OwnCaps> MessageCoordinator<PeerCaps, Out, In, Notif, D, OwnCaps>
where
    PeerCaps: Send + Sync + 'static,
    Out: OutboundRequest,
    In: InboundRequest + OutboundRequest,
    Notif: InboundNotification,
    D: Dispatcher<In, Result = In::Result> + 'static,
    OwnCaps: CapabilityGate,
{
    pub fn new(transport: Arc<dyn Transport>, dispatcher: D, own_capabilities: OwnCaps) -> Self {
        MessageCoordinator {
            transport,
            registry: Arc::new(Mutex::new(PeerRegistry::new())),
            dispatcher: Arc::new(dispatcher),
            own_capabilities: Arc::new(own_capabilities),
            notification_handlers: Arc::new(Mutex::new(HashMap::new())),
            id_generator: Arc::new(RequestIdGenerator::new()),
            running: Arc::new(AtomicBool::new(false)),
            read_loop: Mutex::new(None),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn registry(&self) -> Arc<Mutex<PeerRegistry<PeerCaps, Out>>> {
        self.registry.clone()
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Idempotent: a second `start()` while already running is a no-op.
    /// Spec §4.3: "fails with a connection error if the transport is closed".
    pub async fn start(&self) -> Result<(), ProtocolError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if !self.transport.is_open() {
            self.running.store(false, Ordering::SeqCst);
            return Err(ProtocolError::ConnectionError(
                "transport is closed".to_string(),
            ));
        }

        let Some(mut messages) = self.transport.peer_messages() else {
            self.running.store(false, Ordering::SeqCst);
            return Err(ProtocolError::ConnectionError(
                "transport's inbound stream was already taken".to_string(),
            ));
        };

        let registry = self.registry.clone();
        let dispatcher = self.dispatcher.clone();
        let own_capabilities = self.own_capabilities.clone();
        let notification_handlers = self.notification_handlers.clone();
        let transport = self.transport.clone();
        let running = self.running.clone();

        let handle = tokio::spawn(async move {
            while let Some(message) = messages.next().await {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                handle_message::<PeerCaps, Out, In, Notif, D, OwnCaps>(
                    message,
                    &registry,
                    &dispatcher,
                    &own_capabilities,
                    &notification_handlers,
                    &transport,
                )
                .await;
            }
            running.store(false, Ordering::SeqCst);
        });

        *self.read_loop.lock().await = Some(handle);
        Ok(())
    }

    /// Idempotent: cancels all in-flight state, joins the loop.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.read_loop.lock().await.take() {
            handle.abort();
            let _ = handle.await;
        }
        let peer_ids: Vec<String> = {
            let registry = self.registry.lock().await;
            registry_peer_ids(&registry)
        };
        let mut registry = self.registry.lock().await;
        for peer_id in peer_ids {
            registry.cleanup_peer(&peer_id);
        }
        self.transport.close().await;
    }

    pub async fn register_notification_handler(
        &self,
        method: &'static str,
        handler: Arc<dyn NotificationHandler>,
    ) {
        self.notification_handlers
            .lock()
            .await
            .entry(method)
            .or_default()
            .push(handler);
    }

    /// Allocates an id, registers a completion slot, sends via the
    /// transport, and awaits the slot or the timeout (spec §4.3).
    pub async fn send_request_to_peer(
        &self,
        peer_id: &str,
        request: Out,
        timeout: Option<Duration>,
    ) -> Result<Out::Result, ProtocolError> {
        self.check_send_preconditions(peer_id, &request).await?;

        let request_id = self.id_generator.next();
        let frame = Frame::Single(RawMessage::request(
            request_id.clone(),
            request.method(),
            request_params_value(&request)?,
        ));

        let (tx, rx) = oneshot::channel();
        {
            let mut registry = self.registry.lock().await;
            registry.track_request_to_peer(peer_id, request_id.clone(), request.clone(), tx);
        }

        if let Err(e) = self.transport.send(peer_id, frame).await {
            let mut registry = self.registry.lock().await;
            registry.untrack_request_to_peer(peer_id, &request_id);
            return Err(e);
        }

        let timeout = timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let outcome = tokio::time::timeout(timeout, rx).await;
        match outcome {
            Ok(Ok(Ok(value))) => {
                if request.is_initialize() {
                    let mut registry = self.registry.lock().await;
                    if let Some(peer) = registry.get_mut(peer_id) {
                        peer.initialized = true;
                    }
                }
                request.parse_result(value)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(_)) => Err(ProtocolError::InternalError(
                "completion slot dropped without resolution".to_string(),
            )),
            Err(_) => {
                let mut registry = self.registry.lock().await;
                registry.untrack_request_to_peer(peer_id, &request_id);
                Err(ProtocolError::RequestTimeout)
            }
        }
    }

    pub async fn send_notification_to_peer(
        &self,
        peer_id: &str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<(), ProtocolError> {
        if !self.transport.is_open() {
            return Err(ProtocolError::ConnectionError(
                "transport is closed".to_string(),
            ));
        }
        let frame = Frame::Single(RawMessage::notification(method, params));
        self.transport.send(peer_id, frame).await
    }

    /// Sends `notifications/cancelled` and resolves the local slot with
    /// `Error{Cancelled}` (spec §5 "Cancellation").
    pub async fn cancel_request_to_peer(&self, peer_id: &str, request_id: RequestId) -> bool {
        let found = {
            let mut registry = self.registry.lock().await;
            registry.resolve_request_to_peer(peer_id, &request_id, Err(ProtocolError::Cancelled))
        };
        if found {
            let params = serde_json::json!({ "requestId": request_id });
            let _ = self
                .send_notification_to_peer(peer_id, lifecycle::NOTIFICATION_CANCELLED, params)
                .await;
        }
        found
    }

    /// Cancels a handler task we spawned for the peer's inbound request.
    /// Returns `true` iff the task was found and still running.
    pub async fn cancel_request_from_peer(&self, peer_id: &str, request_id: &RequestId) -> bool {
        let mut registry = self.registry.lock().await;
        match registry.untrack_request_from_peer(peer_id, request_id) {
            Some(tracked) => {
                let was_running = !tracked.handle.is_finished();
                tracked.handle.abort();
                was_running
            }
            None => false,
        }
    }

    async fn check_send_preconditions(&self, peer_id: &str, request: &Out) -> Result<(), ProtocolError> {
        if !self.transport.is_open() {
            return Err(ProtocolError::ConnectionError(
                "transport is closed".to_string(),
            ));
        }
        let mut registry = self.registry.lock().await;
        // The handshake request is how a peer becomes known in the first
        // place, so it implicitly registers its own entry rather than
        // requiring one to already exist (spec §4.3).
        if !registry.contains(peer_id) {
            if request.is_initialize() {
                registry.register(peer_id);
            } else {
                return Err(ProtocolError::InvalidRequest(format!(
                    "unknown peer: {peer_id}"
                )));
            }
        }
        let Some(peer) = registry.get(peer_id) else {
            return Err(ProtocolError::InvalidRequest(format!(
                "unknown peer: {peer_id}"
            )));
        };
        if request.method() != lifecycle::METHOD_PING
            && !request.is_initialize()
            && !peer.initialized
        {
            return Err(ProtocolError::InvalidRequest(
                "peer is not yet initialized".to_string(),
            ));
        }
        Ok(())
    }
}

fn request_params_value<Out: OutboundRequest>(request: &Out) -> Result<serde_json::Value, ProtocolError> {
    let wire = serde_json::to_value(request)
        .map_err(|e| ProtocolError::InternalError(format!("failed to encode request: {e}")))?;
    Ok(wire.get("params").cloned().unwrap_or(serde_json::Value::Null))
}

fn registry_peer_ids<PeerCaps, Out: OutboundRequest>(registry: &PeerRegistry<PeerCaps, Out>) -> Vec<String> {
    registry.peer_ids()
}

async fn handle_message<PeerCaps, Out, In, Notif, D, OwnCaps>(
    message: PeerMessage,
    registry: &Arc<Mutex<PeerRegistry<PeerCaps, Out>>>,
    dispatcher: &Arc<D>,
    own_capabilities: &Arc<OwnCaps>,
    notification_handlers: &Arc<Mutex<HashMap<&'static str, Vec<Arc<dyn NotificationHandler>>>>>,
    transport: &Arc<dyn Transport>,
) where
    PeerCaps: Send + Sync + 'static,
    Out: OutboundRequest,
    In: InboundRequest + OutboundRequest,
    Notif: InboundNotification,
    D: Dispatcher<In, Result = In::Result> + 'static,
    OwnCaps: CapabilityGate,
{
    match message.frame {
        Frame::Single(raw) => {
            handle_raw_message::<PeerCaps, Out, In, Notif, D, OwnCaps>(
                raw,
                &message.peer_id,
                registry,
                dispatcher,
                own_capabilities,
                notification_handlers,
                transport,
            )
            .await;
        }
        Frame::Batch(items) => {
            for raw in items {
                handle_raw_message::<PeerCaps, Out, In, Notif, D, OwnCaps>(
                    raw,
                    &message.peer_id,
                    registry,
                    dispatcher,
                    own_capabilities,
                    notification_handlers,
                    transport,
                )
                .await;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_raw_message<PeerCaps, Out, In, Notif, D, OwnCaps>(
    raw: RawMessage,
    peer_id: &str,
    registry: &Arc<Mutex<PeerRegistry<PeerCaps, Out>>>,
    dispatcher: &Arc<D>,
    own_capabilities: &Arc<OwnCaps>,
    notification_handlers: &Arc<Mutex<HashMap<&'static str, Vec<Arc<dyn NotificationHandler>>>>>,
    transport: &Arc<dyn Transport>,
) where
    PeerCaps: Send + Sync + 'static,
    Out: OutboundRequest,
    In: InboundRequest + OutboundRequest,
    Notif: InboundNotification,
    D: Dispatcher<In, Result = In::Result> + 'static,
    OwnCaps: CapabilityGate,
{
    let classified = match mcp_protocol::parser::classify(&raw) {
        Ok(c) => c,
        Err(e) => {
            if let Some(id_value) = raw.id.clone() {
                if let Ok(id) = serde_json::from_value::<RequestId>(id_value) {
                    send_error_response(transport, peer_id, id, e).await;
                }
            }
            return;
        }
    };

    match classified {
        mcp_protocol::parser::Classified::Request(env) => {
            let id = env.id.clone();
            let request = match In::parse(&env) {
                Ok(r) => r,
                Err(e) => {
                    send_error_response(transport, peer_id, id, e).await;
                    return;
                }
            };

            if let Some(capability) = request.required_capability() {
                if !own_capabilities.allows(capability) {
                    send_error_response(
                        transport,
                        peer_id,
                        id,
                        ProtocolError::MethodNotFound(InboundRequest::method(&request).to_string()),
                    )
                    .await;
                    return;
                }
            }

            {
                let registry = registry.lock().await;
                let initialized = registry.get(peer_id).map(|p| p.initialized).unwrap_or(false);
                if !initialized && InboundRequest::method(&request) != mcp_types::lifecycle::METHOD_INITIALIZE {
                    send_error_response(
                        transport,
                        peer_id,
                        id,
                        ProtocolError::MethodNotFound(InboundRequest::method(&request).to_string()),
                    )
                    .await;
                    return;
                }
            }

            let dispatcher = dispatcher.clone();
            let transport_for_task = transport.clone();
            let peer_id_owned = peer_id.to_string();
            let id_for_task = id.clone();
            let method = InboundRequest::method(&request);
            let registry_for_task = registry.clone();

            let task_id = id.clone();
            let handle = tokio::spawn(async move {
                let outcome = dispatcher.dispatch(&peer_id_owned, request).await;
                let frame = match outcome {
                    Ok(result) => match serde_json::to_value(result) {
                        Ok(value) => {
                            Frame::Single(RawMessage::response(id_for_task.clone(), value))
                        }
                        Err(e) => Frame::Single(RawMessage::error_response(
                            id_for_task.clone(),
                            ProtocolError::InternalError(e.to_string()).to_json_rpc(),
                        )),
                    },
                    Err(e) => Frame::Single(RawMessage::error_response(
                        id_for_task.clone(),
                        e.to_json_rpc(),
                    )),
                };
                let _ = transport_for_task.send(&peer_id_owned, frame).await;
                registry_for_task
                    .lock()
                    .await
                    .untrack_request_from_peer(&peer_id_owned, &id_for_task);
            });

            let mut registry = registry.lock().await;
            registry.track_request_from_peer(peer_id, task_id, method, handle);
        }
        mcp_protocol::parser::Classified::Response(env) => {
            let mut registry = registry.lock().await;
            let outcome = env.outcome.map_err(|e| {
                ProtocolError::InternalError(format!(
                    "peer returned JSON-RPC error: code = {}, message = {}",
                    e.code, e.message
                ))
            });
            registry.resolve_request_to_peer(peer_id, &env.id, outcome);
        }
        mcp_protocol::parser::Classified::Notification(env) => {
            let Some(notification) = Notif::parse(&env) else {
                return;
            };

            if let Some(request_id) = notification.as_cancelled_request_id() {
                let mut registry = registry.lock().await;
                if let Some(tracked) = registry.untrack_request_from_peer(peer_id, request_id) {
                    tracked.handle.abort();
                }
                return;
            }

            let handlers = {
                let handlers = notification_handlers.lock().await;
                handlers.get(notification.method()).cloned().unwrap_or_default()
            };
            for handler in handlers {
                handler.handle(peer_id, env.params.clone()).await;
            }
        }
    }
}

async fn send_error_response(
    transport: &Arc<dyn Transport>,
    peer_id: &str,
    id: RequestId,
    error: ProtocolError,
) {
    let frame = Frame::Single(RawMessage::error_response(id, error.to_json_rpc()));
    let _ = transport.send(peer_id, frame).await;
}
