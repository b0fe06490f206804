use std::sync::Arc;

use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::capabilities::ClientCapabilities;
use mcp_types::capabilities::Implementation;
use mcp_types::capabilities::ProtocolVersion;
use mcp_types::capabilities::ServerCapabilities;
use mcp_types::lifecycle::EmptyResult;
use mcp_types::lifecycle::InitializeResult;
use mcp_types::request::ClientRequest;
use mcp_types::request::ServerRequest;
use mcp_types::result::ClientResult;
use mcp_types::result::ServerResult;
use tokio::sync::Mutex;

use crate::dispatch::Dispatcher;
use crate::managers::CompletionsManager;
use crate::managers::ElicitationManager;
use crate::managers::LoggingManager;
use crate::managers::PromptsManager;
use crate::managers::ResourcesManager;
use crate::managers::RootsManager;
use crate::managers::SamplingManager;
use crate::managers::ToolsManager;
use crate::registry::PeerRegistry;

/// Server-side dispatcher: handles everything a client may send (spec §9
/// "Dynamic per-method dispatch becomes a sum-typed request variant plus
/// exhaustive match"). Holds the peer registry directly so `initialize`
/// can record the client's capabilities and flip `initialized` — the one
/// request every side must special-case outside the managers, grounded in
/// the teacher's `message_processor.rs::handle_initialize`.
pub struct ServerSessionDispatcher {
    registry: Arc<Mutex<PeerRegistry<ClientCapabilities, ServerRequest>>>,
    server_info: Implementation,
    capabilities: ServerCapabilities,
    protocol_version: ProtocolVersion,
    pub tools: Option<Arc<dyn ToolsManager>>,
    pub prompts: Option<Arc<dyn PromptsManager>>,
    pub resources: Option<Arc<dyn ResourcesManager>>,
    pub logging: Option<Arc<dyn LoggingManager>>,
    pub completions: Option<Arc<dyn CompletionsManager>>,
}

impl ServerSessionDispatcher {
    pub fn new(
        registry: Arc<Mutex<PeerRegistry<ClientCapabilities, ServerRequest>>>,
        server_info: Implementation,
        capabilities: ServerCapabilities,
    ) -> Self {
        ServerSessionDispatcher {
            registry,
            server_info,
            capabilities,
            protocol_version: ProtocolVersion::latest(),
            tools: None,
            prompts: None,
            resources: None,
            logging: None,
            completions: None,
        }
    }

    async fn handle_initialize(
        &self,
        peer_id: &str,
        params: mcp_types::lifecycle::InitializeParams,
    ) -> Result<ServerResult, ProtocolError> {
        if params.protocol_version != self.protocol_version {
            return Err(ProtocolError::ProtocolVersionMismatch {
                expected: self.protocol_version.0.clone(),
                actual: params.protocol_version.0.clone(),
            });
        }

        let mut registry = self.registry.lock().await;
        let peer = registry.register(peer_id);
        peer.capabilities = Some(params.capabilities);
        peer.info = Some(params.client_info);
        peer.protocol_version = Some(params.protocol_version.clone());
        peer.initialized = true;

        Ok(ServerResult::Initialize(InitializeResult {
            protocol_version: self.protocol_version.clone(),
            capabilities: self.capabilities.clone(),
            server_info: self.server_info.clone(),
            instructions: None,
        }))
    }
}

#[async_trait]
impl Dispatcher<ClientRequest> for ServerSessionDispatcher {
    type Result = ServerResult;

    async fn dispatch(&self, peer_id: &str, request: ClientRequest) -> Result<ServerResult, ProtocolError> {
        match request {
            ClientRequest::Initialize(params) => self.handle_initialize(peer_id, params).await,
            ClientRequest::Ping(_) => Ok(ServerResult::Empty(EmptyResult {})),
            ClientRequest::ListTools(params) => {
                let Some(tools) = &self.tools else {
                    return Err(ProtocolError::MethodNotFound("tools/list".to_string()));
                };
                tools.list_tools(peer_id, params.cursor).await.map(ServerResult::ListTools)
            }
            ClientRequest::CallTool(params) => {
                let Some(tools) = &self.tools else {
                    return Err(ProtocolError::MethodNotFound("tools/call".to_string()));
                };
                tools
                    .call_tool(peer_id, &params.name, params.arguments)
                    .await
                    .map(ServerResult::CallTool)
            }
            ClientRequest::ListPrompts(params) => {
                let Some(prompts) = &self.prompts else {
                    return Err(ProtocolError::MethodNotFound("prompts/list".to_string()));
                };
                prompts
                    .list_prompts(peer_id, params.cursor)
                    .await
                    .map(ServerResult::ListPrompts)
            }
            ClientRequest::GetPrompt(params) => {
                let Some(prompts) = &self.prompts else {
                    return Err(ProtocolError::MethodNotFound("prompts/get".to_string()));
                };
                prompts
                    .get_prompt(peer_id, &params.name, params.arguments)
                    .await
                    .map(ServerResult::GetPrompt)
            }
            ClientRequest::ListResources(params) => {
                let Some(resources) = &self.resources else {
                    return Err(ProtocolError::MethodNotFound("resources/list".to_string()));
                };
                resources
                    .list_resources(peer_id, params.cursor)
                    .await
                    .map(ServerResult::ListResources)
            }
            ClientRequest::ListResourceTemplates(params) => {
                let Some(resources) = &self.resources else {
                    return Err(ProtocolError::MethodNotFound(
                        "resources/templates/list".to_string(),
                    ));
                };
                resources
                    .list_resource_templates(peer_id, params.cursor)
                    .await
                    .map(ServerResult::ListResourceTemplates)
            }
            ClientRequest::ReadResource(params) => {
                let Some(resources) = &self.resources else {
                    return Err(ProtocolError::MethodNotFound("resources/read".to_string()));
                };
                resources
                    .read_resource(peer_id, &params.uri)
                    .await
                    .map(ServerResult::ReadResource)
            }
            ClientRequest::Subscribe(params) => {
                let Some(resources) = &self.resources else {
                    return Err(ProtocolError::MethodNotFound("resources/subscribe".to_string()));
                };
                resources.subscribe(peer_id, &params.uri).await?;
                Ok(ServerResult::Empty(EmptyResult {}))
            }
            ClientRequest::Unsubscribe(params) => {
                let Some(resources) = &self.resources else {
                    return Err(ProtocolError::MethodNotFound(
                        "resources/unsubscribe".to_string(),
                    ));
                };
                resources.unsubscribe(peer_id, &params.uri).await?;
                Ok(ServerResult::Empty(EmptyResult {}))
            }
            ClientRequest::SetLevel(params) => {
                let Some(logging) = &self.logging else {
                    return Err(ProtocolError::MethodNotFound("logging/setLevel".to_string()));
                };
                logging.set_level(peer_id, params.level).await?;
                Ok(ServerResult::Empty(EmptyResult {}))
            }
            ClientRequest::Complete(params) => {
                let Some(completions) = &self.completions else {
                    return Err(ProtocolError::MethodNotFound(
                        "completion/complete".to_string(),
                    ));
                };
                completions.complete(peer_id, params).await.map(ServerResult::Complete)
            }
        }
    }
}

/// Client-side dispatcher: handles everything a server may send.
pub struct ClientSessionDispatcher {
    registry: Arc<Mutex<PeerRegistry<ServerCapabilities, ClientRequest>>>,
    pub roots: Option<Arc<dyn RootsManager>>,
    pub sampling: Option<Arc<dyn SamplingManager>>,
    pub elicitation: Option<Arc<dyn ElicitationManager>>,
}

impl ClientSessionDispatcher {
    pub fn new(registry: Arc<Mutex<PeerRegistry<ServerCapabilities, ClientRequest>>>) -> Self {
        ClientSessionDispatcher {
            registry,
            roots: None,
            sampling: None,
            elicitation: None,
        }
    }
}

#[async_trait]
impl Dispatcher<ServerRequest> for ClientSessionDispatcher {
    type Result = ClientResult;

    async fn dispatch(&self, peer_id: &str, request: ServerRequest) -> Result<ClientResult, ProtocolError> {
        // Touching the registry keeps this dispatcher symmetric with the
        // server-side one even though no `ServerRequest` variant currently
        // needs to mutate peer state the way `initialize` does.
        let _ = self.registry.lock().await.contains(peer_id);
        match request {
            ServerRequest::Ping(_) => Ok(ClientResult::Empty(EmptyResult {})),
            ServerRequest::ListRoots(_) => {
                let Some(roots) = &self.roots else {
                    return Err(ProtocolError::MethodNotFound("roots/list".to_string()));
                };
                roots.list_roots().await.map(ClientResult::ListRoots)
            }
            ServerRequest::CreateMessage(params) => {
                let Some(sampling) = &self.sampling else {
                    return Err(ProtocolError::MethodNotFound(
                        "sampling/createMessage".to_string(),
                    ));
                };
                sampling.create_message(params).await.map(ClientResult::CreateMessage)
            }
            ServerRequest::Elicit(params) => {
                let Some(elicitation) = &self.elicitation else {
                    return Err(ProtocolError::MethodNotFound("elicitation/create".to_string()));
                };
                elicitation.elicit(params).await.map(ClientResult::Elicit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_types::capabilities::ToolsCapability;
    use mcp_types::lifecycle::InitializeParams;

    #[tokio::test]
    async fn initialize_records_peer_capabilities_and_marks_initialized() {
        let registry = Arc::new(Mutex::new(PeerRegistry::new()));
        let dispatcher = ServerSessionDispatcher::new(
            registry.clone(),
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

        let outcome = dispatcher
            .dispatch(
                "peer-1",
                ClientRequest::Initialize(InitializeParams {
                    protocol_version: ProtocolVersion::latest(),
                    capabilities: ClientCapabilities::default(),
                    client_info: Implementation {
                        name: "test-client".to_string(),
                        version: "0.1.0".to_string(),
                        title: None,
                    },
                }),
            )
            .await;
        assert!(matches!(outcome, Ok(ServerResult::Initialize(_))));

        let registry = registry.lock().await;
        let Some(peer) = registry.get("peer-1") else {
            panic!("initialize registers the peer");
        };
        assert!(peer.initialized);
    }

    #[tokio::test]
    async fn mismatched_protocol_version_is_rejected() {
        let registry = Arc::new(Mutex::new(PeerRegistry::new()));
        let dispatcher = ServerSessionDispatcher::new(
            registry,
            Implementation {
                name: "test-server".to_string(),
                version: "0.1.0".to_string(),
                title: None,
            },
            ServerCapabilities::default(),
        );

        let outcome = dispatcher
            .dispatch(
                "peer-1",
                ClientRequest::Initialize(InitializeParams {
                    protocol_version: ProtocolVersion("1999-01-01".to_string()),
                    capabilities: ClientCapabilities::default(),
                    client_info: Implementation::default(),
                }),
            )
            .await;
        assert!(matches!(
            outcome,
            Err(ProtocolError::ProtocolVersionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn unconfigured_capability_yields_method_not_found() {
        let registry = Arc::new(Mutex::new(PeerRegistry::new()));
        let dispatcher = ServerSessionDispatcher::new(
            registry,
            Implementation::default(),
            ServerCapabilities::default(),
        );

        let outcome = dispatcher
            .dispatch(
                "peer-1",
                ClientRequest::ListTools(mcp_types::tools::ListToolsParams { cursor: None }),
            )
            .await;
        assert!(matches!(outcome, Err(ProtocolError::MethodNotFound(_))));
    }
}
