use std::collections::HashMap;

use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::tools::CallToolResult;
use mcp_types::tools::ListToolsResult;
use mcp_types::tools::Tool;
use tokio::sync::RwLock;

/// Registered tools and the handlers that execute them, keyed by peer so a
/// tool can behave differently per caller (grounded in
/// `original_source/src/conduit/server/managers/tools_v2.py`'s
/// client-aware `ToolManager`).
#[async_trait]
pub trait ToolsManager: Send + Sync {
    async fn list_tools(&self, peer_id: &str, cursor: Option<String>) -> Result<ListToolsResult, ProtocolError>;
    async fn call_tool(
        &self,
        peer_id: &str,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult, ProtocolError>;
}

/// A tool handler invoked with the calling peer's id alongside its
/// arguments, mirroring the Python `ClientAwareToolHandler` alias.
pub type ToolHandler =
    Box<dyn Fn(&str, Option<serde_json::Value>) -> futures::future::BoxFuture<'static, CallToolResult> + Send + Sync>;

/// Minimal in-memory reference implementation, sufficient to exercise the
/// coordinator in tests; real business logic is out of scope (Non-goals).
#[derive(Default)]
pub struct InMemoryToolsManager {
    tools: RwLock<HashMap<String, Tool>>,
    handlers: RwLock<HashMap<String, ToolHandler>>,
}

impl InMemoryToolsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, tool: Tool, handler: ToolHandler) {
        let name = tool.name.clone();
        self.tools.write().await.insert(name.clone(), tool);
        self.handlers.write().await.insert(name, handler);
    }
}

#[async_trait]
impl ToolsManager for InMemoryToolsManager {
    async fn list_tools(&self, _peer_id: &str, _cursor: Option<String>) -> Result<ListToolsResult, ProtocolError> {
        Ok(ListToolsResult {
            tools: self.tools.read().await.values().cloned().collect(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        peer_id: &str,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult, ProtocolError> {
        let handlers = self.handlers.read().await;
        let Some(handler) = handlers.get(name) else {
            return Err(ProtocolError::InvalidParams(format!("unknown tool: {name}")));
        };
        Ok(handler(peer_id, arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_types::content::Content;

    fn echo_tool() -> Tool {
        Tool {
            name: "echo".to_string(),
            description: Some("echoes its input".to_string()),
            input_schema: serde_json::json!({"type": "object"}),
        }
    }

    #[tokio::test]
    async fn registered_tool_is_listed_and_callable() {
        let manager = InMemoryToolsManager::new();
        manager
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

        let listed = manager.list_tools("peer-1", None).await;
        let Ok(listed) = listed else {
            panic!("list_tools on a freshly registered manager cannot fail");
        };
        assert_eq!(listed.tools.len(), 1);

        let called = manager.call_tool("peer-1", "echo", Some(serde_json::json!("hi"))).await;
        let Ok(called) = called else {
            panic!("call_tool for a registered tool cannot fail");
        };
        assert!(!called.is_error);
    }

    #[tokio::test]
    async fn calling_an_unknown_tool_is_invalid_params() {
        let manager = InMemoryToolsManager::new();
        let outcome = manager.call_tool("peer-1", "missing", None).await;
        assert!(matches!(outcome, Err(ProtocolError::InvalidParams(_))));
    }
}
