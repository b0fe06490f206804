use std::collections::HashMap;

use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::prompts::GetPromptResult;
use mcp_types::prompts::ListPromptsResult;
use mcp_types::prompts::Prompt;
use tokio::sync::RwLock;

/// Grounded in `original_source/src/conduit/server/managers/prompts_v2.py`'s
/// `PromptManager`: prompts are registered globally, handlers receive the
/// calling peer's id.
#[async_trait]
pub trait PromptsManager: Send + Sync {
    async fn list_prompts(&self, peer_id: &str, cursor: Option<String>) -> Result<ListPromptsResult, ProtocolError>;
    async fn get_prompt(
        &self,
        peer_id: &str,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<GetPromptResult, ProtocolError>;
}

pub type PromptHandler =
    Box<dyn Fn(&str, Option<serde_json::Value>) -> futures::future::BoxFuture<'static, GetPromptResult> + Send + Sync>;

#[derive(Default)]
pub struct InMemoryPromptsManager {
    prompts: RwLock<HashMap<String, Prompt>>,
    handlers: RwLock<HashMap<String, PromptHandler>>,
}

impl InMemoryPromptsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, prompt: Prompt, handler: PromptHandler) {
        let name = prompt.name.clone();
        self.prompts.write().await.insert(name.clone(), prompt);
        self.handlers.write().await.insert(name, handler);
    }
}

#[async_trait]
impl PromptsManager for InMemoryPromptsManager {
    async fn list_prompts(&self, _peer_id: &str, _cursor: Option<String>) -> Result<ListPromptsResult, ProtocolError> {
        Ok(ListPromptsResult {
            prompts: self.prompts.read().await.values().cloned().collect(),
            next_cursor: None,
        })
    }

    async fn get_prompt(
        &self,
        peer_id: &str,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<GetPromptResult, ProtocolError> {
        let handlers = self.handlers.read().await;
        let Some(handler) = handlers.get(name) else {
            return Err(ProtocolError::InvalidParams(format!("unknown prompt: {name}")));
        };
        Ok(handler(peer_id, arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeting_prompt() -> Prompt {
        Prompt {
            name: "greeting".to_string(),
            description: None,
            arguments: vec![],
        }
    }

    #[tokio::test]
    async fn registered_prompt_is_listed_and_fetchable() {
        let manager = InMemoryPromptsManager::new();
        manager
            .register(
                greeting_prompt(),
                Box::new(|_peer, _args| {
                    Box::pin(async move {
                        GetPromptResult {
                            description: None,
                            messages: vec![],
                        }
                    })
                }),
            )
            .await;

        let listed = manager.list_prompts("peer-1", None).await;
        assert!(matches!(listed, Ok(r) if r.prompts.len() == 1));

        let fetched = manager.get_prompt("peer-1", "greeting", None).await;
        assert!(fetched.is_ok());
    }

    #[tokio::test]
    async fn fetching_an_unknown_prompt_is_invalid_params() {
        let manager = InMemoryPromptsManager::new();
        let outcome = manager.get_prompt("peer-1", "missing", None).await;
        assert!(matches!(outcome, Err(ProtocolError::InvalidParams(_))));
    }
}
