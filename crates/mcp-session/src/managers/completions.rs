use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::completion::CompleteParams;
use mcp_types::completion::CompleteResult;

/// Argument-completion suggestions for prompts/resource templates.
/// Grounded in
/// `original_source/src/conduit/server/managers/completions_v2.py`.
#[async_trait]
pub trait CompletionsManager: Send + Sync {
    async fn complete(&self, peer_id: &str, request: CompleteParams) -> Result<CompleteResult, ProtocolError>;
}

/// Reference implementation returning no suggestions.
pub struct EmptyCompletionsManager;

#[async_trait]
impl CompletionsManager for EmptyCompletionsManager {
    async fn complete(&self, _peer_id: &str, _request: CompleteParams) -> Result<CompleteResult, ProtocolError> {
        Ok(CompleteResult::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_types::completion::CompletionArgument;
    use mcp_types::completion::CompletionReference;

    #[tokio::test]
    async fn empty_manager_returns_no_suggestions() {
        let manager = EmptyCompletionsManager;
        let result = manager
            .complete(
                "peer-1",
                CompleteParams {
                    reference: CompletionReference::Prompt { name: "greeting".to_string() },
                    argument: CompletionArgument {
                        name: "name".to_string(),
                        value: "a".to_string(),
                    },
                },
            )
            .await;
        assert!(matches!(result, Ok(r) if r.completion.values.is_empty()));
    }
}
