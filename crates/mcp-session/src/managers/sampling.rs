use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::sampling::CreateMessageParams;
use mcp_types::sampling::CreateMessageResult;

/// Client-side: lets a server ask this client's host LLM to sample a
/// completion. `create_message` takes a single `request` argument per the
/// Open Question resolution (SPEC_FULL §9.2) — the session façade already
/// knows which peer it is calling through.
#[async_trait]
pub trait SamplingManager: Send + Sync {
    async fn create_message(&self, request: CreateMessageParams) -> Result<CreateMessageResult, ProtocolError>;
}

/// Reference implementation that always declines; real hosts wire this to
/// an actual model (out of scope per Non-goals).
pub struct RefusingSamplingManager;

#[async_trait]
impl SamplingManager for RefusingSamplingManager {
    async fn create_message(&self, _request: CreateMessageParams) -> Result<CreateMessageResult, ProtocolError> {
        Err(ProtocolError::InternalError(
            "no sampling handler configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refusing_manager_declines_every_request() {
        let manager = RefusingSamplingManager;
        let outcome = manager
            .create_message(CreateMessageParams {
                messages: vec![],
                max_tokens: 16,
                system_prompt: None,
                model_preferences: None,
            })
            .await;
        assert!(matches!(outcome, Err(ProtocolError::InternalError(_))));
    }
}
