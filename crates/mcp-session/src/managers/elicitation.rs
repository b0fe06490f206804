use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::elicitation::ElicitAction;
use mcp_types::elicitation::ElicitParams;
use mcp_types::elicitation::ElicitResult;

/// Client-side: lets a server ask the human-in-the-loop a structured
/// question. Single-arg form, same reasoning as [`crate::managers::sampling::SamplingManager`].
#[async_trait]
pub trait ElicitationManager: Send + Sync {
    async fn elicit(&self, request: ElicitParams) -> Result<ElicitResult, ProtocolError>;
}

/// Reference implementation that always declines without prompting anyone.
pub struct DecliningElicitationManager;

#[async_trait]
impl ElicitationManager for DecliningElicitationManager {
    async fn elicit(&self, _request: ElicitParams) -> Result<ElicitResult, ProtocolError> {
        Ok(ElicitResult {
            action: ElicitAction::Decline,
            content: None,
        })
    }
}
