use std::collections::HashMap;

use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::lifecycle::LoggingLevel;
use tokio::sync::RwLock;

/// Per-peer protocol log level (distinct from this crate's own `tracing`
/// output — spec §4.9 ambient logging is separate from this MCP-protocol
/// feature). Grounded in
/// `original_source/src/conduit/server/managers/logging_v2.py`.
#[async_trait]
pub trait LoggingManager: Send + Sync {
    async fn set_level(&self, peer_id: &str, level: LoggingLevel) -> Result<(), ProtocolError>;
    async fn level_for(&self, peer_id: &str) -> Option<LoggingLevel>;
    /// Whether a message at `level` should be forwarded to `peer_id`, given
    /// its currently configured minimum level. No level set means nothing
    /// is forwarded, matching the Python reference's `current_level is None`.
    async fn should_send(&self, peer_id: &str, level: LoggingLevel) -> bool {
        match self.level_for(peer_id).await {
            Some(minimum) => level >= minimum,
            None => false,
        }
    }
}

#[derive(Default)]
pub struct InMemoryLoggingManager {
    levels: RwLock<HashMap<String, LoggingLevel>>,
}

impl InMemoryLoggingManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoggingManager for InMemoryLoggingManager {
    async fn set_level(&self, peer_id: &str, level: LoggingLevel) -> Result<(), ProtocolError> {
        self.levels.write().await.insert(peer_id.to_string(), level);
        Ok(())
    }

    async fn level_for(&self, peer_id: &str) -> Option<LoggingLevel> {
        self.levels.read().await.get(peer_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_send_compares_against_the_configured_minimum() {
        let manager = InMemoryLoggingManager::new();
        assert!(!manager.should_send("peer-1", LoggingLevel::Error).await);

        assert!(manager.set_level("peer-1", LoggingLevel::Warning).await.is_ok());
        assert!(!manager.should_send("peer-1", LoggingLevel::Info).await);
        assert!(manager.should_send("peer-1", LoggingLevel::Error).await);
    }
}
