use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::roots::ListRootsResult;
use mcp_types::roots::Root;
use tokio::sync::RwLock;

/// Client-side: the filesystem/workspace roots this client exposes to
/// servers that ask (grounded in
/// `original_source/src/conduit/client/managers/roots.py`).
#[async_trait]
pub trait RootsManager: Send + Sync {
    async fn list_roots(&self) -> Result<ListRootsResult, ProtocolError>;
}

#[derive(Default)]
pub struct InMemoryRootsManager {
    roots: RwLock<Vec<Root>>,
}

impl InMemoryRootsManager {
    pub fn new(roots: Vec<Root>) -> Self {
        InMemoryRootsManager {
            roots: RwLock::new(roots),
        }
    }

    pub async fn set_roots(&self, roots: Vec<Root>) {
        *self.roots.write().await = roots;
    }
}

#[async_trait]
impl RootsManager for InMemoryRootsManager {
    async fn list_roots(&self) -> Result<ListRootsResult, ProtocolError> {
        Ok(ListRootsResult {
            roots: self.roots.read().await.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_the_configured_roots() {
        let manager = InMemoryRootsManager::new(vec![Root {
            uri: "file:///workspace".to_string(),
            name: Some("workspace".to_string()),
        }]);
        let result = manager.list_roots().await;
        assert!(matches!(result, Ok(r) if r.roots.len() == 1));
    }
}
