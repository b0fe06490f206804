use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use mcp_protocol::error::ProtocolError;
use mcp_types::resources::ListResourceTemplatesResult;
use mcp_types::resources::ListResourcesResult;
use mcp_types::resources::ReadResourceResult;
use mcp_types::resources::Resource;
use mcp_types::resources::ResourceContents;
use mcp_types::resources::ResourceTemplate;
use tokio::sync::RwLock;

/// Resource listing, reading, and subscription bookkeeping. Subscriptions
/// are per-peer (spec §3 peer state lives per connection); the coordinator
/// owning this manager decides whether/how to fan out
/// `notifications/resources/updated`.
#[async_trait]
pub trait ResourcesManager: Send + Sync {
    async fn list_resources(&self, peer_id: &str, cursor: Option<String>) -> Result<ListResourcesResult, ProtocolError>;
    async fn list_resource_templates(
        &self,
        peer_id: &str,
        cursor: Option<String>,
    ) -> Result<ListResourceTemplatesResult, ProtocolError>;
    async fn read_resource(&self, peer_id: &str, uri: &str) -> Result<ReadResourceResult, ProtocolError>;
    async fn subscribe(&self, peer_id: &str, uri: &str) -> Result<(), ProtocolError>;
    async fn unsubscribe(&self, peer_id: &str, uri: &str) -> Result<(), ProtocolError>;
}

#[derive(Default)]
pub struct InMemoryResourcesManager {
    resources: RwLock<HashMap<String, (Resource, Vec<ResourceContents>)>>,
    templates: RwLock<Vec<ResourceTemplate>>,
    subscriptions: RwLock<HashMap<String, HashSet<String>>>,
}

impl InMemoryResourcesManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, resource: Resource, contents: Vec<ResourceContents>) {
        let uri = resource.uri.clone();
        self.resources.write().await.insert(uri, (resource, contents));
    }

    pub async fn register_template(&self, template: ResourceTemplate) {
        self.templates.write().await.push(template);
    }

    /// Subscriber ids currently watching `uri`, for tests and for the
    /// coordinator to fan out updates to.
    pub async fn subscribers(&self, uri: &str) -> Vec<String> {
        self.subscriptions
            .read()
            .await
            .get(uri)
            .map(|peers| peers.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResourcesManager for InMemoryResourcesManager {
    async fn list_resources(&self, _peer_id: &str, _cursor: Option<String>) -> Result<ListResourcesResult, ProtocolError> {
        Ok(ListResourcesResult {
            resources: self.resources.read().await.values().map(|(r, _)| r.clone()).collect(),
            next_cursor: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _peer_id: &str,
        _cursor: Option<String>,
    ) -> Result<ListResourceTemplatesResult, ProtocolError> {
        Ok(ListResourceTemplatesResult {
            resource_templates: self.templates.read().await.clone(),
            next_cursor: None,
        })
    }

    async fn read_resource(&self, _peer_id: &str, uri: &str) -> Result<ReadResourceResult, ProtocolError> {
        let resources = self.resources.read().await;
        let Some((_, contents)) = resources.get(uri) else {
            return Err(ProtocolError::InvalidParams(format!("unknown resource: {uri}")));
        };
        Ok(ReadResourceResult {
            contents: contents.clone(),
        })
    }

    async fn subscribe(&self, peer_id: &str, uri: &str) -> Result<(), ProtocolError> {
        self.subscriptions
            .write()
            .await
            .entry(uri.to_string())
            .or_default()
            .insert(peer_id.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, peer_id: &str, uri: &str) -> Result<(), ProtocolError> {
        if let Some(peers) = self.subscriptions.write().await.get_mut(uri) {
            peers.remove(peer_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_resource() -> (Resource, Vec<ResourceContents>) {
        (
            Resource {
                uri: "file:///doc.md".to_string(),
                name: "doc".to_string(),
                description: None,
                mime_type: Some("text/markdown".to_string()),
            },
            vec![ResourceContents {
                uri: "file:///doc.md".to_string(),
                mime_type: Some("text/markdown".to_string()),
                payload: mcp_types::resources::ResourcePayload::Text {
                    text: "hello".to_string(),
                },
            }],
        )
    }

    #[tokio::test]
    async fn subscribe_then_unsubscribe_removes_the_peer() {
        let manager = InMemoryResourcesManager::new();
        let (resource, contents) = doc_resource();
        manager.register(resource, contents).await;

        assert!(manager.subscribe("peer-1", "file:///doc.md").await.is_ok());
        assert_eq!(manager.subscribers("file:///doc.md").await, vec!["peer-1".to_string()]);

        assert!(manager.unsubscribe("peer-1", "file:///doc.md").await.is_ok());
        assert!(manager.subscribers("file:///doc.md").await.is_empty());
    }

    #[tokio::test]
    async fn reading_an_unknown_uri_is_invalid_params() {
        let manager = InMemoryResourcesManager::new();
        let outcome = manager.read_resource("peer-1", "file:///missing.md").await;
        assert!(matches!(outcome, Err(ProtocolError::InvalidParams(_))));
    }
}
