use serde::Deserialize;
use serde::Serialize;

use crate::lifecycle::CancelledParams;
use crate::lifecycle::EmptyParams;
use crate::lifecycle::LoggingMessageParams;
use crate::lifecycle::ProgressParams;
use crate::resources::ResourceUpdatedParams;

/// Notifications the client may send to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ClientNotification {
    #[serde(rename = "notifications/initialized")]
    Initialized(EmptyParams),
    #[serde(rename = "notifications/cancelled")]
    Cancelled(CancelledParams),
    #[serde(rename = "notifications/progress")]
    Progress(ProgressParams),
    #[serde(rename = "notifications/roots/list_changed")]
    RootsListChanged(EmptyParams),
}

impl ClientNotification {
    pub fn method(&self) -> &'static str {
        match self {
            ClientNotification::Initialized(_) => crate::lifecycle::NOTIFICATION_INITIALIZED,
            ClientNotification::Cancelled(_) => crate::lifecycle::NOTIFICATION_CANCELLED,
            ClientNotification::Progress(_) => crate::lifecycle::NOTIFICATION_PROGRESS,
            ClientNotification::RootsListChanged(_) => {
                crate::lifecycle::NOTIFICATION_ROOTS_LIST_CHANGED
            }
        }
    }
}

/// Notifications the server may send to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ServerNotification {
    #[serde(rename = "notifications/cancelled")]
    Cancelled(CancelledParams),
    #[serde(rename = "notifications/progress")]
    Progress(ProgressParams),
    #[serde(rename = "notifications/message")]
    Message(LoggingMessageParams),
    #[serde(rename = "notifications/tools/list_changed")]
    ToolsListChanged(EmptyParams),
    #[serde(rename = "notifications/prompts/list_changed")]
    PromptsListChanged(EmptyParams),
    #[serde(rename = "notifications/resources/list_changed")]
    ResourcesListChanged(EmptyParams),
    #[serde(rename = "notifications/resources/updated")]
    ResourcesUpdated(ResourceUpdatedParams),
}

impl ServerNotification {
    pub fn method(&self) -> &'static str {
        match self {
            ServerNotification::Cancelled(_) => crate::lifecycle::NOTIFICATION_CANCELLED,
            ServerNotification::Progress(_) => crate::lifecycle::NOTIFICATION_PROGRESS,
            ServerNotification::Message(_) => crate::lifecycle::NOTIFICATION_MESSAGE,
            ServerNotification::ToolsListChanged(_) => {
                crate::lifecycle::NOTIFICATION_TOOLS_LIST_CHANGED
            }
            ServerNotification::PromptsListChanged(_) => {
                crate::lifecycle::NOTIFICATION_PROMPTS_LIST_CHANGED
            }
            ServerNotification::ResourcesListChanged(_) => {
                crate::lifecycle::NOTIFICATION_RESOURCES_LIST_CHANGED
            }
            ServerNotification::ResourcesUpdated(_) => {
                crate::lifecycle::NOTIFICATION_RESOURCES_UPDATED
            }
        }
    }
}
