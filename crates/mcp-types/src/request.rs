use serde::Deserialize;
use serde::Serialize;

use crate::completion::CompleteParams;
use crate::elicitation::ElicitParams;
use crate::lifecycle::EmptyParams;
use crate::lifecycle::InitializeParams;
use crate::lifecycle::SetLevelParams;
use crate::prompts::GetPromptParams;
use crate::prompts::ListPromptsParams;
use crate::resources::ListResourcesParams;
use crate::resources::ReadResourceParams;
use crate::resources::SubscribeParams;
use crate::resources::UnsubscribeParams;
use crate::sampling::CreateMessageParams;
use crate::tools::CallToolParams;
use crate::tools::ListToolsParams;

/// Requests the client may send to the server. Tagged on the wire by
/// `method`, with `params` as the payload — this is the sum-typed
/// replacement for the source's string-keyed dispatch table (spec §9 design
/// notes).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ClientRequest {
    #[serde(rename = "initialize")]
    Initialize(InitializeParams),
    #[serde(rename = "ping")]
    Ping(EmptyParams),
    #[serde(rename = "tools/list")]
    ListTools(ListToolsParams),
    #[serde(rename = "tools/call")]
    CallTool(CallToolParams),
    #[serde(rename = "prompts/list")]
    ListPrompts(ListPromptsParams),
    #[serde(rename = "prompts/get")]
    GetPrompt(GetPromptParams),
    #[serde(rename = "resources/list")]
    ListResources(ListResourcesParams),
    #[serde(rename = "resources/templates/list")]
    ListResourceTemplates(ListResourcesParams),
    #[serde(rename = "resources/read")]
    ReadResource(ReadResourceParams),
    #[serde(rename = "resources/subscribe")]
    Subscribe(SubscribeParams),
    #[serde(rename = "resources/unsubscribe")]
    Unsubscribe(UnsubscribeParams),
    #[serde(rename = "logging/setLevel")]
    SetLevel(SetLevelParams),
    #[serde(rename = "completion/complete")]
    Complete(CompleteParams),
}

impl ClientRequest {
    pub fn method(&self) -> &'static str {
        match self {
            ClientRequest::Initialize(_) => crate::lifecycle::METHOD_INITIALIZE,
            ClientRequest::Ping(_) => crate::lifecycle::METHOD_PING,
            ClientRequest::ListTools(_) => crate::tools::METHOD_LIST_TOOLS,
            ClientRequest::CallTool(_) => crate::tools::METHOD_CALL_TOOL,
            ClientRequest::ListPrompts(_) => crate::prompts::METHOD_LIST_PROMPTS,
            ClientRequest::GetPrompt(_) => crate::prompts::METHOD_GET_PROMPT,
            ClientRequest::ListResources(_) => crate::resources::METHOD_LIST_RESOURCES,
            ClientRequest::ListResourceTemplates(_) => {
                crate::resources::METHOD_LIST_RESOURCE_TEMPLATES
            }
            ClientRequest::ReadResource(_) => crate::resources::METHOD_READ_RESOURCE,
            ClientRequest::Subscribe(_) => crate::resources::METHOD_SUBSCRIBE,
            ClientRequest::Unsubscribe(_) => crate::resources::METHOD_UNSUBSCRIBE,
            ClientRequest::SetLevel(_) => crate::lifecycle::METHOD_SET_LEVEL,
            ClientRequest::Complete(_) => crate::completion::METHOD_COMPLETE,
        }
    }

    /// Capability area this method is gated behind, or `None` for methods
    /// that are always allowed (spec §3 invariant 5, §4.2 capability gating).
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            ClientRequest::Initialize(_) | ClientRequest::Ping(_) => None,
            ClientRequest::ListTools(_) | ClientRequest::CallTool(_) => Some(Capability::Tools),
            ClientRequest::ListPrompts(_) | ClientRequest::GetPrompt(_) => {
                Some(Capability::Prompts)
            }
            ClientRequest::ListResources(_)
            | ClientRequest::ListResourceTemplates(_)
            | ClientRequest::ReadResource(_)
            | ClientRequest::Subscribe(_)
            | ClientRequest::Unsubscribe(_) => Some(Capability::Resources),
            ClientRequest::SetLevel(_) => Some(Capability::Logging),
            ClientRequest::Complete(_) => Some(Capability::Completions),
        }
    }
}

/// Requests the server may send to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ServerRequest {
    #[serde(rename = "ping")]
    Ping(EmptyParams),
    #[serde(rename = "roots/list")]
    ListRoots(EmptyParams),
    #[serde(rename = "sampling/createMessage")]
    CreateMessage(CreateMessageParams),
    #[serde(rename = "elicitation/create")]
    Elicit(ElicitParams),
}

impl ServerRequest {
    pub fn method(&self) -> &'static str {
        match self {
            ServerRequest::Ping(_) => crate::lifecycle::METHOD_PING,
            ServerRequest::ListRoots(_) => crate::roots::METHOD_LIST_ROOTS,
            ServerRequest::CreateMessage(_) => crate::sampling::METHOD_CREATE_MESSAGE,
            ServerRequest::Elicit(_) => crate::elicitation::METHOD_ELICIT,
        }
    }

    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            ServerRequest::Ping(_) => None,
            ServerRequest::ListRoots(_) => Some(Capability::Roots),
            ServerRequest::CreateMessage(_) => Some(Capability::Sampling),
            ServerRequest::Elicit(_) => Some(Capability::Elicitation),
        }
    }
}

/// Named capability areas gating inbound requests, per the GLOSSARY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Tools,
    Prompts,
    Resources,
    Roots,
    Sampling,
    Elicitation,
    Logging,
    Completions,
}
