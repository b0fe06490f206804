use serde::Deserialize;
use serde::Serialize;

use crate::completion::CompleteResult;
use crate::elicitation::ElicitResult;
use crate::lifecycle::EmptyResult;
use crate::lifecycle::InitializeResult;
use crate::prompts::GetPromptResult;
use crate::prompts::ListPromptsResult;
use crate::resources::ListResourceTemplatesResult;
use crate::resources::ListResourcesResult;
use crate::resources::ReadResourceResult;
use crate::roots::ListRootsResult;
use crate::sampling::CreateMessageResult;
use crate::tools::CallToolResult;
use crate::tools::ListToolsResult;

/// The result a server sends back for a given [`crate::request::ClientRequest`]
/// variant. Untagged: the wire `result` object is decoded against whichever
/// variant matches the *outstanding request* the response correlates to
/// (spec §4.1 "a response's result must parse against the original request's
/// expected result type"), not against a discriminant carried on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerResult {
    Initialize(InitializeResult),
    Empty(EmptyResult),
    ListTools(ListToolsResult),
    CallTool(CallToolResult),
    ListPrompts(ListPromptsResult),
    GetPrompt(GetPromptResult),
    ListResources(ListResourcesResult),
    ListResourceTemplates(ListResourceTemplatesResult),
    ReadResource(ReadResourceResult),
    Complete(CompleteResult),
}

/// The result a client sends back for a given [`crate::request::ServerRequest`]
/// variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientResult {
    Empty(EmptyResult),
    ListRoots(ListRootsResult),
    CreateMessage(CreateMessageResult),
    Elicit(ElicitResult),
}
