use serde::Deserialize;
use serde::Serialize;

/// Content block shared by tool results, prompt messages, and sampling
/// messages. `original_source/src/conduit/protocol/content.py` models several
/// variants (text/image/audio/resource); only the text variant carries
/// meaningful payload for this spec's scope, so the others are kept as
/// pass-through data rather than fully modeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
    Image { data: String, mime_type: String },
    Audio { data: String, mime_type: String },
    Resource { resource: serde_json::Value },
}

impl Content {
    pub fn text(s: impl Into<String>) -> Self {
        Content::Text { text: s.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}
