//! Tool call request and response envelopes.
//!
//! Every tool call, whatever its outcome, is answered with a
//! [`ToolCallResponse`]: an ordered list of text entries plus an error flag.

use rmcp::model::{CallToolResult, Content, JsonObject};
use serde::{Deserialize, Deserializer, Serialize};

use super::ToolError;

/// Inbound tool call: a tool name and its argument bag.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolCallRequest {
    /// Registered tool name.
    pub name: String,

    /// Named arguments; absent or `null` is treated as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub arguments: JsonObject,
}

impl ToolCallRequest {
    /// Create a request from a name and a JSON value.
    ///
    /// Non-object values are treated as an empty argument bag.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let arguments = match arguments {
            serde_json::Value::Object(map) => map,
            _ => JsonObject::new(),
        };
        Self {
            name: name.into(),
            arguments,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<JsonObject, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<JsonObject>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single content entry of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// Outbound tool call result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResponse {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl ToolCallResponse {
    /// Wrap a value as pretty-printed JSON text.
    pub fn success<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self {
                content: vec![ContentBlock::Text { text }],
                is_error: false,
            },
            Err(e) => Self::error(format!("Failed to serialize tool result: {e}")),
        }
    }

    /// Build an error envelope from a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Text of the first content entry.
    pub fn text(&self) -> &str {
        match self.content.first() {
            Some(ContentBlock::Text { text }) => text,
            None => "",
        }
    }

    /// Parse the first content entry back into JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(self.text()).ok()
    }
}

impl From<&ToolError> for ToolCallResponse {
    fn from(err: &ToolError) -> Self {
        Self::error(err.to_string())
    }
}

impl From<ToolCallResponse> for CallToolResult {
    fn from(response: ToolCallResponse) -> Self {
        let content = response
            .content
            .into_iter()
            .map(|ContentBlock::Text { text }| Content::text(text))
            .collect();
        if response.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}
