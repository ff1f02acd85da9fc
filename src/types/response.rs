//! Canonical result types

use serde::{Deserialize, Serialize};

use super::request::{MessageContent, Role};

/// Canonical invocation result.
///
/// For the message-array provider family this is the provider document with
/// field renaming only; for the flattened-turn family the translator
/// synthesizes the envelope fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResult {
    /// Response id
    #[serde(default)]
    pub id: String,
    /// Unix timestamp (seconds) of creation
    #[serde(default)]
    pub created: i64,
    /// Model that actually produced the response
    #[serde(default)]
    pub model: String,
    /// Completion choices, in order
    pub choices: Vec<Choice>,
    /// Token usage, when the provider reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl InvokeResult {
    /// Text content of the first choice, if any
    pub fn content_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .and_then(MessageContent::text)
    }

    /// Tool calls of the first choice
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.choices
            .first()
            .and_then(|choice| choice.message.tool_calls.as_deref())
            .unwrap_or_default()
    }
}

/// One completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Position within the response
    #[serde(default)]
    pub index: u32,
    /// The generated message
    pub message: ChoiceMessage,
    /// Why generation stopped (`stop`, `length`, `tool_calls`, ...)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message inside a [`Choice`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// Role, normally `assistant`
    pub role: Role,
    /// Content; absent when the model only produced tool calls
    #[serde(default)]
    pub content: Option<MessageContent>,
    /// Tool calls requested by the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// A tool call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    /// Always `"function"`
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

/// Function invocation within a [`ToolCall`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as the provider produced them
    pub arguments: String,
}

/// Token usage counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}
