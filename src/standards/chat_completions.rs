//! Message-array wire family.
//!
//! The chat-completions shape shared by kimi, qwen, deepseek and the forge
//! gateway: `{ model, messages[], tools?, tool_choice?, response_format?,
//! max_tokens }` POSTed with a bearer credential. Responses already match the
//! canonical result modulo field names, so translation back is a plain
//! deserialization.

use secrecy::ExposeSecret;

use crate::config::{ModelDescriptor, ProviderKind};
use crate::error::LlmError;
use crate::types::{
    ContentPart, InvokeRequest, InvokeResult, Message, MessageContent, ResponseFormat, Role,
    ToolChoice,
};

use super::{DEFAULT_MAX_TOKENS, WireStandard};

/// Strategy object for the message-array family.
pub(crate) struct ChatCompletionsStandard;

impl WireStandard for ChatCompletionsStandard {
    fn endpoint(&self, model: &ModelDescriptor) -> String {
        let base = model.base_url.trim_end_matches('/');
        match model.provider {
            // These base URLs already carry their version segment.
            ProviderKind::Kimi | ProviderKind::Qwen | ProviderKind::DeepSeek => {
                format!("{base}/chat/completions")
            }
            _ => format!("{base}/v1/chat/completions"),
        }
    }

    fn apply_auth(
        &self,
        model: &ModelDescriptor,
        request: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        request.bearer_auth(model.api_key.expose_secret())
    }

    fn translate_request(
        &self,
        model: &ModelDescriptor,
        request: &InvokeRequest,
    ) -> Result<serde_json::Value, LlmError> {
        let messages: Vec<serde_json::Value> =
            request.messages.iter().map(wire_message).collect();

        let mut body = serde_json::json!({
            "model": model.name,
            "messages": messages,
        });

        if let Some(tools) = &request.tools
            && !tools.is_empty()
        {
            body["tools"] = serde_json::to_value(tools)
                .map_err(|e| LlmError::InternalError(format!("serialize tools failed: {e}")))?;
            if let Some(choice) = &request.tool_choice {
                body["tool_choice"] = wire_tool_choice(choice);
            }
        }

        body["max_tokens"] = serde_json::json!(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS));

        if let Some(format) = &request.response_format {
            body["response_format"] = wire_response_format(format)?;
        }

        Ok(body)
    }

    fn translate_response(
        &self,
        model: &ModelDescriptor,
        raw: serde_json::Value,
    ) -> Result<InvokeResult, LlmError> {
        let mut result: InvokeResult = serde_json::from_value(raw)
            .map_err(|e| LlmError::ParseError(format!("invalid completion response: {e}")))?;
        if result.model.is_empty() {
            result.model = model.name.clone();
        }
        Ok(result)
    }
}

/// Convert one canonical message to the wire shape.
///
/// Content collapses to a plain string when it is a single text part;
/// tool-role content always flattens to one string, with non-text parts
/// JSON-encoded.
fn wire_message(message: &Message) -> serde_json::Value {
    if message.role == Role::Tool {
        let content = flatten_to_text(&message.content);
        let mut wire = serde_json::json!({
            "role": message.role,
            "content": content,
        });
        if let Some(name) = &message.name {
            wire["name"] = serde_json::json!(name);
        }
        if let Some(id) = &message.tool_call_id {
            wire["tool_call_id"] = serde_json::json!(id);
        }
        return wire;
    }

    let content = match &message.content {
        MessageContent::Text(text) => serde_json::json!(text),
        MessageContent::Parts(parts) => match parts.as_slice() {
            [ContentPart::Text { text }] => serde_json::json!(text),
            parts => serde_json::json!(parts),
        },
    };

    let mut wire = serde_json::json!({
        "role": message.role,
        "content": content,
    });
    if let Some(name) = &message.name {
        wire["name"] = serde_json::json!(name);
    }
    wire
}

fn flatten_to_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => text.clone(),
                other => serde_json::to_string(other).unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn wire_tool_choice(choice: &ToolChoice) -> serde_json::Value {
    match choice {
        ToolChoice::None => serde_json::json!("none"),
        ToolChoice::Auto => serde_json::json!("auto"),
        // Normalization resolves `Required` to a named tool before this point.
        ToolChoice::Required => serde_json::json!("required"),
        ToolChoice::Tool { name } => serde_json::json!({
            "type": "function",
            "function": { "name": name },
        }),
    }
}

fn wire_response_format(format: &ResponseFormat) -> Result<serde_json::Value, LlmError> {
    serde_json::to_value(format)
        .map_err(|e| LlmError::InternalError(format!("serialize response_format failed: {e}")))
}
