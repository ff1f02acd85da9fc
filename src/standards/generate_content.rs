//! Flattened-turn wire family (Gemini `generateContent`).
//!
//! Gemini's API is not message-based: the conversation flattens into an
//! ordered `contents` list whose roles collapse to a two-valued space
//! (`user` vs `model`), schema hints move into a generation-configuration
//! object instead of `response_format`, and the credential travels as a
//! query parameter rather than a header. The response envelope is likewise
//! synthesized: the translator picks the best candidate and fills in id,
//! timestamp and any usage counters the provider omitted.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::ModelDescriptor;
use crate::error::LlmError;
use crate::types::{
    Choice, ChoiceMessage, ContentPart, InvokeRequest, InvokeResult, Message, MessageContent,
    ResponseFormat, Role, ToolCall, ToolChoice, Usage,
};

use super::{DEFAULT_MAX_TOKENS, WireStandard};

/// Strategy object for the flattened-turn family.
pub(crate) struct GenerateContentStandard;

impl WireStandard for GenerateContentStandard {
    fn endpoint(&self, model: &ModelDescriptor) -> String {
        let base = model.base_url.trim_end_matches('/');
        format!("{base}/models/{}:generateContent", model.name)
    }

    fn apply_auth(
        &self,
        model: &ModelDescriptor,
        request: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        request.query(&[("key", model.api_key.expose_secret())])
    }

    fn translate_request(
        &self,
        _model: &ModelDescriptor,
        request: &InvokeRequest,
    ) -> Result<serde_json::Value, LlmError> {
        let contents = request.messages.iter().map(wire_content).collect();

        let tools = request.tools.as_ref().filter(|t| !t.is_empty()).map(|tools| {
            vec![GeminiTool {
                function_declarations: tools
                    .iter()
                    .map(|tool| FunctionDeclaration {
                        name: tool.function.name.clone(),
                        description: tool.function.description.clone(),
                        parameters: tool.function.parameters.clone(),
                    })
                    .collect(),
            }]
        });

        let tool_config = match (&tools, &request.tool_choice) {
            (Some(_), Some(choice)) => Some(wire_tool_config(choice)),
            _ => None,
        };

        let mut generation_config = GenerationConfig {
            max_output_tokens: Some(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
            response_mime_type: None,
            response_schema: None,
        };
        match &request.response_format {
            Some(ResponseFormat::JsonSchema { json_schema }) => {
                generation_config.response_mime_type = Some("application/json".to_string());
                generation_config.response_schema = Some(json_schema.schema.clone());
            }
            Some(ResponseFormat::JsonObject) => {
                generation_config.response_mime_type = Some("application/json".to_string());
            }
            Some(ResponseFormat::Text) | None => {}
        }

        let wire = GenerateContentRequest {
            contents,
            tools,
            tool_config,
            generation_config: Some(generation_config),
        };

        serde_json::to_value(wire)
            .map_err(|e| LlmError::InternalError(format!("serialize request failed: {e}")))
    }

    fn translate_response(
        &self,
        model: &ModelDescriptor,
        raw: serde_json::Value,
    ) -> Result<InvokeResult, LlmError> {
        let response: GenerateContentResponse = serde_json::from_value(raw)
            .map_err(|e| LlmError::ParseError(format!("invalid generateContent response: {e}")))?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ParseError("response contained no candidates".to_string()))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        if let Some(content) = candidate.content {
            for part in content.parts {
                match part {
                    Part::Text { text: chunk } => text.push_str(&chunk),
                    Part::FunctionCall { function_call } => {
                        tool_calls.push(ToolCall {
                            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                            kind: "function".to_string(),
                            function: crate::types::FunctionCall {
                                name: function_call.name,
                                arguments: function_call.args.to_string(),
                            },
                        });
                    }
                    Part::FileData { .. } => {}
                }
            }
        }

        let finish_reason =
            wire_finish_reason(candidate.finish_reason.as_deref(), !tool_calls.is_empty());

        let usage = response.usage_metadata.unwrap_or_default();
        let prompt_tokens = usage.prompt_token_count.unwrap_or(0);
        let completion_tokens = usage.candidates_token_count.unwrap_or(0);
        let total_tokens = usage
            .total_token_count
            .unwrap_or(prompt_tokens + completion_tokens);

        Ok(InvokeResult {
            id: response
                .response_id
                .unwrap_or_else(|| format!("gen-{}", uuid::Uuid::new_v4())),
            created: chrono::Utc::now().timestamp(),
            model: response.model_version.unwrap_or_else(|| model.name.clone()),
            choices: vec![Choice {
                index: 0,
                message: ChoiceMessage {
                    role: Role::Assistant,
                    content: (!text.is_empty()).then_some(MessageContent::Text(text)),
                    tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                },
                finish_reason,
            }],
            usage: Some(Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens,
            }),
        })
    }
}

/// Collapse a canonical role onto the two-valued turn space.
fn wire_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::System | Role::User | Role::Tool => "user",
    }
}

fn wire_content(message: &Message) -> Content {
    let parts = match &message.content {
        MessageContent::Text(text) => vec![Part::Text { text: text.clone() }],
        MessageContent::Parts(parts) => parts.iter().map(wire_part).collect(),
    };
    Content {
        role: Some(wire_role(message.role).to_string()),
        parts,
    }
}

fn wire_part(part: &ContentPart) -> Part {
    match part {
        ContentPart::Text { text } => Part::Text { text: text.clone() },
        ContentPart::ImageUrl { image_url } => Part::FileData {
            file_data: FileData {
                file_uri: image_url.url.clone(),
                mime_type: None,
            },
        },
        ContentPart::FileUrl { file_url } => Part::FileData {
            file_data: FileData {
                file_uri: file_url.url.clone(),
                mime_type: file_url.mime_type.clone(),
            },
        },
    }
}

fn wire_tool_config(choice: &ToolChoice) -> ToolConfig {
    let config = match choice {
        ToolChoice::None => FunctionCallingConfig {
            mode: "NONE".to_string(),
            allowed_function_names: None,
        },
        ToolChoice::Auto => FunctionCallingConfig {
            mode: "AUTO".to_string(),
            allowed_function_names: None,
        },
        // Normalization resolves `Required` to a named tool before this point.
        ToolChoice::Required => FunctionCallingConfig {
            mode: "ANY".to_string(),
            allowed_function_names: None,
        },
        ToolChoice::Tool { name } => FunctionCallingConfig {
            mode: "ANY".to_string(),
            allowed_function_names: Some(vec![name.clone()]),
        },
    };
    ToolConfig {
        function_calling_config: config,
    }
}

fn wire_finish_reason(reason: Option<&str>, has_tool_calls: bool) -> Option<String> {
    let mapped = match reason {
        Some("STOP") if has_tool_calls => "tool_calls",
        Some("STOP") => "stop",
        Some("MAX_TOKENS") => "length",
        Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") | Some("IMAGE_SAFETY") => {
            "content_filter"
        }
        Some(other) => return Some(other.to_lowercase()),
        None if has_tool_calls => "tool_calls",
        None => return None,
    };
    Some(mapped.to_string())
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// Generate Content request (protocol layer)
#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    /// The flattened conversation turns
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "toolConfig")]
    tool_config: Option<ToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: WireFunctionCall,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileData {
    #[serde(rename = "fileUri")]
    file_uri: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "mimeType")]
    mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiTool {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
struct FunctionDeclaration {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
struct ToolConfig {
    #[serde(rename = "functionCallingConfig")]
    function_calling_config: FunctionCallingConfig,
}

#[derive(Debug, Clone, Serialize)]
struct FunctionCallingConfig {
    mode: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "allowedFunctionNames")]
    allowed_function_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none", rename = "maxOutputTokens")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "responseMimeType")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "responseSchema")]
    response_schema: Option<serde_json::Value>,
}

/// Generate Content response
#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default, rename = "modelVersion")]
    model_version: Option<String>,
    #[serde(default, rename = "responseId")]
    response_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct UsageMetadata {
    #[serde(default, rename = "promptTokenCount")]
    prompt_token_count: Option<u32>,
    #[serde(default, rename = "candidatesTokenCount")]
    candidates_token_count: Option<u32>,
    #[serde(default, rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}
