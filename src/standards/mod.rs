//! Wire standards.
//!
//! Two provider wire families are supported: the message-array family
//! ([`chat_completions`]) spoken by most providers, and the flattened-turn
//! family ([`generate_content`]) spoken by Gemini. Each family is a strategy
//! object implementing [`WireStandard`], selected by provider kind.
//!
//! Request normalization ([`normalize_request`]) is family-independent and
//! runs once per invocation, before any network attempt, so malformed
//! requests surface as [`LlmError::ConfigurationError`] without touching a
//! provider.

pub(crate) mod chat_completions;
pub(crate) mod generate_content;

use crate::config::{ModelDescriptor, ProviderKind};
use crate::error::LlmError;
use crate::types::{InvokeRequest, InvokeResult, JsonSchemaSpec, ResponseFormat, Tool, ToolChoice};

/// Applied at the wire when the caller did not cap the output length.
pub(crate) const DEFAULT_MAX_TOKENS: u32 = 32_768;

/// Request/response translation for one provider wire family.
pub(crate) trait WireStandard: Send + Sync {
    /// Full request URL for the given model.
    fn endpoint(&self, model: &ModelDescriptor) -> String;

    /// Attach the credential to the outgoing request.
    fn apply_auth(
        &self,
        model: &ModelDescriptor,
        request: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder;

    /// Translate a canonical request into the provider's wire payload.
    fn translate_request(
        &self,
        model: &ModelDescriptor,
        request: &InvokeRequest,
    ) -> Result<serde_json::Value, LlmError>;

    /// Translate the provider's raw response back to canonical form.
    fn translate_response(
        &self,
        model: &ModelDescriptor,
        raw: serde_json::Value,
    ) -> Result<InvokeResult, LlmError>;
}

static CHAT_COMPLETIONS: chat_completions::ChatCompletionsStandard =
    chat_completions::ChatCompletionsStandard;
static GENERATE_CONTENT: generate_content::GenerateContentStandard =
    generate_content::GenerateContentStandard;

/// The wire standard spoken by the given provider kind.
pub(crate) fn standard_for(kind: ProviderKind) -> &'static dyn WireStandard {
    match kind {
        ProviderKind::Gemini => &GENERATE_CONTENT,
        ProviderKind::Kimi | ProviderKind::Qwen | ProviderKind::DeepSeek | ProviderKind::Forge => {
            &CHAT_COMPLETIONS
        }
    }
}

/// Validate and normalize a canonical request.
///
/// Resolves the tool-choice directive against the supplied tools and promotes
/// the `output_schema` shorthand into an explicit `json_schema` response
/// format. All failures are configuration errors raised before any network
/// attempt.
pub(crate) fn normalize_request(mut request: InvokeRequest) -> Result<InvokeRequest, LlmError> {
    if request.messages.is_empty() {
        return Err(LlmError::ConfigurationError(
            "at least one message is required".to_string(),
        ));
    }

    if let Some(choice) = request.tool_choice.take() {
        request.tool_choice = Some(normalize_tool_choice(choice, request.tools.as_deref())?);
    }

    request.response_format = normalize_response_format(
        request.response_format.take(),
        request.output_schema.take(),
    )?;

    Ok(request)
}

/// Resolve a tool-choice directive.
///
/// `none` and `auto` pass through. `required` resolves to the single
/// configured tool; with zero or several tools the directive is ambiguous
/// and rejected. A named choice passes through for the translators to encode.
fn normalize_tool_choice(
    choice: ToolChoice,
    tools: Option<&[Tool]>,
) -> Result<ToolChoice, LlmError> {
    match choice {
        ToolChoice::None | ToolChoice::Auto => Ok(choice),
        ToolChoice::Required => {
            let tools = tools.unwrap_or_default();
            match tools {
                [] => Err(LlmError::ConfigurationError(
                    "tool_choice 'required' was provided but no tools were configured".to_string(),
                )),
                [only] => Ok(ToolChoice::Tool {
                    name: only.function.name.clone(),
                }),
                _ => Err(LlmError::ConfigurationError(
                    "tool_choice 'required' needs a single tool or an explicit tool name"
                        .to_string(),
                )),
            }
        }
        ToolChoice::Tool { name } => Ok(ToolChoice::Tool { name }),
    }
}

/// Validate an explicit response format, or promote the `output_schema`
/// shorthand into the canonical `json_schema` format.
fn normalize_response_format(
    format: Option<ResponseFormat>,
    output_schema: Option<JsonSchemaSpec>,
) -> Result<Option<ResponseFormat>, LlmError> {
    if let Some(format) = format {
        if let ResponseFormat::JsonSchema { json_schema } = &format {
            let valid = json_schema
                .schema
                .as_object()
                .is_some_and(|schema| !schema.is_empty());
            if !valid {
                return Err(LlmError::ConfigurationError(
                    "response_format json_schema requires a non-empty schema object".to_string(),
                ));
            }
        }
        return Ok(Some(format));
    }

    let Some(schema) = output_schema else {
        return Ok(None);
    };

    if schema.name.is_empty() || schema.schema.is_null() {
        return Err(LlmError::ConfigurationError(
            "output_schema requires both name and schema".to_string(),
        ));
    }

    Ok(Some(ResponseFormat::JsonSchema {
        json_schema: schema,
    }))
}
