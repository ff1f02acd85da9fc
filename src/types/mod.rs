//! Canonical request and result types.
//!
//! These are the provider-agnostic shapes exposed to callers. The wire
//! standards in [`crate::standards`] translate them to and from each
//! provider family's own format.

mod request;
mod response;

pub use request::{
    ContentPart, FileUrl, FunctionDef, ImageUrl, InvokeRequest, JsonSchemaSpec, Message,
    MessageContent, ResponseFormat, Role, Tool, ToolChoice,
};
pub use response::{Choice, ChoiceMessage, FunctionCall, InvokeResult, ToolCall, Usage};
