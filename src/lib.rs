//! # Modelrelay - Resilient Multi-Provider LLM Invocation
//!
//! Modelrelay presents one uniform call contract in front of several
//! independent LLM providers. It picks a model for each request, translates
//! the request into that provider's wire format, executes the call, and
//! translates the response back into one canonical shape. When a provider
//! fails, the same logical request transparently retries against the next
//! best candidate, while per-model health tracking keeps persistently
//! failing providers out of rotation.
//!
#![deny(unsafe_code)]
//!
//! ## Design
//!
//! - **Registry**: a static catalog of invokable models, derived once from
//!   deployment configuration. A model is enabled iff its API key is set.
//! - **Health**: per-model success/failure history with an
//!   unhealthy-after-3-consecutive-failures classification and a 30s
//!   post-failure cooldown.
//! - **Selection**: candidates ordered by preference and priority, skipping
//!   unhealthy or cooling-down models; during a total outage the full
//!   enabled list is tried anyway.
//! - **Failover**: strictly sequential, one attempt per candidate per call.
//!   Callers see exactly one outcome: a canonical result or one aggregate
//!   error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modelrelay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RelayClient::new(RelayConfig::from_env());
//!
//!     let request = InvokeRequest::new(vec![
//!         Message::system("You are a helpful assistant."),
//!         Message::user("Hello!"),
//!     ]);
//!
//!     let result = client.invoke(request).await?;
//!     println!("{}", result.content_text().unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod registry;
pub mod selector;
pub mod types;

mod standards;

pub use client::{RelayClient, RelayClientBuilder};
pub use config::{ModelDescriptor, ProviderKind, RelayConfig};
pub use error::{LlmError, ModelFailure};
pub use health::{HealthRecord, HealthTracker, ModelStatus, StatusSnapshot};
pub use registry::ModelRegistry;
pub use selector::Selector;

/// Commonly used imports.
pub mod prelude {
    pub use crate::client::RelayClient;
    pub use crate::config::{ProviderKind, RelayConfig};
    pub use crate::error::LlmError;
    pub use crate::types::{
        ContentPart, InvokeRequest, InvokeResult, JsonSchemaSpec, Message, MessageContent,
        ResponseFormat, Role, Tool, ToolChoice,
    };
}
