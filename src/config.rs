//! Deployment configuration.
//!
//! One [`ModelDescriptor`] per invokable model, derived once from deployment
//! settings. Operators control availability solely by supplying or
//! withholding credentials: a descriptor is enabled iff its API key is
//! non-empty.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Supported provider kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini (native `generateContent` API)
    Gemini,
    /// Moonshot Kimi
    Kimi,
    /// Alibaba Qwen (DashScope compatible mode)
    Qwen,
    /// DeepSeek
    DeepSeek,
    /// Forge gateway
    Forge,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Gemini => "gemini",
            Self::Kimi => "kimi",
            Self::Qwen => "qwen",
            Self::DeepSeek => "deepseek",
            Self::Forge => "forge",
        };
        f.write_str(name)
    }
}

/// Static configuration identifying one invokable model.
///
/// Immutable after process start.
#[derive(Debug)]
pub struct ModelDescriptor {
    /// Model name, unique across the catalog
    pub name: String,
    /// Provider kind, selects the wire standard
    pub provider: ProviderKind,
    /// API credential; empty means disabled
    pub api_key: SecretString,
    /// Base endpoint
    pub base_url: String,
    /// Enabled iff the credential is non-empty
    pub enabled: bool,
    /// Selection priority; lower is preferred
    pub priority: u32,
    /// Per-request timeout
    pub timeout: Duration,
    /// Carried retry budget; the orchestrator performs one attempt per
    /// candidate per invocation and fails over instead of retrying
    pub max_retries: u32,
}

impl ModelDescriptor {
    /// Create a descriptor with the default timeout (60s) and retry budget.
    pub fn new(
        name: impl Into<String>,
        provider: ProviderKind,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        priority: u32,
    ) -> Self {
        let api_key = api_key.into();
        Self {
            name: name.into(),
            provider,
            enabled: !api_key.is_empty(),
            api_key: SecretString::from(api_key),
            base_url: base_url.into(),
            priority,
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Full configuration for a [`RelayClient`](crate::client::RelayClient).
#[derive(Debug)]
pub struct RelayConfig {
    /// Model catalog, in registration order
    pub models: Vec<ModelDescriptor>,
    /// Name of the configured default model
    pub default_model: String,
}

impl RelayConfig {
    /// Build the deployment catalog from process environment variables.
    ///
    /// Recognized variables: `GEMINI_API_KEY`/`GEMINI_API_URL`,
    /// `KIMI_API_KEY`/`KIMI_API_URL`, `QWEN_API_KEY`/`QWEN_API_URL`,
    /// `DEEPSEEK_API_KEY`/`DEEPSEEK_API_URL`, `FORGE_API_KEY`/`FORGE_API_URL`
    /// and `DEFAULT_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the catalog with an explicit settings lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).unwrap_or_default();
        let url = |key: &str, default: &str| {
            lookup(key).filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
        };

        let gemini_key = var("GEMINI_API_KEY");
        let gemini_url = url(
            "GEMINI_API_URL",
            "https://generativelanguage.googleapis.com/v1beta",
        );
        let kimi_key = var("KIMI_API_KEY");
        let kimi_url = url("KIMI_API_URL", "https://api.moonshot.cn/v1");
        let qwen_key = var("QWEN_API_KEY");
        let qwen_url = url(
            "QWEN_API_URL",
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
        );
        let deepseek_key = var("DEEPSEEK_API_KEY");
        let deepseek_url = url("DEEPSEEK_API_URL", "https://api.deepseek.com/v1");
        let forge_key = var("FORGE_API_KEY");
        let forge_url = url("FORGE_API_URL", "https://forge.manus.im");

        let models = vec![
            ModelDescriptor::new(
                "gemini-2.5-pro",
                ProviderKind::Gemini,
                gemini_key.clone(),
                gemini_url.clone(),
                1,
            ),
            ModelDescriptor::new("gemini-3.0-pro", ProviderKind::Gemini, gemini_key, gemini_url, 2),
            ModelDescriptor::new("kimi-2.5", ProviderKind::Kimi, kimi_key.clone(), kimi_url.clone(), 3),
            ModelDescriptor::new("moonshot-v1-32k", ProviderKind::Kimi, kimi_key, kimi_url, 4),
            ModelDescriptor::new("qwen-max", ProviderKind::Qwen, qwen_key.clone(), qwen_url.clone(), 5),
            ModelDescriptor::new("qwen-turbo", ProviderKind::Qwen, qwen_key, qwen_url, 6),
            ModelDescriptor::new(
                "deepseek-reasoner",
                ProviderKind::DeepSeek,
                deepseek_key.clone(),
                deepseek_url.clone(),
                7,
            )
            .with_timeout(Duration::from_secs(120)),
            ModelDescriptor::new("deepseek-chat", ProviderKind::DeepSeek, deepseek_key, deepseek_url, 8),
            ModelDescriptor::new("forge-default", ProviderKind::Forge, forge_key, forge_url, 9),
        ];

        let default_model = lookup("DEFAULT_MODEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "gemini-2.5-pro".to_string());

        Self {
            models,
            default_model,
        }
    }
}
