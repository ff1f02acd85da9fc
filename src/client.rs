//! Invocation orchestrator.
//!
//! [`RelayClient`] fronts every configured provider with one uniform
//! [`invoke`](RelayClient::invoke) contract: it orders candidates, tries them
//! strictly sequentially, updates per-model health on each outcome, and
//! returns the first success or one aggregate failure. Each candidate gets
//! exactly one attempt per invocation; resilience comes from failing over to
//! the next model, not from re-trying the same one.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ModelDescriptor, RelayConfig};
use crate::error::{LlmError, ModelFailure, classify_http_error};
use crate::health::{HealthTracker, StatusSnapshot};
use crate::registry::ModelRegistry;
use crate::selector::Selector;
use crate::standards::{WireStandard, normalize_request, standard_for};
use crate::types::{InvokeRequest, InvokeResult};

/// Client fronting all configured providers.
///
/// Cheap to share behind an `Arc`; concurrent invocations only contend on
/// the health tracker's lock.
///
/// # Examples
///
/// ```rust,no_run
/// use modelrelay::{RelayClient, RelayConfig};
/// use modelrelay::types::{InvokeRequest, Message};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RelayClient::new(RelayConfig::from_env());
///     let result = client
///         .invoke(InvokeRequest::new(vec![Message::user("Hello!")]))
///         .await?;
///     println!("{}", result.content_text().unwrap_or_default());
///     Ok(())
/// }
/// ```
pub struct RelayClient {
    registry: Arc<ModelRegistry>,
    health: Arc<HealthTracker>,
    selector: Selector,
    http: reqwest::Client,
}

impl RelayClient {
    /// Create a client with default health settings and HTTP client.
    pub fn new(config: RelayConfig) -> Self {
        Self::builder(config).build()
    }

    /// Start building a client with custom settings.
    pub fn builder(config: RelayConfig) -> RelayClientBuilder {
        RelayClientBuilder {
            config,
            http: None,
            failure_threshold: None,
            cooldown: None,
        }
    }

    /// Invoke the best available model with automatic failover.
    ///
    /// Candidates are attempted in order until one succeeds; the first
    /// success returns immediately. A request-shape problem fails fast with
    /// [`LlmError::ConfigurationError`] before any network call. When every
    /// candidate fails, the aggregate [`LlmError::AllModelsFailed`] carries
    /// one entry per attempted model.
    pub async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResult, LlmError> {
        let request = normalize_request(request)?;
        let candidates = self.selector.select(request.model.as_deref())?;

        let mut failures = Vec::new();
        for candidate in &candidates {
            match self.invoke_model(candidate, &request).await {
                Ok(result) => {
                    self.health.mark_success(&candidate.name);
                    if let Some(wanted) = &request.model
                        && *wanted != candidate.name
                    {
                        tracing::info!(
                            requested = %wanted,
                            model = %candidate.name,
                            "fallback model succeeded"
                        );
                    }
                    return Ok(result);
                }
                Err(error) => {
                    tracing::error!(model = %candidate.name, error = %error, "model invocation failed");
                    self.health.mark_failure(&candidate.name, &error);
                    failures.push(ModelFailure::new(&candidate.name, &error));
                }
            }
        }

        Err(LlmError::AllModelsFailed(failures))
    }

    /// One attempt against one candidate.
    async fn invoke_model(
        &self,
        model: &ModelDescriptor,
        request: &InvokeRequest,
    ) -> Result<InvokeResult, LlmError> {
        let standard: &dyn WireStandard = standard_for(model.provider);
        let url = standard.endpoint(model);
        let body = standard.translate_request(model, request)?;

        tracing::debug!(provider = %model.provider, model = %model.name, url = %url, "invoking model");

        let response = standard
            .apply_auth(model, self.http.post(&url))
            .timeout(model.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e, model.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), &text));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("response body was not JSON: {e}")))?;

        standard.translate_response(model, raw)
    }

    /// Read-only status of every enabled model, plus aggregate counts.
    pub fn status(&self) -> StatusSnapshot {
        self.health.status(&self.registry)
    }

    /// Restore every model to healthy and clear all counters.
    pub fn reset_health(&self) {
        self.health.reset_all(&self.registry);
    }

    /// The model registry backing this client.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}

fn classify_transport_error(error: &reqwest::Error, timeout: Duration) -> LlmError {
    if error.is_timeout() {
        LlmError::TimeoutError(format!("no response within {timeout:?}"))
    } else if error.is_connect() {
        LlmError::ConnectionError(error.to_string())
    } else {
        LlmError::HttpError(error.to_string())
    }
}

/// Builder for [`RelayClient`].
pub struct RelayClientBuilder {
    config: RelayConfig,
    http: Option<reqwest::Client>,
    failure_threshold: Option<u32>,
    cooldown: Option<Duration>,
}

impl RelayClientBuilder {
    /// Use a preconfigured HTTP client (proxies, connection pools, ...).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Override the consecutive-failure threshold.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = Some(threshold);
        self
    }

    /// Override the post-failure cooldown window.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Build the client.
    pub fn build(self) -> RelayClient {
        let registry = Arc::new(ModelRegistry::new(self.config));

        let mut health = HealthTracker::for_registry(&registry);
        if let Some(threshold) = self.failure_threshold {
            health = health.with_failure_threshold(threshold);
        }
        if let Some(cooldown) = self.cooldown {
            health = health.with_cooldown(cooldown);
        }
        let health = Arc::new(health);

        RelayClient {
            selector: Selector::new(registry.clone(), health.clone()),
            registry,
            health,
            http: self.http.unwrap_or_default(),
        }
    }
}
