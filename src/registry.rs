//! Static model catalog.
//!
//! Built exactly once from [`RelayConfig`]; descriptors never change after
//! construction. Health is tracked separately in [`crate::health`].

use std::sync::Arc;

use crate::config::{ModelDescriptor, RelayConfig};
use crate::error::LlmError;

/// Immutable catalog of invokable models.
pub struct ModelRegistry {
    models: Vec<Arc<ModelDescriptor>>,
    default_model: String,
}

impl ModelRegistry {
    /// Build the registry from configuration.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            models: config.models.into_iter().map(Arc::new).collect(),
            default_model: config.default_model,
        }
    }

    /// All registered descriptors, in registration order.
    pub fn all(&self) -> &[Arc<ModelDescriptor>] {
        &self.models
    }

    /// Enabled descriptors sorted by ascending priority.
    ///
    /// The sort is stable, so priority ties keep registration order.
    pub fn enabled(&self) -> Vec<Arc<ModelDescriptor>> {
        let mut enabled: Vec<_> = self
            .models
            .iter()
            .filter(|m| m.enabled)
            .cloned()
            .collect();
        enabled.sort_by_key(|m| m.priority);
        enabled
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&Arc<ModelDescriptor>> {
        self.models.iter().find(|m| m.name == name)
    }

    /// The computed default: the configured default model if enabled,
    /// otherwise the top-priority enabled descriptor.
    pub fn default_model(&self) -> Result<Arc<ModelDescriptor>, LlmError> {
        if let Some(configured) = self.get(&self.default_model)
            && configured.enabled
        {
            return Ok(configured.clone());
        }
        self.enabled()
            .into_iter()
            .next()
            .ok_or(LlmError::NoModelAvailable)
    }
}
