//! Candidate selection.
//!
//! Produces the ordered, deduplicated list of models one invocation will try,
//! honoring preference, priority, health classification and cooldown.

use std::sync::Arc;

use crate::config::ModelDescriptor;
use crate::error::LlmError;
use crate::health::HealthTracker;
use crate::registry::ModelRegistry;

/// Orders candidates for one invocation.
pub struct Selector {
    registry: Arc<ModelRegistry>,
    health: Arc<HealthTracker>,
}

impl Selector {
    /// Create a selector over the given registry and health tracker.
    pub fn new(registry: Arc<ModelRegistry>, health: Arc<HealthTracker>) -> Self {
        Self { registry, health }
    }

    /// Ordered, deduplicated candidate list for one invocation.
    ///
    /// A usable preferred model jumps to the front of the full enabled list.
    /// Without a usable preference the list is restricted to models that are
    /// healthy and out of cooldown; if that filter empties the list, the full
    /// enabled list is returned instead, trading health-signal correctness
    /// for availability during a total outage.
    ///
    /// Fails with [`LlmError::NoModelAvailable`] only when the registry has
    /// zero enabled models.
    pub fn select(&self, preferred: Option<&str>) -> Result<Vec<Arc<ModelDescriptor>>, LlmError> {
        let enabled = self.registry.enabled();
        if enabled.is_empty() {
            return Err(LlmError::NoModelAvailable);
        }

        if let Some(name) = preferred
            && let Some(model) = self.registry.get(name)
            && model.enabled
            && !self.health.is_in_cooldown(name)
            && self.health.is_healthy(name)
        {
            let mut candidates = vec![model.clone()];
            candidates.extend(enabled.into_iter().filter(|m| m.name != name));
            return Ok(candidates);
        }

        let available: Vec<_> = enabled
            .iter()
            .filter(|m| self.health.is_healthy(&m.name) && !self.health.is_in_cooldown(&m.name))
            .cloned()
            .collect();

        if available.is_empty() {
            tracing::warn!("all models unhealthy or in cooldown, trying the full enabled list");
            return Ok(enabled);
        }

        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelDescriptor, ProviderKind, RelayConfig};
    use std::time::Duration;

    fn registry_of(models: &[(&str, u32)]) -> Arc<ModelRegistry> {
        let models = models
            .iter()
            .map(|(name, priority)| {
                ModelDescriptor::new(
                    *name,
                    ProviderKind::Kimi,
                    "key",
                    "https://api.test/v1",
                    *priority,
                )
            })
            .collect();
        Arc::new(ModelRegistry::new(RelayConfig {
            models,
            default_model: "a".to_string(),
        }))
    }

    fn selector(registry: &Arc<ModelRegistry>) -> (Selector, Arc<HealthTracker>) {
        let health = Arc::new(HealthTracker::for_registry(registry));
        (Selector::new(registry.clone(), health.clone()), health)
    }

    fn names(candidates: &[Arc<ModelDescriptor>]) -> Vec<&str> {
        candidates.iter().map(|m| m.name.as_str()).collect()
    }

    fn failure() -> LlmError {
        LlmError::api_error(500, "server error")
    }

    #[test]
    fn orders_by_priority_and_is_repeatable() {
        let registry = registry_of(&[("b", 2), ("a", 1), ("c", 3)]);
        let (selector, _) = selector(&registry);

        let first = selector.select(None).unwrap();
        assert_eq!(names(&first), vec!["a", "b", "c"]);
        let second = selector.select(None).unwrap();
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn usable_preferred_model_moves_to_front() {
        let registry = registry_of(&[("a", 1), ("b", 2), ("c", 3)]);
        let (selector, _) = selector(&registry);

        let candidates = selector.select(Some("c")).unwrap();
        assert_eq!(names(&candidates), vec!["c", "a", "b"]);
    }

    #[test]
    fn unhealthy_preferred_model_is_ignored() {
        let registry = registry_of(&[("a", 1), ("b", 2)]);
        let (selector, health) = selector(&registry);

        for _ in 0..3 {
            health.mark_failure("b", &failure());
        }

        let candidates = selector.select(Some("b")).unwrap();
        assert_eq!(names(&candidates), vec!["a"]);
    }

    #[test]
    fn unknown_preferred_model_is_ignored() {
        let registry = registry_of(&[("a", 1), ("b", 2)]);
        let (selector, _) = selector(&registry);

        let candidates = selector.select(Some("nope")).unwrap();
        assert_eq!(names(&candidates), vec!["a", "b"]);
    }

    #[test]
    fn cooling_down_models_are_filtered_out() {
        let registry = registry_of(&[("a", 1), ("b", 2)]);
        let health = Arc::new(
            HealthTracker::for_registry(&registry).with_cooldown(Duration::from_secs(3600)),
        );
        let selector = Selector::new(registry.clone(), health.clone());

        health.mark_failure("a", &failure());

        let candidates = selector.select(None).unwrap();
        assert_eq!(names(&candidates), vec!["b"]);
    }

    #[test]
    fn falls_back_to_full_list_when_everything_is_excluded() {
        let registry = registry_of(&[("a", 1), ("b", 2)]);
        let health = Arc::new(
            HealthTracker::for_registry(&registry).with_cooldown(Duration::from_secs(3600)),
        );
        let selector = Selector::new(registry.clone(), health.clone());

        health.mark_failure("a", &failure());
        health.mark_failure("b", &failure());

        let candidates = selector.select(None).unwrap();
        assert_eq!(names(&candidates), vec!["a", "b"]);
    }

    #[test]
    fn fails_only_when_nothing_is_enabled() {
        let registry = Arc::new(ModelRegistry::new(RelayConfig {
            models: vec![ModelDescriptor::new(
                "a",
                ProviderKind::Kimi,
                "",
                "https://api.test/v1",
                1,
            )],
            default_model: "a".to_string(),
        }));
        let (selector, _) = selector(&registry);

        assert!(matches!(
            selector.select(None),
            Err(LlmError::NoModelAvailable)
        ));
    }
}
