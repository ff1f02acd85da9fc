//! Per-model health tracking.
//!
//! Each model runs a small state machine: healthy until it fails a number of
//! times in a row (default 3), healthy again after its next success or an
//! explicit reset. Independently of that classification, every failure opens
//! a cooldown window (default 30s) during which the model is skipped by
//! selection; the window expires purely by wall-clock time.
//!
//! Records are guarded by one `RwLock`. Concurrent invocations may interleave
//! counter updates last-writer-wins; health classification only needs
//! eventual consistency, so no finer isolation is used.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::ProviderKind;
use crate::error::LlmError;
use crate::registry::ModelRegistry;

/// Consecutive failures after which a model is classified unhealthy.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Cooldown window opened by every failure.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Mutable health state for one model.
#[derive(Debug, Clone)]
pub struct HealthRecord {
    /// When the model last served a successful call
    pub last_used_at: Option<Instant>,
    /// Lifetime failure count
    pub failure_count: u64,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// When the model last failed
    pub last_failure_at: Option<Instant>,
    /// Healthy/unhealthy classification
    pub is_healthy: bool,
}

impl HealthRecord {
    fn new() -> Self {
        Self {
            last_used_at: None,
            failure_count: 0,
            consecutive_failures: 0,
            last_failure_at: None,
            is_healthy: true,
        }
    }
}

/// Read-only status row for one model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub name: String,
    pub provider: ProviderKind,
    pub enabled: bool,
    pub healthy: bool,
    pub in_cooldown: bool,
    pub priority: u32,
}

/// Read-only status of the whole catalog.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub models: Vec<ModelStatus>,
    /// Number of enabled models
    pub total: usize,
    /// Enabled models currently classified healthy
    pub healthy: usize,
    /// Enabled models currently in cooldown
    pub in_cooldown: usize,
}

/// Process-wide health tracker.
///
/// Owned and injected explicitly (no globals) so a distributed backend can
/// replace it if health ever needs to synchronize across replicas. Side
/// effects are limited to structured logging.
pub struct HealthTracker {
    records: RwLock<HashMap<String, HealthRecord>>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl HealthTracker {
    /// Initialize one record per enabled model in the registry.
    pub fn for_registry(registry: &ModelRegistry) -> Self {
        let tracker = Self {
            records: RwLock::new(HashMap::new()),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        };
        tracker.initialize(registry);
        tracker
    }

    /// Override the consecutive-failure threshold
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Override the cooldown window
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    fn initialize(&self, registry: &ModelRegistry) {
        let Ok(mut records) = self.records.write() else {
            return;
        };
        for model in registry.enabled() {
            records
                .entry(model.name.clone())
                .or_insert_with(HealthRecord::new);
        }
    }

    /// Record a successful call: the model is healthy again regardless of
    /// prior state.
    pub fn mark_success(&self, name: &str) {
        let Ok(mut records) = self.records.write() else {
            return;
        };
        if let Some(record) = records.get_mut(name) {
            record.last_used_at = Some(Instant::now());
            record.consecutive_failures = 0;
            record.is_healthy = true;
        }
    }

    /// Record a failed call and open the cooldown window.
    pub fn mark_failure(&self, name: &str, error: &LlmError) {
        let Ok(mut records) = self.records.write() else {
            return;
        };
        if let Some(record) = records.get_mut(name) {
            record.last_failure_at = Some(Instant::now());
            record.failure_count += 1;
            record.consecutive_failures += 1;

            if record.consecutive_failures >= self.failure_threshold && record.is_healthy {
                record.is_healthy = false;
                tracing::warn!(
                    model = %name,
                    consecutive_failures = record.consecutive_failures,
                    error = %error,
                    "model marked unhealthy"
                );
            }
        }
    }

    /// Whether the model failed within the cooldown window.
    pub fn is_in_cooldown(&self, name: &str) -> bool {
        let Ok(records) = self.records.read() else {
            return false;
        };
        records
            .get(name)
            .and_then(|record| record.last_failure_at)
            .is_some_and(|at| at.elapsed() < self.cooldown)
    }

    /// Whether the model is classified healthy. Unknown models count as
    /// healthy; they have simply never been tracked.
    pub fn is_healthy(&self, name: &str) -> bool {
        let Ok(records) = self.records.read() else {
            return true;
        };
        records.get(name).map(|r| r.is_healthy).unwrap_or(true)
    }

    /// Snapshot of one model's record.
    pub fn record(&self, name: &str) -> Option<HealthRecord> {
        let records = self.records.read().ok()?;
        records.get(name).cloned()
    }

    /// Clear all records and reinitialize from the registry, restoring every
    /// model to healthy.
    pub fn reset_all(&self, registry: &ModelRegistry) {
        if let Ok(mut records) = self.records.write() {
            records.clear();
        }
        self.initialize(registry);
        tracing::info!("model health state reset");
    }

    /// Per-model status rows plus aggregate counts.
    pub fn status(&self, registry: &ModelRegistry) -> StatusSnapshot {
        let models: Vec<ModelStatus> = registry
            .enabled()
            .iter()
            .map(|model| ModelStatus {
                name: model.name.clone(),
                provider: model.provider,
                enabled: model.enabled,
                healthy: self.is_healthy(&model.name),
                in_cooldown: self.is_in_cooldown(&model.name),
                priority: model.priority,
            })
            .collect();

        let total = models.len();
        let healthy = models.iter().filter(|m| m.healthy).count();
        let in_cooldown = models.iter().filter(|m| m.in_cooldown).count();

        StatusSnapshot {
            models,
            total,
            healthy,
            in_cooldown,
        }
    }
}
