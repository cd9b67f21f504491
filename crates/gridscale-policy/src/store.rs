//! In-memory policy registry.
//!
//! Policies live in an `RwLock`ed map keyed by service name. Readers (the
//! evaluation fan-out, the admin API) always receive copies, never
//! references, so concurrent evaluators cannot race on a shared struct.
//! Registering a policy for a service that already has one replaces it
//! wholesale — registration is an upsert.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PolicyError, PolicyResult};
use crate::types::{PolicyStatus, ScalingPolicy};

/// Shared registry of scaling policies.
///
/// `Clone` is cheap (`Arc` inside) and every clone sees the same map.
#[derive(Clone, Default)]
pub struct PolicyStore {
    policies: Arc<RwLock<HashMap<String, ScalingPolicy>>>,
}

impl PolicyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a policy, replacing any existing policy for
    /// the same service.
    ///
    /// Assigns a fresh id when none is given and stamps
    /// `created_at`/`updated_at`. Returns the stored copy. On validation
    /// failure the store is left untouched.
    pub async fn register(&self, mut policy: ScalingPolicy) -> PolicyResult<ScalingPolicy> {
        validate(&policy)?;

        if policy.id.is_empty() {
            policy.id = Uuid::new_v4().to_string();
        }
        let now = epoch_secs();
        policy.created_at = now;
        policy.updated_at = now;

        let mut policies = self.policies.write().await;
        if policies
            .insert(policy.service_name.clone(), policy.clone())
            .is_some()
        {
            debug!(service = %policy.service_name, "existing policy replaced");
        }
        info!(
            service = %policy.service_name,
            id = %policy.id,
            min = policy.min_replicas,
            max = policy.max_replicas,
            "policy registered"
        );
        Ok(policy)
    }

    /// Copies of every enabled policy, for safe concurrent iteration.
    pub async fn snapshot_enabled(&self) -> Vec<ScalingPolicy> {
        let policies = self.policies.read().await;
        policies.values().filter(|p| p.enabled).cloned().collect()
    }

    /// Copy of the policy for a service, if registered.
    pub async fn get(&self, service: &str) -> Option<ScalingPolicy> {
        let policies = self.policies.read().await;
        policies.get(service).cloned()
    }

    /// Read-only status projection for a service.
    pub async fn status(&self, service: &str) -> PolicyResult<PolicyStatus> {
        let policies = self.policies.read().await;
        policies
            .get(service)
            .map(ScalingPolicy::status)
            .ok_or_else(|| PolicyError::NotFound(service.to_string()))
    }

    /// Status projections for all registered policies.
    pub async fn list_status(&self) -> Vec<PolicyStatus> {
        let policies = self.policies.read().await;
        policies.values().map(ScalingPolicy::status).collect()
    }

    /// Enable or disable evaluation of a service's policy.
    pub async fn set_enabled(&self, service: &str, enabled: bool) -> PolicyResult<()> {
        let mut policies = self.policies.write().await;
        let policy = policies
            .get_mut(service)
            .ok_or_else(|| PolicyError::NotFound(service.to_string()))?;
        policy.enabled = enabled;
        policy.updated_at = epoch_secs();
        info!(service, enabled, "policy toggled");
        Ok(())
    }

    /// Remove a service's policy. Returns whether one was present.
    ///
    /// Administrative surface only — the controller never deletes.
    pub async fn remove(&self, service: &str) -> bool {
        let mut policies = self.policies.write().await;
        let removed = policies.remove(service).is_some();
        if removed {
            info!(service, "policy removed");
        }
        removed
    }

    /// Record a successful scaling action for a service.
    ///
    /// The controller is the only caller; this is the only writer of
    /// `current_replicas` and `last_scaled_at`.
    pub async fn record_scaled(
        &self,
        service: &str,
        replicas: u32,
        now: u64,
    ) -> PolicyResult<()> {
        let mut policies = self.policies.write().await;
        let policy = policies
            .get_mut(service)
            .ok_or_else(|| PolicyError::NotFound(service.to_string()))?;
        policy.current_replicas = replicas;
        policy.last_scaled_at = Some(now);
        policy.updated_at = now;
        Ok(())
    }

    /// Number of registered policies.
    pub async fn len(&self) -> usize {
        self.policies.read().await.len()
    }

    /// Whether the store has no policies.
    pub async fn is_empty(&self) -> bool {
        self.policies.read().await.is_empty()
    }
}

/// Structural validation. First failure wins.
fn validate(policy: &ScalingPolicy) -> PolicyResult<()> {
    if policy.service_name.is_empty() {
        return Err(PolicyError::Validation(
            "service_name must not be empty".to_string(),
        ));
    }
    if policy.min_replicas < 1 {
        return Err(PolicyError::Validation(
            "min_replicas must be at least 1".to_string(),
        ));
    }
    if policy.max_replicas < policy.min_replicas {
        return Err(PolicyError::Validation(format!(
            "max_replicas {} is below min_replicas {}",
            policy.max_replicas, policy.min_replicas
        )));
    }
    if !(0.0..=100.0).contains(&policy.target_cpu) {
        return Err(PolicyError::Validation(format!(
            "target_cpu {} outside 0-100",
            policy.target_cpu
        )));
    }
    if !(0.0..=100.0).contains(&policy.target_memory) {
        return Err(PolicyError::Validation(format!(
            "target_memory {} outside 0-100",
            policy.target_memory
        )));
    }
    if policy.target_rps < 0.0 {
        return Err(PolicyError::Validation(format!(
            "target_rps {} must not be negative",
            policy.target_rps
        )));
    }
    for metric in &policy.custom_metrics {
        if metric.name.is_empty() {
            return Err(PolicyError::Validation(
                "custom metric name must not be empty".to_string(),
            ));
        }
        if metric.target <= 0.0 {
            return Err(PolicyError::Validation(format!(
                "custom metric {} target must be positive",
                metric.name
            )));
        }
    }
    Ok(())
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
