//! The autoscaling control loop.
//!
//! `AutoScaler` owns the policy store and drives a fixed-interval
//! evaluation loop. Each tick snapshots the enabled policies and
//! evaluates them concurrently (semaphore-bounded fan-out); the batch is
//! joined before the next tick may start, so two evaluations of the same
//! policy never overlap.
//!
//! Per-policy flow: cooldown gate → metrics collection → decision →
//! executor call → state update. Any error aborts that policy's
//! evaluation for the tick without mutating state; the next tick retries
//! naturally.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{Semaphore, watch};
use tracing::{debug, error, info, warn};

use gridscale_engine::calculate_decision;
use gridscale_policy::{
    METRIC_CPU_UTILIZATION, METRIC_CURRENT_REPLICAS, METRIC_MEMORY_UTILIZATION,
    METRIC_REQUESTS_PER_SECOND, MetricsSnapshot, PolicyResult, PolicyStatus, PolicyStore,
    ScaleAction, ScalingDecision, ScalingPolicy,
};

use crate::config::ControllerConfig;
use crate::error::{ControllerError, ControllerResult};
use crate::sources::{MetricsSource, ScalingTarget};

/// The autoscaling controller.
///
/// Exclusively owns its `PolicyStore`: after registration, the
/// controller is the only writer of a policy's runtime state.
pub struct AutoScaler {
    store: PolicyStore,
    metrics: Arc<dyn MetricsSource>,
    executor: Arc<dyn ScalingTarget>,
    config: ControllerConfig,
    /// Bounds the per-tick evaluation fan-out.
    eval_permits: Arc<Semaphore>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl AutoScaler {
    /// Create a controller over the given collaborators.
    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        executor: Arc<dyn ScalingTarget>,
        config: ControllerConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let eval_permits = Arc::new(Semaphore::new(config.max_concurrent_evaluations.max(1)));
        Self {
            store: PolicyStore::new(),
            metrics,
            executor,
            config,
            eval_permits,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// The policy store this controller owns.
    ///
    /// Shared with the admin API for read/registration access; the
    /// controller remains the only writer of runtime state.
    pub fn store(&self) -> PolicyStore {
        self.store.clone()
    }

    /// Validate and store a policy. Replaces any existing policy for the
    /// same service.
    pub async fn register_policy(&self, policy: ScalingPolicy) -> PolicyResult<ScalingPolicy> {
        self.store.register(policy).await
    }

    /// Read-only status snapshot for a service.
    pub async fn policy_status(&self, service: &str) -> PolicyResult<PolicyStatus> {
        self.store.status(service).await
    }

    /// Run the evaluation loop until `stop()` is called.
    pub async fn start(&self) {
        info!(
            interval_secs = self.config.evaluation_interval_secs,
            cooldown_secs = self.config.cooldown_secs,
            "autoscaler started"
        );

        let mut shutdown = self.shutdown_rx.clone();
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.evaluation_interval()) => {
                    self.evaluate_all().await;
                }
                _ = shutdown.changed() => {
                    info!("autoscaler shutting down");
                    break;
                }
            }
        }
    }

    /// Signal the loop to exit. The in-flight tick completes first.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Evaluate every enabled policy once.
    ///
    /// Policies are evaluated concurrently, bounded by
    /// `max_concurrent_evaluations`; the call returns only after the
    /// whole batch finishes. Per-policy failures are logged and skipped.
    /// Returns the decisions made this tick (cooldown skips excluded).
    pub async fn evaluate_all(&self) -> Vec<ScalingDecision> {
        let policies = self.store.snapshot_enabled().await;
        if policies.is_empty() {
            return Vec::new();
        }
        debug!(count = policies.len(), "evaluation tick");

        let mut handles = Vec::with_capacity(policies.len());
        for policy in policies {
            let permits = self.eval_permits.clone();
            let store = self.store.clone();
            let metrics = self.metrics.clone();
            let executor = self.executor.clone();
            let config = self.config.clone();

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, but a failed acquire
                // must not take the whole tick down.
                let Ok(_permit) = permits.acquire().await else {
                    return None;
                };
                match evaluate_policy(&store, &*metrics, &*executor, &config, &policy).await {
                    Ok(decision) => decision,
                    Err(e) => {
                        warn!(
                            service = %policy.service_name,
                            error = %e,
                            "policy evaluation failed"
                        );
                        None
                    }
                }
            }));
        }

        let mut decisions = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Some(decision)) => decisions.push(decision),
                Ok(None) => {}
                Err(e) => error!(error = %e, "evaluation task panicked"),
            }
        }
        decisions
    }
}

/// Evaluate a single policy: cooldown gate → metrics → decision →
/// executor → state update.
///
/// Returns `None` when the policy is within its cooldown (nothing was
/// fetched or decided).
async fn evaluate_policy(
    store: &PolicyStore,
    metrics: &dyn MetricsSource,
    executor: &dyn ScalingTarget,
    config: &ControllerConfig,
    policy: &ScalingPolicy,
) -> ControllerResult<Option<ScalingDecision>> {
    let now = epoch_secs();

    // Cheap early exit: within cooldown, no metrics are fetched and no
    // decision is made.
    if let Some(last) = policy.last_scaled_at {
        if now.saturating_sub(last) < config.cooldown_secs {
            debug!(
                service = %policy.service_name,
                since_last = now.saturating_sub(last),
                cooldown = config.cooldown_secs,
                "within cooldown, skipping"
            );
            return Ok(None);
        }
    }

    let snapshot = collect_metrics(metrics, config, policy).await?;
    let decision = calculate_decision(policy, &snapshot, &config.rate_limits());

    if decision.action == ScaleAction::NoAction {
        debug!(
            service = %policy.service_name,
            replicas = decision.current_replicas,
            "no scaling needed"
        );
        return Ok(Some(decision));
    }

    info!(
        service = %policy.service_name,
        from = decision.current_replicas,
        to = decision.target_replicas,
        action = ?decision.action,
        reason = %decision.reason,
        "executing scaling action"
    );

    executor
        .scale(&policy.service_name, decision.target_replicas)
        .await
        .map_err(|e| ControllerError::Scaling {
            service: policy.service_name.clone(),
            source: e,
        })?;

    store
        .record_scaled(&policy.service_name, decision.target_replicas, now)
        .await?;

    Ok(Some(decision))
}

/// Build the metrics snapshot for one policy.
///
/// The replica count and every configured core signal (CPU, memory, RPS)
/// must fetch successfully; a failure there aborts the evaluation.
/// Custom metrics are best-effort: a failed fetch is logged and the
/// signal is simply absent from the snapshot.
async fn collect_metrics(
    source: &dyn MetricsSource,
    config: &ControllerConfig,
    policy: &ScalingPolicy,
) -> ControllerResult<MetricsSnapshot> {
    let window = config.metrics_window();
    let service = policy.service_name.as_str();
    let mut snapshot = MetricsSnapshot::new();

    let replicas = source
        .current_replicas(service)
        .await
        .map_err(|e| metrics_err(service, e))?;
    snapshot.insert(METRIC_CURRENT_REPLICAS.to_string(), replicas as f64);

    if policy.target_cpu > 0.0 {
        let value = source
            .cpu_utilization(service, window)
            .await
            .map_err(|e| metrics_err(service, e))?;
        snapshot.insert(METRIC_CPU_UTILIZATION.to_string(), value);
    }
    if policy.target_memory > 0.0 {
        let value = source
            .memory_utilization(service, window)
            .await
            .map_err(|e| metrics_err(service, e))?;
        snapshot.insert(METRIC_MEMORY_UTILIZATION.to_string(), value);
    }
    if policy.target_rps > 0.0 {
        let value = source
            .requests_per_second(service, window)
            .await
            .map_err(|e| metrics_err(service, e))?;
        snapshot.insert(METRIC_REQUESTS_PER_SECOND.to_string(), value);
    }

    for metric in &policy.custom_metrics {
        match source.custom_metric(service, &metric.name, window).await {
            Ok(value) => {
                snapshot.insert(metric.name.clone(), value);
            }
            Err(e) => {
                warn!(
                    service,
                    metric = %metric.name,
                    error = %e,
                    "custom metric fetch failed, signal omitted"
                );
            }
        }
    }

    Ok(snapshot)
}

fn metrics_err(service: &str, source: anyhow::Error) -> ControllerError {
    ControllerError::Metrics {
        service: service.to_string(),
        source,
    }
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
