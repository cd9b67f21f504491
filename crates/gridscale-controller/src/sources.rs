//! Collaborator interfaces — where metrics come from and where scaling
//! commands go.
//!
//! Both backends are external systems; the controller only ever talks to
//! them through these traits. Implementations must be cheap to share
//! (`Arc<dyn ...>`) and safe to call concurrently from the per-policy
//! evaluation tasks.

use std::time::Duration;

use async_trait::async_trait;

use gridscale_policy::ServiceInfo;

/// Supplies point-in-time utilization numbers per service.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// CPU utilization percentage over the lookback window.
    async fn cpu_utilization(&self, service: &str, window: Duration) -> anyhow::Result<f64>;

    /// Memory utilization percentage over the lookback window.
    async fn memory_utilization(&self, service: &str, window: Duration) -> anyhow::Result<f64>;

    /// Request rate over the lookback window.
    async fn requests_per_second(&self, service: &str, window: Duration) -> anyhow::Result<f64>;

    /// Value of a named custom metric over the lookback window.
    async fn custom_metric(
        &self,
        service: &str,
        metric: &str,
        window: Duration,
    ) -> anyhow::Result<f64>;

    /// Number of replicas currently running.
    async fn current_replicas(&self, service: &str) -> anyhow::Result<u32>;
}

/// Applies replica-count changes to a running service.
#[async_trait]
pub trait ScalingTarget: Send + Sync {
    /// Scale `service` to exactly `replicas`.
    async fn scale(&self, service: &str, replicas: u32) -> anyhow::Result<()>;

    /// Executor-reported state of `service`.
    ///
    /// Served to external callers (the admin API); the evaluation loop
    /// itself never queries this.
    async fn service_info(&self, service: &str) -> anyhow::Result<ServiceInfo>;
}
