//! Domain types for GridScale scaling policies.
//!
//! These types describe per-service scaling configuration, the ephemeral
//! artifacts produced by each evaluation, and read-only status projections
//! served to external callers. All types are serializable to/from JSON for
//! the admin API and config-file preloading.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque identifier for a scaling policy.
pub type PolicyId = String;

/// Service name — the unique key a policy is registered under.
pub type ServiceName = String;

// ── Metrics snapshot ──────────────────────────────────────────────

/// Point-in-time metric values for one evaluation, keyed by metric name.
///
/// Built fresh for every policy evaluation and discarded afterwards;
/// never persisted.
pub type MetricsSnapshot = HashMap<String, f64>;

/// Snapshot key: number of replicas currently running.
pub const METRIC_CURRENT_REPLICAS: &str = "current_replicas";
/// Snapshot key: CPU utilization percentage.
pub const METRIC_CPU_UTILIZATION: &str = "cpu_utilization";
/// Snapshot key: memory utilization percentage.
pub const METRIC_MEMORY_UTILIZATION: &str = "memory_utilization";
/// Snapshot key: request rate.
pub const METRIC_REQUESTS_PER_SECOND: &str = "requests_per_second";

// ── Scaling policy ────────────────────────────────────────────────

/// Per-service scaling configuration plus its mutable runtime state.
///
/// At most one policy exists per service name; registering another for
/// the same service replaces it. The controller is the only writer of
/// `current_replicas` and `last_scaled_at` after registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalingPolicy {
    /// Policy id. Generated at registration when empty.
    #[serde(default)]
    pub id: PolicyId,
    /// The service this policy scales.
    pub service_name: ServiceName,
    /// Lower replica bound. The target never goes below this.
    pub min_replicas: u32,
    /// Upper replica bound. The target never goes above this.
    pub max_replicas: u32,
    /// Target CPU utilization percentage. 0 disables the signal.
    #[serde(default)]
    pub target_cpu: f64,
    /// Target memory utilization percentage. 0 disables the signal.
    #[serde(default)]
    pub target_memory: f64,
    /// Target requests per second. 0 disables the signal.
    #[serde(default)]
    pub target_rps: f64,
    /// Additional signals considered after CPU/memory/RPS, in order.
    #[serde(default)]
    pub custom_metrics: Vec<CustomMetricSpec>,
    /// Scale-up behavior rules. Carried as configuration; re-scaling is
    /// currently gated by the controller cooldown alone.
    #[serde(default)]
    pub scale_up: Option<ScalingBehavior>,
    /// Scale-down behavior rules. Same caveat as `scale_up`.
    #[serde(default)]
    pub scale_down: Option<ScalingBehavior>,
    /// Whether the controller evaluates this policy.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Replica count as of the last successful scaling action.
    #[serde(default)]
    pub current_replicas: u32,
    /// Unix timestamp (seconds) of the last successful scaling action.
    #[serde(default)]
    pub last_scaled_at: Option<u64>,
    /// Unix timestamp (seconds) when this policy was registered.
    #[serde(default)]
    pub created_at: u64,
    /// Unix timestamp (seconds) of the last mutation.
    #[serde(default)]
    pub updated_at: u64,
}

fn default_enabled() -> bool {
    true
}

impl ScalingPolicy {
    /// Read-only projection for external querying.
    pub fn status(&self) -> PolicyStatus {
        PolicyStatus {
            id: self.id.clone(),
            service_name: self.service_name.clone(),
            enabled: self.enabled,
            current_replicas: self.current_replicas,
            min_replicas: self.min_replicas,
            max_replicas: self.max_replicas,
            last_scaled_at: self.last_scaled_at,
            updated_at: self.updated_at,
        }
    }
}

/// One user-defined metric signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomMetricSpec {
    /// Metric name as known to the metrics source.
    pub name: String,
    /// Target value for the metric. Must be positive.
    pub target: f64,
    /// How the metric value is interpreted.
    #[serde(default)]
    pub metric_type: MetricType,
    /// Multiplier applied to this metric's pressure ratio.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Interpretation of a custom metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Raw value compared against the target.
    #[default]
    Value,
    /// Percentage of capacity.
    Utilization,
    /// Per-replica average.
    Average,
}

// ── Behaviors ─────────────────────────────────────────────────────

/// Directional scaling behavior: a stabilization window plus rules
/// bounding how fast the direction may move.
///
/// Carried through registration and the API so operators can express
/// intent; the decision algorithm does not branch on these yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalingBehavior {
    /// Seconds the direction must hold before its rules apply.
    pub stabilization_window_secs: u64,
    /// Rules bounding replica movement in this direction.
    #[serde(default)]
    pub rules: Vec<ScalingRule>,
}

/// A single behavior rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalingRule {
    pub rule_type: ScalingRuleType,
    /// Pod count or percentage, depending on `rule_type`.
    pub value: u32,
    /// Window the rule is measured over, in seconds.
    pub period_secs: u64,
}

/// Unit a behavior rule is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingRuleType {
    Pods,
    Percent,
}

// ── Decisions ─────────────────────────────────────────────────────

/// The tri-state outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleAction {
    ScaleUp,
    ScaleDown,
    NoAction,
}

/// Result of evaluating one policy against one metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalingDecision {
    pub service_name: ServiceName,
    pub current_replicas: u32,
    pub target_replicas: u32,
    /// Human-readable join of every signal that argued for the target.
    pub reason: String,
    /// The snapshot the decision was computed from.
    pub metrics: MetricsSnapshot,
    pub action: ScaleAction,
    /// Unix timestamp (seconds) when the decision was made.
    pub timestamp: u64,
    /// Id of the policy that produced this decision.
    pub policy_id: PolicyId,
}

// ── Projections ───────────────────────────────────────────────────

/// Read-only projection of a policy for external querying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyStatus {
    pub id: PolicyId,
    pub service_name: ServiceName,
    pub enabled: bool,
    pub current_replicas: u32,
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub last_scaled_at: Option<u64>,
    pub updated_at: u64,
}

/// Executor-reported state of a running service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfo {
    pub name: String,
    pub current_replicas: u32,
    pub ready_replicas: u32,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}
