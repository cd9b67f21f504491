//! Decision engine — turns a policy plus a metrics snapshot into a
//! scaling decision.
//!
//! Pure signal math, no I/O. Each enabled signal argues for the replica
//! count that would bring it back to its target
//! (`ceil(current × observed/target)`, custom metrics additionally
//! weighted); the pre-constraint target is the maximum over all signals.
//! Signals never average and no signal can argue the count down on its
//! own — only the absence of pressure does. The raw target is then
//! clamped to the policy's replica bounds and rate-limited before the
//! action is derived.

use std::time::{SystemTime, UNIX_EPOCH};

use gridscale_policy::{
    METRIC_CPU_UTILIZATION, METRIC_CURRENT_REPLICAS, METRIC_MEMORY_UTILIZATION,
    METRIC_REQUESTS_PER_SECOND, MetricsSnapshot, ScaleAction, ScalingDecision, ScalingPolicy,
};

use crate::rate_limit::RateLimits;

/// Compute the scaling decision for one policy and one snapshot.
///
/// Signal order is fixed: CPU, memory, RPS, then custom metrics in list
/// order. A signal participates only when its target is configured and
/// the observed value is present and positive.
pub fn calculate_decision(
    policy: &ScalingPolicy,
    metrics: &MetricsSnapshot,
    limits: &RateLimits,
) -> ScalingDecision {
    let current = metrics
        .get(METRIC_CURRENT_REPLICAS)
        .copied()
        .unwrap_or(policy.current_replicas as f64) as u32;

    let mut target = current;
    let mut reasons: Vec<String> = Vec::new();

    if policy.target_cpu > 0.0 {
        if let Some(&observed) = metrics.get(METRIC_CPU_UTILIZATION) {
            if observed > 0.0 {
                let candidate = scaled_candidate(current, observed / policy.target_cpu);
                if candidate > target {
                    target = candidate;
                    reasons.push(format!(
                        "cpu utilization {observed:.1}% vs target {:.1}%",
                        policy.target_cpu
                    ));
                }
            }
        }
    }
    if policy.target_memory > 0.0 {
        if let Some(&observed) = metrics.get(METRIC_MEMORY_UTILIZATION) {
            if observed > 0.0 {
                let candidate = scaled_candidate(current, observed / policy.target_memory);
                if candidate > target {
                    target = candidate;
                    reasons.push(format!(
                        "memory utilization {observed:.1}% vs target {:.1}%",
                        policy.target_memory
                    ));
                }
            }
        }
    }
    if policy.target_rps > 0.0 {
        if let Some(&observed) = metrics.get(METRIC_REQUESTS_PER_SECOND) {
            if observed > 0.0 {
                let candidate = scaled_candidate(current, observed / policy.target_rps);
                if candidate > target {
                    target = candidate;
                    reasons.push(format!(
                        "request rate {observed:.1} vs target {:.1}",
                        policy.target_rps
                    ));
                }
            }
        }
    }
    for metric in &policy.custom_metrics {
        if metric.target <= 0.0 {
            continue;
        }
        if let Some(&observed) = metrics.get(&metric.name) {
            if observed > 0.0 {
                let ratio = observed / metric.target * metric.weight;
                let candidate = scaled_candidate(current, ratio);
                if candidate > target {
                    target = candidate;
                    reasons.push(format!(
                        "{} {observed:.1} vs target {:.1}",
                        metric.name, metric.target
                    ));
                }
            }
        }
    }

    // Clamp to the policy's replica bounds.
    if target < policy.min_replicas {
        target = policy.min_replicas;
        if target > current {
            reasons.push(format!("raised to min replicas {}", policy.min_replicas));
        }
    }
    if target > policy.max_replicas {
        target = policy.max_replicas;
        reasons.push(format!("capped at max replicas {}", policy.max_replicas));
    }

    // Bound the step size of this single evaluation.
    let limited = limits.apply(current, target);
    if limited != target {
        reasons.push(format!("rate limited to {limited}"));
        target = limited;
    }

    let action = if target > current {
        ScaleAction::ScaleUp
    } else if target < current {
        ScaleAction::ScaleDown
    } else {
        ScaleAction::NoAction
    };

    let reason = if reasons.is_empty() {
        "No scaling needed".to_string()
    } else {
        reasons.join("; ")
    };

    ScalingDecision {
        service_name: policy.service_name.clone(),
        current_replicas: current,
        target_replicas: target,
        reason,
        metrics: metrics.clone(),
        action,
        timestamp: epoch_secs(),
        policy_id: policy.id.clone(),
    }
}

/// Replica count that would bring a signal back to target.
fn scaled_candidate(current: u32, ratio: f64) -> u32 {
    (current as f64 * ratio).ceil() as u32
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridscale_policy::{CustomMetricSpec, MetricType};

    fn test_policy() -> ScalingPolicy {
        ScalingPolicy {
            id: "p-1".to_string(),
            service_name: "api".to_string(),
            min_replicas: 1,
            max_replicas: 100,
            target_cpu: 0.0,
            target_memory: 0.0,
            target_rps: 0.0,
            custom_metrics: Vec::new(),
            scale_up: None,
            scale_down: None,
            enabled: true,
            current_replicas: 0,
            last_scaled_at: None,
            created_at: 1000,
            updated_at: 1000,
        }
    }

    fn snapshot(pairs: &[(&str, f64)]) -> MetricsSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    /// Limits wide enough to never bite, for tests that watch the raw
    /// signal math.
    fn loose_limits() -> RateLimits {
        RateLimits {
            max_scale_up_rate: 100.0,
            max_scale_down_rate: 100.0,
        }
    }

    #[test]
    fn no_signals_means_no_action() {
        let policy = test_policy();
        let metrics = snapshot(&[(METRIC_CURRENT_REPLICAS, 3.0)]);

        let decision = calculate_decision(&policy, &metrics, &RateLimits::default());
        assert_eq!(decision.action, ScaleAction::NoAction);
        assert_eq!(decision.target_replicas, 3);
        assert_eq!(decision.reason, "No scaling needed");
    }

    #[test]
    fn cpu_above_target_scales_up() {
        let mut policy = test_policy();
        policy.target_cpu = 70.0;
        let metrics = snapshot(&[
            (METRIC_CURRENT_REPLICAS, 3.0),
            (METRIC_CPU_UTILIZATION, 91.0),
        ]);

        // ratio 91/70 = 1.3, ceil(3 * 1.3) = 4.
        let decision = calculate_decision(&policy, &metrics, &RateLimits::default());
        assert_eq!(decision.action, ScaleAction::ScaleUp);
        assert_eq!(decision.target_replicas, 4);
        assert!(decision.reason.contains("cpu utilization"));
    }

    #[test]
    fn max_of_signals_wins() {
        let mut policy = test_policy();
        policy.target_cpu = 50.0;
        policy.target_memory = 50.0;
        policy.target_rps = 100.0;
        let metrics = snapshot(&[
            (METRIC_CURRENT_REPLICAS, 2.0),
            // CPU implies ceil(2 * 100/50) = 4.
            (METRIC_CPU_UTILIZATION, 100.0),
            // Memory implies ceil(2 * 50/50) = 2.
            (METRIC_MEMORY_UTILIZATION, 50.0),
            // RPS implies ceil(2 * 300/100) = 6.
            (METRIC_REQUESTS_PER_SECOND, 300.0),
        ]);

        let decision = calculate_decision(&policy, &metrics, &loose_limits());
        // Maximum, never an average or a sum.
        assert_eq!(decision.target_replicas, 6);
        assert!(decision.reason.contains("cpu utilization"));
        assert!(decision.reason.contains("request rate"));
        // Memory never raised the running target, so it is not a reason.
        assert!(!decision.reason.contains("memory"));
    }

    #[test]
    fn weighted_custom_metric() {
        let mut policy = test_policy();
        policy.custom_metrics = vec![CustomMetricSpec {
            name: "queue_depth".to_string(),
            target: 50.0,
            metric_type: MetricType::Value,
            weight: 1.5,
        }];
        let metrics = snapshot(&[(METRIC_CURRENT_REPLICAS, 2.0), ("queue_depth", 100.0)]);

        // ceil(2 * (100/50) * 1.5) = 6.
        let decision = calculate_decision(&policy, &metrics, &loose_limits());
        assert_eq!(decision.target_replicas, 6);
        assert!(decision.reason.contains("queue_depth"));
    }

    #[test]
    fn absent_custom_metric_is_ignored() {
        let mut policy = test_policy();
        policy.custom_metrics = vec![CustomMetricSpec {
            name: "queue_depth".to_string(),
            target: 50.0,
            metric_type: MetricType::Value,
            weight: 1.0,
        }];
        let metrics = snapshot(&[(METRIC_CURRENT_REPLICAS, 2.0)]);

        let decision = calculate_decision(&policy, &metrics, &RateLimits::default());
        assert_eq!(decision.action, ScaleAction::NoAction);
    }

    #[test]
    fn target_clamped_to_max() {
        let mut policy = test_policy();
        policy.target_cpu = 10.0;
        policy.max_replicas = 5;
        let metrics = snapshot(&[
            (METRIC_CURRENT_REPLICAS, 2.0),
            (METRIC_CPU_UTILIZATION, 100.0),
        ]);

        let decision = calculate_decision(&policy, &metrics, &RateLimits::default());
        assert_eq!(decision.target_replicas, 4); // max clamp to 5, then rate limit 2+ceil(2*1.0)=4
        assert!(decision.reason.contains("capped at max replicas 5"));
    }

    #[test]
    fn target_raised_to_min() {
        let mut policy = test_policy();
        policy.min_replicas = 3;
        let metrics = snapshot(&[(METRIC_CURRENT_REPLICAS, 2.0)]);

        let decision = calculate_decision(&policy, &metrics, &RateLimits::default());
        assert_eq!(decision.target_replicas, 3);
        assert_eq!(decision.action, ScaleAction::ScaleUp);
        assert!(decision.reason.contains("raised to min replicas 3"));
    }

    #[test]
    fn rate_limit_bounds_the_jump() {
        let mut policy = test_policy();
        policy.target_cpu = 1.0;
        let limits = RateLimits {
            max_scale_up_rate: 0.5,
            max_scale_down_rate: 0.5,
        };
        let metrics = snapshot(&[
            (METRIC_CURRENT_REPLICAS, 10.0),
            (METRIC_CPU_UTILIZATION, 100.0),
        ]);

        // Raw target 1000, clamped to max 100, rate limited to 15.
        let decision = calculate_decision(&policy, &metrics, &limits);
        assert_eq!(decision.target_replicas, 15);
        assert!(decision.reason.contains("rate limited to 15"));
    }

    #[test]
    fn zero_replicas_stay_at_zero() {
        let mut policy = test_policy();
        policy.target_cpu = 70.0;
        policy.min_replicas = 2;
        let metrics = snapshot(&[
            (METRIC_CURRENT_REPLICAS, 0.0),
            (METRIC_CPU_UTILIZATION, 95.0),
        ]);

        // ceil(0 * ratio) = 0 for every signal; the min clamp proposes 2
        // but the rate limiter allows a step of ceil(0 * rate) = 0.
        let decision = calculate_decision(&policy, &metrics, &RateLimits::default());
        assert_eq!(decision.target_replicas, 0);
        assert_eq!(decision.action, ScaleAction::NoAction);
    }

    #[test]
    fn signal_at_target_holds_steady() {
        let mut policy = test_policy();
        policy.target_cpu = 70.0;
        let metrics = snapshot(&[
            (METRIC_CURRENT_REPLICAS, 4.0),
            (METRIC_CPU_UTILIZATION, 70.0),
        ]);

        // ratio 1.0 → candidate equals current, no pressure.
        let decision = calculate_decision(&policy, &metrics, &RateLimits::default());
        assert_eq!(decision.action, ScaleAction::NoAction);
        assert_eq!(decision.target_replicas, 4);
    }

    #[test]
    fn zero_valued_metric_is_no_signal() {
        let mut policy = test_policy();
        policy.target_rps = 100.0;
        let metrics = snapshot(&[
            (METRIC_CURRENT_REPLICAS, 5.0),
            (METRIC_REQUESTS_PER_SECOND, 0.0),
        ]);

        let decision = calculate_decision(&policy, &metrics, &RateLimits::default());
        assert_eq!(decision.action, ScaleAction::NoAction);
        assert_eq!(decision.target_replicas, 5);
    }

    #[test]
    fn decision_carries_snapshot_and_identity() {
        let mut policy = test_policy();
        policy.target_cpu = 70.0;
        let metrics = snapshot(&[
            (METRIC_CURRENT_REPLICAS, 3.0),
            (METRIC_CPU_UTILIZATION, 91.0),
        ]);

        let decision = calculate_decision(&policy, &metrics, &RateLimits::default());
        assert_eq!(decision.service_name, "api");
        assert_eq!(decision.policy_id, "p-1");
        assert_eq!(decision.current_replicas, 3);
        assert_eq!(decision.metrics, metrics);
        assert!(decision.timestamp > 0);
    }
}
