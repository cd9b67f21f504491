//! Controller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use gridscale_engine::RateLimits;

/// Tuning knobs for the evaluation loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Seconds between evaluation ticks.
    pub evaluation_interval_secs: u64,
    /// Minimum seconds between two scaling actions on the same policy.
    pub cooldown_secs: u64,
    /// Lookback window passed to every metrics call, in seconds.
    pub metrics_window_secs: u64,
    /// Maximum increase per evaluation, as a fraction of current replicas.
    pub max_scale_up_rate: f64,
    /// Maximum decrease per evaluation, as a fraction of current replicas.
    pub max_scale_down_rate: f64,
    /// Smoothing delay passed through to policy behaviors. The decision
    /// loop gates re-scaling on `cooldown_secs` alone for now.
    pub stabilization_window_secs: u64,
    /// Upper bound on concurrently evaluated policies per tick.
    pub max_concurrent_evaluations: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_secs: 30,
            cooldown_secs: 300,
            metrics_window_secs: 60,
            max_scale_up_rate: 1.0,
            max_scale_down_rate: 0.5,
            stabilization_window_secs: 300,
            max_concurrent_evaluations: 16,
        }
    }
}

impl ControllerConfig {
    /// Tick cadence as a `Duration`.
    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.evaluation_interval_secs)
    }

    /// Metrics lookback window as a `Duration`.
    pub fn metrics_window(&self) -> Duration {
        Duration::from_secs(self.metrics_window_secs)
    }

    /// The per-evaluation step bounds.
    pub fn rate_limits(&self) -> RateLimits {
        RateLimits {
            max_scale_up_rate: self.max_scale_up_rate,
            max_scale_down_rate: self.max_scale_down_rate,
        }
    }
}
