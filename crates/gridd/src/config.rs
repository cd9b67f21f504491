//! Daemon configuration file.
//!
//! A toml file carrying the controller settings, the collaborator
//! endpoints, and policies to register at boot:
//!
//! ```toml
//! metrics_url = "127.0.0.1:9090"
//! executor_url = "127.0.0.1:9443"
//!
//! [controller]
//! evaluation_interval_secs = 30
//! cooldown_secs = 300
//!
//! [[policies]]
//! service_name = "checkout"
//! min_replicas = 2
//! max_replicas = 20
//! target_cpu = 70.0
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use gridscale_controller::ControllerConfig;
use gridscale_policy::ScalingPolicy;

/// Parsed daemon configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GriddConfig {
    /// Metrics backend authority (host:port).
    pub metrics_url: Option<String>,
    /// Scaling executor authority (host:port).
    pub executor_url: Option<String>,
    /// Controller loop settings.
    pub controller: ControllerConfig,
    /// Policies registered at boot. A bad entry fails startup.
    pub policies: Vec<ScalingPolicy>,
}

impl GriddConfig {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: GriddConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}
