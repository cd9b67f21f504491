//! gridd — the GridScale daemon.
//!
//! Single binary that assembles the autoscaler subsystems:
//! - Policy store + controller loop
//! - HTTP clients for the metrics backend and the scaling executor
//! - REST API for policy management
//!
//! # Usage
//!
//! ```text
//! gridd run --port 8443 --metrics-url 127.0.0.1:9090 --executor-url 127.0.0.1:9443
//! ```

mod backends;
mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use gridscale_controller::AutoScaler;

use crate::backends::{HttpMetricsSource, HttpScalingTarget};
use crate::config::GriddConfig;

#[derive(Parser)]
#[command(name = "gridd", about = "GridScale daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the controller loop and its API server.
    Run {
        /// Port for the REST API.
        #[arg(long, default_value = "8443")]
        port: u16,

        /// Config file with controller settings and boot policies.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Metrics backend authority (host:port). Overrides the config file.
        #[arg(long)]
        metrics_url: Option<String>,

        /// Scaling executor authority (host:port). Overrides the config file.
        #[arg(long)]
        executor_url: Option<String>,

        /// Evaluation interval in seconds. Overrides the config file.
        #[arg(long)]
        evaluation_interval: Option<u64>,

        /// Cooldown between scaling actions in seconds. Overrides the config file.
        #[arg(long)]
        cooldown: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gridd=debug,gridscale=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            port,
            config,
            metrics_url,
            executor_url,
            evaluation_interval,
            cooldown,
        } => {
            run(
                port,
                config,
                metrics_url,
                executor_url,
                evaluation_interval,
                cooldown,
            )
            .await
        }
    }
}

async fn run(
    port: u16,
    config: Option<PathBuf>,
    metrics_url: Option<String>,
    executor_url: Option<String>,
    evaluation_interval: Option<u64>,
    cooldown: Option<u64>,
) -> anyhow::Result<()> {
    info!("GridScale daemon starting");

    let mut config = match config {
        Some(path) => GriddConfig::load(&path)?,
        None => GriddConfig::default(),
    };
    if let Some(secs) = evaluation_interval {
        config.controller.evaluation_interval_secs = secs;
    }
    if let Some(secs) = cooldown {
        config.controller.cooldown_secs = secs;
    }

    let metrics_authority = metrics_url
        .or(config.metrics_url)
        .ok_or_else(|| anyhow::anyhow!("metrics backend not configured (--metrics-url)"))?;
    let executor_authority = executor_url
        .or(config.executor_url)
        .ok_or_else(|| anyhow::anyhow!("scaling executor not configured (--executor-url)"))?;

    // ── Initialize subsystems ──────────────────────────────────

    let metrics = Arc::new(HttpMetricsSource::new(&metrics_authority));
    let executor = Arc::new(HttpScalingTarget::new(&executor_authority));
    info!(
        metrics = %metrics_authority,
        executor = %executor_authority,
        "collaborator clients initialized"
    );

    let controller = Arc::new(AutoScaler::new(
        metrics,
        executor.clone(),
        config.controller.clone(),
    ));
    info!(
        interval = config.controller.evaluation_interval_secs,
        cooldown = config.controller.cooldown_secs,
        "controller initialized"
    );

    // Boot policies: a rejected entry is a startup error.
    for policy in config.policies {
        let stored = controller
            .register_policy(policy)
            .await
            .map_err(|e| anyhow::anyhow!("boot policy rejected: {e}"))?;
        info!(service = %stored.service_name, "boot policy registered");
    }

    // ── Start the controller loop ──────────────────────────────

    let loop_handle = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller.start().await;
        })
    };

    // ── Start API server ───────────────────────────────────────

    let router = gridscale_api::build_router(controller.store(), executor);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let shutdown_controller = controller.clone();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        shutdown_controller.stop();
    });

    server.await?;

    // Wait for the controller loop.
    let _ = loop_handle.await;

    info!("GridScale daemon stopped");
    Ok(())
}
