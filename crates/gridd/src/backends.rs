//! HTTP collaborator clients.
//!
//! Thin hyper-based clients for the metrics backend and the scaling
//! executor. Metric endpoints return a bare number body; the executor
//! accepts a JSON scale request and serves service info as JSON. Both
//! clients open a fresh http1 connection per request with a hard
//! timeout — collaborator calls are low-volume (a handful per
//! evaluation tick) and must never wedge the loop.

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use http_body_util::BodyExt;
use tracing::debug;

use gridscale_controller::{MetricsSource, ScalingTarget};
use gridscale_policy::ServiceInfo;

/// Per-request timeout for collaborator calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// One-shot HTTP request against `authority` (host:port).
async fn http_request(
    authority: &str,
    method: &str,
    path: &str,
    body: Option<String>,
) -> anyhow::Result<(http::StatusCode, bytes::Bytes)> {
    let fut = async {
        let stream = tokio::net::TcpStream::connect(authority)
            .await
            .with_context(|| format!("connecting to {authority}"))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .context("http handshake")?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let mut builder = http::Request::builder()
            .method(method)
            .uri(format!("http://{authority}{path}"))
            .header("host", authority)
            .header("user-agent", "gridd/0.1");
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(http_body_util::Full::new(bytes::Bytes::from(
                body.unwrap_or_default(),
            )))
            .context("building request")?;

        let resp = sender.send_request(req).await.context("sending request")?;
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .context("reading response body")?
            .to_bytes();
        Ok::<_, anyhow::Error>((status, bytes))
    };

    tokio::time::timeout(REQUEST_TIMEOUT, fut)
        .await
        .map_err(|_| anyhow!("request to {authority}{path} timed out"))?
}

/// GET a bare-number body.
async fn get_number(authority: &str, path: &str) -> anyhow::Result<f64> {
    let (status, body) = http_request(authority, "GET", path, None).await?;
    if !status.is_success() {
        anyhow::bail!("GET {path} returned {status}");
    }
    let text = std::str::from_utf8(&body).context("response body is not utf-8")?;
    text.trim()
        .parse::<f64>()
        .with_context(|| format!("parsing number from GET {path}"))
}

// ── Metrics backend ────────────────────────────────────────────

/// Client for the metrics backend.
///
/// `GET /metrics/{service}/{metric}?window={secs}` → bare number,
/// `GET /replicas/{service}` → bare integer.
pub struct HttpMetricsSource {
    authority: String,
}

impl HttpMetricsSource {
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
        }
    }

    async fn metric(&self, service: &str, metric: &str, window: Duration) -> anyhow::Result<f64> {
        get_number(
            &self.authority,
            &format!("/metrics/{service}/{metric}?window={}", window.as_secs()),
        )
        .await
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsSource {
    async fn cpu_utilization(&self, service: &str, window: Duration) -> anyhow::Result<f64> {
        self.metric(service, "cpu_utilization", window).await
    }

    async fn memory_utilization(&self, service: &str, window: Duration) -> anyhow::Result<f64> {
        self.metric(service, "memory_utilization", window).await
    }

    async fn requests_per_second(&self, service: &str, window: Duration) -> anyhow::Result<f64> {
        self.metric(service, "requests_per_second", window).await
    }

    async fn custom_metric(
        &self,
        service: &str,
        metric: &str,
        window: Duration,
    ) -> anyhow::Result<f64> {
        self.metric(service, metric, window).await
    }

    async fn current_replicas(&self, service: &str) -> anyhow::Result<u32> {
        let (status, body) =
            http_request(&self.authority, "GET", &format!("/replicas/{service}"), None).await?;
        if !status.is_success() {
            anyhow::bail!("GET /replicas/{service} returned {status}");
        }
        let text = std::str::from_utf8(&body).context("response body is not utf-8")?;
        text.trim()
            .parse::<u32>()
            .with_context(|| format!("parsing replica count for {service}"))
    }
}

// ── Scaling executor ───────────────────────────────────────────

/// Client for the scaling executor.
///
/// `POST /scale/{service}` with `{"target": n}`,
/// `GET /services/{service}` → `ServiceInfo` JSON.
pub struct HttpScalingTarget {
    authority: String,
}

impl HttpScalingTarget {
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
        }
    }
}

#[async_trait]
impl ScalingTarget for HttpScalingTarget {
    async fn scale(&self, service: &str, replicas: u32) -> anyhow::Result<()> {
        let body = serde_json::json!({ "target": replicas }).to_string();
        let (status, _) = http_request(
            &self.authority,
            "POST",
            &format!("/scale/{service}"),
            Some(body),
        )
        .await?;
        if !status.is_success() {
            anyhow::bail!("scale request for {service} returned {status}");
        }
        debug!(service, replicas, "scale request accepted");
        Ok(())
    }

    async fn service_info(&self, service: &str) -> anyhow::Result<ServiceInfo> {
        let (status, body) = http_request(
            &self.authority,
            "GET",
            &format!("/services/{service}"),
            None,
        )
        .await?;
        if !status.is_success() {
            anyhow::bail!("GET /services/{service} returned {status}");
        }
        serde_json::from_slice(&body).context("decoding service info")
    }
}
