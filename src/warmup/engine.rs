//! Rate-controlled HTTP warmup engine.
//!
//! A single dispatch task issues `request_count` GET requests spaced
//! `duration / request_count` apart and aggregates their outcomes. The caller
//! waits for either natural completion or context cancellation; on
//! cancellation the dispatch task is told to stop, aborts in-flight requests
//! and is joined before [`HttpWarmupExecutor::execute`] returns.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{header::USER_AGENT, Client};
use tokio::{
    sync::watch,
    task::JoinSet,
    time::{sleep_until, Instant},
};
use tracing::{debug, warn};

use super::{
    config::WarmupConfig,
    context::WarmupContext,
    executor::WarmupExecutor,
    result::{WarmupError, WarmupResult},
    stats::{Hit, LatencyStats},
};
use crate::observability::metrics::WarmupTelemetry;

pub const WARMUP_USER_AGENT: &str = "kube-booster/1.0";
pub const WARMUP_REQUEST_HEADER: &str = "X-Warmup-Request";

pub const CANCELLED_MESSAGE: &str = "warmup cancelled";

/// Upper bound on the latency buffer reserved up front; the request count is
/// user-controlled.
const MAX_PREALLOCATED_HITS: usize = 1024;

pub struct HttpWarmupExecutor {
    client: Client,
    telemetry: Arc<dyn WarmupTelemetry>,
}

impl HttpWarmupExecutor {
    pub fn new(telemetry: Arc<dyn WarmupTelemetry>) -> Result<Self, WarmupError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WarmupError::Client(e.to_string()))?;
        Ok(Self::with_client(client, telemetry))
    }

    pub fn with_client(client: Client, telemetry: Arc<dyn WarmupTelemetry>) -> Self {
        Self { client, telemetry }
    }
}

#[async_trait]
impl WarmupExecutor for HttpWarmupExecutor {
    async fn execute(&self, ctx: &WarmupContext, config: &WarmupConfig) -> WarmupResult {
        let Some(address) = config.pod_ip.as_deref().filter(|ip| !ip.is_empty()) else {
            return WarmupResult::failed(
                WarmupError::AddressNotSet,
                "cannot execute warmup: pod IP not set",
            );
        };

        if let Some(cause) = ctx.err() {
            return WarmupResult::failed(WarmupError::Cancelled(cause), CANCELLED_MESSAGE);
        }

        let url = config.endpoint_url(address);
        debug!(
            pod = %config.pod_name,
            namespace = %config.pod_namespace,
            endpoint = %url,
            request_count = config.request_count,
            duration = ?config.duration,
            "starting warmup"
        );

        let attack = Attack {
            client: self.client.clone(),
            url,
            timeout: config.per_request_timeout(),
            schedule: config.clone(),
            telemetry: Arc::clone(&self.telemetry),
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let started = Instant::now();
        let mut handle = tokio::spawn(attack.run(stop_rx));

        let (joined, cancelled) = tokio::select! {
            biased;
            joined = &mut handle => (joined, None),
            cause = ctx.done() => {
                let _ = stop_tx.send(true);
                (handle.await, Some(cause))
            }
        };
        let total_duration = started.elapsed();

        let stats = match joined {
            Ok(stats) => stats,
            Err(e) => {
                warn!(pod = %config.pod_name, error = %e, "warmup dispatch task failed");
                let mut result = WarmupResult::failed(WarmupError::TaskFailed(e.to_string()), "");
                result.total_duration = total_duration;
                result.message = result.build_message();
                return result;
            }
        };

        let mut result = WarmupResult {
            success: false,
            requests_completed: stats.successes(),
            requests_failed: stats.failures(),
            total_duration,
            latency_p50: stats.percentile(0.50),
            latency_p99: stats.percentile(0.99),
            error: None,
            message: String::new(),
        };

        if let Some(cause) = cancelled {
            debug!(pod = %config.pod_name, reason = %cause, "warmup cancelled");
            result.error = Some(WarmupError::Cancelled(cause));
            result.message = CANCELLED_MESSAGE.to_string();
            return result;
        }

        result.success = stats.successes() > 0;
        result.message = result.build_message();

        debug!(
            pod = %config.pod_name,
            namespace = %config.pod_namespace,
            success = result.success,
            requests = stats.requests(),
            success_rate = result.success_rate(),
            latency_p50 = ?result.latency_p50,
            latency_p99 = ?result.latency_p99,
            last_error = stats.last_error().unwrap_or(""),
            duration = ?total_duration,
            "warmup completed"
        );

        result
    }
}

/// One scheduled burst of warmup requests.
struct Attack {
    client: Client,
    url: String,
    timeout: Duration,
    /// Request count, window and namespace of the run
    schedule: WarmupConfig,
    telemetry: Arc<dyn WarmupTelemetry>,
}

impl Attack {
    /// Dispatch `k` fires at `started + duration * k / hits`. A loop that falls
    /// behind catches up immediately instead of stretching the window.
    async fn run(self, mut stop: watch::Receiver<bool>) -> LatencyStats {
        let hits = self.schedule.request_count;
        let namespace = self.schedule.pod_namespace.as_str();
        let mut stats = LatencyStats::with_capacity((hits as usize).min(MAX_PREALLOCATED_HITS));
        let mut in_flight = JoinSet::new();
        let started = Instant::now();
        let mut dispatched = 0u32;

        while dispatched < hits || !in_flight.is_empty() {
            let next_at = started + self.schedule.dispatch_offset(dispatched);
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        in_flight.shutdown().await;
                        break;
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    let hit = joined.unwrap_or_else(|e| Hit {
                        latency: Duration::ZERO,
                        status: None,
                        error: Some(e.to_string()),
                    });
                    self.telemetry.record_request_latency(namespace, hit.latency);
                    stats.record(&hit);
                }
                _ = sleep_until(next_at), if dispatched < hits => {
                    dispatched += 1;
                    in_flight.spawn(send_warmup_request(
                        self.client.clone(),
                        self.url.clone(),
                        self.timeout,
                    ));
                }
            }
        }

        stats
    }
}

async fn send_warmup_request(client: Client, url: String, timeout: Duration) -> Hit {
    let start = Instant::now();
    let response = client
        .get(&url)
        .header(USER_AGENT, WARMUP_USER_AGENT)
        .header(WARMUP_REQUEST_HEADER, "true")
        .timeout(timeout)
        .send()
        .await;

    let (status, error) = match response {
        Ok(resp) => {
            let status = resp.status().as_u16();
            // Drain the body so the target does the full amount of work.
            match resp.bytes().await {
                Ok(_) => (Some(status), None),
                Err(e) => (Some(status), Some(e.to_string())),
            }
        }
        Err(e) => (None, Some(e.to_string())),
    };

    Hit {
        latency: start.elapsed(),
        status,
        error,
    }
}
