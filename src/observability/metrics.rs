use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    pub port: u16,
    pub host: String,
    pub duration_buckets: Option<Vec<f64>>,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            duration_buckets: None,
        }
    }
}

const REQUEST_LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

pub fn init_metrics() {
    describe_counter!(
        "kube_booster_warmup_total",
        "Total warmup executions by namespace and result"
    );
    describe_counter!(
        "kube_booster_warmup_requests_total",
        "Total HTTP requests sent during warmup"
    );
    describe_histogram!(
        "kube_booster_warmup_duration_seconds",
        "Time from warmup start to completion"
    );
    describe_histogram!(
        "kube_booster_warmup_request_latency_seconds",
        "Individual request latency during warmup"
    );
    describe_gauge!(
        "kube_booster_pods_pending_warmup",
        "Pods currently waiting for warmup"
    );
}

pub fn start_prometheus(config: PrometheusConfig) -> Result<(), BuildError> {
    init_metrics();

    let duration_matcher = Matcher::Full(String::from("kube_booster_warmup_duration_seconds"));
    let duration_bucket: Vec<f64> = config.duration_buckets.unwrap_or_else(|| {
        vec![
            0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0,
            120.0, 300.0,
        ]
    });
    let latency_matcher =
        Matcher::Full(String::from("kube_booster_warmup_request_latency_seconds"));

    let ip_addr: IpAddr = config
        .host
        .parse()
        .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
    let socket_addr = SocketAddr::new(ip_addr, config.port);

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .upkeep_timeout(Duration::from_secs(5 * 60))
        .set_buckets_for_metric(duration_matcher, &duration_bucket)?
        .set_buckets_for_metric(latency_matcher, REQUEST_LATENCY_BUCKETS)?
        .install()
}

/// Fire-and-forget telemetry for warmup runs, injected into the engine and
/// controller so both stay testable without a global recorder.
pub trait WarmupTelemetry: Send + Sync {
    fn record_warmup_result(&self, namespace: &str, success: bool, duration: Duration);

    fn record_warmup_requests(&self, namespace: &str, count: u32);

    fn record_request_latency(&self, namespace: &str, latency: Duration);

    fn increment_pending(&self, namespace: &str, node: &str);

    fn decrement_pending(&self, namespace: &str, node: &str);
}

/// Writes to the process-wide `metrics` recorder installed by [`start_prometheus`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusTelemetry;

impl WarmupTelemetry for PrometheusTelemetry {
    fn record_warmup_result(&self, namespace: &str, success: bool, duration: Duration) {
        let result = if success { "success" } else { "failure" };
        counter!("kube_booster_warmup_total",
            "namespace" => namespace.to_string(),
            "result" => result
        )
        .increment(1);
        histogram!("kube_booster_warmup_duration_seconds",
            "namespace" => namespace.to_string()
        )
        .record(duration.as_secs_f64());
    }

    fn record_warmup_requests(&self, namespace: &str, count: u32) {
        counter!("kube_booster_warmup_requests_total",
            "namespace" => namespace.to_string()
        )
        .increment(count as u64);
    }

    fn record_request_latency(&self, namespace: &str, latency: Duration) {
        histogram!("kube_booster_warmup_request_latency_seconds",
            "namespace" => namespace.to_string()
        )
        .record(latency.as_secs_f64());
    }

    fn increment_pending(&self, namespace: &str, node: &str) {
        gauge!("kube_booster_pods_pending_warmup",
            "namespace" => namespace.to_string(),
            "node" => node.to_string()
        )
        .increment(1.0);
    }

    fn decrement_pending(&self, namespace: &str, node: &str) {
        gauge!("kube_booster_pods_pending_warmup",
            "namespace" => namespace.to_string(),
            "node" => node.to_string()
        )
        .decrement(1.0);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl WarmupTelemetry for NoopTelemetry {
    fn record_warmup_result(&self, _namespace: &str, _success: bool, _duration: Duration) {}

    fn record_warmup_requests(&self, _namespace: &str, _count: u32) {}

    fn record_request_latency(&self, _namespace: &str, _latency: Duration) {}

    fn increment_pending(&self, _namespace: &str, _node: &str) {}

    fn decrement_pending(&self, _namespace: &str, _node: &str) {}
}
