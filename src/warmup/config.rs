//! Warmup configuration resolved from pod annotations and container spec.

use std::{collections::BTreeMap, time::Duration};

use k8s_openapi::api::core::v1::Pod;

use super::duration::{parse_go_duration, ParsedDuration};
use crate::annotations::{WARMUP_DURATION, WARMUP_ENDPOINT, WARMUP_PORT, WARMUP_REQUESTS};

pub const DEFAULT_REQUEST_COUNT: u32 = 3;
pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);
pub const DEFAULT_ENDPOINT_PATH: &str = "/";

pub const MIN_DURATION: Duration = Duration::from_secs(1);
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reasons a pod's warmup configuration cannot be resolved
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WarmupConfigError {
    #[error("cannot resolve: pod missing")]
    PodMissing,

    #[error("invalid warmup-requests value {value:?}: {reason}")]
    InvalidRequestCount { value: String, reason: String },

    #[error("warmup-requests must be at least 1, got {count}")]
    RequestCountTooLow { count: i64 },

    #[error("invalid warmup-duration value {value:?}: {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("warmup-duration must be at least 1s, got {value}")]
    DurationTooShort { value: String },

    #[error("invalid warmup-port value {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },

    #[error("warmup-port must be between 1 and 65535, got {port}")]
    PortOutOfRange { port: i64 },

    #[error("pod has multiple containers, please specify warmup port using annotation kube-booster.io/warmup-port")]
    MultipleContainers,

    #[error("container {container:?} has multiple ports, please specify warmup port using annotation kube-booster.io/warmup-port")]
    MultiplePorts { container: String },

    #[error("cannot determine warmup port: no container ports found, please specify using annotation kube-booster.io/warmup-port")]
    NoPorts,
}

pub type WarmupConfigResult<T> = Result<T, WarmupConfigError>;

/// Resolved parameters for a single warmup run. Built fresh per reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmupConfig {
    /// Always starts with `/`
    pub endpoint: String,
    pub request_count: u32,
    /// Total window over which requests are spread
    pub duration: Duration,
    pub port: u16,
    pub pod_ip: Option<String>,
    pub pod_name: String,
    pub pod_namespace: String,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT_PATH.to_string(),
            request_count: DEFAULT_REQUEST_COUNT,
            duration: DEFAULT_DURATION,
            port: 0,
            pod_ip: None,
            pod_name: String::new(),
            pod_namespace: String::new(),
        }
    }
}

impl WarmupConfig {
    /// Resolve the warmup configuration for `pod`.
    ///
    /// Each annotation is parsed independently; a present but malformed value is
    /// an error and never falls back to the default. An explicit port annotation
    /// always wins over the container spec.
    pub fn from_pod(pod: Option<&Pod>) -> WarmupConfigResult<Self> {
        let pod = pod.ok_or(WarmupConfigError::PodMissing)?;
        let empty = BTreeMap::new();
        let annotations = pod.metadata.annotations.as_ref().unwrap_or(&empty);

        let mut config = WarmupConfig {
            pod_ip: pod
                .status
                .as_ref()
                .and_then(|s| s.pod_ip.clone())
                .filter(|ip| !ip.is_empty()),
            pod_name: pod.metadata.name.clone().unwrap_or_default(),
            pod_namespace: pod.metadata.namespace.clone().unwrap_or_default(),
            ..Default::default()
        };

        if let Some(endpoint) = annotation(annotations, WARMUP_ENDPOINT) {
            config.endpoint = normalize_path(endpoint);
        }
        if let Some(value) = annotation(annotations, WARMUP_REQUESTS) {
            config.request_count = parse_request_count(value)?;
        }
        if let Some(value) = annotation(annotations, WARMUP_DURATION) {
            config.duration = parse_duration(value)?;
        }
        config.port = match annotation(annotations, WARMUP_PORT) {
            Some(value) => parse_port(value)?,
            None => detect_port(pod)?,
        };

        Ok(config)
    }

    /// `http://address:port/path`
    pub fn endpoint_url(&self, address: &str) -> String {
        let host = if address.contains(':') && !address.starts_with('[') {
            format!("[{}]", address)
        } else {
            address.to_string()
        };
        format!("http://{}:{}{}", host, self.port, normalize_path(&self.endpoint))
    }

    /// `duration / request_count`, clamped to [1s, 10s].
    pub fn per_request_timeout(&self) -> Duration {
        let nominal = self.duration / self.request_count.max(1);
        nominal.clamp(MIN_REQUEST_TIMEOUT, MAX_REQUEST_TIMEOUT)
    }

    /// Offset of dispatch `k` from the start of the run: `duration * k / request_count`.
    ///
    /// Computed in nanoseconds so truncation never accumulates across the window.
    pub fn dispatch_offset(&self, k: u32) -> Duration {
        let nanos = self.duration.as_nanos() * u128::from(k) / u128::from(self.request_count.max(1));
        u64::try_from(nanos)
            .map(Duration::from_nanos)
            .unwrap_or(self.duration)
    }
}

/// Empty values are treated the same as a missing annotation.
fn annotation<'a>(annotations: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    annotations
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn parse_request_count(value: &str) -> WarmupConfigResult<u32> {
    let count: i64 = value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| WarmupConfigError::InvalidRequestCount {
            value: value.to_string(),
            reason: e.to_string(),
        })?;
    if count < 1 {
        return Err(WarmupConfigError::RequestCountTooLow { count });
    }
    u32::try_from(count).map_err(|_| WarmupConfigError::InvalidRequestCount {
        value: value.to_string(),
        reason: format!("must not exceed {}", u32::MAX),
    })
}

fn parse_duration(value: &str) -> WarmupConfigResult<Duration> {
    match parse_go_duration(value.trim()) {
        Ok(ParsedDuration::Positive(d)) if d >= MIN_DURATION => Ok(d),
        Ok(ParsedDuration::Positive(d)) => Err(WarmupConfigError::DurationTooShort {
            value: format!("{:?}", d),
        }),
        Ok(ParsedDuration::Negative(d)) => Err(WarmupConfigError::DurationTooShort {
            value: format!("-{:?}", d),
        }),
        Err(reason) => Err(WarmupConfigError::InvalidDuration {
            value: value.to_string(),
            reason,
        }),
    }
}

fn parse_port(value: &str) -> WarmupConfigResult<u16> {
    let port: i64 = value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| WarmupConfigError::InvalidPort {
            value: value.to_string(),
            reason: e.to_string(),
        })?;
    if !(1..=65535).contains(&port) {
        return Err(WarmupConfigError::PortOutOfRange { port });
    }
    Ok(port as u16)
}

/// Auto-detect only when there is exactly one container with exactly one port.
fn detect_port(pod: &Pod) -> WarmupConfigResult<u16> {
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or_default();

    match containers {
        [] => Err(WarmupConfigError::NoPorts),
        [container] => {
            let ports = container.ports.as_deref().unwrap_or_default();
            match ports {
                [] => Err(WarmupConfigError::NoPorts),
                [port] => u16::try_from(port.container_port)
                    .ok()
                    .filter(|p| *p >= 1)
                    .ok_or(WarmupConfigError::PortOutOfRange {
                        port: port.container_port as i64,
                    }),
                _ => Err(WarmupConfigError::MultiplePorts {
                    container: container.name.clone(),
                }),
            }
        }
        _ => Err(WarmupConfigError::MultipleContainers),
    }
}
