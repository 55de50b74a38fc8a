use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigResult;

pub const DEFAULT_CONCURRENCY: u16 = 16;
pub const DEFAULT_REQUEUE_DELAY_SECS: u64 = 5;
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 10;

/// Process-level configuration of the warmup controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Restrict the pod watch to one namespace; all namespaces when unset
    pub namespace: Option<String>,
    /// Node-local mode: only reconcile pods scheduled on this node
    pub node_name: Option<String>,
    /// Maximum number of pods reconciled at the same time
    pub concurrency: u16,
    /// Delay before re-checking a pod that is not yet running or ready
    pub requeue_delay_secs: u64,
    /// Backoff after a failed status write
    pub error_requeue_secs: u64,
    /// When false the controller satisfies gates without sending traffic
    pub warmup_enabled: bool,
    pub metrics: Option<MetricsConfig>,
    pub health: HealthProbeConfig,
    pub log_dir: Option<String>,
    pub log_level: Option<String>,
    pub log_json: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub port: u16,
    pub host: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Bind address of the `/healthz` and `/readyz` endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthProbeConfig {
    pub port: u16,
    pub host: String,
}

impl Default for HealthProbeConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            node_name: None,
            concurrency: DEFAULT_CONCURRENCY,
            requeue_delay_secs: DEFAULT_REQUEUE_DELAY_SECS,
            error_requeue_secs: DEFAULT_ERROR_REQUEUE_SECS,
            warmup_enabled: true,
            metrics: Some(MetricsConfig::default()),
            health: HealthProbeConfig::default(),
            log_dir: None,
            log_level: None,
            log_json: false,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        crate::config::validation::ConfigValidator::validate(self)
    }

    pub fn requeue_delay(&self) -> Duration {
        Duration::from_secs(self.requeue_delay_secs)
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    /// Field selector for node-local mode, `None` when watching every node.
    pub fn node_field_selector(&self) -> Option<String> {
        self.node_name
            .as_deref()
            .filter(|node| !node.is_empty())
            .map(|node| format!("spec.nodeName={}", node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.concurrency, 16);
        assert_eq!(config.requeue_delay(), Duration::from_secs(5));
        assert_eq!(config.error_requeue(), Duration::from_secs(10));
        assert!(config.warmup_enabled);
        assert_eq!(config.metrics, Some(MetricsConfig::default()));
        assert_eq!(config.health.port, 8081);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_node_field_selector() {
        let mut config = ControllerConfig::default();
        assert_eq!(config.node_field_selector(), None);

        config.node_name = Some(String::new());
        assert_eq!(config.node_field_selector(), None);

        config.node_name = Some("worker-1".to_string());
        assert_eq!(
            config.node_field_selector().as_deref(),
            Some("spec.nodeName=worker-1")
        );
    }

    #[test]
    fn test_serde_roundtrip_keeps_defaults() {
        let config = ControllerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ControllerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.concurrency, config.concurrency);
        assert_eq!(parsed.health, config.health);
    }
}
