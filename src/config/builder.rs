use super::{ConfigResult, ControllerConfig, HealthProbeConfig, MetricsConfig};

/// Builder for ControllerConfig that wraps the config itself
#[derive(Debug, Clone, Default)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership
    pub fn from_config(config: ControllerConfig) -> Self {
        Self { config }
    }

    pub fn from_config_ref(config: &ControllerConfig) -> Self {
        Self::from_config(config.clone())
    }

    // ==================== Scope ====================

    pub fn namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    pub fn node_name<S: Into<String>>(mut self, node: S) -> Self {
        self.config.node_name = Some(node.into());
        self
    }

    pub fn maybe_namespace(mut self, namespace: Option<impl Into<String>>) -> Self {
        self.config.namespace = namespace.map(|n| n.into());
        self
    }

    pub fn maybe_node_name(mut self, node: Option<impl Into<String>>) -> Self {
        self.config.node_name = node.map(|n| n.into());
        self
    }

    // ==================== Reconcile ====================

    pub fn concurrency(mut self, concurrency: u16) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn requeue_delay_secs(mut self, secs: u64) -> Self {
        self.config.requeue_delay_secs = secs;
        self
    }

    pub fn error_requeue_secs(mut self, secs: u64) -> Self {
        self.config.error_requeue_secs = secs;
        self
    }

    pub fn warmup_enabled(mut self, enabled: bool) -> Self {
        self.config.warmup_enabled = enabled;
        self
    }

    pub fn disable_warmup(mut self) -> Self {
        self.config.warmup_enabled = false;
        self
    }

    // ==================== Endpoints ====================

    pub fn enable_metrics<S: Into<String>>(mut self, host: S, port: u16) -> Self {
        self.config.metrics = Some(MetricsConfig {
            host: host.into(),
            port,
        });
        self
    }

    pub fn maybe_metrics(mut self, metrics: Option<MetricsConfig>) -> Self {
        self.config.metrics = metrics;
        self
    }

    pub fn health_probe<S: Into<String>>(mut self, host: S, port: u16) -> Self {
        self.config.health = HealthProbeConfig {
            host: host.into(),
            port,
        };
        self
    }

    // ==================== Logging ====================

    pub fn maybe_log_dir(mut self, dir: Option<impl Into<String>>) -> Self {
        self.config.log_dir = dir.map(|d| d.into());
        self
    }

    pub fn maybe_log_level(mut self, level: Option<impl Into<String>>) -> Self {
        self.config.log_level = level.map(|l| l.into());
        self
    }

    pub fn log_json(mut self, enabled: bool) -> Self {
        self.config.log_json = enabled;
        self
    }

    pub fn build(self) -> ConfigResult<ControllerConfig> {
        self.build_with_validation(true)
    }

    pub fn build_unchecked(self) -> ControllerConfig {
        self.into()
    }

    pub fn build_with_validation(self, validate: bool) -> ConfigResult<ControllerConfig> {
        let config: ControllerConfig = self.into();
        if validate {
            config.validate()?;
        }
        Ok(config)
    }
}

impl From<ControllerConfigBuilder> for ControllerConfig {
    fn from(builder: ControllerConfigBuilder) -> Self {
        builder.config
    }
}

impl ControllerConfig {
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::new()
    }

    pub fn to_builder(&self) -> ControllerConfigBuilder {
        ControllerConfigBuilder::from_config_ref(self)
    }
}
