use super::{ConfigError, ConfigResult, ControllerConfig};
use crate::observability::logging::parse_level;

pub(crate) struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &ControllerConfig) -> ConfigResult<()> {
        Self::validate_workers(config)?;
        Self::validate_endpoints(config)?;
        Self::validate_logging(config)?;
        Ok(())
    }

    fn validate_workers(config: &ControllerConfig) -> ConfigResult<()> {
        if config.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency".to_string(),
                value: config.concurrency.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if config.requeue_delay_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "requeue_delay_secs".to_string(),
                value: config.requeue_delay_secs.to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    fn validate_endpoints(config: &ControllerConfig) -> ConfigResult<()> {
        if config.health.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "health.port".to_string(),
                value: "0".to_string(),
                reason: "must be between 1 and 65535".to_string(),
            });
        }

        if let Some(metrics) = &config.metrics {
            if metrics.port == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "metrics.port".to_string(),
                    value: "0".to_string(),
                    reason: "must be between 1 and 65535".to_string(),
                });
            }
            if metrics.port == config.health.port && metrics.host == config.health.host {
                return Err(ConfigError::IncompatibleConfig {
                    reason: format!(
                        "metrics and health probe servers cannot both bind {}:{}",
                        metrics.host, metrics.port
                    ),
                });
            }
        }
        Ok(())
    }

    fn validate_logging(config: &ControllerConfig) -> ConfigResult<()> {
        if let Some(level) = &config.log_level {
            if parse_level(level).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "log_level".to_string(),
                    value: level.clone(),
                    reason: "expected one of trace, debug, info, warn, error".to_string(),
                });
            }
        }
        Ok(())
    }
}
