//! Mapping from a warmup attempt to the condition reason and message.

use std::fmt;

use crate::warmup::{executor::SKIPPED_MESSAGE, WarmupConfigError, WarmupResult};

pub const FAIL_OPEN_PREFIX: &str = "Warmup failed but pod marked ready (fail-open): ";

/// Reason token written on the warmup condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionReason {
    Complete,
    FailedOpen,
}

impl ConditionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionReason::Complete => "WarmupComplete",
            ConditionReason::FailedOpen => "WarmupFailedOpen",
        }
    }

    /// Reason of the Kubernetes Event published alongside the condition.
    pub fn event_reason(&self) -> &'static str {
        match self {
            ConditionReason::Complete => "WarmupCompleted",
            ConditionReason::FailedOpen => "WarmupFailedOpen",
        }
    }
}

impl fmt::Display for ConditionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a warmup attempt can end. The condition is always written True;
/// only reason and message differ.
#[derive(Debug, Clone, PartialEq)]
pub enum WarmupOutcome {
    /// Annotations could not be resolved into a warmup config
    ConfigError(WarmupConfigError),
    /// The engine ran and produced a result
    Executed(WarmupResult),
    /// Warmup is administratively disabled
    Skipped,
}

impl WarmupOutcome {
    pub fn reason(&self) -> ConditionReason {
        match self {
            WarmupOutcome::ConfigError(_) => ConditionReason::FailedOpen,
            WarmupOutcome::Executed(result) if result.success => ConditionReason::Complete,
            WarmupOutcome::Executed(_) => ConditionReason::FailedOpen,
            WarmupOutcome::Skipped => ConditionReason::Complete,
        }
    }

    pub fn message(&self) -> String {
        match self {
            WarmupOutcome::ConfigError(e) => format!("warmup config error: {}", e),
            WarmupOutcome::Executed(result) if result.success => result.message.clone(),
            WarmupOutcome::Executed(result) => format!("{}{}", FAIL_OPEN_PREFIX, result.message),
            WarmupOutcome::Skipped => SKIPPED_MESSAGE.to_string(),
        }
    }

    pub fn is_failed_open(&self) -> bool {
        self.reason() == ConditionReason::FailedOpen
    }

    pub fn result(&self) -> Option<&WarmupResult> {
        match self {
            WarmupOutcome::Executed(result) => Some(result),
            _ => None,
        }
    }
}
