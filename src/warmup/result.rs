use std::time::Duration;

use super::context::CancelCause;

/// Failures folded into a [`WarmupResult`]; never propagated to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WarmupError {
    #[error("pod IP not set")]
    AddressNotSet,

    #[error("{0}")]
    Cancelled(CancelCause),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("warmup task failed: {0}")]
    TaskFailed(String),
}

/// Outcome of one warmup run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarmupResult {
    /// True iff at least one request succeeded in a completed run
    pub success: bool,
    /// Requests that returned a 2xx response
    pub requests_completed: u32,
    pub requests_failed: u32,
    /// Wall-clock span of the whole run
    pub total_duration: Duration,
    pub latency_p50: Duration,
    pub latency_p99: Duration,
    pub error: Option<WarmupError>,
    pub message: String,
}

impl WarmupResult {
    /// A failed run that issued no requests.
    pub fn failed(error: WarmupError, message: impl Into<String>) -> Self {
        Self {
            error: Some(error),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn requests_total(&self) -> u32 {
        self.requests_completed + self.requests_failed
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.requests_total();
        if total == 0 {
            return 0.0;
        }
        self.requests_completed as f64 / total as f64 * 100.0
    }

    /// Human-readable summary, deterministic for a given set of fields.
    pub fn build_message(&self) -> String {
        if let Some(error) = &self.error {
            return format!("warmup failed: {}", error);
        }

        if self.requests_total() == 0 {
            return "warmup skipped: no requests executed".to_string();
        }

        format!(
            "warmup completed{}: {}/{} requests succeeded ({:.1}%), P50={:?}, P99={:?}",
            if self.success { "" } else { " with failures" },
            self.requests_completed,
            self.requests_total(),
            self.success_rate(),
            self.latency_p50,
            self.latency_p99
        )
    }
}
