use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;

use super::{config::WarmupConfig, context::WarmupContext, result::WarmupResult};

pub const SKIPPED_MESSAGE: &str = "warmup skipped: no executor configured";

/// Runs warmup traffic against a pod.
///
/// Implementations never fail through control flow: every outcome, including
/// cancellation, is reported in the returned [`WarmupResult`].
#[async_trait]
pub trait WarmupExecutor: Send + Sync {
    async fn execute(&self, ctx: &WarmupContext, config: &WarmupConfig) -> WarmupResult;

    /// True for executors that never issue traffic (warmup disabled).
    fn is_noop(&self) -> bool {
        false
    }
}

/// Executor used when warmup is administratively disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExecutor;

#[async_trait]
impl WarmupExecutor for NoopExecutor {
    async fn execute(&self, _ctx: &WarmupContext, _config: &WarmupConfig) -> WarmupResult {
        WarmupResult {
            success: true,
            message: SKIPPED_MESSAGE.to_string(),
            ..Default::default()
        }
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// Returns a canned result and records the configs it was invoked with.
#[derive(Debug, Default)]
pub struct MockExecutor {
    result: Option<WarmupResult>,
    calls: AtomicUsize,
    configs: Mutex<Vec<WarmupConfig>>,
}

impl MockExecutor {
    /// Succeeds with `request_count` completed requests.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(result: WarmupResult) -> Self {
        Self {
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn configs(&self) -> Vec<WarmupConfig> {
        self.configs
            .lock()
            .map(|configs| configs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WarmupExecutor for MockExecutor {
    async fn execute(&self, _ctx: &WarmupContext, config: &WarmupConfig) -> WarmupResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut configs) = self.configs.lock() {
            configs.push(config.clone());
        }
        match &self.result {
            Some(result) => result.clone(),
            None => WarmupResult {
                success: true,
                requests_completed: config.request_count,
                message: "mock warmup completed".to_string(),
                ..Default::default()
            },
        }
    }
}
