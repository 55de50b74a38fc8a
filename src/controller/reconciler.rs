//! Per-pod warmup state machine.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use k8s_openapi::api::core::v1::Pod;
use kube::{runtime::controller::Action, ResourceExt};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{
    conditions::{evaluate, upsert_condition, warmup_condition, GateState},
    outcome::{ConditionReason, WarmupOutcome},
    pod_api::{PodApiError, PodClient, PodEvent, PodEventKind},
};
use crate::{
    annotations::warmup_requested,
    config::ControllerConfig,
    observability::metrics::WarmupTelemetry,
    warmup::{CancelCause, WarmupConfig, WarmupContext, WarmupError, WarmupExecutor},
};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("failed to record warmup condition on pod {namespace}/{name}: {source}")]
    StatusWrite {
        namespace: String,
        name: String,
        #[source]
        source: PodApiError,
    },
}

/// Shared state handed to every reconcile.
pub struct ReconcileContext {
    pub pods: Arc<dyn PodClient>,
    pub executor: Arc<dyn WarmupExecutor>,
    pub telemetry: Arc<dyn WarmupTelemetry>,
    /// Flips to true once process shutdown begins
    pub shutdown: watch::Receiver<bool>,
    pub requeue_delay: Duration,
    pub error_requeue: Duration,
}

impl ReconcileContext {
    pub fn new(
        pods: Arc<dyn PodClient>,
        executor: Arc<dyn WarmupExecutor>,
        telemetry: Arc<dyn WarmupTelemetry>,
        shutdown: watch::Receiver<bool>,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            pods,
            executor,
            telemetry,
            shutdown,
            requeue_delay: config.requeue_delay(),
            error_requeue: config.error_requeue(),
        }
    }

    fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// Keeps the pending-warmup gauge raised for as long as it lives.
struct PendingGuard<'a> {
    telemetry: &'a dyn WarmupTelemetry,
    namespace: &'a str,
    node: &'a str,
}

impl<'a> PendingGuard<'a> {
    fn new(telemetry: &'a dyn WarmupTelemetry, namespace: &'a str, node: &'a str) -> Self {
        telemetry.increment_pending(namespace, node);
        Self {
            telemetry,
            namespace,
            node,
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.telemetry.decrement_pending(self.namespace, self.node);
    }
}

pub async fn reconcile(pod: Arc<Pod>, ctx: Arc<ReconcileContext>) -> Result<Action, ReconcileError> {
    let name = pod.name_any();
    let namespace = pod.namespace().unwrap_or_default();

    match evaluate(&pod) {
        GateState::NotGated => return Ok(Action::await_change()),
        GateState::AlreadyReady => {
            debug!(pod = %name, namespace = %namespace, "warmup condition already True, skipping");
            return Ok(Action::await_change());
        }
        GateState::NotRunning { phase } => {
            debug!(pod = %name, namespace = %namespace, phase = %phase, "pod not in Running phase, requeuing");
            return Ok(Action::requeue(ctx.requeue_delay));
        }
        GateState::ContainersNotReady => {
            debug!(pod = %name, namespace = %namespace, "containers not ready, requeuing");
            return Ok(Action::requeue(ctx.requeue_delay));
        }
        GateState::ContainersReadyPending => {
            debug!(pod = %name, namespace = %namespace, "ContainersReady condition not True, requeuing");
            return Ok(Action::requeue(ctx.requeue_delay));
        }
        GateState::Ready => {}
    }

    if !warmup_requested(&pod) {
        debug!(pod = %name, namespace = %namespace, "pod declares the warmup gate without the enabling annotation");
    }

    info!(pod = %name, namespace = %namespace, "starting warmup execution");

    let outcome = match WarmupConfig::from_pod(Some(&pod)) {
        Err(e) => {
            error!(pod = %name, namespace = %namespace, error = %e, "failed to resolve warmup config");
            WarmupOutcome::ConfigError(e)
        }
        Ok(_) if ctx.executor.is_noop() => {
            info!(pod = %name, namespace = %namespace, "warmup skipped: no executor configured");
            WarmupOutcome::Skipped
        }
        Ok(config) => WarmupOutcome::Executed(run_warmup(&pod, &config, &ctx).await),
    };

    if ctx.shutting_down() && cancelled_by_shutdown(&outcome) {
        // Leave the gate unset so the next controller instance warms the pod up.
        info!(pod = %name, namespace = %namespace, "shutdown interrupted warmup, not recording a result");
        return Ok(Action::await_change());
    }

    match write_condition(&pod, &outcome, &ctx).await {
        Err(ReconcileError::StatusWrite {
            source: PodApiError::NotFound { .. },
            ..
        }) => {
            debug!(pod = %name, namespace = %namespace, "pod deleted during warmup, nothing to record");
            return Ok(Action::await_change());
        }
        written => written?,
    }
    publish_outcome(&pod, &outcome, &ctx).await;

    match &outcome {
        WarmupOutcome::ConfigError(e) => {
            info!(pod = %name, namespace = %namespace, error = %e, "warmup skipped due to config error (fail-open)")
        }
        WarmupOutcome::Executed(result) if result.success => {
            info!(pod = %name, namespace = %namespace, message = %result.message, "warmup completed successfully")
        }
        WarmupOutcome::Executed(result) => info!(
            pod = %name,
            namespace = %namespace,
            message = %result.message,
            error = ?result.error,
            "warmup completed with issues (fail-open)"
        ),
        WarmupOutcome::Skipped => {}
    }

    Ok(Action::await_change())
}

pub fn error_policy(pod: Arc<Pod>, err: &ReconcileError, ctx: Arc<ReconcileContext>) -> Action {
    warn!(
        pod = %pod.name_any(),
        namespace = %pod.namespace().unwrap_or_default(),
        error = %err,
        "reconcile failed, retrying in {:?}",
        ctx.error_requeue
    );
    Action::requeue(ctx.error_requeue)
}

async fn run_warmup(
    pod: &Pod,
    config: &WarmupConfig,
    ctx: &ReconcileContext,
) -> crate::warmup::WarmupResult {
    let node = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.node_name.as_deref())
        .unwrap_or_default();
    let _pending = PendingGuard::new(ctx.telemetry.as_ref(), &config.pod_namespace, node);

    let warmup_ctx = WarmupContext::new(ctx.shutdown.clone()).with_timeout(config.duration);
    let result = ctx.executor.execute(&warmup_ctx, config).await;

    ctx.telemetry
        .record_warmup_result(&config.pod_namespace, result.success, result.total_duration);
    ctx.telemetry
        .record_warmup_requests(&config.pod_namespace, result.requests_total());

    result
}

fn cancelled_by_shutdown(outcome: &WarmupOutcome) -> bool {
    outcome
        .result()
        .is_some_and(|r| r.error == Some(WarmupError::Cancelled(CancelCause::Canceled)))
}

async fn write_condition(
    pod: &Pod,
    outcome: &WarmupOutcome,
    ctx: &ReconcileContext,
) -> Result<(), ReconcileError> {
    let mut conditions = pod
        .status
        .as_ref()
        .and_then(|s| s.conditions.clone())
        .unwrap_or_default();
    upsert_condition(
        &mut conditions,
        warmup_condition(outcome.reason(), outcome.message(), Utc::now()),
    );

    ctx.pods
        .update_status(pod, conditions)
        .await
        .map_err(|source| {
            if !matches!(source, PodApiError::NotFound { .. }) {
                error!(pod = %pod.name_any(), error = %source, "failed to update pod condition");
            }
            ReconcileError::StatusWrite {
                namespace: pod.namespace().unwrap_or_default(),
                name: pod.name_any(),
                source,
            }
        })
}

async fn publish_outcome(pod: &Pod, outcome: &WarmupOutcome, ctx: &ReconcileContext) {
    let reason = outcome.reason();
    let kind = match reason {
        ConditionReason::Complete => PodEventKind::Normal,
        ConditionReason::FailedOpen => PodEventKind::Warning,
    };
    ctx.pods
        .publish_event(
            pod,
            PodEvent {
                kind,
                reason: reason.event_reason().to_string(),
                note: outcome.message(),
            },
        )
        .await;
}
