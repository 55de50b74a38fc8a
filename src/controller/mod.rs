//! Pod controller that satisfies the warmup readiness gate.

pub mod conditions;
pub mod outcome;
pub mod pod_api;
pub mod reconciler;

use std::{future::Future, sync::Arc};

use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::Api,
    runtime::{controller, watcher, Controller},
    Client,
};
use tracing::{debug, info, warn};

pub use conditions::GateState;
pub use outcome::{ConditionReason, WarmupOutcome};
pub use pod_api::{KubePodClient, PodApiError, PodClient, PodEvent, PodEventKind};
pub use reconciler::{error_policy, reconcile, ReconcileContext, ReconcileError};

use crate::config::ControllerConfig;

/// Watch scope for the pod controller.
pub fn pod_api(client: Client, config: &ControllerConfig) -> Api<Pod> {
    match config.namespace.as_deref().filter(|ns| !ns.is_empty()) {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    }
}

pub fn watcher_config(config: &ControllerConfig) -> watcher::Config {
    match config.node_field_selector() {
        Some(selector) => watcher::Config::default().fields(&selector),
        None => watcher::Config::default(),
    }
}

/// Run the controller until `shutdown` resolves and in-flight reconciles drain.
pub async fn run<F>(
    client: Client,
    config: &ControllerConfig,
    context: Arc<ReconcileContext>,
    shutdown: F,
) where
    F: Future<Output = ()> + Send + Sync + 'static,
{
    if let Some(node) = &config.node_name {
        info!(node = %node, "running in node-local mode");
    }
    info!(
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        concurrency = config.concurrency,
        "starting pod warmup controller"
    );

    Controller::new(pod_api(client, config), watcher_config(config))
        .with_config(controller::Config::default().concurrency(config.concurrency))
        .graceful_shutdown_on(shutdown)
        .run(reconcile, error_policy, context)
        .for_each(|res| async move {
            match res {
                Ok((obj, action)) => debug!(pod = %obj.name, ?action, "reconciled"),
                Err(controller::Error::ReconcilerFailed(e, obj)) => {
                    warn!(pod = %obj.name, error = %e, "reconcile failed")
                }
                Err(e) => warn!(error = %e, "controller error"),
            }
        })
        .await;

    info!("pod warmup controller stopped");
}
