// Shared helpers for integration tests
#![allow(dead_code)]

pub mod mock_target;

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, ContainerStatus, Pod, PodCondition, PodReadinessGate, PodSpec,
    PodStatus,
};
use kube::api::ObjectMeta;
use kube_booster::{
    annotations::{
        CONDITION_TYPE_CONTAINERS_READY, CONDITION_TYPE_WARMUP_READY, READINESS_GATE_NAME,
        WARMUP_ENABLED, WARMUP_ENABLED_VALUE,
    },
    config::ControllerConfig,
    controller::{PodApiError, PodClient, PodEvent, ReconcileContext},
    observability::metrics::WarmupTelemetry,
    warmup::WarmupExecutor,
};
use tokio::sync::watch;

/// Fluent builder for pods in the shapes the controller cares about.
#[derive(Clone)]
pub struct PodBuilder {
    pod: Pod,
}

impl PodBuilder {
    /// A gated, running pod with one ready container exposing `8080`.
    pub fn ready(name: &str) -> Self {
        Self::new(name)
            .gated()
            .annotation(WARMUP_ENABLED, WARMUP_ENABLED_VALUE)
            .container("app", &[8080])
            .phase("Running")
            .pod_ip("10.0.0.12")
            .containers_ready(true)
    }

    pub fn new(name: &str) -> Self {
        Self {
            pod: Pod {
                metadata: ObjectMeta {
                    name: Some(name.to_string()),
                    namespace: Some("default".to_string()),
                    resource_version: Some("1".to_string()),
                    ..Default::default()
                },
                spec: Some(PodSpec {
                    node_name: Some("worker-1".to_string()),
                    ..Default::default()
                }),
                status: Some(PodStatus::default()),
            },
        }
    }

    fn spec(&mut self) -> &mut PodSpec {
        self.pod.spec.get_or_insert_with(PodSpec::default)
    }

    fn status(&mut self) -> &mut PodStatus {
        self.pod.status.get_or_insert_with(PodStatus::default)
    }

    pub fn gated(mut self) -> Self {
        self.spec()
            .readiness_gates
            .get_or_insert_with(Vec::new)
            .push(PodReadinessGate {
                condition_type: READINESS_GATE_NAME.to_string(),
            });
        self
    }

    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.pod
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn container(mut self, name: &str, ports: &[i32]) -> Self {
        let ports = (!ports.is_empty()).then(|| {
            ports
                .iter()
                .map(|&p| ContainerPort {
                    container_port: p,
                    ..Default::default()
                })
                .collect()
        });
        self.spec().containers.push(Container {
            name: name.to_string(),
            ports,
            ..Default::default()
        });
        self
    }

    pub fn phase(mut self, phase: &str) -> Self {
        self.status().phase = Some(phase.to_string());
        self
    }

    pub fn pod_ip(mut self, ip: &str) -> Self {
        self.status().pod_ip = Some(ip.to_string());
        self
    }

    /// Container statuses for every declared container plus the
    /// `ContainersReady` condition.
    pub fn containers_ready(mut self, ready: bool) -> Self {
        let names: Vec<String> = self
            .pod
            .spec
            .as_ref()
            .map(|s| s.containers.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default();
        self.status().container_statuses = Some(
            names
                .into_iter()
                .map(|name| ContainerStatus {
                    name,
                    ready,
                    ..Default::default()
                })
                .collect(),
        );
        self.condition(
            CONDITION_TYPE_CONTAINERS_READY,
            if ready { "True" } else { "False" },
        )
    }

    pub fn condition(mut self, type_: &str, status: &str) -> Self {
        let conditions = self.status().conditions.get_or_insert_with(Vec::new);
        conditions.retain(|c| c.type_ != type_);
        conditions.push(PodCondition {
            type_: type_.to_string(),
            status: status.to_string(),
            ..Default::default()
        });
        self
    }

    pub fn warmed_up(self) -> Self {
        self.condition(CONDITION_TYPE_WARMUP_READY, "True")
    }

    pub fn build(self) -> Pod {
        self.pod
    }
}

/// Returns the warmup condition on `pod`, if any.
pub fn warmup_condition(pod: &Pod) -> Option<PodCondition> {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|c| c.iter().find(|c| c.type_ == CONDITION_TYPE_WARMUP_READY))
        .cloned()
}

#[derive(Debug, Clone)]
pub struct StatusWrite {
    pub name: String,
    pub namespace: String,
    pub conditions: Vec<PodCondition>,
}

impl StatusWrite {
    pub fn warmup_condition(&self) -> Option<&PodCondition> {
        self.conditions
            .iter()
            .find(|c| c.type_ == CONDITION_TYPE_WARMUP_READY)
    }

    /// `pod` with these conditions applied, as the API server would return it.
    pub fn apply_to(&self, pod: &Pod) -> Pod {
        let mut pod = pod.clone();
        pod.status.get_or_insert_with(PodStatus::default).conditions = Some(self.conditions.clone());
        pod
    }
}

/// In-memory stand-in for the pod status API.
#[derive(Default)]
pub struct FakePodClient {
    writes: Mutex<Vec<StatusWrite>>,
    events: Mutex<Vec<PodEvent>>,
    fail_with_conflict: bool,
    fail_with_not_found: bool,
}

impl FakePodClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conflicting() -> Self {
        Self {
            fail_with_conflict: true,
            ..Default::default()
        }
    }

    /// Behaves as if the pod was deleted before the status write.
    pub fn missing() -> Self {
        Self {
            fail_with_not_found: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> Vec<StatusWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<PodEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl PodClient for FakePodClient {
    async fn update_status(
        &self,
        pod: &Pod,
        conditions: Vec<PodCondition>,
    ) -> Result<(), PodApiError> {
        let name = pod.metadata.name.clone().unwrap_or_default();
        let namespace = pod.metadata.namespace.clone().unwrap_or_default();
        if self.fail_with_conflict {
            return Err(PodApiError::Conflict { namespace, name });
        }
        if self.fail_with_not_found {
            return Err(PodApiError::NotFound { namespace, name });
        }
        self.writes.lock().unwrap().push(StatusWrite {
            name,
            namespace,
            conditions,
        });
        Ok(())
    }

    async fn publish_event(&self, _pod: &Pod, event: PodEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Telemetry sink that remembers what it was told.
#[derive(Default)]
pub struct RecordingTelemetry {
    pub results: Mutex<Vec<(String, bool, Duration)>>,
    pub requests: Mutex<u32>,
    pub latencies: Mutex<Vec<Duration>>,
    pub pending: Mutex<i64>,
    pub pending_peak: Mutex<i64>,
}

impl WarmupTelemetry for RecordingTelemetry {
    fn record_warmup_result(&self, namespace: &str, success: bool, duration: Duration) {
        self.results
            .lock()
            .unwrap()
            .push((namespace.to_string(), success, duration));
    }

    fn record_warmup_requests(&self, _namespace: &str, count: u32) {
        *self.requests.lock().unwrap() += count;
    }

    fn record_request_latency(&self, _namespace: &str, latency: Duration) {
        self.latencies.lock().unwrap().push(latency);
    }

    fn increment_pending(&self, _namespace: &str, _node: &str) {
        let mut pending = self.pending.lock().unwrap();
        *pending += 1;
        let mut peak = self.pending_peak.lock().unwrap();
        *peak = (*peak).max(*pending);
    }

    fn decrement_pending(&self, _namespace: &str, _node: &str) {
        *self.pending.lock().unwrap() -= 1;
    }
}

/// Everything a reconcile test needs to inspect afterwards.
pub struct TestHarness {
    pub pods: Arc<FakePodClient>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub shutdown_tx: watch::Sender<bool>,
    pub context: Arc<ReconcileContext>,
}

impl TestHarness {
    pub fn new(executor: Arc<dyn WarmupExecutor>) -> Self {
        Self::with_pods(executor, FakePodClient::new())
    }

    pub fn with_pods(executor: Arc<dyn WarmupExecutor>, pods: FakePodClient) -> Self {
        let pods = Arc::new(pods);
        let telemetry = Arc::new(RecordingTelemetry::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let context = Arc::new(ReconcileContext::new(
            pods.clone(),
            executor,
            telemetry.clone(),
            shutdown_rx,
            &ControllerConfig::default(),
        ));
        Self {
            pods,
            telemetry,
            shutdown_tx,
            context,
        }
    }
}
