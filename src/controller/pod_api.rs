//! The slice of the Kubernetes API the reconciler writes through.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, PodCondition};
use kube::{
    api::{Api, Patch, PatchParams},
    runtime::events::{Event, EventType, Recorder, Reporter},
    Client, Resource, ResourceExt,
};
use serde_json::json;
use tracing::warn;

pub const CONTROLLER_NAME: &str = "kube-booster-controller";

/// Events API rejects notes longer than this.
const MAX_EVENT_NOTE_BYTES: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum PodApiError {
    #[error("conflict updating pod {namespace}/{name}: object has been modified")]
    Conflict { namespace: String, name: String },

    #[error("pod {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl PodApiError {
    fn from_kube(err: kube::Error, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 409 => PodApiError::Conflict {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(resp) if resp.code == 404 => PodApiError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            other => PodApiError::Kube(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodEventKind {
    Normal,
    Warning,
}

/// A Kubernetes Event to attach to a pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodEvent {
    pub kind: PodEventKind,
    pub reason: String,
    pub note: String,
}

#[async_trait]
pub trait PodClient: Send + Sync {
    /// Persist `conditions` as the pod's full condition list. The write is
    /// optimistic against the pod's resourceVersion.
    async fn update_status(&self, pod: &Pod, conditions: Vec<PodCondition>)
        -> Result<(), PodApiError>;

    /// Fire-and-forget; failures are logged by the implementation.
    async fn publish_event(&self, pod: &Pod, event: PodEvent);
}

pub struct KubePodClient {
    client: Client,
    recorder: Recorder,
}

impl KubePodClient {
    pub fn new(client: Client, instance: Option<String>) -> Self {
        let reporter = Reporter {
            controller: CONTROLLER_NAME.to_string(),
            instance,
        };
        let recorder = Recorder::new(client.clone(), reporter);
        Self { client, recorder }
    }
}

#[async_trait]
impl PodClient for KubePodClient {
    async fn update_status(
        &self,
        pod: &Pod,
        conditions: Vec<PodCondition>,
    ) -> Result<(), PodApiError> {
        let name = pod.name_any();
        let namespace = pod.namespace().unwrap_or_default();
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &namespace);

        let mut patch = json!({ "status": { "conditions": conditions } });
        if let Some(rv) = pod.resource_version() {
            patch["metadata"] = json!({ "resourceVersion": rv });
        }

        api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| PodApiError::from_kube(e, &namespace, &name))?;
        Ok(())
    }

    async fn publish_event(&self, pod: &Pod, event: PodEvent) {
        let ev = Event {
            type_: match event.kind {
                PodEventKind::Normal => EventType::Normal,
                PodEventKind::Warning => EventType::Warning,
            },
            reason: event.reason,
            note: Some(truncate_note(event.note)),
            action: "Warmup".to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&ev, &pod.object_ref(&())).await {
            warn!(
                pod = %pod.name_any(),
                namespace = %pod.namespace().unwrap_or_default(),
                error = %e,
                "failed to publish warmup event"
            );
        }
    }
}

fn truncate_note(mut note: String) -> String {
    if note.len() <= MAX_EVENT_NOTE_BYTES {
        return note;
    }
    let mut end = MAX_EVENT_NOTE_BYTES;
    while !note.is_char_boundary(end) {
        end -= 1;
    }
    note.truncate(end);
    note
}
