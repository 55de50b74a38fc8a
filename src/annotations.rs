//! Well-known annotation keys, readiness gate and condition identifiers.

/// Annotation that opts a pod into warmup gating.
pub const WARMUP_ENABLED: &str = "kube-booster.io/warmup";

/// Value of [`WARMUP_ENABLED`] that activates gating.
pub const WARMUP_ENABLED_VALUE: &str = "enabled";

pub const WARMUP_ENDPOINT: &str = "kube-booster.io/warmup-endpoint";

pub const WARMUP_REQUESTS: &str = "kube-booster.io/warmup-requests";

/// Go-style duration string, e.g. `30s`, `1m30s`.
pub const WARMUP_DURATION: &str = "kube-booster.io/warmup-duration";

pub const WARMUP_PORT: &str = "kube-booster.io/warmup-port";

/// Readiness gate declared on the pod spec by the admission mutator.
pub const READINESS_GATE_NAME: &str = "kube-booster.io/warmup-ready";

/// Condition type written to the pod status once warmup has finished.
pub const CONDITION_TYPE_WARMUP_READY: &str = "kube-booster.io/warmup-ready";

/// Built-in pod condition that must be True before warmup starts.
pub const CONDITION_TYPE_CONTAINERS_READY: &str = "ContainersReady";

pub const POD_PHASE_RUNNING: &str = "Running";

/// True when the pod carries the enabling annotation the admission mutator keys on.
pub fn warmup_requested(pod: &k8s_openapi::api::core::v1::Pod) -> bool {
    pod.metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(WARMUP_ENABLED))
        .is_some_and(|value| value == WARMUP_ENABLED_VALUE)
}
