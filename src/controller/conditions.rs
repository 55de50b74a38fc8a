//! Pure helpers over pod readiness gates and status conditions.

use chrono::{DateTime, Utc};
use k8s_openapi::{
    api::core::v1::{Pod, PodCondition},
    apimachinery::pkg::apis::meta::v1::Time,
};

use super::outcome::ConditionReason;
use crate::annotations::{
    CONDITION_TYPE_CONTAINERS_READY, CONDITION_TYPE_WARMUP_READY, POD_PHASE_RUNNING,
    READINESS_GATE_NAME,
};

const CONDITION_TRUE: &str = "True";

/// Where a pod stands relative to the warmup gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// The pod does not declare the warmup readiness gate
    NotGated,
    /// Warmup condition already True; terminal
    AlreadyReady,
    NotRunning { phase: String },
    ContainersNotReady,
    /// Kubelet has not yet flipped the `ContainersReady` condition
    ContainersReadyPending,
    /// Every precondition holds; warmup may start
    Ready,
}

impl GateState {
    pub fn should_requeue(&self) -> bool {
        matches!(
            self,
            GateState::NotRunning { .. }
                | GateState::ContainersNotReady
                | GateState::ContainersReadyPending
        )
    }
}

pub fn evaluate(pod: &Pod) -> GateState {
    if !has_readiness_gate(pod) {
        return GateState::NotGated;
    }
    if is_condition_true(pod, CONDITION_TYPE_WARMUP_READY) {
        return GateState::AlreadyReady;
    }

    let phase = pod
        .status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_default();
    if phase != POD_PHASE_RUNNING {
        return GateState::NotRunning { phase };
    }

    if !containers_ready(pod) {
        return GateState::ContainersNotReady;
    }
    if !is_condition_true(pod, CONDITION_TYPE_CONTAINERS_READY) {
        return GateState::ContainersReadyPending;
    }

    GateState::Ready
}

pub fn has_readiness_gate(pod: &Pod) -> bool {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.readiness_gates.as_ref())
        .is_some_and(|gates| {
            gates
                .iter()
                .any(|gate| gate.condition_type == READINESS_GATE_NAME)
        })
}

pub fn find_condition<'a>(pod: &'a Pod, condition_type: &str) -> Option<&'a PodCondition> {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == condition_type))
}

pub fn is_condition_true(pod: &Pod, condition_type: &str) -> bool {
    find_condition(pod, condition_type).is_some_and(|c| c.status == CONDITION_TRUE)
}

/// All container statuses report ready, and there is at least one.
pub fn containers_ready(pod: &Pod) -> bool {
    let Some(statuses) = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
    else {
        return false;
    };
    !statuses.is_empty() && statuses.iter().all(|s| s.ready)
}

pub fn warmup_condition(
    reason: ConditionReason,
    message: impl Into<String>,
    now: DateTime<Utc>,
) -> PodCondition {
    PodCondition {
        type_: CONDITION_TYPE_WARMUP_READY.to_string(),
        status: CONDITION_TRUE.to_string(),
        reason: Some(reason.as_str().to_string()),
        message: Some(message.into()),
        last_transition_time: Some(Time(now)),
        ..Default::default()
    }
}

/// Replace the entry with the same type in place, or append it.
pub fn upsert_condition(conditions: &mut Vec<PodCondition>, condition: PodCondition) {
    match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) => {
            existing.status = condition.status;
            existing.reason = condition.reason;
            existing.message = condition.message;
            existing.last_transition_time = condition.last_transition_time;
        }
        None => conditions.push(condition),
    }
}
