mod common;

use std::time::Duration;

use common::PodBuilder;
use k8s_openapi::api::core::v1::Pod;
use kube_booster::{
    annotations::{WARMUP_DURATION, WARMUP_PORT, WARMUP_REQUESTS},
    warmup::WarmupConfig,
};
use proptest::prelude::*;

fn arb_override() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        "-?[0-9]{1,12}".prop_map(Some),
        "-?[0-9]{1,3}(\\.[0-9]{1,2})?(ns|us|ms|s|m|h)".prop_map(Some),
        "[0-9]{1,2}m[0-9]{1,2}s".prop_map(Some),
        ".{0,12}".prop_map(Some),
    ]
}

fn pod_with(count: &Option<String>, duration: &Option<String>, port: &Option<String>) -> Pod {
    let mut builder = PodBuilder::ready("web-0");
    if let Some(v) = count {
        builder = builder.annotation(WARMUP_REQUESTS, v);
    }
    if let Some(v) = duration {
        builder = builder.annotation(WARMUP_DURATION, v);
    }
    if let Some(v) = port {
        builder = builder.annotation(WARMUP_PORT, v);
    }
    builder.build()
}

proptest! {
    /// Whatever the overrides say, a resolved config is always within bounds.
    #[test]
    fn resolved_config_is_always_in_bounds(
        count in arb_override(),
        duration in arb_override(),
        port in arb_override(),
    ) {
        let pod = pod_with(&count, &duration, &port);
        if let Ok(config) = WarmupConfig::from_pod(Some(&pod)) {
            prop_assert!(config.request_count >= 1);
            prop_assert!(config.duration >= Duration::from_secs(1));
            prop_assert!(config.port >= 1);
            prop_assert!(config.endpoint.starts_with('/'));
        }
    }

    /// Out-of-range numeric overrides are rejected rather than clamped.
    #[test]
    fn out_of_range_values_are_rejected(
        count in -1_000i64..1,
        port in prop_oneof![-1_000i64..1, 65_536i64..200_000],
    ) {
        let pod = pod_with(&Some(count.to_string()), &None, &None);
        prop_assert!(WarmupConfig::from_pod(Some(&pod)).is_err());

        let pod = pod_with(&None, &None, &Some(port.to_string()));
        prop_assert!(WarmupConfig::from_pod(Some(&pod)).is_err());
    }

    /// Well-formed overrides resolve to exactly the requested values.
    #[test]
    fn valid_overrides_resolve_exactly(
        count in 1u32..10_000,
        secs in 1u64..7_200,
        port in 1u16..=65_535,
    ) {
        let pod = pod_with(
            &Some(count.to_string()),
            &Some(format!("{}s", secs)),
            &Some(port.to_string()),
        );
        let config = WarmupConfig::from_pod(Some(&pod)).unwrap();
        prop_assert_eq!(config.request_count, count);
        prop_assert_eq!(config.duration, Duration::from_secs(secs));
        prop_assert_eq!(config.port, port);
    }
}

#[test]
fn single_port_pod_resolves_defaults() {
    let pod = PodBuilder::ready("web-0").build();
    let config = WarmupConfig::from_pod(Some(&pod)).unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.endpoint, "/");
    assert_eq!(config.request_count, 3);
    assert_eq!(config.duration, Duration::from_secs(30));
}

#[test]
fn missing_pod_is_an_error() {
    let err = WarmupConfig::from_pod(None).unwrap_err();
    assert_eq!(err.to_string(), "cannot resolve: pod missing");
}
