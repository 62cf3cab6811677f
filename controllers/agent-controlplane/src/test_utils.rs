//! Test utilities for unit testing the reconciler and mappers
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use crate::reconciler::Reconciler;
use cluster_store::MockClusterStore;
use crds::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Pull secret name used by test reconcilers
pub const TEST_PULL_SECRET: &str = "test-pull-secret";

/// Helper to create test AgentControlPlane CRD
pub fn create_test_agent_control_plane(namespace: &str, name: &str) -> AgentControlPlane {
    AgentControlPlane {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: AgentControlPlaneSpec {
            replicas: Some(3),
            version: "4.16.0".to_string(),
            machine_template: AgentControlPlaneMachineTemplate {
                infrastructure_ref: ObjectReference::new(
                    "infrastructure.cluster.x-k8s.io/v1beta1",
                    "Metal3MachineTemplate",
                    namespace,
                    &format!("{name}-template"),
                ),
                node_drain_timeout: Some("5m".to_string()),
                ..Default::default()
            },
        },
        status: None,
    }
}

/// Helper to create test InfraEnv CRD, optionally carrying a back-reference annotation
pub fn create_test_infra_env(namespace: &str, name: &str, back_reference: Option<&str>) -> InfraEnv {
    InfraEnv {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: back_reference.map(|value| {
                BTreeMap::from([(AGENT_CONTROL_PLANE_ANNOTATION.to_string(), value.to_string())])
            }),
            ..Default::default()
        },
        spec: InfraEnvSpec::default(),
        status: None,
    }
}

/// Helper to create test Cluster CRD whose controlPlaneRef points at `kind` `ref_namespace/ref_name`
pub fn create_test_cluster(
    namespace: &str,
    name: &str,
    kind: &str,
    ref_namespace: Option<&str>,
    ref_name: &str,
) -> Cluster {
    Cluster {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: ClusterSpec {
            paused: None,
            control_plane_ref: Some(ObjectReference {
                api_version: Some("controlplane.openshift.io/v1".to_string()),
                kind: Some(kind.to_string()),
                name: Some(ref_name.to_string()),
                namespace: ref_namespace.map(str::to_string),
                ..Default::default()
            }),
            infrastructure_ref: None,
        },
    }
}

/// Helper to create a reconciler over a shared mock store
pub fn create_test_reconciler(store: &MockClusterStore) -> Reconciler {
    Reconciler::new(Box::new(store.clone()), TEST_PULL_SECRET.to_string())
}
