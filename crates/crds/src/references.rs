//! Kubernetes object references shared by the agent control plane CRDs
//!
//! Mirrors the core `ObjectReference` and `LocalObjectReference` shapes with
//! their upstream wire names, so the CRDs can carry them with a generated
//! JSON schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to an object of any kind, possibly in another namespace
///
/// Used for `Cluster.spec.controlPlaneRef` and
/// `AgentControlPlane.spec.machineTemplate.infrastructureRef`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// API version of the referent (e.g., "controlplane.openshift.io/v1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Kind of the referent (e.g., "AgentControlPlane")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Name of the referent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Namespace of the referent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// UID of the referent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Specific resourceVersion to which this reference is made, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    /// Field path inside the referent, if the reference targets a sub-object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
}

impl ObjectReference {
    /// Create a reference with kind, name and namespace
    pub fn new(api_version: &str, kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            api_version: Some(api_version.to_string()),
            kind: Some(kind.to_string()),
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    /// True when the reference points at the given kind
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }
}

/// Reference to an object in the same namespace, by name only
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocalObjectReference {
    /// Name of the referent
    #[serde(default)]
    pub name: String,
}

impl LocalObjectReference {
    /// Create a reference by name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_reference_wire_names() {
        let reference = ObjectReference::new(
            "controlplane.openshift.io/v1",
            "AgentControlPlane",
            "team-a",
            "cp-1",
        );
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["apiVersion"], "controlplane.openshift.io/v1");
        assert_eq!(json["kind"], "AgentControlPlane");
        assert!(json.get("uid").is_none());
    }

    #[test]
    fn test_is_kind() {
        let reference = ObjectReference {
            kind: Some("KubeadmControlPlane".to_string()),
            ..Default::default()
        };
        assert!(reference.is_kind("KubeadmControlPlane"));
        assert!(!reference.is_kind("AgentControlPlane"));
        assert!(!ObjectReference::default().is_kind("AgentControlPlane"));
    }
}
