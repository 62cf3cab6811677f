//! AgentControlPlane CRD
//!
//! Declares the desired control plane for a Cluster API cluster provisioned
//! through the assisted installer. The controller converges one `InfraEnv`
//! per `AgentControlPlane` and propagates its boot image URL into the
//! machine template.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::references::ObjectReference;

/// Machine template annotation holding the boot image URL of the control plane
pub const ISO_DOWNLOAD_URL_ANNOTATION: &str = "controlplane.openshift.io/isoDownloadURL";

/// Desired state of an AgentControlPlane
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[kube(
    group = "controlplane.openshift.io",
    version = "v1",
    kind = "AgentControlPlane",
    namespaced,
    derive = "PartialEq",
    status = "AgentControlPlaneStatus",
    scale = r#"{"specReplicasPath":".spec.replicas","statusReplicasPath":".status.replicas","labelSelectorPath":".status.selector"}"#,
    shortname = "acp"
)]
#[serde(rename_all = "camelCase")]
pub struct AgentControlPlaneSpec {
    /// Number of desired machines. Defaults to 1.
    ///
    /// Stacked etcd topologies should use odd numbers; this is not enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// OpenShift version
    pub version: String,

    /// How machines should be shaped when creating or updating the control plane
    pub machine_template: AgentControlPlaneMachineTemplate,
}

impl AgentControlPlaneSpec {
    /// Desired replica count, defaulting to 1 when unset
    pub fn replicas(&self) -> i32 {
        self.replicas.unwrap_or(1)
    }
}

/// Template for control plane machines
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentControlPlaneMachineTemplate {
    /// Labels and annotations applied to the machines
    #[serde(default)]
    pub metadata: MachineTemplateMetadata,

    /// Reference to a custom resource offered by an infrastructure provider
    pub infrastructure_ref: ObjectReference,

    /// Total time spent draining a control plane node (Go duration, e.g. "5m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_drain_timeout: Option<String>,

    /// Total time spent waiting for volumes to detach (Go duration)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_volume_detach_timeout: Option<String>,

    /// How long to retry deleting the Node of a deleted Machine (Go duration)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_deletion_timeout: Option<String>,
}

impl AgentControlPlaneMachineTemplate {
    /// Boot image URL currently recorded on the template, if any
    pub fn iso_download_url(&self) -> Option<&str> {
        self.metadata
            .annotations
            .get(ISO_DOWNLOAD_URL_ANNOTATION)
            .map(String::as_str)
    }
}

/// Subset of object metadata carried by a machine template
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MachineTemplateMetadata {
    /// Labels applied to machines
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Annotations applied to machines
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Observed state of an AgentControlPlane
///
/// Written only by the controller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentControlPlaneStatus {
    /// Non-terminated machines targeted by this control plane
    #[serde(default)]
    pub replicas: i32,

    /// Minimum version of the control plane machines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Non-terminated machines that have the desired template spec
    #[serde(default)]
    pub updated_replicas: i32,

    /// Fully running and ready control plane machines
    #[serde(default)]
    pub ready_replicas: i32,

    /// Machines still required for 100% available capacity
    #[serde(default)]
    pub unavailable_replicas: i32,

    /// Whether the control plane has been initialized
    #[serde(default)]
    pub initialized: bool,

    /// Label selector in query-param syntax, for the scale subresource
    #[serde(default)]
    pub selector: String,

    /// Set once the API server became ready during initial provisioning.
    /// Never cleared afterwards.
    #[serde(default)]
    pub ready: bool,

    /// Terminal reconciliation problem, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,

    /// Latest generation observed by the controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Current service state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Cluster API style condition
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (e.g., "Ready")
    #[serde(rename = "type")]
    pub type_: String,

    /// "True", "False" or "Unknown"
    pub status: String,

    /// Severity when status is "False" ("Error", "Warning", "Info")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// Last time the condition changed status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<chrono::DateTime<chrono::Utc>>,

    /// Machine-readable reason for the last transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
