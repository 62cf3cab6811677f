//! InfraEnv CRD
//!
//! Assisted installer resource that produces a bootable discovery image.
//! Owned by the installer's CRD definitions; only the fields this
//! controller reads or writes are modelled here.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::agent_control_plane::Condition;
use crate::references::LocalObjectReference;

/// Desired state of an InfraEnv
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[kube(
    group = "agent-install.openshift.io",
    version = "v1beta1",
    kind = "InfraEnv",
    namespaced,
    derive = "PartialEq",
    status = "InfraEnvStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct InfraEnvSpec {
    /// Secret holding the pull secret for the discovery image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_secret_ref: Option<LocalObjectReference>,

    /// SSH public key baked into the discovery image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_authorized_key: Option<String>,

    /// Target CPU architecture of the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_architecture: Option<String>,
}

/// Observed state of an InfraEnv, written by the installer
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InfraEnvStatus {
    /// Download URL of the discovery image, set once the image is generated
    #[serde(default, rename = "isoDownloadURL")]
    pub iso_download_url: String,

    /// When the current image was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<chrono::DateTime<chrono::Utc>>,

    /// Installer-reported conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl InfraEnv {
    /// Image URL, or `None` while the image is not generated yet
    pub fn iso_download_url(&self) -> Option<&str> {
        self.status
            .as_ref()
            .map(|status| status.iso_download_url.as_str())
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_download_url_wire_name() {
        let status: InfraEnvStatus = serde_json::from_value(serde_json::json!({
            "isoDownloadURL": "https://images.example/discovery.iso"
        }))
        .unwrap();
        assert_eq!(status.iso_download_url, "https://images.example/discovery.iso");
    }

    #[test]
    fn test_iso_download_url_empty_is_none() {
        let mut infra_env = InfraEnv::new("cp-1", InfraEnvSpec::default());
        assert_eq!(infra_env.iso_download_url(), None);

        infra_env.status = Some(InfraEnvStatus::default());
        assert_eq!(infra_env.iso_download_url(), None);

        infra_env.status = Some(InfraEnvStatus {
            iso_download_url: "https://images.example/a.iso".to_string(),
            ..Default::default()
        });
        assert_eq!(infra_env.iso_download_url(), Some("https://images.example/a.iso"));
    }
}
