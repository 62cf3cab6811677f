//! Event mappers.
//!
//! Translate events on watched kinds into reconcile requests for the owning
//! AgentControlPlane. Every mapper is total: an event either maps to exactly
//! one AgentControlPlane or is dropped. AgentControlPlane events map to
//! themselves through `Controller::new` and need no mapper here.

use crds::{back_reference, AgentControlPlane, Cluster, InfraEnv, NamespacedName};
use kube::Resource;
use kube_runtime::reflector::ObjectRef;

fn object_ref(key: &NamespacedName) -> ObjectRef<AgentControlPlane> {
    let obj_ref = ObjectRef::new(&key.name);
    if key.namespace.is_empty() {
        obj_ref
    } else {
        obj_ref.within(&key.namespace)
    }
}

/// Map a Cluster to the AgentControlPlane its `controlPlaneRef` points at.
///
/// References to any other control plane kind are dropped. A reference
/// without a namespace resolves to the Cluster's own namespace.
pub fn cluster_to_agent_control_plane(cluster: &Cluster) -> Option<ObjectRef<AgentControlPlane>> {
    let control_plane_ref = cluster.spec.control_plane_ref.as_ref()?;
    if !control_plane_ref.is_kind(&AgentControlPlane::kind(&())) {
        return None;
    }

    let name = control_plane_ref.name.as_deref().filter(|name| !name.is_empty())?;
    let namespace = control_plane_ref
        .namespace
        .as_deref()
        .filter(|namespace| !namespace.is_empty())
        .or(cluster.metadata.namespace.as_deref())
        .unwrap_or_default();

    Some(object_ref(&NamespacedName::new(namespace, name)))
}

/// Map an InfraEnv to the AgentControlPlane named by its back-reference annotation.
///
/// InfraEnvs without the annotation, or whose annotation does not decode to a
/// name, are dropped.
pub fn infra_env_to_agent_control_plane(infra_env: &InfraEnv) -> Option<ObjectRef<AgentControlPlane>> {
    back_reference::from_annotations(infra_env)
        .filter(|key| !key.name.is_empty())
        .map(|key| object_ref(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crds::AGENT_CONTROL_PLANE_ANNOTATION;
    use std::collections::BTreeMap;

    #[test]
    fn test_cluster_with_agent_control_plane_ref() {
        let cluster = create_test_cluster("team-a", "cluster-1", "AgentControlPlane", Some("team-a"), "cp-1");
        let obj_ref = cluster_to_agent_control_plane(&cluster).unwrap();
        assert_eq!(obj_ref.name, "cp-1");
        assert_eq!(obj_ref.namespace.as_deref(), Some("team-a"));
    }

    #[test]
    fn test_cluster_with_other_kind_is_dropped() {
        let cluster = create_test_cluster("team-a", "cluster-1", "KubeadmControlPlane", Some("team-a"), "cp-1");
        assert!(cluster_to_agent_control_plane(&cluster).is_none());
    }

    #[test]
    fn test_cluster_without_control_plane_ref_is_dropped() {
        let mut cluster = create_test_cluster("team-a", "cluster-1", "AgentControlPlane", None, "cp-1");
        cluster.spec.control_plane_ref = None;
        assert!(cluster_to_agent_control_plane(&cluster).is_none());
    }

    #[test]
    fn test_cluster_ref_without_namespace_uses_cluster_namespace() {
        let cluster = create_test_cluster("team-b", "cluster-1", "AgentControlPlane", None, "cp-1");
        let obj_ref = cluster_to_agent_control_plane(&cluster).unwrap();
        assert_eq!(obj_ref.namespace.as_deref(), Some("team-b"));
    }

    #[test]
    fn test_infra_env_with_annotation() {
        let infra_env = create_test_infra_env("team-a", "cp-1", Some("team-a/cp-1"));
        let obj_ref = infra_env_to_agent_control_plane(&infra_env).unwrap();
        assert_eq!(obj_ref.name, "cp-1");
        assert_eq!(obj_ref.namespace.as_deref(), Some("team-a"));
    }

    #[test]
    fn test_infra_env_without_annotation_is_dropped() {
        let infra_env = create_test_infra_env("team-a", "cp-1", None);
        assert!(infra_env_to_agent_control_plane(&infra_env).is_none());

        let mut infra_env = create_test_infra_env("team-a", "cp-1", None);
        infra_env.metadata.annotations = Some(BTreeMap::from([(
            "unrelated".to_string(),
            "team-a/cp-1".to_string(),
        )]));
        assert!(infra_env_to_agent_control_plane(&infra_env).is_none());
    }

    #[test]
    fn test_infra_env_with_empty_annotation_is_dropped() {
        let infra_env = create_test_infra_env("team-a", "cp-1", Some(""));
        assert!(infra_env_to_agent_control_plane(&infra_env).is_none());

        let infra_env = create_test_infra_env("team-a", "cp-1", Some("team-a/"));
        assert!(infra_env_to_agent_control_plane(&infra_env).is_none());
    }

    #[test]
    fn test_infra_env_annotation_without_namespace() {
        let mut infra_env = create_test_infra_env("team-a", "cp-1", None);
        infra_env.metadata.annotations = Some(BTreeMap::from([(
            AGENT_CONTROL_PLANE_ANNOTATION.to_string(),
            "cp-global".to_string(),
        )]));
        let obj_ref = infra_env_to_agent_control_plane(&infra_env).unwrap();
        assert_eq!(obj_ref.name, "cp-global");
        assert_eq!(obj_ref.namespace, None);
    }
}
