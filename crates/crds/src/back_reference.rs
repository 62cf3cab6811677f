//! Back-reference index
//!
//! Encodes a pointer from a child resource to its owning `AgentControlPlane`
//! as a single `<namespace>/<name>` string, stored in an annotation on the
//! child. The string doubles as a foreign key: mapping a child event back to
//! its parent needs no separate index structure.
//!
//! Wire format:
//! - `<namespace>/<name>` when the namespace is set
//! - `<name>` when the namespace is empty (cluster-scoped fallback)

use std::fmt;

use kube::Resource;

/// Annotation carrying the encoded parent identity on an `InfraEnv`.
pub const AGENT_CONTROL_PLANE_ANNOTATION: &str = "controlplane.openshift.io/agentControlPlane";

/// Separator between namespace and name.
pub const SEPARATOR: char = '/';

/// Namespace + name identity of a Kubernetes object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NamespacedName {
    /// Namespace (empty for cluster-scoped objects)
    pub namespace: String,
    /// Object name
    pub name: String,
}

impl NamespacedName {
    /// Create a new identity
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of an existing object, read from its metadata.
    ///
    /// Missing fields become empty strings.
    pub fn of<K: Resource>(obj: &K) -> Self {
        let meta = obj.meta();
        Self {
            namespace: meta.namespace.clone().unwrap_or_default(),
            name: meta.name.clone().unwrap_or_default(),
        }
    }

    /// Encoded form, suitable for the back-reference annotation
    pub fn encode(&self) -> String {
        encode(&self.namespace, &self.name)
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{}{}", self.namespace, SEPARATOR, self.name)
        }
    }
}

/// Encode a namespace and name into a back-reference string.
pub fn encode(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}{SEPARATOR}{name}")
    }
}

/// Decode a back-reference string.
///
/// Returns `None` for the empty string, which means "no reference".
/// Splits on the first separator only; without a separator the whole
/// value is taken as the name with an empty namespace.
pub fn decode(value: &str) -> Option<NamespacedName> {
    if value.is_empty() {
        return None;
    }

    match value.split_once(SEPARATOR) {
        Some((namespace, name)) => Some(NamespacedName::new(namespace, name)),
        None => Some(NamespacedName::new("", value)),
    }
}

/// Read and decode the back-reference annotation from an object.
///
/// Returns `None` when the annotation is absent or empty.
pub fn from_annotations<K: Resource>(obj: &K) -> Option<NamespacedName> {
    obj.meta()
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(AGENT_CONTROL_PLANE_ANNOTATION))
        .and_then(|value| decode(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_with_namespace() {
        assert_eq!(encode("team-a", "cp-1"), "team-a/cp-1");
    }

    #[test]
    fn test_encode_without_namespace() {
        assert_eq!(encode("", "cp-1"), "cp-1");
    }

    #[test]
    fn test_decode_roundtrip() {
        for (namespace, name) in [("team-a", "cp-1"), ("", "cp-1"), ("default", "a.b-c")] {
            let decoded = decode(&encode(namespace, name)).unwrap();
            assert_eq!(decoded, NamespacedName::new(namespace, name));
        }
    }

    #[test]
    fn test_decode_empty_is_no_reference() {
        assert_eq!(decode(""), None);
    }

    #[test]
    fn test_decode_splits_on_first_separator() {
        let decoded = decode("ns/name/extra").unwrap();
        assert_eq!(decoded.namespace, "ns");
        assert_eq!(decoded.name, "name/extra");
    }

    #[test]
    fn test_decode_trailing_separator_has_empty_name() {
        let decoded = decode("ns/").unwrap();
        assert_eq!(decoded.namespace, "ns");
        assert!(decoded.name.is_empty());
    }

    #[test]
    fn test_display_matches_encode() {
        let key = NamespacedName::new("team-a", "cp-1");
        assert_eq!(key.to_string(), key.encode());
        assert_eq!(NamespacedName::new("", "cp-1").to_string(), "cp-1");
    }
}
