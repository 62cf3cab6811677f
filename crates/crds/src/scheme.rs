//! Scheme registry
//!
//! Explicit table of the resource kinds this workspace knows how to
//! (de)serialize and reference. Built once at startup and handed to the
//! resource store; there is no process-wide registration.

use std::collections::HashMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::core::GroupVersionKind;
use kube::Resource;
use thiserror::Error;

use crate::{AgentControlPlane, Cluster, InfraEnv};

/// Errors raised by scheme lookups
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemeError {
    /// The kind was never registered
    #[error("kind {0} is not registered in the scheme")]
    UnregisteredKind(String),

    /// The object lacks a field needed to reference it
    #[error("{kind} is missing metadata.{field}")]
    MissingMetadata {
        /// Kind of the object
        kind: String,
        /// Missing metadata field
        field: &'static str,
    },
}

/// Kind registry
#[derive(Debug, Clone, Default)]
pub struct Scheme {
    kinds: HashMap<String, GroupVersionKind>,
}

impl Scheme {
    /// Empty scheme
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheme with every kind the agent control plane controller handles
    pub fn with_defaults() -> Self {
        let mut scheme = Self::new();
        scheme.register::<AgentControlPlane>();
        scheme.register::<InfraEnv>();
        scheme.register::<Cluster>();
        scheme
    }

    /// Register a statically typed resource kind
    pub fn register<K>(&mut self) -> &mut Self
    where
        K: Resource<DynamicType = ()>,
    {
        let gvk = GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()));
        self.kinds.insert(gvk.kind.clone(), gvk);
        self
    }

    /// Look up a registered kind
    pub fn lookup(&self, kind: &str) -> Result<&GroupVersionKind, SchemeError> {
        self.kinds
            .get(kind)
            .ok_or_else(|| SchemeError::UnregisteredKind(kind.to_string()))
    }

    /// Build a controller owner reference pointing at `owner`.
    ///
    /// The owner must be registered and persisted (have a name and uid).
    /// `blockOwnerDeletion` is set so foreground deletion of the owner
    /// waits for its children to be collected.
    pub fn owner_reference<K>(&self, owner: &K) -> Result<OwnerReference, SchemeError>
    where
        K: Resource<DynamicType = ()>,
    {
        let kind = K::kind(&());
        let gvk = self.lookup(&kind)?;
        let meta = owner.meta();

        let name = meta.name.clone().ok_or_else(|| SchemeError::MissingMetadata {
            kind: kind.to_string(),
            field: "name",
        })?;
        let uid = meta.uid.clone().ok_or_else(|| SchemeError::MissingMetadata {
            kind: kind.to_string(),
            field: "uid",
        })?;

        let api_version = if gvk.group.is_empty() {
            gvk.version.clone()
        } else {
            format!("{}/{}", gvk.group, gvk.version)
        };

        Ok(OwnerReference {
            api_version,
            kind: gvk.kind.clone(),
            name,
            uid,
            controller: Some(true),
            block_owner_deletion: Some(true),
        })
    }
}
