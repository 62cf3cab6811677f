//! Kubernetes-backed resource store
//!
//! Thin wrapper over `kube::Api` that maps API status codes onto
//! `StoreError` and turns 404 on reads into `None`.

use crate::error::{from_kube, StoreError};
use crate::store_trait::ClusterStoreTrait;
use crds::{AgentControlPlane, InfraEnv, NamespacedName, Scheme};
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource};
use tracing::debug;

/// Resource store backed by the Kubernetes API server
pub struct KubeClusterStore {
    client: Client,
    scheme: Scheme,
}

impl std::fmt::Debug for KubeClusterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterStore")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl KubeClusterStore {
    /// Create a new store
    ///
    /// # Arguments
    /// * `client` - Kubernetes client
    /// * `scheme` - Kinds this store may read and write
    pub fn new(client: Client, scheme: Scheme) -> Self {
        Self { client, scheme }
    }

    fn api<K>(&self, namespace: &str) -> Result<Api<K>, StoreError>
    where
        K: Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>,
    {
        self.scheme.lookup(&K::kind(&()))?;
        Ok(Api::namespaced(self.client.clone(), namespace))
    }
}

#[async_trait::async_trait]
impl ClusterStoreTrait for KubeClusterStore {
    fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    async fn get_agent_control_plane(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<AgentControlPlane>, StoreError> {
        debug!("Getting AgentControlPlane {}/{}", namespace, name);
        let api = self.api::<AgentControlPlane>(namespace)?;
        api.get_opt(name)
            .await
            .map_err(|e| from_kube(e, &format!("AgentControlPlane {namespace}/{name}")))
    }

    async fn patch_agent_control_plane(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<AgentControlPlane, StoreError> {
        debug!("Patching AgentControlPlane {}/{}", namespace, name);
        let api = self.api::<AgentControlPlane>(namespace)?;
        api.patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(|e| from_kube(e, &format!("AgentControlPlane {namespace}/{name}")))
    }

    async fn get_infra_env(&self, namespace: &str, name: &str) -> Result<Option<InfraEnv>, StoreError> {
        debug!("Getting InfraEnv {}/{}", namespace, name);
        let api = self.api::<InfraEnv>(namespace)?;
        api.get_opt(name)
            .await
            .map_err(|e| from_kube(e, &format!("InfraEnv {namespace}/{name}")))
    }

    async fn create_infra_env(&self, infra_env: &InfraEnv) -> Result<InfraEnv, StoreError> {
        let key = NamespacedName::of(infra_env);
        debug!("Creating InfraEnv {}", key);
        let api = self.api::<InfraEnv>(&key.namespace)?;
        api.create(&PostParams::default(), infra_env)
            .await
            .map_err(|e| from_kube(e, &format!("InfraEnv {key}")))
    }
}
