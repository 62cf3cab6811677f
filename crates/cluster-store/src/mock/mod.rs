//! Mock ClusterStore for unit testing
//!
//! Stores resources in memory, keyed by namespace/name, and emulates the
//! API server behaviour the reconciler depends on: uid and resourceVersion
//! assignment, generation bumps on spec changes, `AlreadyExists` on create
//! collisions and `Conflict` on stale resourceVersion preconditions.
//!
//! Every operation yields to the runtime once before touching state, so
//! concurrent reconciliations interleave the way they would over the network.

mod merge;

use crate::error::StoreError;
use crate::store_trait::ClusterStoreTrait;
use crds::{AgentControlPlane, InfraEnv, InfraEnvStatus, NamespacedName, Scheme};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub use merge::merge_patch;

/// Store operation, used for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `get_agent_control_plane`
    GetAgentControlPlane,
    /// `patch_agent_control_plane`
    PatchAgentControlPlane,
    /// `get_infra_env`
    GetInfraEnv,
    /// `create_infra_env`
    CreateInfraEnv,
}

/// Failure to inject into the next call of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Store temporarily unavailable
    Unavailable,
    /// Optimistic concurrency conflict
    Conflict,
    /// Name collision on create
    AlreadyExists,
}

impl Operation {
    fn kind(self) -> String {
        match self {
            Self::GetAgentControlPlane | Self::PatchAgentControlPlane => AgentControlPlane::kind(&()).to_string(),
            Self::GetInfraEnv | Self::CreateInfraEnv => InfraEnv::kind(&()).to_string(),
        }
    }
}

impl Failure {
    fn into_error(self, op: Operation) -> StoreError {
        let what = format!("injected failure for {op:?}");
        match self {
            Self::Unavailable => StoreError::Unavailable(what),
            Self::Conflict => StoreError::Conflict(what),
            Self::AlreadyExists => StoreError::AlreadyExists(what),
        }
    }
}

/// Mock ClusterStore for testing
#[derive(Clone)]
pub struct MockClusterStore {
    scheme: Scheme,
    pub(crate) agent_control_planes: Arc<Mutex<HashMap<NamespacedName, AgentControlPlane>>>,
    pub(crate) infra_envs: Arc<Mutex<HashMap<NamespacedName, InfraEnv>>>,
    failures: Arc<Mutex<HashMap<Operation, VecDeque<Failure>>>>,
    calls: Arc<Mutex<HashMap<Operation, usize>>>,
    next_resource_version: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MockClusterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClusterStore").finish_non_exhaustive()
    }
}

impl Default for MockClusterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClusterStore {
    /// Create an empty mock store with the default scheme
    pub fn new() -> Self {
        Self::with_scheme(Scheme::with_defaults())
    }

    /// Create an empty mock store with a custom scheme
    pub fn with_scheme(scheme: Scheme) -> Self {
        Self {
            scheme,
            agent_control_planes: Arc::new(Mutex::new(HashMap::new())),
            infra_envs: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(HashMap::new())),
            next_resource_version: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Add an AgentControlPlane (for test setup), filling in server-side metadata
    pub fn add_agent_control_plane(&self, mut acp: AgentControlPlane) -> AgentControlPlane {
        self.persist_metadata(&mut acp);
        self.agent_control_planes
            .lock()
            .unwrap()
            .insert(NamespacedName::of(&acp), acp.clone());
        acp
    }

    /// Store an AgentControlPlane exactly as given, without server-side metadata
    pub fn put_agent_control_plane(&self, acp: AgentControlPlane) {
        self.agent_control_planes
            .lock()
            .unwrap()
            .insert(NamespacedName::of(&acp), acp);
    }

    /// Add an InfraEnv (for test setup), filling in server-side metadata
    pub fn add_infra_env(&self, mut infra_env: InfraEnv) -> InfraEnv {
        self.persist_metadata(&mut infra_env);
        self.infra_envs
            .lock()
            .unwrap()
            .insert(NamespacedName::of(&infra_env), infra_env.clone());
        infra_env
    }

    /// Simulate the installer publishing the image URL on an InfraEnv
    pub fn set_infra_env_image_url(&self, namespace: &str, name: &str, url: &str) {
        let version = self.next_version();
        let mut infra_envs = self.infra_envs.lock().unwrap();
        if let Some(infra_env) = infra_envs.get_mut(&NamespacedName::new(namespace, name)) {
            infra_env.status = Some(InfraEnvStatus {
                iso_download_url: url.to_string(),
                ..infra_env.status.clone().unwrap_or_default()
            });
            infra_env.metadata.resource_version = Some(version);
        }
    }

    /// Snapshot of a stored AgentControlPlane
    pub fn agent_control_plane(&self, namespace: &str, name: &str) -> Option<AgentControlPlane> {
        self.agent_control_planes
            .lock()
            .unwrap()
            .get(&NamespacedName::new(namespace, name))
            .cloned()
    }

    /// Snapshot of a stored InfraEnv
    pub fn infra_env(&self, namespace: &str, name: &str) -> Option<InfraEnv> {
        self.infra_envs
            .lock()
            .unwrap()
            .get(&NamespacedName::new(namespace, name))
            .cloned()
    }

    /// Number of stored InfraEnvs
    pub fn infra_env_count(&self) -> usize {
        self.infra_envs.lock().unwrap().len()
    }

    /// Make the next call of `op` fail. Queued failures are consumed in order.
    pub fn fail_next(&self, op: Operation, failure: Failure) {
        self.failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(failure);
    }

    /// Number of times `op` was called, including failed calls
    pub fn calls(&self, op: Operation) -> usize {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    /// Number of calls that could have written to the store
    pub fn write_calls(&self) -> usize {
        self.calls(Operation::CreateInfraEnv) + self.calls(Operation::PatchAgentControlPlane)
    }

    fn next_version(&self) -> String {
        self.next_resource_version
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }

    fn persist_metadata<K: Resource>(&self, obj: &mut K) {
        let version = self.next_version();
        let meta = obj.meta_mut();
        if meta.uid.is_none() {
            meta.uid = Some(uuid::Uuid::new_v4().to_string());
        }
        if meta.generation.is_none() {
            meta.generation = Some(1);
        }
        meta.resource_version = Some(version);
    }

    async fn enter(&self, op: Operation) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        self.scheme.lookup(&op.kind())?;
        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(failure) => Err(failure.into_error(op)),
            None => Ok(()),
        }
    }
}

/// Apply a merge patch to a typed object, honouring a resourceVersion precondition
/// and bumping generation when the spec changes.
fn apply_patch<K>(current: &K, patch: &serde_json::Value, next_version: String) -> Result<K, StoreError>
where
    K: Resource + Serialize + DeserializeOwned,
{
    if let Some(expected) = patch
        .pointer("/metadata/resourceVersion")
        .and_then(serde_json::Value::as_str)
    {
        if current.meta().resource_version.as_deref() != Some(expected) {
            return Err(StoreError::Conflict(format!(
                "resourceVersion {expected} is stale"
            )));
        }
    }

    let mut document = serde_json::to_value(current)?;
    let spec_before = document.get("spec").cloned();
    merge_patch(&mut document, patch);
    let spec_changed = document.get("spec").cloned() != spec_before;

    let mut patched: K = serde_json::from_value(document)?;
    let meta = patched.meta_mut();
    meta.resource_version = Some(next_version);
    if spec_changed {
        meta.generation = Some(meta.generation.unwrap_or(0) + 1);
    }
    Ok(patched)
}

#[async_trait::async_trait]
impl ClusterStoreTrait for MockClusterStore {
    fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    async fn get_agent_control_plane(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<AgentControlPlane>, StoreError> {
        self.enter(Operation::GetAgentControlPlane).await?;
        Ok(self.agent_control_plane(namespace, name))
    }

    async fn patch_agent_control_plane(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<AgentControlPlane, StoreError> {
        self.enter(Operation::PatchAgentControlPlane).await?;
        let key = NamespacedName::new(namespace, name);
        let version = self.next_version();
        let mut agent_control_planes = self.agent_control_planes.lock().unwrap();
        let current = agent_control_planes
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(format!("AgentControlPlane {key}")))?;
        let patched = apply_patch(current, patch, version)?;
        agent_control_planes.insert(key, patched.clone());
        Ok(patched)
    }

    async fn get_infra_env(&self, namespace: &str, name: &str) -> Result<Option<InfraEnv>, StoreError> {
        self.enter(Operation::GetInfraEnv).await?;
        Ok(self.infra_env(namespace, name))
    }

    async fn create_infra_env(&self, infra_env: &InfraEnv) -> Result<InfraEnv, StoreError> {
        self.enter(Operation::CreateInfraEnv).await?;

        let key = NamespacedName::of(infra_env);
        let mut created = infra_env.clone();
        self.persist_metadata(&mut created);

        let mut infra_envs = self.infra_envs.lock().unwrap();
        if infra_envs.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!("InfraEnv {key}")));
        }
        infra_envs.insert(key, created.clone());
        Ok(created)
    }
}
