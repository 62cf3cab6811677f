//! Reconciliation logic for AgentControlPlane CRDs.
//!
//! Each AgentControlPlane gets exactly one InfraEnv with the same
//! namespace/name. The reconciler creates it when absent, waits for the
//! installer to publish the discovery image URL, then records that URL on
//! the control plane's machine template.
//!
//! Every invocation recomputes the decision from the store; nothing about
//! earlier attempts is remembered except the requeue backoff.

use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use cluster_store::ClusterStoreTrait;
use crds::{
    AgentControlPlane, InfraEnv, InfraEnvSpec, LocalObjectReference, NamespacedName,
    AGENT_CONTROL_PLANE_ANNOTATION, ISO_DOWNLOAD_URL_ANNOTATION,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of a successful reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The AgentControlPlane no longer exists
    NotFound,
    /// The AgentControlPlane is being deleted; garbage collection owns the InfraEnv
    Deleting,
    /// A new InfraEnv was created; its own events re-trigger reconciliation
    InfraEnvCreated,
    /// The InfraEnv exists but has no image URL yet
    AwaitingImage,
    /// The image URL was written to the machine template
    ImageUrlPropagated,
    /// Nothing to do
    Converged,
}

/// Backoff state for a resource
#[derive(Debug, Clone, Default)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

/// Reconciles AgentControlPlane resources.
pub struct Reconciler {
    store: Box<dyn ClusterStoreTrait + Send + Sync>,
    pull_secret_name: String,
    /// Error count tracking per resource (namespace/name -> BackoffState)
    backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("pull_secret_name", &self.pull_secret_name)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(store: Box<dyn ClusterStoreTrait + Send + Sync>, pull_secret_name: String) -> Self {
        Self {
            store,
            pull_secret_name,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reconciles one AgentControlPlane, identified by namespace/name.
    ///
    /// This method:
    /// 1. Fetches the AgentControlPlane (gone means done)
    /// 2. Fetches the InfraEnv with the same namespace/name
    /// 3. Creates the InfraEnv if absent, owned by and annotated with the control plane
    /// 4. Otherwise propagates the InfraEnv image URL, once published, to the machine template
    ///
    /// Store failures are returned so the scheduler requeues the key.
    pub async fn reconcile_agent_control_plane(
        &self,
        key: &NamespacedName,
    ) -> Result<ReconcileOutcome, ControllerError> {
        let acp = match self
            .store
            .get_agent_control_plane(&key.namespace, &key.name)
            .await
        {
            Ok(Some(acp)) => acp,
            Ok(None) => {
                debug!("AgentControlPlane {} not found, nothing to reconcile", key);
                return Ok(ReconcileOutcome::NotFound);
            }
            Err(e) => {
                warn!("Failed to get AgentControlPlane {}: {}", key, e);
                return Err(e.into());
            }
        };

        info!(
            agent_control_plane = %key.name,
            agent_control_plane_namespace = %key.namespace,
            generation = acp.metadata.generation.unwrap_or_default(),
            "Reconciling AgentControlPlane"
        );

        if acp.metadata.deletion_timestamp.is_some() {
            debug!("AgentControlPlane {} is being deleted, leaving InfraEnv to garbage collection", key);
            return Ok(ReconcileOutcome::Deleting);
        }

        self.reconcile_infra_env(key, &acp).await
    }

    async fn reconcile_infra_env(
        &self,
        key: &NamespacedName,
        acp: &AgentControlPlane,
    ) -> Result<ReconcileOutcome, ControllerError> {
        let Some(infra_env) = self.store.get_infra_env(&key.namespace, &key.name).await? else {
            let infra_env = self.build_infra_env(key, acp)?;
            self.store.create_infra_env(&infra_env).await.map_err(|e| {
                warn!("Failed to create InfraEnv {}: {}", key, e);
                e
            })?;
            info!(infra_env_name = %key.name, "Created InfraEnv for AgentControlPlane {}", key);
            return Ok(ReconcileOutcome::InfraEnvCreated);
        };

        let Some(url) = infra_env.iso_download_url() else {
            info!(
                infra_env_name = %key.name,
                "InfraEnv corresponding to the AgentControlPlane has no image URL available"
            );
            return Ok(ReconcileOutcome::AwaitingImage);
        };

        self.propagate_image_url(key, acp, url).await
    }

    /// Builds the InfraEnv for an AgentControlPlane.
    ///
    /// Fails without side effects if the owner reference cannot be built, so
    /// an unowned InfraEnv is never created.
    fn build_infra_env(
        &self,
        key: &NamespacedName,
        acp: &AgentControlPlane,
    ) -> Result<InfraEnv, ControllerError> {
        let owner_reference = self.store.scheme().owner_reference(acp).map_err(|e| {
            error!("Error setting owner reference on InfraEnv {}: {}", key, e);
            ControllerError::OwnerReference(e)
        })?;

        let mut infra_env = InfraEnv::new(
            &key.name,
            InfraEnvSpec {
                pull_secret_ref: Some(LocalObjectReference::new(self.pull_secret_name.clone())),
                ..Default::default()
            },
        );
        infra_env.metadata.namespace = Some(key.namespace.clone());
        infra_env.metadata.annotations = Some(BTreeMap::from([(
            AGENT_CONTROL_PLANE_ANNOTATION.to_string(),
            key.encode(),
        )]));
        infra_env.metadata.owner_references = Some(vec![owner_reference]);
        Ok(infra_env)
    }

    async fn propagate_image_url(
        &self,
        key: &NamespacedName,
        acp: &AgentControlPlane,
        url: &str,
    ) -> Result<ReconcileOutcome, ControllerError> {
        if acp.spec.machine_template.iso_download_url() == Some(url) {
            debug!("AgentControlPlane {} machine template already has image URL {}", key, url);
            return Ok(ReconcileOutcome::Converged);
        }

        let mut annotations = serde_json::Map::new();
        annotations.insert(
            ISO_DOWNLOAD_URL_ANNOTATION.to_string(),
            serde_json::Value::String(url.to_string()),
        );
        // resourceVersion makes the merge patch fail on a stale read instead of overwriting
        let patch = serde_json::json!({
            "metadata": {
                "resourceVersion": acp.metadata.resource_version,
            },
            "spec": {
                "machineTemplate": {
                    "metadata": {
                        "annotations": annotations,
                    },
                },
            },
        });

        self.store
            .patch_agent_control_plane(&key.namespace, &key.name, &patch)
            .await
            .map_err(|e| {
                warn!("Failed to set image URL on AgentControlPlane {}: {}", key, e);
                e
            })?;

        info!("Set image URL {} on AgentControlPlane {} machine template", url, key);
        Ok(ReconcileOutcome::ImageUrlPropagated)
    }

    /// Next requeue delay for a resource, and its consecutive error count
    pub fn get_backoff_for_resource(&self, resource_key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states.entry(resource_key.to_string()).or_default();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (FibonacciBackoff::default().next_backoff(), 0)
            }
        }
    }

    /// Record a failed reconciliation for a resource
    pub fn increment_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.entry(resource_key.to_string()).or_default().error_count += 1;
        }
    }

    /// Forget the failure history of a resource after a successful reconciliation
    pub fn reset_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }
}
