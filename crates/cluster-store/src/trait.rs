//! ClusterStore trait for mocking
//!
//! Abstracts the Kubernetes API calls the reconciler makes, so the
//! convergence logic can be unit tested against an in-memory store.
//! Reads treat "not found" as a normal outcome and return `Ok(None)`.

use crate::error::StoreError;
use crds::{AgentControlPlane, InfraEnv, Scheme};

/// Resource store operations used by the reconciler
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterStoreTrait: Send + Sync {
    /// Kinds known to this store
    fn scheme(&self) -> &Scheme;

    /// Fetch an AgentControlPlane, `None` if it does not exist
    async fn get_agent_control_plane(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<AgentControlPlane>, StoreError>;

    /// Merge-patch an AgentControlPlane.
    ///
    /// A `metadata.resourceVersion` in the patch acts as a precondition;
    /// a mismatch fails with `StoreError::Conflict`.
    async fn patch_agent_control_plane(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<AgentControlPlane, StoreError>;

    /// Fetch an InfraEnv, `None` if it does not exist
    async fn get_infra_env(&self, namespace: &str, name: &str) -> Result<Option<InfraEnv>, StoreError>;

    /// Create an InfraEnv; fails with `StoreError::AlreadyExists` on a name collision
    async fn create_infra_env(&self, infra_env: &InfraEnv) -> Result<InfraEnv, StoreError>;
}
