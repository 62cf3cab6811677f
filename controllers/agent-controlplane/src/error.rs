//! Controller-specific error types.
//!
//! Every variant is treated as "retry" by the error policy; none of them is
//! written back to the AgentControlPlane status.

use cluster_store::StoreError;
use crds::SchemeError;
use thiserror::Error;

/// Errors that can occur in the Agent Control Plane Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Resource store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Owner reference could not be attached to a child resource
    #[error("Failed to set owner reference: {0}")]
    OwnerReference(#[from] SchemeError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
