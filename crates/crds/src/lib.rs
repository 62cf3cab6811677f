//! Agent Control Plane CRD Definitions
//!
//! Kubernetes resource types consumed and produced by the agent control
//! plane controller, the back-reference index that links an `InfraEnv` to
//! its `AgentControlPlane`, and the scheme registry handed to the store.

pub mod agent_control_plane;
pub mod back_reference;
pub mod cluster;
pub mod infra_env;
pub mod references;
pub mod scheme;

pub use agent_control_plane::*;
pub use back_reference::{NamespacedName, AGENT_CONTROL_PLANE_ANNOTATION};
pub use cluster::*;
pub use infra_env::*;
pub use references::*;
pub use scheme::{Scheme, SchemeError};
