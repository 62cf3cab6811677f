//! Cluster resource store
//!
//! The resource-store capability consumed by the agent control plane
//! reconciler: typed get/create/patch over the resources it converges, with
//! "not found" reported as `Ok(None)` and name collisions and stale writes
//! reported as distinct errors.
//!
//! # Example
//!
//! ```no_run
//! use cluster_store::{ClusterStoreTrait, KubeClusterStore};
//! use crds::Scheme;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let store = KubeClusterStore::new(client, Scheme::with_defaults());
//!
//! if let Some(infra_env) = store.get_infra_env("team-a", "cp-1").await? {
//!     println!("image: {:?}", infra_env.iso_download_url());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeClusterStore;
pub use error::StoreError;
pub use store_trait::ClusterStoreTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{Failure, MockClusterStore, Operation};
