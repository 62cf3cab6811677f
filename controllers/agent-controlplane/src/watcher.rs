//! Kubernetes resource watchers.
//!
//! Wires the watched kinds to the reconciler through `kube_runtime::Controller`:
//! - AgentControlPlane: primary kind, every change reconciles itself
//! - Cluster: mapped through its `controlPlaneRef`
//! - InfraEnv: mapped through its back-reference annotation
//!
//! The controller's scheduler deduplicates pending requests per
//! AgentControlPlane and never runs two reconciliations of the same object
//! at once; distinct objects reconcile concurrently up to the configured limit.

use crate::config::Config;
use crate::error::ControllerError;
use crate::mappers::{cluster_to_agent_control_plane, infra_env_to_agent_control_plane};
use crate::reconciler::Reconciler;
use crds::{AgentControlPlane, Cluster, InfraEnv, NamespacedName};
use futures::StreamExt;
use kube::Api;
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reconcile entry point called by the controller runtime.
///
/// The object handed in by the runtime is only used for its identity; the
/// reconciler re-reads current state from the store.
async fn reconcile(acp: Arc<AgentControlPlane>, reconciler: Arc<Reconciler>) -> Result<Action, ControllerError> {
    let key = NamespacedName::of(acp.as_ref());
    let outcome = reconciler.reconcile_agent_control_plane(&key).await?;
    debug!("Reconciled AgentControlPlane {}: {:?}", key, outcome);
    reconciler.reset_error(&key.to_string());
    Ok(Action::await_change())
}

/// Error policy: requeue with per-object Fibonacci backoff.
fn error_policy(acp: Arc<AgentControlPlane>, error: &ControllerError, reconciler: Arc<Reconciler>) -> Action {
    let key = NamespacedName::of(acp.as_ref()).to_string();
    reconciler.increment_error(&key);
    let (delay, error_count) = reconciler.get_backoff_for_resource(&key);
    warn!(
        "Reconciliation error for AgentControlPlane {} (attempt {}), requeueing in {:?}: {}",
        key, error_count, delay, error
    );
    Action::requeue(delay)
}

/// Watches Kubernetes resources for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    agent_control_plane_api: Api<AgentControlPlane>,
    cluster_api: Api<Cluster>,
    infra_env_api: Api<InfraEnv>,
    config: Config,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        reconciler: Arc<Reconciler>,
        agent_control_plane_api: Api<AgentControlPlane>,
        cluster_api: Api<Cluster>,
        infra_env_api: Api<InfraEnv>,
        config: Config,
    ) -> Self {
        Self {
            reconciler,
            agent_control_plane_api,
            cluster_api,
            infra_env_api,
            config,
        }
    }

    /// Runs the AgentControlPlane controller until shutdown.
    pub async fn watch_agent_control_planes(&self) -> Result<(), ControllerError> {
        info!("Starting AgentControlPlane watcher");

        let controller_config = ControllerConfig::default()
            .debounce(self.config.debounce)
            .concurrency(self.config.concurrency);

        Controller::new(self.agent_control_plane_api.clone(), watcher::Config::default())
            .watches(self.cluster_api.clone(), watcher::Config::default(), |cluster| {
                cluster_to_agent_control_plane(&cluster)
            })
            .watches(self.infra_env_api.clone(), watcher::Config::default(), |infra_env| {
                infra_env_to_agent_control_plane(&infra_env)
            })
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(reconcile, error_policy, self.reconciler.clone())
            .for_each(|res| async move {
                match res {
                    Ok((obj_ref, _)) => debug!("Reconcile completed for {}", obj_ref),
                    Err(e) => error!("Controller error for AgentControlPlane: {}", e),
                }
            })
            .await;

        info!("AgentControlPlane watcher stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use cluster_store::MockClusterStore;
    use std::time::Duration;

    #[test]
    fn test_error_policy_requeues_with_fibonacci_backoff() {
        let store = MockClusterStore::new();
        let reconciler = Arc::new(create_test_reconciler(&store));
        let acp = Arc::new(create_test_agent_control_plane("team-a", "cp-1"));
        let error = ControllerError::Watch("boom".to_string());

        let delays: Vec<Action> = (0..3)
            .map(|_| error_policy(acp.clone(), &error, reconciler.clone()))
            .collect();
        assert_eq!(
            delays,
            vec![
                Action::requeue(Duration::from_secs(5)),
                Action::requeue(Duration::from_secs(5)),
                Action::requeue(Duration::from_secs(10)),
            ]
        );

        // Backoff is tracked per AgentControlPlane
        let other = Arc::new(create_test_agent_control_plane("team-a", "cp-2"));
        assert_eq!(
            error_policy(other, &error, reconciler.clone()),
            Action::requeue(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_successful_reconcile_awaits_change_and_resets_backoff() {
        let store = MockClusterStore::new();
        let acp = Arc::new(store.add_agent_control_plane(create_test_agent_control_plane("team-a", "cp-1")));
        let reconciler = Arc::new(create_test_reconciler(&store));
        let error = ControllerError::Watch("boom".to_string());

        error_policy(acp.clone(), &error, reconciler.clone());
        error_policy(acp.clone(), &error, reconciler.clone());
        assert_eq!(
            error_policy(acp.clone(), &error, reconciler.clone()),
            Action::requeue(Duration::from_secs(10))
        );

        let action = reconcile(acp.clone(), reconciler.clone()).await.unwrap();
        assert_eq!(action, Action::await_change());
        assert_eq!(store.infra_env_count(), 1);

        assert_eq!(
            error_policy(acp, &error, reconciler),
            Action::requeue(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_failed_reconcile_returns_error() {
        let store = MockClusterStore::new();
        let acp = Arc::new(store.add_agent_control_plane(create_test_agent_control_plane("team-a", "cp-1")));
        let reconciler = Arc::new(create_test_reconciler(&store));
        store.fail_next(cluster_store::Operation::CreateInfraEnv, cluster_store::Failure::Unavailable);

        let result = reconcile(acp, reconciler).await;
        assert!(matches!(result, Err(ControllerError::Store(_))));
    }
}
