//! Main controller implementation.
//!
//! This module contains the `Controller` struct that builds the store,
//! reconciler and watcher, and runs the watcher until shutdown.

use crate::config::Config;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use cluster_store::KubeClusterStore;
use crds::{AgentControlPlane, Cluster, InfraEnv, Scheme};
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for AgentControlPlane management.
pub struct Controller {
    agent_control_plane_watcher: JoinHandle<Result<(), ControllerError>>,
}

fn api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

impl Controller {
    /// Creates a new controller instance and starts its watcher.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing Agent Control Plane Controller");

        let kube_client = Client::try_default().await?;

        let store = KubeClusterStore::new(kube_client.clone(), Scheme::with_defaults());
        let reconciler = Arc::new(Reconciler::new(
            Box::new(store),
            config.pull_secret_name.clone(),
        ));

        let namespace = config.watch_namespace.as_deref();
        let watcher = Watcher::new(
            reconciler,
            api::<AgentControlPlane>(&kube_client, namespace),
            api::<Cluster>(&kube_client, namespace),
            api::<InfraEnv>(&kube_client, namespace),
            config,
        );

        let agent_control_plane_watcher =
            tokio::spawn(async move { watcher.watch_agent_control_planes().await });

        Ok(Self {
            agent_control_plane_watcher,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("Agent Control Plane Controller running");

        self.agent_control_plane_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("AgentControlPlane watcher panicked: {}", e)))?
    }
}
