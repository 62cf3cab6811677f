//! Agent Control Plane Controller
//!
//! Drives Cluster API control planes provisioned through the assisted
//! installer toward their declared state.
//!
//! This controller reconciles `AgentControlPlane` CRDs: it ensures each one
//! has an owned `InfraEnv`, and once the installer publishes the discovery
//! image URL on that `InfraEnv`, records it on the control plane's machine
//! template. `Cluster` and `InfraEnv` events are mapped back to the owning
//! `AgentControlPlane`.

mod backoff;
mod config;
mod controller;
mod error;
mod mappers;
mod reconciler;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::Config;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube uses rustls; pick the ring provider explicitly
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider already installed");
    }

    info!("Starting Agent Control Plane Controller");

    let config = Config::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Pull secret: {}", config.pull_secret_name);
    info!("  Concurrency: {}", config.concurrency);
    info!("  Debounce: {:?}", config.debounce);

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
