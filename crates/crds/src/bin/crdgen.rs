//! Prints the AgentControlPlane CRD as YAML.
//!
//! `InfraEnv` and `Cluster` are installed by their own projects and are not
//! generated here.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/agentcontrolplanes.yaml`

use anyhow::Result;
use crds::AgentControlPlane;
use kube::CustomResourceExt;

fn main() -> Result<()> {
    let crd = AgentControlPlane::crd();
    print!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}
