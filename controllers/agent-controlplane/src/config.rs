//! Controller configuration.
//!
//! Read once at startup from environment variables:
//! - `WATCH_NAMESPACE`: namespace to watch (all namespaces when unset)
//! - `PULL_SECRET_NAME`: pull secret referenced by created InfraEnvs
//! - `RECONCILE_CONCURRENCY`: max concurrent reconciliations
//! - `RECONCILE_DEBOUNCE_SECS`: quiet period before a triggered reconcile runs

use crate::error::ControllerError;
use std::env;
use std::time::Duration;

/// Default pull secret name for created InfraEnvs
pub const DEFAULT_PULL_SECRET_NAME: &str = "pull-secret";
/// Default reconcile concurrency
pub const DEFAULT_CONCURRENCY: u16 = 3;
/// Default debounce in seconds
pub const DEFAULT_DEBOUNCE_SECS: u64 = 5;

/// Runtime configuration for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Namespace to watch, `None` for all namespaces
    pub watch_namespace: Option<String>,
    /// Name of the pull secret set on created InfraEnvs
    pub pull_secret_name: String,
    /// Max concurrent reconciliations (distinct AgentControlPlanes)
    pub concurrency: u16,
    /// Debounce applied to reconcile triggers
    pub debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            pull_secret_name: DEFAULT_PULL_SECRET_NAME.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            debounce: Duration::from_secs(DEFAULT_DEBOUNCE_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let concurrency = match non_empty("RECONCILE_CONCURRENCY") {
            Some(value) => value.trim().parse::<u16>().map_err(|e| {
                ControllerError::InvalidConfig(format!("RECONCILE_CONCURRENCY={value}: {e}"))
            })?,
            None => DEFAULT_CONCURRENCY,
        };
        if concurrency == 0 {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let debounce_secs = match non_empty("RECONCILE_DEBOUNCE_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|e| {
                ControllerError::InvalidConfig(format!("RECONCILE_DEBOUNCE_SECS={value}: {e}"))
            })?,
            None => DEFAULT_DEBOUNCE_SECS,
        };

        Ok(Self {
            watch_namespace: non_empty("WATCH_NAMESPACE"),
            pull_secret_name: non_empty("PULL_SECRET_NAME")
                .unwrap_or_else(|| DEFAULT_PULL_SECRET_NAME.to_string()),
            concurrency,
            debounce: Duration::from_secs(debounce_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_reads_all_values() {
        let config = Config::from_lookup(lookup(&[
            ("WATCH_NAMESPACE", "clusters"),
            ("PULL_SECRET_NAME", "assisted-pull-secret"),
            ("RECONCILE_CONCURRENCY", "8"),
            ("RECONCILE_DEBOUNCE_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.watch_namespace.as_deref(), Some("clusters"));
        assert_eq!(config.pull_secret_name, "assisted-pull-secret");
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.debounce, Duration::ZERO);
    }

    #[test]
    fn test_empty_namespace_means_all() {
        let config = Config::from_lookup(lookup(&[("WATCH_NAMESPACE", "")])).unwrap();
        assert_eq!(config.watch_namespace, None);
    }

    #[test]
    fn test_invalid_concurrency() {
        let err = Config::from_lookup(lookup(&[("RECONCILE_CONCURRENCY", "lots")])).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));

        let err = Config::from_lookup(lookup(&[("RECONCILE_CONCURRENCY", "0")])).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));
    }
}
