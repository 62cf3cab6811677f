//! Resource store errors

use crds::SchemeError;
use thiserror::Error;

/// Errors that can occur when interacting with the resource store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist (only surfaced by writes; reads return `None`)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object with the same namespace/name already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic concurrency check failed (stale resourceVersion)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store temporarily unable to serve the request
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Kind is not registered in the scheme
    #[error("Scheme error: {0}")]
    Scheme(#[from] SchemeError),

    /// Any other Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Classify a kube error into a store error by HTTP status.
pub(crate) fn from_kube(err: kube::Error, what: &str) -> StoreError {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => StoreError::NotFound(what.to_string()),
        kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
            StoreError::AlreadyExists(what.to_string())
        }
        kube::Error::Api(ae) if ae.code == 409 => StoreError::Conflict(what.to_string()),
        kube::Error::Api(ae) if ae.code >= 500 => {
            StoreError::Unavailable(format!("{what}: {}", ae.message))
        }
        other => StoreError::Kube(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        let status = serde_json::json!({
            "status": "Failure",
            "message": format!("{reason} from the API server"),
            "reason": reason,
            "code": code,
        });
        kube::Error::Api(serde_json::from_value(status).unwrap())
    }

    #[test]
    fn test_not_found() {
        let err = from_kube(api_error(404, "NotFound"), "InfraEnv ns/cp");
        assert!(matches!(err, StoreError::NotFound(what) if what == "InfraEnv ns/cp"));
    }

    #[test]
    fn test_conflict_reasons_are_distinguished() {
        assert!(matches!(
            from_kube(api_error(409, "AlreadyExists"), "InfraEnv ns/cp"),
            StoreError::AlreadyExists(_)
        ));
        assert!(matches!(
            from_kube(api_error(409, "Conflict"), "AgentControlPlane ns/cp"),
            StoreError::Conflict(_)
        ));
    }

    #[test]
    fn test_server_errors_are_unavailable() {
        let err = from_kube(api_error(503, "ServiceUnavailable"), "InfraEnv ns/cp");
        assert!(matches!(err, StoreError::Unavailable(msg) if msg.contains("ServiceUnavailable")));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = from_kube(api_error(400, "BadRequest"), "InfraEnv ns/cp");
        assert!(matches!(err, StoreError::Kube(kube::Error::Api(_))));
    }
}
