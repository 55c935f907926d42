//! Error types for ClinicDesk

use std::time::Duration;
use thiserror::Error;

/// Error thrown when a tag is not part of the capability catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown capability '{tag}'")]
pub struct UnknownCapabilityError {
    pub tag: String,
}

/// Error thrown when the identity service rejects the supplied credentials
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Authentication failed for '{username}': {reason}")]
pub struct AuthenticationError {
    pub username: String,
    pub reason: String,
}

impl AuthenticationError {
    pub fn invalid_credentials(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            reason: "invalid username or password".to_string(),
        }
    }
}

/// Transient failure talking to the identity service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Network error during {operation}: {message}")]
pub struct NetworkError {
    pub operation: String,
    pub message: String,
}

impl NetworkError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// The call did not complete within the caller's deadline
    pub fn timed_out(operation: impl Into<String>, after: Duration) -> Self {
        Self::new(operation, format!("timed out after {}ms", after.as_millis()))
    }
}

/// Error thrown when role is not found
#[derive(Debug, Clone, Error)]
#[error("Role '{role_id}' not found. Available roles: {}", available_roles.join(", "))]
pub struct RoleNotFoundError {
    pub role_id: String,
    pub available_roles: Vec<String>,
}

/// Error thrown when an inactive role is offered for a new assignment
#[derive(Debug, Clone, Error)]
#[error("Role '{role_id}' is inactive and cannot be assigned")]
pub struct RoleInactiveError {
    pub role_id: String,
}

/// General ClinicDesk access error type
#[derive(Debug, Error)]
pub enum AccessError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    RoleNotFound(#[from] RoleNotFoundError),

    #[error(transparent)]
    RoleInactive(#[from] RoleInactiveError),

    #[error(transparent)]
    UnknownCapability(#[from] UnknownCapabilityError),

    #[error("Identity '{0}' not found")]
    IdentityNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

impl AccessError {
    /// Transient failures that the caller may retry ("try again" state)
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccessError::Network(_))
    }

    /// Bad credentials, shown inline on the sign-in form
    pub fn is_authentication(&self) -> bool {
        matches!(self, AccessError::Authentication(_))
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_is_retryable() {
        let err: AccessError = NetworkError::new("sign_in", "connection reset").into();
        assert!(err.is_retryable());
        assert!(!err.is_authentication());
    }

    #[test]
    fn test_authentication_error_is_not_retryable() {
        let err: AccessError = AuthenticationError::invalid_credentials("ana").into();
        assert!(!err.is_retryable());
        assert!(err.is_authentication());
        assert!(err.to_string().contains("ana"));
    }

    #[test]
    fn test_timed_out_message() {
        let err = NetworkError::timed_out("refresh_identity", Duration::from_millis(250));
        assert_eq!(err.operation, "refresh_identity");
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn test_role_not_found_lists_available() {
        let err = RoleNotFoundError {
            role_id: "vet".to_string(),
            available_roles: vec!["admin".to_string(), "reception".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Role 'vet' not found. Available roles: admin, reception"
        );
    }
}
