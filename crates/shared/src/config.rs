//! Configuration types for ClinicDesk

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::catalog::{Capability, RequirementPolicy};

fn default_sign_in_path() -> String {
    "/login".to_string()
}

fn default_unauthorized_path() -> String {
    "/unauthorized".to_string()
}

fn default_landing_path() -> String {
    "/".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_audit_capacity() -> usize {
    1_000
}

fn default_in_menu() -> bool {
    true
}

/// Well-known locations the guard redirects to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutesConfig {
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,

    #[serde(default = "default_unauthorized_path")]
    pub unauthorized_path: String,

    /// Where a sign-in without a pending intent lands
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            sign_in_path: default_sign_in_path(),
            unauthorized_path: default_unauthorized_path(),
            landing_path: default_landing_path(),
        }
    }
}

/// Session behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Default deadline for sign-in and refresh calls
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl SessionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Audit trail behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    #[serde(default = "default_audit_capacity")]
    pub capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            capacity: default_audit_capacity(),
        }
    }
}

/// Capability requirement declared by a screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementConfig {
    pub policy: RequirementPolicy,
    pub capabilities: Vec<Capability>,
}

/// Screen declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenConfig {
    pub id: String,
    pub path: String,
    pub title: String,

    /// Public screens are reachable without a session
    #[serde(default)]
    pub public: bool,

    #[serde(default = "default_in_menu")]
    pub in_menu: bool,

    /// No requirement means any signed-in identity may enter
    #[serde(default)]
    pub requirement: Option<RequirementConfig>,
}

/// Top-level access configuration (access.json / access.yaml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    #[serde(default)]
    pub routes: RoutesConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub audit: AuditConfig,

    /// Replaces the built-in clinic screens when present
    #[serde(default)]
    pub screens: Option<Vec<ScreenConfig>>,
}

impl AccessConfig {
    /// Load configuration from a JSON or YAML file, chosen by extension
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        let config: Self = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the guard could never act on
    pub fn validate(&self) -> crate::Result<()> {
        for (name, path) in [
            ("signInPath", &self.routes.sign_in_path),
            ("unauthorizedPath", &self.routes.unauthorized_path),
            ("landingPath", &self.routes.landing_path),
        ] {
            if !path.starts_with('/') {
                return Err(crate::AccessError::Config(format!(
                    "routes.{} must be an absolute path, got '{}'",
                    name, path
                )));
            }
        }

        if self.session.request_timeout_ms == 0 {
            return Err(crate::AccessError::Config(
                "session.requestTimeoutMs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Logger interface for dependency injection
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str, meta: Option<&HashMap<String, String>>);
    fn info(&self, message: &str, meta: Option<&HashMap<String, String>>);
    fn warn(&self, message: &str, meta: Option<&HashMap<String, String>>);
    fn error(&self, message: &str, meta: Option<&HashMap<String, String>>);
}

/// Logger that forwards to the `tracing` macros
#[derive(Debug, Clone, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str, meta: Option<&HashMap<String, String>>) {
        match meta {
            Some(meta) => tracing::debug!(?meta, "{}", message),
            None => tracing::debug!("{}", message),
        }
    }

    fn info(&self, message: &str, meta: Option<&HashMap<String, String>>) {
        match meta {
            Some(meta) => tracing::info!(?meta, "{}", message),
            None => tracing::info!("{}", message),
        }
    }

    fn warn(&self, message: &str, meta: Option<&HashMap<String, String>>) {
        match meta {
            Some(meta) => tracing::warn!(?meta, "{}", message),
            None => tracing::warn!("{}", message),
        }
    }

    fn error(&self, message: &str, meta: Option<&HashMap<String, String>>) {
        match meta {
            Some(meta) => tracing::error!(?meta, "{}", message),
            None => tracing::error!("{}", message),
        }
    }
}

/// No-op logger for testing
#[derive(Debug, Clone, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _message: &str, _meta: Option<&HashMap<String, String>>) {}
    fn info(&self, _message: &str, _meta: Option<&HashMap<String, String>>) {}
    fn warn(&self, _message: &str, _meta: Option<&HashMap<String, String>>) {}
    fn error(&self, _message: &str, _meta: Option<&HashMap<String, String>>) {}
}
