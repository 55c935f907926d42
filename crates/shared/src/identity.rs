//! Identity and credential types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{Capability, CapabilitySet};
use crate::role::Role;

/// Opaque account reference issued by the identity service
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Clinical staff details. Carried along with the identity, never read by the access core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalProfile {
    pub specialty: Option<String>,
    pub license_id: Option<String>,
    #[serde(default)]
    pub shifts: Vec<String>,
    pub bio: Option<String>,
}

/// A signed-in account and its current role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: IdentityId,
    pub display_name: String,
    pub role: Role,
    #[serde(default)]
    pub profile: Option<ClinicalProfile>,
}

impl Identity {
    pub fn new(id: IdentityId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
            profile: None,
        }
    }

    /// Builder: attach a clinical profile
    pub fn with_profile(mut self, profile: ClinicalProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Granted capabilities, always those of the current role
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.role.capabilities
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.role.grants(capability)
    }
}

/// Sign-in credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
