//! Role types

use serde::{Deserialize, Serialize};

use crate::catalog::{Capability, CapabilitySet};

fn default_active() -> bool {
    true
}

/// A named bundle of capabilities assigned to identities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Unique role identifier (e.g. 'admin', 'reception', 'vet')
    pub id: String,

    /// Human-readable role name
    pub name: String,

    /// Role description
    #[serde(default)]
    pub description: String,

    /// Inactive roles keep existing assignments but are not offered for new ones
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Granted capabilities
    #[serde(default)]
    pub capabilities: CapabilitySet,
}

impl Role {
    /// Create a new active role with no capabilities
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            is_active: true,
            capabilities: CapabilitySet::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set the granted capabilities
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Builder: mark the role inactive
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Check if this role grants a capability
    pub fn grants(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn summary(&self) -> RoleSummary {
        RoleSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            capability_count: self.capabilities.len(),
            is_active: self.is_active,
        }
    }
}

/// Options for listing roles
#[derive(Debug, Clone, Default)]
pub struct ListRolesOptions {
    /// Include inactive roles
    pub include_inactive: bool,
}

/// Summary info for a role in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    pub capability_count: usize,
    pub is_active: bool,
}
