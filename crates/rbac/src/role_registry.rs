//! RoleRegistry - Role definitions and assignment rules

use shared::{
    AccessError, Capability, CapabilitySet, ListRolesOptions, Role, RoleInactiveError,
    RoleNotFoundError, RoleSummary,
};
use std::collections::HashMap;

/// RoleRegistry holds the role definitions known to the identity service
#[derive(Debug, Default)]
pub struct RoleRegistry {
    /// All registered roles
    roles: HashMap<String, Role>,
}

impl RoleRegistry {
    /// Create a new RoleRegistry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a role
    pub fn register_role(&mut self, role: Role) {
        self.roles.insert(role.id.clone(), role);
    }

    /// Get a role by ID
    pub fn get_role(&self, id: &str) -> Option<&Role> {
        self.roles.get(id)
    }

    /// Check if role exists
    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.contains_key(role_id)
    }

    /// Get all role IDs, sorted
    pub fn get_role_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.roles.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Get a role or a `RoleNotFoundError` listing what exists
    pub fn require_role(&self, role_id: &str) -> Result<&Role, RoleNotFoundError> {
        self.roles.get(role_id).ok_or_else(|| RoleNotFoundError {
            role_id: role_id.to_string(),
            available_roles: self.get_role_ids().iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Roles that may be offered for a new assignment (active only), sorted by id
    pub fn assignable_roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.roles.values().filter(|r| r.is_active).collect();
        roles.sort_by(|a, b| a.id.cmp(&b.id));
        roles
    }

    /// Resolve a role for a new assignment. Inactive roles are refused;
    /// identities already holding one keep it.
    pub fn role_for_assignment(&self, role_id: &str) -> Result<&Role, AccessError> {
        let role = self.require_role(role_id)?;
        if !role.is_active {
            return Err(RoleInactiveError {
                role_id: role_id.to_string(),
            }
            .into());
        }
        Ok(role)
    }

    /// Replace a role's grant set
    pub fn set_capabilities(
        &mut self,
        role_id: &str,
        capabilities: CapabilitySet,
    ) -> Result<&Role, RoleNotFoundError> {
        if let Some(role) = self.roles.get_mut(role_id) {
            role.capabilities = capabilities;
        }
        self.require_role(role_id)
    }

    /// Activate or deactivate a role
    pub fn set_active(&mut self, role_id: &str, active: bool) -> Result<&Role, RoleNotFoundError> {
        if let Some(role) = self.roles.get_mut(role_id) {
            role.is_active = active;
        }
        self.require_role(role_id)
    }

    /// Role IDs granting a capability, sorted
    pub fn roles_granting(&self, capability: Capability) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .roles
            .values()
            .filter(|r| r.grants(capability))
            .map(|r| r.id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// List roles as summaries, sorted by id
    pub fn list_roles(&self, options: &ListRolesOptions) -> Vec<RoleSummary> {
        let mut summaries: Vec<RoleSummary> = self
            .roles
            .values()
            .filter(|r| options.include_inactive || r.is_active)
            .map(Role::summary)
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}
