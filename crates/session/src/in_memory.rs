//! In-memory identity service
//!
//! Accounts, roles and the persisted sign-in token live in process memory.
//! Useful for testing, demos and the CLI. Offline mode and artificial
//! latency simulate transport faults.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use rbac::RoleRegistry;
use shared::{
    AccessError, AuthenticationError, CapabilitySet, ClinicalProfile, Credentials, Identity,
    IdentityId, ListRolesOptions, NetworkError, Result, Role, RoleSummary,
};

use crate::service::IdentityService;

#[derive(Debug)]
struct Account {
    password: String,
    identity_id: IdentityId,
}

#[derive(Debug)]
struct IdentityRecord {
    display_name: String,
    role_id: String,
    profile: Option<ClinicalProfile>,
}

#[derive(Debug, Default)]
struct Directory {
    roles: RoleRegistry,
    accounts: HashMap<String, Account>,
    identities: HashMap<IdentityId, IdentityRecord>,
    /// Token of the established session, if any
    active_token: Option<(String, IdentityId)>,
}

impl Directory {
    fn materialize(&self, id: &IdentityId) -> Result<Identity> {
        let record = self
            .identities
            .get(id)
            .ok_or_else(|| AccessError::IdentityNotFound(id.to_string()))?;
        let role = self.roles.require_role(&record.role_id)?;

        let identity = Identity::new(id.clone(), record.display_name.clone(), role.clone());
        Ok(match &record.profile {
            Some(profile) => identity.with_profile(profile.clone()),
            None => identity,
        })
    }
}

/// Thread-safe in-memory identity service
#[derive(Debug, Default)]
pub struct InMemoryIdentityService {
    directory: RwLock<Directory>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
}

impl InMemoryIdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Directory>> {
        self.directory
            .read()
            .map_err(|_| AccessError::Other("Failed to acquire read lock".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Directory>> {
        self.directory
            .write()
            .map_err(|_| AccessError::Other("Failed to acquire write lock".to_string()))
    }

    /// Apply configured latency, then fail if offline
    async fn transport(&self, operation: &str) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::new(operation, "identity service unreachable").into());
        }
        Ok(())
    }

    // ============== Fault injection ==============

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    // ============== Administration ==============

    /// Register (or replace) a role
    pub fn register_role(&self, role: Role) -> Result<()> {
        self.write()?.roles.register_role(role);
        Ok(())
    }

    /// Create an account assigned to an active role
    pub fn add_account(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
        role_id: &str,
    ) -> Result<IdentityId> {
        let mut directory = self.write()?;
        directory.roles.role_for_assignment(role_id)?;

        if directory.accounts.contains_key(username) {
            return Err(AccessError::Config(format!(
                "Account '{}' already exists",
                username
            )));
        }

        let identity_id = IdentityId::new(uuid::Uuid::new_v4().to_string());
        directory.identities.insert(
            identity_id.clone(),
            IdentityRecord {
                display_name: display_name.to_string(),
                role_id: role_id.to_string(),
                profile: None,
            },
        );
        directory.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                identity_id: identity_id.clone(),
            },
        );
        Ok(identity_id)
    }

    pub fn set_profile(&self, id: &IdentityId, profile: ClinicalProfile) -> Result<()> {
        let mut directory = self.write()?;
        let record = directory
            .identities
            .get_mut(id)
            .ok_or_else(|| AccessError::IdentityNotFound(id.to_string()))?;
        record.profile = Some(profile);
        Ok(())
    }

    /// Move an identity to another (active) role
    pub fn assign_role(&self, id: &IdentityId, role_id: &str) -> Result<()> {
        let mut directory = self.write()?;
        directory.roles.role_for_assignment(role_id)?;
        let record = directory
            .identities
            .get_mut(id)
            .ok_or_else(|| AccessError::IdentityNotFound(id.to_string()))?;
        record.role_id = role_id.to_string();
        Ok(())
    }

    /// Replace a role's grant set; holders see it on their next refresh
    pub fn set_role_capabilities(&self, role_id: &str, capabilities: CapabilitySet) -> Result<()> {
        self.write()?.roles.set_capabilities(role_id, capabilities)?;
        Ok(())
    }

    pub fn set_role_active(&self, role_id: &str, active: bool) -> Result<()> {
        self.write()?.roles.set_active(role_id, active)?;
        Ok(())
    }

    pub fn role(&self, role_id: &str) -> Result<Role> {
        Ok(self.read()?.roles.require_role(role_id)?.clone())
    }

    /// Active roles, sorted by id
    pub fn assignable_roles(&self) -> Result<Vec<Role>> {
        Ok(self
            .read()?
            .roles
            .assignable_roles()
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn list_roles(&self, options: &ListRolesOptions) -> Result<Vec<RoleSummary>> {
        Ok(self.read()?.roles.list_roles(options))
    }

    pub fn identity_id_for(&self, username: &str) -> Option<IdentityId> {
        self.read()
            .ok()
            .and_then(|d| d.accounts.get(username).map(|a| a.identity_id.clone()))
    }

    /// The persisted token of the established session, if any
    pub fn active_token(&self) -> Option<String> {
        self.read()
            .ok()
            .and_then(|d| d.active_token.as_ref().map(|(token, _)| token.clone()))
    }
}

#[async_trait]
impl IdentityService for InMemoryIdentityService {
    async fn current_identity(&self) -> Result<Option<Identity>> {
        self.transport("current_identity").await?;
        let directory = self.read()?;

        match &directory.active_token {
            Some((_, id)) => Ok(Some(directory.materialize(id)?)),
            None => Ok(None),
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity> {
        self.transport("sign_in").await?;
        let mut directory = self.write()?;

        let identity_id = match directory.accounts.get(&credentials.username) {
            Some(account) if account.password == credentials.password => {
                account.identity_id.clone()
            }
            _ => {
                return Err(AuthenticationError::invalid_credentials(&credentials.username).into())
            }
        };

        let identity = directory.materialize(&identity_id)?;
        let token = uuid::Uuid::new_v4().to_string();
        directory.active_token = Some((token, identity_id));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.transport("sign_out").await?;
        self.write()?.active_token = None;
        Ok(())
    }

    async fn identity(&self, id: &IdentityId) -> Result<Identity> {
        self.transport("identity").await?;
        self.read()?.materialize(id)
    }
}
