//! SeedFile - Load roles and accounts for the in-memory identity service

use serde::{Deserialize, Serialize};
use shared::{ClinicalProfile, Result, Role};
use std::path::Path;

use crate::in_memory::InMemoryIdentityService;

/// Built-in clinic directory used when no seed file is given
pub const DEMO_SEED: &str = r#"
roles:
  - id: admin
    name: Administrator
    description: Full back-office access
    capabilities:
      - owners:read
      - owners:manage
      - animals:read
      - animals:manage
      - services:read
      - services:manage
      - appointments:read
      - appointments:manage
      - products:read
      - products:manage
      - cashier:read
      - cashier:manage
      - users:read
      - users:manage
      - roles:manage
  - id: reception
    name: Reception
    capabilities:
      - owners:read
      - owners:manage
      - animals:read
      - appointments:read
      - appointments:manage
  - id: vet
    name: Veterinarian
    capabilities:
      - owners:read
      - animals:read
      - animals:manage
      - services:read
      - appointments:read
  - id: cashier
    name: Cashier
    capabilities:
      - products:read
      - cashier:read
      - cashier:manage
  - id: intern
    name: Intern (retired)
    isActive: false
    capabilities:
      - animals:read
accounts:
  - username: admin
    password: admin
    displayName: Clinic Administrator
    role: admin
  - username: ana
    password: ana
    displayName: Ana Torres
    role: reception
  - username: ruiz
    password: ruiz
    displayName: Dr. Marta Ruiz
    role: vet
    profile:
      specialty: Small animal surgery
      licenseId: MV-20931
      shifts: [mon-am, tue-am, thu-pm]
  - username: leo
    password: leo
    displayName: Leo Campos
    role: cashier
"#;

/// An account to create at seed time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAccount {
    pub username: String,
    pub password: String,
    pub display_name: String,
    /// Role id; must name an active role
    pub role: String,
    #[serde(default)]
    pub profile: Option<ClinicalProfile>,
}

/// Seed document: `roles:` and `accounts:`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFile {
    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
}

impl SeedFile {
    /// Load a seed from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// The built-in clinic directory
    pub fn demo() -> Result<Self> {
        Self::from_yaml_str(DEMO_SEED)
    }

    /// Build an identity service populated with this seed
    pub fn into_service(self) -> Result<InMemoryIdentityService> {
        let service = InMemoryIdentityService::new();

        for role in self.roles {
            service.register_role(role)?;
        }

        for account in self.accounts {
            let id = service.add_account(
                &account.username,
                &account.password,
                &account.display_name,
                &account.role,
            )?;
            if let Some(profile) = account.profile {
                service.set_profile(&id, profile)?;
            }
        }

        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::IdentityService;
    use shared::{AccessError, Capability, Credentials, ListRolesOptions};
    use std::io::Write;

    #[test]
    fn test_demo_seed_parses() {
        let seed = SeedFile::demo().unwrap();

        assert_eq!(seed.roles.len(), 5);
        assert_eq!(seed.accounts.len(), 4);

        let admin = seed.roles.iter().find(|r| r.id == "admin").unwrap();
        assert_eq!(admin.capabilities.len(), Capability::ALL.len());

        let intern = seed.roles.iter().find(|r| r.id == "intern").unwrap();
        assert!(!intern.is_active);
    }

    #[tokio::test]
    async fn test_demo_seed_builds_service() {
        let service = SeedFile::demo().unwrap().into_service().unwrap();

        let roles = service.list_roles(&ListRolesOptions::default()).unwrap();
        assert_eq!(roles.len(), 4);

        let ruiz = service
            .sign_in(&Credentials::new("ruiz", "ruiz"))
            .await
            .unwrap();
        assert_eq!(ruiz.role.id, "vet");
        assert_eq!(
            ruiz.profile.unwrap().license_id.as_deref(),
            Some("MV-20931")
        );
    }

    #[test]
    fn test_seed_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "roles:\n  - id: desk\n    name: Desk\n    capabilities: [\"owners:read\"]\naccounts:\n  - username: bo\n    password: pw\n    displayName: Bo\n    role: desk\n"
        )
        .unwrap();

        let seed = SeedFile::from_file(file.path()).unwrap();
        assert_eq!(seed.roles[0].id, "desk");
        assert_eq!(seed.accounts[0].username, "bo");
    }

    #[test]
    fn test_seed_account_on_unknown_role_fails() {
        let seed = SeedFile::from_yaml_str(
            "accounts:\n  - username: bo\n    password: pw\n    displayName: Bo\n    role: ghost\n",
        )
        .unwrap();

        let err = seed.into_service().unwrap_err();
        assert!(matches!(err, AccessError::RoleNotFound(_)));
    }

    #[test]
    fn test_seed_rejects_unknown_capability() {
        let result = SeedFile::from_yaml_str(
            "roles:\n  - id: x\n    name: X\n    capabilities: [\"pharmacy:read\"]\n",
        );
        assert!(matches!(result, Err(AccessError::Yaml(_))));
    }
}
