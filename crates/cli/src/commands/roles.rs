//! clinic roles command

use clap::Args;
use console::style;
use rbac::RoleRegistry;
use shared::{Capability, ListRolesOptions, RoleSummary};
use std::path::PathBuf;

use super::load_seed;

#[derive(Debug, Args)]
pub struct RolesCommand {
    /// Seed file with roles and accounts (YAML); built-in demo when omitted
    #[arg(short, long)]
    pub seed: Option<PathBuf>,

    /// Include inactive roles
    #[arg(short, long)]
    pub all: bool,

    /// Only roles granting this capability (e.g. owners:read)
    #[arg(short, long)]
    pub grants: Option<Capability>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RolesCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let roles = self.summaries()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&roles)?);
            return Ok(());
        }

        println!("{}", style("Roles").bold());
        for summary in &roles {
            let status = if summary.is_active { "" } else { " (inactive)" };
            println!(
                "  {:<12} {:<24} {} capabilities{}",
                summary.id,
                summary.name,
                summary.capability_count,
                style(status).yellow()
            );
        }
        Ok(())
    }

    fn summaries(&self) -> anyhow::Result<Vec<RoleSummary>> {
        let registry = self.registry()?;
        let mut roles = registry.list_roles(&ListRolesOptions {
            include_inactive: self.all,
        });
        if let Some(capability) = self.grants {
            let granting = registry.roles_granting(capability);
            roles.retain(|summary| granting.contains(&summary.id.as_str()));
        }
        Ok(roles)
    }

    fn registry(&self) -> anyhow::Result<RoleRegistry> {
        let seed = load_seed(self.seed.as_deref())?;
        let mut registry = RoleRegistry::new();
        for role in seed.roles {
            registry.register_role(role);
        }
        Ok(registry)
    }
}
