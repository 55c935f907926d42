//! clinic check command

use clap::Args;
use console::style;
use navigation::{menu, Decision, GuardChain, ScreenRegistry};
use rbac::RoleRegistry;
use session::SessionSnapshot;
use shared::{Identity, IdentityId};
use std::path::PathBuf;

use super::{load_config, load_seed};

#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Role to check
    #[arg(short, long)]
    pub role: String,

    /// Seed file with roles and accounts (YAML); built-in demo when omitted
    #[arg(short, long)]
    pub seed: Option<PathBuf>,

    /// Access configuration (JSON or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Per-screen decisions and the resulting menu for one role
#[derive(Debug)]
pub struct CheckReport {
    pub role: String,
    pub warnings: Vec<String>,
    pub decisions: Vec<(String, String, Decision)>,
    pub menu: Vec<String>,
}

impl CheckReport {
    pub fn to_json(&self) -> serde_json::Value {
        let screens: Vec<_> = self
            .decisions
            .iter()
            .map(|(id, path, decision)| {
                serde_json::json!({
                    "id": id,
                    "path": path,
                    "decision": decision.to_string(),
                })
            })
            .collect();
        serde_json::json!({
            "role": self.role,
            "warnings": self.warnings,
            "screens": screens,
            "menu": self.menu,
        })
    }
}

impl CheckCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let report = self.report()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            return Ok(());
        }

        for warning in &report.warnings {
            println!("{}", style(warning).yellow());
        }
        println!("Checking screens for role: {}", style(&report.role).bold());
        for (id, path, decision) in &report.decisions {
            let mark = match decision {
                Decision::Allow => style("✓ allow".to_string()).green(),
                other => style(format!("✗ {}", other)).red(),
            };
            println!("  {:<14} {:<16} {}", id, path, mark);
        }
        println!();
        println!("Menu: {}", report.menu.join(", "));
        Ok(())
    }

    /// Evaluate every screen against a session holding the role
    pub fn report(&self) -> anyhow::Result<CheckReport> {
        let config = load_config(self.config.as_deref())?;
        let seed = load_seed(self.seed.as_deref())?;

        let mut roles = RoleRegistry::new();
        for role in seed.roles {
            roles.register_role(role);
        }
        let role = roles.require_role(&self.role)?.clone();
        let mut warnings = Vec::new();
        if !role.is_active {
            warnings.push(format!(
                "Role '{}' is inactive; existing holders keep it",
                role.id
            ));
        }

        let snapshot = SessionSnapshot::resolved(Some(Identity::new(
            IdentityId::new("policy-check"),
            role.name.clone(),
            role,
        )));
        let screens = ScreenRegistry::from_config(&config)?;
        let guard = GuardChain::new(config.routes.clone());

        let decisions = menu::decide_screens(&screens, &guard, &snapshot)
            .into_iter()
            .map(|d| (d.screen.id.clone(), d.screen.path.clone(), d.decision))
            .collect();
        let menu = menu::build_menu(&screens, &guard, &snapshot)
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        Ok(CheckReport {
            role: self.role.clone(),
            warnings,
            decisions,
            menu,
        })
    }
}
