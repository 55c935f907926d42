//! clinic screens command

use clap::Args;
use console::style;
use navigation::{Screen, ScreenAccess, ScreenRegistry};
use std::path::PathBuf;

use super::load_config;

#[derive(Debug, Args)]
pub struct ScreensCommand {
    /// Access configuration (JSON or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn describe(screen: &Screen) -> serde_json::Value {
    serde_json::json!({
        "id": screen.id,
        "path": screen.path,
        "title": screen.title,
        "public": screen.access == ScreenAccess::Public,
        "inMenu": screen.in_menu,
        "requirement": screen.requirement.to_string(),
    })
}

impl ScreensCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let config = load_config(self.config.as_deref())?;
        let registry = ScreenRegistry::from_config(&config)?;

        if self.json {
            let screens: Vec<_> = registry.screens().iter().map(describe).collect();
            println!("{}", serde_json::to_string_pretty(&screens)?);
            return Ok(());
        }

        println!("{}", style("Screens").bold());
        for screen in registry.screens() {
            let access = match screen.access {
                ScreenAccess::Public => style("public".to_string()).green(),
                ScreenAccess::Authenticated => style(screen.requirement.to_string()).cyan(),
            };
            let menu = if screen.in_menu { "" } else { " (not in menu)" };
            println!(
                "  {:<14} {:<16} {}{}",
                screen.id,
                screen.path,
                access,
                style(menu).dim()
            );
        }
        Ok(())
    }
}
