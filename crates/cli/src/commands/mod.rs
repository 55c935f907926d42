//! CLI Commands

pub mod check;
pub mod roles;
pub mod screens;

pub use check::CheckCommand;
pub use roles::RolesCommand;
pub use screens::ScreensCommand;

use anyhow::Context;
use session::SeedFile;
use shared::AccessConfig;
use std::path::Path;

/// Load access configuration, or the defaults without a path
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AccessConfig> {
    match path {
        Some(path) => AccessConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AccessConfig::default()),
    }
}

/// Load a seed directory, or the built-in demo without a path
pub fn load_seed(path: Option<&Path>) -> anyhow::Result<SeedFile> {
    match path {
        Some(path) => SeedFile::from_file(path)
            .with_context(|| format!("Failed to load seed {}", path.display())),
        None => Ok(SeedFile::demo()?),
    }
}
