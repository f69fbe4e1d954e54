//! CLI commands for linkdeploy

use std::path::Path;

use clap::Subcommand;
use color_eyre::eyre::{eyre, Report, Result};
use linkdeploy_core::{ArtifactRegistry, Error};

pub mod accounts;
pub mod deploy;
pub mod plan;

/// All available CLI commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the configured contracts, libraries first
    Deploy(deploy::DeployCommand),

    /// Show the deployment order and library links without touching the network
    Plan(plan::PlanCommand),

    /// Show the named accounts derived for a network
    Accounts(accounts::AccountsCommand),
}

impl Command {
    /// Execute the command against the project described by `config_path`
    pub async fn run(self, config_path: &Path) -> Result<()> {
        match self {
            Command::Deploy(cmd) => cmd.run(config_path).await,
            Command::Plan(cmd) => cmd.run(config_path).await,
            Command::Accounts(cmd) => cmd.run(config_path).await,
        }
    }
}

/// Name the artifacts that do exist when a requested one is missing
pub(crate) fn with_available_artifacts<R: ArtifactRegistry + ?Sized>(
    registry: &R,
    error: Error,
) -> Report {
    match error {
        Error::ArtifactNotFound(_) => {
            let available = registry.list().unwrap_or_default();
            if available.is_empty() {
                eyre!("{} (no artifacts found, has the project been compiled?)", error)
            } else {
                eyre!("{} (available: {})", error, available.join(", "))
            }
        }
        other => other.into(),
    }
}
