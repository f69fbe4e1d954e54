//! Print the deployment order

use std::path::Path;

use clap::Args;
use color_eyre::eyre::{eyre, Result};
use console::style;
use linkdeploy_core::{graph, ArtifactRegistry};

use crate::artifacts::FileSystemRegistry;
use crate::config::ProjectConfig;

use super::with_available_artifacts;

/// Show the deployment order and library links without touching the network
#[derive(Args)]
pub struct PlanCommand {}

impl PlanCommand {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        let config = ProjectConfig::load_from(config_path)?;
        if config.contracts.is_empty() {
            return Err(eyre!("No [[contracts]] listed in {}", config_path.display()));
        }

        let registry = FileSystemRegistry::new(config.artifacts_dir(config_path));
        let ordered = graph::plan(&registry, &config.contracts)
            .map_err(|e| with_available_artifacts(&registry, e))?;

        if ordered != config.contracts {
            println!(
                "{} Listed order breaks library dependencies, reordered",
                style("⚠").yellow()
            );
        }

        println!(
            "{:<4} {:<24} {:<24} {}",
            "#", "Contract", "Links", "Args"
        );
        println!("{}", "-".repeat(80));

        for (i, spec) in ordered.iter().enumerate() {
            let artifact = registry.load(&spec.name)?;
            let links = artifact.dependencies().join(", ");
            let args = serde_json::to_string(&spec.args)?;
            println!(
                "{:<4} {:<24} {:<24} {}",
                i + 1,
                spec.name,
                if links.is_empty() { "-".to_string() } else { links },
                args
            );
        }

        println!();
        println!("Total: {} contract(s)", ordered.len());

        Ok(())
    }
}
