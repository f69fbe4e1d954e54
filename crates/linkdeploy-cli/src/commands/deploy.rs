//! Deploy the configured contracts

use std::path::Path;
use std::sync::Arc;

use clap::Args;
use color_eyre::eyre::{eyre, Result};
use console::style;
use dialoguer::Confirm;
use linkdeploy_core::{
    Accounts, DeployObserver, DeployedContract, DeploymentState, DeploymentsDir, Error,
    Orchestrator, RunReport,
};
use tokio::sync::watch;
use tracing::debug;

use crate::artifacts::FileSystemRegistry;
use crate::config::ProjectConfig;
use crate::transport::AlloyTransport;

use super::with_available_artifacts;

/// Deploy the configured contracts, libraries first
#[derive(Args)]
pub struct DeployCommand {
    /// Network to deploy to (defaults to default_network)
    #[arg(long)]
    pub network: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Don't write a run report under deployments/
    #[arg(long)]
    pub no_report: bool,
}

/// Prints per-contract progress to the terminal
struct ConsoleObserver;

impl DeployObserver for ConsoleObserver {
    fn on_transition(&self, name: &str, state: DeploymentState) {
        match state {
            DeploymentState::Linked => println!(
                "{} Linked {}",
                style("→").blue(),
                style(name).cyan()
            ),
            DeploymentState::Submitted => println!(
                "{} Submitting {}...",
                style("→").blue(),
                style(name).cyan()
            ),
            _ => {}
        }
    }

    fn on_deployed(&self, deployed: &DeployedContract) {
        println!(
            "{} {} deployed at {}",
            style("✓").green(),
            style(&deployed.name).cyan(),
            style(deployed.address).yellow()
        );
    }

    fn on_failed(&self, name: &str, error: &Error) {
        println!(
            "{} {} failed: {}",
            style("✗").red(),
            style(name).cyan(),
            error
        );
    }
}

impl DeployCommand {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        let config = ProjectConfig::load_from(config_path)?;
        if config.contracts.is_empty() {
            return Err(eyre!("No [[contracts]] listed in {}", config_path.display()));
        }

        let network = config.network_name(self.network.as_deref())?.to_string();
        let run_config = config.run_config(&network)?;
        let policy = config.confirmation_policy(&network)?;
        let accounts = Accounts::from_mnemonic(&run_config.mnemonic)?;
        let registry = FileSystemRegistry::new(config.artifacts_dir(config_path));

        println!(
            "{} Connecting to {}...",
            style("→").blue(),
            style(&network).cyan()
        );
        let transport =
            AlloyTransport::connect(&run_config.rpc_url, accounts.deployer().clone(), policy)?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupt received, stopping after the current deployment");
                let _ = cancel_tx.send(true);
            }
        });

        let mut orchestrator = Orchestrator::new(run_config, accounts, registry, transport)
            .with_observer(Arc::new(ConsoleObserver))
            .with_cancellation(cancel_rx);

        let ordered = orchestrator
            .plan(&config.contracts)
            .map_err(|e| with_available_artifacts(orchestrator.registry(), e))?;

        println!(
            "{} Deploying to {} (chain ID: {})",
            style("→").blue(),
            style(&network).cyan(),
            orchestrator.config().chain_id
        );
        for (role, address) in orchestrator.accounts().named() {
            println!("   {:<10} {}", style(role).cyan(), style(address).yellow());
        }
        println!();
        for (i, spec) in ordered.iter().enumerate() {
            println!("   {}. {}", i + 1, spec.name);
        }
        println!();

        if !self.yes {
            let confirmed = Confirm::new()
                .with_prompt("Send these deployments?")
                .default(false)
                .interact()?;

            if !confirmed {
                println!("{} Cancelled", style("*").dim());
                return Ok(());
            }
        }

        let deployed = match orchestrator.deploy(&ordered).await {
            Ok(deployed) => deployed,
            Err(e) => {
                let partial = orchestrator.resolver();
                if !partial.is_empty() {
                    println!();
                    println!(
                        "{} Deployed before the run stopped:",
                        style("⚠").yellow()
                    );
                    for contract in partial.iter() {
                        println!(
                            "   {:<24} {}",
                            contract.name,
                            style(contract.address).yellow()
                        );
                    }
                }
                return Err(e.into());
            }
        };

        println!();
        for contract in &deployed {
            println!(
                "{:<24} {}",
                style(&contract.name).cyan(),
                style(contract.address).yellow()
            );
        }

        if !self.no_report {
            let dir = match config_path.parent() {
                Some(parent) => DeploymentsDir::at(parent.join(DeploymentsDir::NAME)),
                None => DeploymentsDir::new(),
            };
            let report = RunReport::new(
                &network,
                orchestrator.config().chain_id,
                orchestrator.deployer(),
                deployed,
            );
            let path = report.write(&dir)?;
            println!();
            println!("{} Report written to {}", style("✓").green(), path.display());
        }

        println!();
        println!(
            "{} {} contract(s) deployed",
            style("✓").green().bold(),
            orchestrator.resolver().len()
        );

        Ok(())
    }
}
