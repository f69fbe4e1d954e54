//! Print the named accounts of a network

use std::path::Path;

use clap::Args;
use color_eyre::eyre::Result;
use console::style;
use linkdeploy_core::Accounts;

use crate::config::ProjectConfig;

/// Show the named accounts derived for a network
#[derive(Args)]
pub struct AccountsCommand {
    /// Network to derive accounts for (defaults to default_network)
    #[arg(long)]
    pub network: Option<String>,
}

impl AccountsCommand {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        let config = ProjectConfig::load_from(config_path)?;
        let network = config.network_name(self.network.as_deref())?;
        let run = config.run_config(network)?;
        let accounts = Accounts::from_mnemonic(&run.mnemonic)?;

        println!(
            "{} Accounts for {} (chain ID: {})",
            style("→").blue(),
            style(network).cyan(),
            run.chain_id
        );
        println!();

        for (role, address) in accounts.named() {
            println!(
                "  {:<10} {}",
                style(role).cyan(),
                style(address).yellow()
            );
        }

        Ok(())
    }
}
