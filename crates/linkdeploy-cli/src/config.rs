use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use linkdeploy_core::{DeploymentSpec, RunConfig};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "linkdeploy.toml";

const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Project configuration file structure (linkdeploy.toml)
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Network used when `--network` is not given
    #[serde(default)]
    pub default_network: Option<String>,
    /// Root of the compiler build output
    #[serde(default = "default_artifacts_dir")]
    pub artifacts: PathBuf,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkEntry>,
    /// Contracts to deploy, with their constructor arguments
    #[serde(default)]
    pub contracts: Vec<DeploymentSpec>,
}

/// A `[networks.<name>]` table
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkEntry {
    pub url: String,
    pub chain_id: u64,
    pub mnemonic: String,
    /// Blocks to wait for after inclusion
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    /// Seconds to wait for a receipt before giving up
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// How long and how deep the transport waits for each transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub confirmations: u64,
    pub timeout: Duration,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

fn default_confirmations() -> u64 {
    1
}

impl ProjectConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| {
            eyre!(
                "Could not find {}. Is this a linkdeploy project?",
                path.display()
            )
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Artifact directory, relative paths taken from the config file's directory
    pub fn artifacts_dir(&self, config_path: &Path) -> PathBuf {
        match config_path.parent() {
            Some(parent) if self.artifacts.is_relative() => parent.join(&self.artifacts),
            _ => self.artifacts.clone(),
        }
    }

    /// Pick the network to use: the one asked for, else the default.
    pub fn network_name<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str> {
        requested
            .or(self.default_network.as_deref())
            .ok_or_else(|| eyre!("No network given and no default_network in {}", CONFIG_FILE))
    }

    /// Build the run configuration for a network, resolving environment variables
    pub fn run_config(&self, name: &str) -> Result<RunConfig> {
        let entry = self.network(name)?;

        Ok(RunConfig {
            network: name.to_string(),
            rpc_url: resolve_env_var(&entry.url)?,
            chain_id: entry.chain_id,
            mnemonic: resolve_env_var(&entry.mnemonic)?,
        })
    }

    pub fn confirmation_policy(&self, name: &str) -> Result<ConfirmationPolicy> {
        let entry = self.network(name)?;
        Ok(ConfirmationPolicy {
            confirmations: entry.confirmations.max(1),
            timeout: Duration::from_secs(entry.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }

    fn network(&self, name: &str) -> Result<&NetworkEntry> {
        self.networks.get(name).ok_or_else(|| {
            eyre!(
                "Network '{}' not found in {} [networks] (known: {})",
                name,
                CONFIG_FILE,
                self.network_names().join(", ")
            )
        })
    }

    /// Get all network names defined in the config
    pub fn network_names(&self) -> Vec<&str> {
        self.networks.keys().map(|s| s.as_str()).collect()
    }
}

/// Resolve environment variable references in a string
/// Supports ${VAR_NAME} syntax
fn resolve_env_var(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).map_err(|_| eyre!("Environment variable '{}' not set", var_name))
    } else {
        Ok(value.to_string())
    }
}
