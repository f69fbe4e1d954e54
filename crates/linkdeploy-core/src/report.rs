//! Run reports
//!
//! A [`RunReport`] lists what one successful run deployed. Reports are
//! written for humans and other tools; nothing reads them back to skip work
//! on a later run.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::dir::DeploymentsDir;
use crate::error::Result;
use crate::types::DeployedContract;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub network: String,
    pub chain_id: u64,
    pub deployer: Address,
    /// Unix seconds at which the report was created
    pub timestamp: u64,
    pub deployments: Vec<DeployedContract>,
}

impl RunReport {
    pub fn new(
        network: impl Into<String>,
        chain_id: u64,
        deployer: Address,
        deployments: Vec<DeployedContract>,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            network: network.into(),
            chain_id,
            deployer,
            timestamp,
            deployments,
        }
    }

    /// Write the report as both the timestamped run and the latest run.
    ///
    /// Returns the path of the timestamped file.
    pub fn write(&self, dir: &DeploymentsDir) -> Result<PathBuf> {
        dir.create(&self.network)?;
        let json = serde_json::to_string_pretty(self)?;

        let run_path = dir.run(&self.network, self.timestamp);
        std::fs::write(&run_path, &json)?;
        std::fs::write(dir.latest(&self.network), &json)?;

        Ok(run_path)
    }
}
