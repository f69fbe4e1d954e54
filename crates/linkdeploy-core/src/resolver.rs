//! Run-scoped record of deployed addresses

use std::collections::HashMap;

use alloy::primitives::Address;

use crate::error::{Error, Result};
use crate::types::DeployedContract;

/// Maps artifact names to the contracts deployed for them in this run.
///
/// Entries are only ever appended; a recorded address never changes.
#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    deployed: Vec<DeployedContract>,
    index: HashMap<String, usize>,
}

impl AddressResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address recorded for `name`.
    ///
    /// `requested_by` names the artifact asking, for the error message.
    pub fn get(&self, name: &str, requested_by: &str) -> Result<Address> {
        self.deployment(name)
            .map(|deployed| deployed.address)
            .ok_or_else(|| Error::unresolved(requested_by, name))
    }

    pub fn deployment(&self, name: &str) -> Option<&DeployedContract> {
        self.index.get(name).map(|&i| &self.deployed[i])
    }

    /// Record a freshly deployed contract
    pub fn record(&mut self, deployed: DeployedContract) -> Result<()> {
        if self.index.contains_key(&deployed.name) {
            return Err(Error::DuplicateDeployment(deployed.name));
        }
        self.index.insert(deployed.name.clone(), self.deployed.len());
        self.deployed.push(deployed);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.deployed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deployed.is_empty()
    }

    /// Deployments in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = &DeployedContract> {
        self.deployed.iter()
    }
}
