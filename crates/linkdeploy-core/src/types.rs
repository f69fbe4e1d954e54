use serde::{Deserialize, Serialize};
use std::fmt;

/// Re-export alloy types for convenience
pub use alloy::primitives::{Address, Bytes, B256};

// =============================================================================
// Domain Enums
// =============================================================================

/// Lifecycle of a single artifact within a run.
///
/// `Pending -> Linked -> Submitted -> Confirmed`, or `Failed` from any
/// non-terminal state. A confirmed deployment is permanent on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    Pending,
    Linked,
    Submitted,
    Confirmed,
    Failed,
}

impl DeploymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentState::Pending => "pending",
            DeploymentState::Linked => "linked",
            DeploymentState::Submitted => "submitted",
            DeploymentState::Confirmed => "confirmed",
            DeploymentState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentState::Confirmed | DeploymentState::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: DeploymentState) -> bool {
        use DeploymentState::*;
        match (self, next) {
            (Pending, Linked) | (Linked, Submitted) | (Submitted, Confirmed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Run Inputs
// =============================================================================

/// Static configuration for one orchestration run, loaded once up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Logical network name (used for reporting)
    pub network: String,
    /// RPC endpoint of the target network
    pub rpc_url: String,
    /// Chain identifier the network must report
    pub chain_id: u64,
    /// Seed phrase the accounts are derived from
    pub mnemonic: String,
}

/// An artifact to deploy together with its constructor arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub name: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl DeploymentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<serde_json::Value>) -> Self {
        self.args = args;
        self
    }
}

// =============================================================================
// Run Outputs
// =============================================================================

/// A contract confirmed on-chain during this run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContract {
    pub name: String,
    pub address: Address,
    /// Constructor arguments as supplied
    pub constructor_args: Vec<serde_json::Value>,
    /// ABI encoding of `constructor_args` appended to the bytecode
    pub encoded_args: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// keccak256 of the linked creation bytecode
    pub bytecode_hash: String,
}
