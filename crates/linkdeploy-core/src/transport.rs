//! Boundary to the signer and network
//!
//! The orchestrator never talks to an RPC endpoint directly. It hands
//! linked bytecode to a [`Transport`] and waits for a terminal outcome;
//! confirmation timeouts are the transport's concern.

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;

use crate::error::TransportError;

/// A contract-creation transaction ready to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Account the transaction is sent from
    pub from: Address,
    /// Linked creation bytecode followed by the encoded constructor arguments
    pub data: Bytes,
}

/// Outcome of a confirmed contract creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReceipt {
    pub contract_address: Address,
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// Submits transactions on behalf of the orchestrator
#[async_trait]
pub trait Transport: Send + Sync {
    /// Chain ID reported by the connected network
    async fn chain_id(&self) -> Result<u64, TransportError>;

    /// Submit a contract creation and wait until it is confirmed or fails
    async fn deploy(&self, request: DeployRequest) -> Result<DeployReceipt, TransportError>;
}
