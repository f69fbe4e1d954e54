//! Alloy-backed signer and transport

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use linkdeploy_core::{DeployReceipt, DeployRequest, Transport, TransportError};
use tracing::debug;

use crate::config::ConfirmationPolicy;

/// Sends deployments over HTTP JSON-RPC, signing with a local key
pub struct AlloyTransport {
    provider: DynProvider,
    policy: ConfirmationPolicy,
}

impl AlloyTransport {
    pub fn connect(rpc_url: &str, signer: PrivateKeySigner, policy: ConfirmationPolicy) -> Result<Self> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| eyre!("Invalid RPC URL '{}': {}", rpc_url, e))?;
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(url)
            .erased();

        Ok(Self { provider, policy })
    }
}

#[async_trait]
impl Transport for AlloyTransport {
    async fn chain_id(&self) -> Result<u64, TransportError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| TransportError::Rpc(format!("Failed to fetch chain ID: {}", e)))
    }

    async fn deploy(&self, request: DeployRequest) -> Result<DeployReceipt, TransportError> {
        // CREATE transaction - no 'to' address
        let tx = TransactionRequest::default()
            .with_from(request.from)
            .with_deploy_code(request.data);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| TransportError::Rpc(format!("Failed to send deployment transaction: {}", e)))?;

        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, "Deployment transaction sent");

        let receipt = pending
            .with_required_confirmations(self.policy.confirmations)
            .with_timeout(Some(self.policy.timeout))
            .get_receipt()
            .await
            .map_err(|e| TransportError::Rpc(format!("Failed to get transaction receipt: {}", e)))?;

        if !receipt.status() {
            return Err(TransportError::Reverted {
                tx_hash: tx_hash.to_string(),
            });
        }

        let contract_address =
            receipt
                .contract_address
                .ok_or_else(|| TransportError::MissingContractAddress {
                    tx_hash: tx_hash.to_string(),
                })?;

        Ok(DeployReceipt {
            contract_address,
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}
