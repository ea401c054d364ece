//! Remote call boundary
//!
//! The store client only sees [`LedgerRpc`]. The wire encoding belongs to the
//! implementation; [`SolanaLedgerRpc`] delegates to `solana-client`.

use crate::connection::ConnectionContext;
use crate::error::LedgerError;
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use tracing::debug;

#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Raw account data, `None` if the account does not exist
    async fn get_account_data(
        &self,
        address: &Pubkey,
        commitment: CommitmentConfig,
    ) -> Result<Option<Vec<u8>>, LedgerError>;

    async fn latest_blockhash(&self, commitment: CommitmentConfig) -> Result<Hash, LedgerError>;

    /// Submit a fully signed transaction and wait for confirmation
    async fn submit_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError>;
}

/// [`LedgerRpc`] over the nonblocking Solana RPC client
pub struct SolanaLedgerRpc {
    client: RpcClient,
}

impl SolanaLedgerRpc {
    pub fn new(endpoint: &str, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(endpoint.to_string(), commitment),
        }
    }

    pub fn from_context(ctx: &ConnectionContext) -> Self {
        Self::new(ctx.endpoint(), ctx.commitment())
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl LedgerRpc for SolanaLedgerRpc {
    async fn get_account_data(
        &self,
        address: &Pubkey,
        commitment: CommitmentConfig,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        let response = self
            .client
            .get_account_with_commitment(address, commitment)
            .await?;
        debug!("Fetched {} at slot {}", address, response.context.slot);
        Ok(response.value.map(|account| account.data))
    }

    async fn latest_blockhash(&self, commitment: CommitmentConfig) -> Result<Hash, LedgerError> {
        let (blockhash, _last_valid_height) = self
            .client
            .get_latest_blockhash_with_commitment(commitment)
            .await?;
        Ok(blockhash)
    }

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        Ok(self.client.send_and_confirm_transaction(transaction).await?)
    }
}
