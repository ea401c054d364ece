//! Keypair-file wallet
//!
//! Stands in for a browser wallet extension when running headless. Silent
//! connects succeed only once the wallet trusts the application, either from
//! configuration or after a successful explicit connect.

use crate::credential::parse_keypair;
use crate::error::{ConfigError, WalletError};
use crate::session::WalletExtension;
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::sync::atomic::{AtomicBool, Ordering};

pub struct KeypairWallet {
    keypair: Keypair,
    trusted: AtomicBool,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair, trusted: bool) -> Self {
        Self {
            keypair,
            trusted: AtomicBool::new(trusted),
        }
    }

    /// Load a wallet keypair; same file formats as the store credential
    pub fn from_file(path: &str, trusted: bool) -> Result<Self, ConfigError> {
        let path = shellexpand::tilde(path).to_string();
        let data = std::fs::read(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self::new(parse_keypair(&data)?, trusted))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted.load(Ordering::Acquire)
    }
}

#[async_trait]
impl WalletExtension for KeypairWallet {
    fn is_available(&self) -> bool {
        true
    }

    async fn connect(&self, silent: bool) -> Result<Pubkey, WalletError> {
        if silent && !self.is_trusted() {
            return Err(WalletError::NotTrusted);
        }
        self.trusted.store(true, Ordering::Release);
        Ok(self.keypair.pubkey())
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, WalletError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Extension(e.to_string()))?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, instruction::Instruction};

    #[tokio::test]
    async fn test_silent_connect_requires_trust() {
        let wallet = KeypairWallet::new(Keypair::new(), false);
        assert_eq!(wallet.connect(true).await, Err(WalletError::NotTrusted));

        let address = wallet.connect(false).await.unwrap();
        assert_eq!(address, wallet.pubkey());
        assert_eq!(wallet.connect(true).await, Ok(address));
    }

    #[tokio::test]
    async fn test_signs_as_fee_payer() {
        let wallet = KeypairWallet::new(Keypair::new(), true);
        let ix = Instruction::new_with_bytes(Pubkey::new_unique(), &[1, 2, 3], vec![]);
        let mut tx = Transaction::new_with_payer(&[ix], Some(&wallet.pubkey()));
        tx.message.recent_blockhash = Hash::new_unique();

        let signed = wallet.sign_transaction(tx).await.unwrap();
        assert!(signed.is_signed());
        assert!(signed.verify().is_ok());
    }

    #[tokio::test]
    async fn test_rejects_foreign_transaction() {
        let wallet = KeypairWallet::new(Keypair::new(), true);
        let ix = Instruction::new_with_bytes(Pubkey::new_unique(), &[], vec![]);
        let tx = Transaction::new_with_payer(&[ix], Some(&Pubkey::new_unique()));

        let err = wallet.sign_transaction(tx).await.unwrap_err();
        assert!(matches!(err, WalletError::Extension(_)));
    }
}
