//! Pre-provisioned signing material for the store account
//!
//! The credential defines the store address for the lifetime of the process.
//! The keypair never leaves this module: callers see the address, and the
//! client asks the credential to co-sign the creation transaction.

use crate::error::ConfigError;
use serde::Deserialize;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::collections::BTreeMap;
use std::fmt;

pub struct StoreCredential {
    keypair: Keypair,
}

/// web3.js `Keypair` serialized with `JSON.stringify`
#[derive(Deserialize)]
struct Web3Keypair {
    #[serde(rename = "_keypair")]
    keypair: Web3KeypairInner,
}

#[derive(Deserialize)]
struct Web3KeypairInner {
    #[serde(rename = "secretKey")]
    secret_key: BTreeMap<String, u8>,
}

impl StoreCredential {
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Load from a keypair file
    ///
    /// Accepts raw 64-byte files, the Solana CLI JSON byte array, and the
    /// web3.js `{"_keypair": {"secretKey": {"0": .., ..}}}` object.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let path = shellexpand::tilde(path).to_string();
        let data = std::fs::read(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_bytes_or_json(&data)
    }

    pub fn from_bytes_or_json(data: &[u8]) -> Result<Self, ConfigError> {
        Ok(Self {
            keypair: parse_keypair(data)?,
        })
    }

    /// The store account address
    pub fn address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub(crate) fn co_sign(
        &self,
        transaction: &mut Transaction,
        recent_blockhash: Hash,
    ) -> Result<(), solana_sdk::signer::SignerError> {
        transaction.try_partial_sign(&[&self.keypair], recent_blockhash)
    }
}

impl fmt::Debug for StoreCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredential")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Parse a keypair from any of the supported file formats
pub(crate) fn parse_keypair(data: &[u8]) -> Result<Keypair, ConfigError> {
    let secret = if data.len() == 64 {
        data.to_vec()
    } else if let Ok(bytes) = serde_json::from_slice::<Vec<u8>>(data) {
        bytes
    } else {
        let web3: Web3Keypair = serde_json::from_slice(data)?;
        ordered_secret_key(&web3.keypair.secret_key)?
    };

    if secret.len() != 64 {
        return Err(ConfigError::InvalidKeypair(format!(
            "expected 64 bytes, got {}",
            secret.len()
        )));
    }
    if secret.iter().all(|&b| b == 0) {
        return Err(ConfigError::InvalidKeypair("all-zero key rejected".to_string()));
    }

    Keypair::try_from(secret.as_slice()).map_err(|e| ConfigError::InvalidKeypair(e.to_string()))
}

fn ordered_secret_key(map: &BTreeMap<String, u8>) -> Result<Vec<u8>, ConfigError> {
    (0..map.len())
        .map(|i| {
            map.get(&i.to_string())
                .copied()
                .ok_or_else(|| ConfigError::InvalidKeypair(format!("secretKey missing index {}", i)))
        })
        .collect()
}
