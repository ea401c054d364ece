//! Wallet sessions
//!
//! A [`Session`] is an explicit value: it is produced by [`SessionManager`] and
//! handed to every call that needs a signing authority. Wallet failures never
//! escape this module; they are logged and yield an empty session.

use crate::error::WalletError;
use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Interface of the external wallet extension
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Whether the extension is installed and reachable
    fn is_available(&self) -> bool;

    /// Request authorization. With `silent` set the wallet must not show any
    /// prompt and succeeds only if this application was trusted before.
    async fn connect(&self, silent: bool) -> Result<Pubkey, WalletError>;

    /// Add the connected account's signature to `transaction`
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError>;
}

/// A connected identity and the wallet able to sign for it
#[derive(Clone)]
pub struct SigningAuthority {
    address: Pubkey,
    wallet: Arc<dyn WalletExtension>,
}

impl SigningAuthority {
    pub fn new(address: Pubkey, wallet: Arc<dyn WalletExtension>) -> Self {
        Self { address, wallet }
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub async fn sign(&self, transaction: Transaction) -> Result<Transaction, WalletError> {
        self.wallet.sign_transaction(transaction).await
    }
}

impl fmt::Debug for SigningAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningAuthority")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Optional identity; empty until a successful connect
#[derive(Debug, Clone, Default)]
pub struct Session {
    authority: Option<SigningAuthority>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn connected(authority: SigningAuthority) -> Self {
        Self {
            authority: Some(authority),
        }
    }

    pub fn address(&self) -> Option<Pubkey> {
        self.authority.as_ref().map(SigningAuthority::address)
    }

    pub fn authority(&self) -> Option<&SigningAuthority> {
        self.authority.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.authority.is_some()
    }
}

/// Establishes the local identity against the wallet extension
pub struct SessionManager {
    wallet: Option<Arc<dyn WalletExtension>>,
}

impl SessionManager {
    /// `None` models a host with no wallet extension installed
    pub fn new(wallet: Option<Arc<dyn WalletExtension>>) -> Self {
        Self { wallet }
    }

    /// Silent re-authorization against a previously trusted wallet. Never prompts.
    pub async fn check_session(&self) -> Session {
        self.authorize(true).await
    }

    /// Explicit, user-visible authorization request
    pub async fn connect(&self) -> Session {
        self.authorize(false).await
    }

    async fn authorize(&self, silent: bool) -> Session {
        let Some(wallet) = self.wallet.as_ref() else {
            warn!("No wallet extension found");
            return Session::empty();
        };
        if !wallet.is_available() {
            warn!("Wallet extension is not available");
            return Session::empty();
        }

        match wallet.connect(silent).await {
            Ok(address) => {
                info!("Connected with {}", address);
                Session::connected(SigningAuthority::new(address, wallet.clone()))
            }
            Err(e) => {
                warn!(silent, "Wallet connect failed: {}", e);
                Session::empty()
            }
        }
    }
}
