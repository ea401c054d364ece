//! Meme Portal SDK - client for a single append-only record store on Solana
//!
//! This SDK provides:
//! - Wallet sessions (silent re-authorization and explicit connect)
//! - Connection context construction (endpoint, commitment, signer)
//! - The store client: fetch, one-time initialization and append
//! - A subscribable cache of the last successful fetch

pub mod cache;
pub mod client;
pub mod connection;
pub mod credential;
pub mod descriptor;
pub mod error;
pub mod instructions;
pub mod record;
pub mod rpc;
pub mod session;
pub mod testing;
pub mod wallet;

// Re-export key types
pub use cache::RecordListCache;
pub use client::{AppendOutcome, RemoteStoreClient, Submitted};
pub use connection::{parse_commitment, ConnectionContext, NetworkConfig};
pub use credential::StoreCredential;
pub use descriptor::{EntryPointNames, ProgramDescriptor};
pub use error::*;
pub use record::{Record, RecordList, StoreState};
pub use rpc::{LedgerRpc, SolanaLedgerRpc};
pub use session::{Session, SessionManager, SigningAuthority, WalletExtension};
pub use wallet::KeypairWallet;

// Re-export commonly used Solana types
pub use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
};
