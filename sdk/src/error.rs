//! Error types for the store client
//!
//! Every failure is handled where it occurs: wallet failures leave the session
//! empty, fetch failures collapse into `RecordList::Uninitialized`, and
//! submission failures abort the operation without touching the cache.

use thiserror::Error;

/// Failure reported by the remote call boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

impl From<solana_client::client_error::ClientError> for LedgerError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        if err.get_transaction_error().is_some() {
            Self::Rejected(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Failure reported by the wallet extension
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet extension not available")]
    Unavailable,

    #[error("Wallet has not previously trusted this application")]
    NotTrusted,

    #[error("User rejected the request")]
    UserRejected,

    #[error("Wallet extension error: {0}")]
    Extension(String),
}

/// Failure reading the store account
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Fetch failed: {0}")]
    Network(#[from] LedgerError),

    #[error("Account payload could not be decoded: {0}")]
    Decode(String),
}

/// Failure submitting a mutating transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("No signing authority: connect a wallet first")]
    MissingSigner,

    #[error("An initialization is already in flight")]
    InitializeInFlight,

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Transaction is missing required signatures")]
    Unsigned,

    #[error("Failed to encode instruction: {0}")]
    Encode(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<LedgerError> for SubmissionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Network(msg) => Self::Network(msg),
            LedgerError::Rejected(msg) => Self::Rejected(msg),
        }
    }
}

/// Failure loading startup configuration (credential, program descriptor)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("Invalid program ID: {0}")]
    InvalidProgramId(String),

    #[error("Program descriptor has no instruction named {0}")]
    MissingInstruction(String),

    #[error("Program descriptor has no account named {0}")]
    MissingAccount(String),

    #[error("Invalid commitment level: {0}")]
    InvalidCommitment(String),

    #[error("Unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("Program descriptor schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl SubmissionError {
    /// Whether the remote program saw and refused the transaction
    pub fn is_rejection(&self) -> bool {
        matches!(self, SubmissionError::Rejected(_))
    }
}
