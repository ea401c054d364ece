//! Network and signing context for talking to the store program

use crate::error::{ConfigError, SubmissionError};
use crate::session::{Session, SigningAuthority};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use std::str::FromStr;

/// Endpoint and commitment level, injected by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// RPC endpoint URL
    pub endpoint: String,

    /// Commitment level for reads and for confirming writes
    pub commitment: CommitmentConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.devnet.solana.com".to_string(),
            commitment: CommitmentConfig::processed(),
        }
    }
}

impl NetworkConfig {
    pub fn new(endpoint: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            commitment,
        }
    }

    /// Resolve a cluster name (`devnet`, `testnet`, `mainnet-beta`, `localnet`)
    /// or pass an explicit URL through unchanged
    pub fn for_cluster(cluster: &str, commitment: CommitmentConfig) -> Result<Self, ConfigError> {
        let endpoint = match cluster {
            "devnet" => "https://api.devnet.solana.com",
            "testnet" => "https://api.testnet.solana.com",
            "mainnet-beta" | "mainnet" => "https://api.mainnet-beta.solana.com",
            "localnet" | "localhost" => "http://127.0.0.1:8899",
            url if url.starts_with("http://") || url.starts_with("https://") => url,
            other => return Err(ConfigError::UnknownCluster(other.to_string())),
        };
        Ok(Self::new(endpoint, commitment))
    }
}

/// Parse `processed`, `confirmed` or `finalized`
pub fn parse_commitment(level: &str) -> Result<CommitmentConfig, ConfigError> {
    let commitment = CommitmentLevel::from_str(level)
        .map_err(|_| ConfigError::InvalidCommitment(level.to_string()))?;
    Ok(CommitmentConfig { commitment })
}

/// Everything a remote call needs: where, how confirmed, and who signs
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    endpoint: String,
    commitment: CommitmentConfig,
    session: Session,
}

impl ConnectionContext {
    /// Pure construction. An empty session is accepted here; calls that need a
    /// signer fail later with [`SubmissionError::MissingSigner`].
    pub fn build(network: &NetworkConfig, session: Session) -> Self {
        Self {
            endpoint: network.endpoint.clone(),
            commitment: network.commitment,
            session,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn authority(&self) -> Result<&SigningAuthority, SubmissionError> {
        self.session.authority().ok_or(SubmissionError::MissingSigner)
    }
}
