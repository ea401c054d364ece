//! Configuration for the portal CLI

use anyhow::{Context, Result};
use meme_portal_sdk::{parse_commitment, EntryPointNames, NetworkConfig};
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Cluster name (`devnet`, `testnet`, `mainnet-beta`, `localnet`) or RPC URL
    #[serde(default = "default_cluster")]
    pub cluster: String,

    /// Commitment level for reads and confirmations
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Pre-provisioned keypair defining the store account
    pub store_keypair_path: String,

    /// Anchor IDL of the store program
    pub idl_path: String,

    /// Keypair used as the wallet identity
    pub wallet_keypair_path: String,

    /// Whether the wallet already trusts this application (allows silent connect)
    #[serde(default)]
    pub wallet_trusted: bool,

    /// IDL names of the entry points and the store account type
    #[serde(default)]
    pub entry_points: EntryPointConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryPointConfig {
    #[serde(default = "default_initialize")]
    pub initialize: String,

    #[serde(default = "default_append")]
    pub append: String,

    #[serde(default = "default_account")]
    pub account: String,
}

impl Default for EntryPointConfig {
    fn default() -> Self {
        Self {
            initialize: default_initialize(),
            append: default_append(),
            account: default_account(),
        }
    }
}

impl EntryPointConfig {
    pub fn names(&self) -> EntryPointNames {
        EntryPointNames {
            initialize: self.initialize.clone(),
            append: self.append.clone(),
            account: self.account.clone(),
        }
    }
}

impl Config {
    /// Load configuration from file or environment variables
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Load from .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("Could not load .env file: {}", e);
        }

        let config = if let Some(path) = config_path {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        } else {
            Self::from_env()?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Config {
            cluster: std::env::var("PORTAL_CLUSTER").unwrap_or_else(|_| default_cluster()),
            commitment: std::env::var("PORTAL_COMMITMENT")
                .unwrap_or_else(|_| default_commitment()),
            store_keypair_path: std::env::var("STORE_KEYPAIR_PATH")
                .context("STORE_KEYPAIR_PATH environment variable is required")?,
            idl_path: std::env::var("IDL_PATH")
                .context("IDL_PATH environment variable is required")?,
            wallet_keypair_path: std::env::var("WALLET_KEYPAIR_PATH")
                .unwrap_or_else(|_| "~/.config/solana/id.json".to_string()),
            wallet_trusted: std::env::var("WALLET_TRUSTED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            entry_points: EntryPointConfig::default(),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.network()?;

        for (name, path) in [
            ("store keypair", &self.store_keypair_path),
            ("IDL", &self.idl_path),
            ("wallet keypair", &self.wallet_keypair_path),
        ] {
            let expanded = shellexpand::tilde(path).to_string();
            if !Path::new(&expanded).exists() {
                anyhow::bail!("{} file does not exist: {}", name, path);
            }
        }

        Ok(())
    }

    pub fn network(&self) -> Result<NetworkConfig> {
        let commitment = parse_commitment(&self.commitment)?;
        Ok(NetworkConfig::for_cluster(&self.cluster, commitment)?)
    }
}

// Default values
fn default_cluster() -> String { "devnet".to_string() }
fn default_commitment() -> String { "processed".to_string() }
fn default_initialize() -> String { "startStuffOff".to_string() }
fn default_append() -> String { "addMeme".to_string() }
fn default_account() -> String { "BaseAccount".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use meme_portal_sdk::CommitmentConfig;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            store_keypair_path = "store.json"
            idl_path = "idl.json"
            wallet_keypair_path = "wallet.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.cluster, "devnet");
        assert!(!config.wallet_trusted);
        assert_eq!(config.entry_points.names().append, "addMeme");

        let network = config.network().unwrap();
        assert_eq!(network.endpoint, "https://api.devnet.solana.com");
        assert_eq!(network.commitment, CommitmentConfig::processed());
    }

    #[test]
    fn test_entry_point_overrides() {
        let config = Config::from_toml(
            r#"
            cluster = "localnet"
            commitment = "confirmed"
            store_keypair_path = "store.json"
            idl_path = "idl.json"
            wallet_keypair_path = "wallet.json"
            wallet_trusted = true

            [entry_points]
            append = "addGif"
            "#,
        )
        .unwrap();

        let names = config.entry_points.names();
        assert_eq!(names.append, "addGif");
        assert_eq!(names.initialize, "startStuffOff");
        assert!(config.wallet_trusted);
        assert_eq!(config.network().unwrap().commitment, CommitmentConfig::confirmed());
    }

    #[test]
    fn test_validate_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("present.json");
        std::fs::write(&existing, b"[]").unwrap();
        let existing = existing.to_str().unwrap().to_string();

        let mut config = Config::from_toml(&format!(
            r#"
            store_keypair_path = "{0}"
            idl_path = "{0}"
            wallet_keypair_path = "{0}"
            "#,
            existing
        ))
        .unwrap();
        assert!(config.validate().is_ok());

        config.idl_path = dir.path().join("missing.json").to_str().unwrap().to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("IDL"));

        config.idl_path = existing;
        config.commitment = "eventually".to_string();
        assert!(config.validate().is_err());
    }
}
