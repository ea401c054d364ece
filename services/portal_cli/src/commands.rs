//! CLI commands

use crate::config::Config;
use anyhow::{Context, Result};
use clap::Subcommand;
use meme_portal_sdk::{
    AppendOutcome, ConnectionContext, KeypairWallet, NetworkConfig, ProgramDescriptor, Record,
    RemoteStoreClient, SessionManager, StoreCredential, StoreState, WalletExtension,
};
use std::fmt::Write;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show session, store address and store state
    Status,
    /// Explicitly authorize the wallet
    Connect,
    /// One-time creation of the store account
    Init,
    /// Append a link to the store
    Submit {
        /// Link to submit
        link: String,
    },
    /// Print the records in the store
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    fn needs_signer(&self) -> bool {
        matches!(self, Command::Connect | Command::Init | Command::Submit { .. })
    }
}

/// Build the client from configuration and run one command
pub async fn run(config: &Config, command: Command) -> Result<()> {
    let network = config.network()?;

    let wallet = KeypairWallet::from_file(&config.wallet_keypair_path, config.wallet_trusted)
        .context("Failed to load wallet keypair")?;
    let sessions = SessionManager::new(Some(Arc::new(wallet) as Arc<dyn WalletExtension>));

    let credential =
        StoreCredential::load(&config.store_keypair_path).context("Failed to load store keypair")?;
    let descriptor = ProgramDescriptor::load(&config.idl_path, &config.entry_points.names())
        .context("Failed to load program descriptor")?;

    // The endpoint is fixed by configuration; the session is attached per command
    let bootstrap = ConnectionContext::build(&network, Default::default());
    let client = RemoteStoreClient::connect(&bootstrap, credential, descriptor);
    info!(
        "Store {} on program {} via {}",
        client.store_address(),
        client.program_id(),
        network.endpoint
    );

    let output = execute(&command, &sessions, &network, &client).await?;
    print!("{}", output);
    Ok(())
}

/// Run `command` and render its output
pub async fn execute(
    command: &Command,
    sessions: &SessionManager,
    network: &NetworkConfig,
    client: &RemoteStoreClient,
) -> Result<String> {
    let mut session = sessions.check_session().await;
    if !session.is_connected() && command.needs_signer() {
        session = sessions.connect().await;
    }
    let ctx = ConnectionContext::build(network, session);
    let mut out = String::new();

    match command {
        Command::Status => {
            match ctx.session().address() {
                Some(address) => writeln!(out, "Wallet:  {}", address)?,
                None => writeln!(out, "Wallet:  not connected")?,
            }
            writeln!(out, "Store:   {}", client.store_address())?;
            match client.fetch_state(&ctx).await {
                StoreState::Uninitialized => {
                    writeln!(out, "State:   not initialized (run `init` once)")?;
                }
                StoreState::Populated(records) => {
                    writeln!(out, "State:   {} records", records.len())?;
                }
                StoreState::FetchFailed(e) => writeln!(out, "State:   fetch failed: {}", e)?,
            }
        }
        Command::Connect => match ctx.session().address() {
            Some(address) => writeln!(out, "Connected with {}", address)?,
            None => anyhow::bail!("Wallet did not authorize this application"),
        },
        Command::Init => {
            let submitted = client.initialize(&ctx).await?;
            writeln!(
                out,
                "Created store account {} ({})",
                client.store_address(),
                submitted.signature
            )?;
        }
        Command::Submit { link } => match client.append(&ctx, link).await? {
            AppendOutcome::Skipped => writeln!(out, "Empty link, nothing submitted")?,
            AppendOutcome::Appended(submitted) => {
                writeln!(out, "Submitted {} ({})", link, submitted.signature)?;
                render_records(&mut out, submitted.records.records())?;
            }
        },
        Command::List { json } => {
            let list = client.fetch(&ctx).await;
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&list)?)?;
            } else if list.is_uninitialized() {
                writeln!(out, "Store not initialized (run `init` once)")?;
            } else {
                render_records(&mut out, list.records())?;
            }
        }
    }

    Ok(out)
}

fn render_records(out: &mut String, records: &[Record]) -> std::fmt::Result {
    for (index, record) in records.iter().enumerate() {
        writeln!(out, "{:>4}  {}  (created by {})", index, record.link, record.creator)?;
    }
    Ok(())
}
