//! Portal CLI binary

use anyhow::Result;
use clap::Parser;
use portal_cli::{run, Command, Config};
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (falls back to environment variables)
    #[arg(short, long, env = "PORTAL_CONFIG")]
    config: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    info!("Using cluster {} ({})", config.cluster, config.commitment);

    if let Err(e) = run(&config, args.command).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}
