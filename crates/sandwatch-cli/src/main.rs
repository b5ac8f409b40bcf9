/*
[INPUT]:  CLI arguments, optional YAML configuration file, OS shutdown signals
[OUTPUT]: Playground commands run against the Sandwatch API
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or shutdown handling
*/

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use sandwatch_auth::ConnectionProvider;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "sandwatch", version, about = "Sandwatch auth playground")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "store", value_name = "PATH", global = true)]
    store_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign the login message with a wallet and store the issued tokens
    Login {
        /// Solana CLI keypair file (JSON array of 64 bytes)
        #[arg(long, value_name = "PATH", conflicts_with = "secret")]
        keypair: Option<PathBuf>,
        /// Base58 secret key (32-byte seed or 64-byte keypair)
        #[arg(long, value_name = "BASE58")]
        secret: Option<String>,
    },
    /// Exchange the stored refresh token for a new pair
    Refresh,
    /// Show stored tokens and their expiry
    Status,
    /// Call a social connection endpoint with the stored credentials
    Connect {
        /// twitter, discord, telegram or instagram
        provider: String,
        #[arg(long)]
        task: Option<String>,
    },
    /// Remove stored tokens
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = match &args.config_path {
        Some(path) => CliConfig::from_file(path).context("load config")?,
        None => CliConfig::default(),
    };
    let store_path = config.resolve_store_path(args.store_path.as_deref())?;
    info!(
        base_url = %config.base_url,
        store = %store_path.display(),
        "starting sandwatch playground"
    );

    let session = commands::Session::open(&config, &store_path).await?;

    match args.command {
        Command::Login { keypair, secret } => {
            let keypair = keypair.or_else(|| config.keypair_path.clone());
            session.login(keypair.as_deref(), secret.as_deref()).await
        }
        Command::Refresh => session.refresh().await,
        Command::Status => session.status().await,
        Command::Connect { provider, task } => {
            let provider: ConnectionProvider = provider.parse().map_err(|err: String| anyhow!(err))?;
            session.connect(provider, task.as_deref()).await
        }
        Command::Logout => session.logout().await,
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}
