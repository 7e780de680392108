//! Signer quorum CLI
//!
//! Loads wallets and devices from disk into a session and inspects or
//! mutates them.

use clap::{Parser, Subcommand};
use serde::Serialize;
use signer_quorum::source::{JsonDeviceProvider, JsonWalletSource};
use signer_quorum::{Config, DeviceId, Result, Session, Wallet, WalletId, WalletView};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "quorum")]
#[command(about = "Multisig signer quorum manager")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty m-of-n wallet file
    Create {
        /// Wallet id, also the file name
        #[arg(short, long)]
        wallet: String,

        /// Display name (defaults to the id)
        #[arg(long)]
        name: Option<String>,

        /// Signatures required
        #[arg(short)]
        m: usize,

        /// Total signers
        #[arg(short)]
        n: usize,
    },

    /// List all wallets
    List,

    /// Show a wallet as the active wallet
    Show {
        /// Wallet id
        #[arg(short, long)]
        wallet: String,
    },

    /// List devices that can be added to a wallet
    Candidates {
        /// Wallet id
        #[arg(short, long)]
        wallet: String,
    },

    /// Attach a device as the next signer of a wallet
    AddSigner {
        /// Wallet id
        #[arg(short, long)]
        wallet: String,

        /// Device id
        #[arg(short, long)]
        device: String,

        /// Write the updated wallet back to its file
        #[arg(long)]
        save: bool,
    },

    /// List known devices
    Devices,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let wallets = JsonWalletSource::new(&config.wallets_dir);

    match cli.command {
        Commands::Create { wallet, name, m, n } => {
            let name = name.unwrap_or_else(|| wallet.clone());
            let created = Wallet::new(wallet, name, m, n);
            wallets
                .create_wallet(&created, config.limits.max_signers)
                .await?;
            print_json(&created.view())?;
        }
        Commands::List => {
            let session = open_session(&config, &wallets).await?;
            let views: Vec<WalletView> = session
                .engine()
                .store()
                .list()
                .iter()
                .map(|w| w.view())
                .collect();
            print_json(&views)?;
        }
        Commands::Show { wallet } => {
            let session = open_session(&config, &wallets).await?;
            let engine = session.engine();
            engine.set_active(&WalletId::new(wallet))?;
            match engine.select_active() {
                Some(active) => print_json(&active.view())?,
                None => println!("No active wallet"),
            }
        }
        Commands::Candidates { wallet } => {
            let session = open_session(&config, &wallets).await?;
            let candidates = session.engine().candidates_for(&WalletId::new(wallet))?;
            print_json(&candidates)?;
        }
        Commands::AddSigner {
            wallet,
            device,
            save,
        } => {
            let session = open_session(&config, &wallets).await?;
            let updated = session
                .engine()
                .add_signer(&WalletId::new(wallet), &DeviceId::new(device))?;
            if save {
                wallets.save_wallet(&updated).await?;
            }
            print_json(&updated.view())?;
        }
        Commands::Devices => {
            let session = open_session(&config, &wallets).await?;
            print_json(&session.engine().devices().list())?;
        }
        Commands::Config => {
            print_json(&config)?;
        }
    }

    Ok(())
}

async fn open_session(config: &Config, wallets: &JsonWalletSource) -> Result<Session> {
    let session = Session::from_config(config);

    let wallet_count = session.refresh_wallets(wallets).await?;
    let device_count = session
        .refresh_devices(&JsonDeviceProvider::new(&config.devices_file))
        .await?;

    tracing::info!(
        wallets_dir = %config.wallets_dir.display(),
        wallets = wallet_count,
        devices = device_count,
        "Session loaded"
    );
    Ok(session)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
