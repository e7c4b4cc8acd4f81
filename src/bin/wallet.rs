//! Ledger wallet command line
//!
//! Manages a password-encrypted keystore file and sends simple transfers
//! through a JSON-RPC settlement authority.
//!
//! ## Usage
//! ```bash
//! # Create a new keystore
//! cargo run --bin wallet --features cli -- generate --keystore wallet.json --password "hunter2"
//!
//! # Show the address stored in a keystore (no password needed)
//! cargo run --bin wallet --features cli -- address --keystore wallet.json
//!
//! # Check a password without printing anything secret
//! cargo run --bin wallet --features cli -- verify-password --keystore wallet.json --password "hunter2"
//!
//! # Transfer 100000 native units
//! cargo run --bin wallet --features cli -- transfer --keystore wallet.json --password "hunter2" \
//!     --to 0x00000000000000000000000000000000000000bb --amount 100000 --rpc-url http://127.0.0.1:8545
//! ```
//!
//! The password may also be supplied through the `WALLET_PASSWORD` environment variable.

#[cfg(feature = "cli")]
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use ledger_wallet_libs::{
    authority::HttpSettlementAuthority,
    data_structures::{types::parse_amount, TokenId},
    signing::{DraftBuilder, SigningCoordinator},
    wallet::{Wallet, WalletBuilder},
    Address, FeePolicy, Keystore, KeystoreRecord, WalletConfig, WalletError, WalletResult,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(author, version, about = "Ledger wallet keystore and transfer tool", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Command {
    /// Generate a fresh key and write it to an encrypted keystore
    Generate {
        #[arg(short, long, help = "Keystore file to create")]
        keystore: PathBuf,

        #[arg(short, long, env = "WALLET_PASSWORD", help = "Keystore password")]
        password: String,

        #[arg(long, help = "Overwrite an existing keystore file")]
        force: bool,
    },

    /// Print the address recorded in a keystore
    Address {
        #[arg(short, long, help = "Keystore file")]
        keystore: PathBuf,
    },

    /// Check a keystore password
    VerifyPassword {
        #[arg(short, long, help = "Keystore file")]
        keystore: PathBuf,

        #[arg(short, long, env = "WALLET_PASSWORD", help = "Keystore password")]
        password: String,
    },

    /// Build, sign and submit a transfer
    Transfer {
        #[arg(short, long, help = "Keystore file")]
        keystore: PathBuf,

        #[arg(short, long, env = "WALLET_PASSWORD", help = "Keystore password")]
        password: String,

        #[arg(long, help = "Recipient address (0x-prefixed hex)")]
        to: String,

        #[arg(long, help = "Amount in base units (decimal)")]
        amount: String,

        #[arg(long, help = "Token identifier (hex). Omit for the native unit")]
        token: Option<String>,

        #[arg(long, help = "Flat fee in base units. Omit to let the authority compute fees")]
        fee: Option<String>,

        #[arg(
            long,
            default_value = "http://127.0.0.1:8545",
            help = "Settlement authority JSON-RPC endpoint"
        )]
        rpc_url: String,

        #[arg(long, default_value = "30", help = "Request timeout in seconds")]
        timeout: u64,
    },
}

#[cfg(feature = "cli")]
fn invalid_argument(name: &str, error: impl std::fmt::Display) -> WalletError {
    WalletError::ConfigurationError(format!("invalid --{name}: {error}"))
}

#[cfg(feature = "cli")]
fn unlock(keystore: &Path, password: &str) -> WalletResult<Wallet> {
    let record = KeystoreRecord::load(keystore)?;
    WalletBuilder::new().from_keystore(record, password).build()
}

#[cfg(feature = "cli")]
fn generate(keystore: PathBuf, password: String, force: bool) -> WalletResult<()> {
    if keystore.exists() && !force {
        return Err(WalletError::ConfigurationError(format!(
            "{} already exists (use --force to overwrite)",
            keystore.display()
        )));
    }
    if password.is_empty() {
        return Err(invalid_argument("password", "must not be empty"));
    }

    let wallet = WalletBuilder::new().generate().build()?;
    let record = Keystore::default().create(&wallet, &password)?;
    record.save(&keystore)?;

    println!("Created keystore {}", keystore.display());
    println!("Address: {}", wallet.address());
    Ok(())
}

#[cfg(feature = "cli")]
async fn transfer(
    wallet: Wallet,
    to: String,
    amount: String,
    token: Option<String>,
    fee: Option<String>,
    rpc_url: String,
    timeout: u64,
) -> WalletResult<()> {
    let to: Address = to.parse().map_err(|e| invalid_argument("to", e))?;
    let amount = parse_amount(&amount).map_err(|e| invalid_argument("amount", e))?;
    let token_id = token
        .map(|t| t.parse::<TokenId>())
        .transpose()
        .map_err(|e| invalid_argument("token", e))?;
    let fee_policy = match fee {
        Some(fee) => FeePolicy::Flat(parse_amount(&fee).map_err(|e| invalid_argument("fee", e))?),
        None => FeePolicy::Zero,
    };

    let config = WalletConfig::new(rpc_url)
        .with_request_timeout(Duration::from_secs(timeout))
        .with_fee_policy(fee_policy);
    let authority = Arc::new(HttpSettlementAuthority::from_config(&config)?);

    let draft = DraftBuilder::new(authority.clone(), &config)
        .build_transfer(wallet.address(), to, amount, token_id)
        .await?;
    println!(
        "Draft: {} input(s), {} output(s), fee {}",
        draft.inputs().len(),
        draft.outputs().len(),
        draft.fee()
    );

    let coordinator = SigningCoordinator::new(authority, &config);
    let (_, result) = coordinator.sign_and_submit(draft, &wallet).await?;
    println!("Submitted: {}", result.tx_hash);
    Ok(())
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> WalletResult<()> {
    tracing_subscriber::fmt::init();

    let args = CliArgs::parse();

    match args.command {
        Command::Generate {
            keystore,
            password,
            force,
        } => generate(keystore, password, force),
        Command::Address { keystore } => {
            let record = KeystoreRecord::load(&keystore)?;
            println!("{}", record.address);
            Ok(())
        }
        Command::VerifyPassword { keystore, password } => {
            let record = KeystoreRecord::load(&keystore)?;
            if Keystore::default().verify_password(&record, &password) {
                println!("Password OK");
                Ok(())
            } else {
                eprintln!("Wrong password");
                std::process::exit(1);
            }
        }
        Command::Transfer {
            keystore,
            password,
            to,
            amount,
            token,
            fee,
            rpc_url,
            timeout,
        } => {
            let wallet = unlock(&keystore, &password)?;
            transfer(wallet, to, amount, token, fee, rpc_url, timeout).await
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("This binary requires the 'cli' feature to be enabled.");
    eprintln!("Run with: cargo run --bin wallet --features cli");
    std::process::exit(1);
}
