//! Wallet libraries for UTXO ledgers
//!
//! This crate provides the client-side core of a UTXO wallet: locking
//! conditions and their validation, coin selection and draft construction,
//! the two-phase signing protocol against a settlement authority, and
//! encrypted key storage.
//!
//! ## Features
//!
//! This crate provides several optional features:
//!
//! - `http`: JSON-RPC settlement authority over HTTP (enabled by default)
//! - `cli`: the `wallet` command line binary
//!
//! ### HTTP Feature
//!
//! The `http` feature enables [`authority::HttpSettlementAuthority`]. Without
//! it, callers supply their own [`authority::SettlementAuthority`]
//! implementation or use the in-crate mock.
//!
//! Enable the binary in your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! ledger_wallet_libs = { version = "0.2", features = ["cli"] }
//! ```

pub mod authority;
pub mod config;
pub mod crypto;
pub mod data_structures;
pub mod errors;
pub mod hex_utils;
pub mod key_management;
pub mod signing;
pub mod utils;
pub mod validation;
pub mod wallet;

pub use authority::SettlementAuthority;
pub use config::{FeePolicy, WalletConfig};
pub use data_structures::{Address, Amount, LockingCondition, Outpoint, Utxo};
pub use errors::*;
pub use hex_utils::*;
pub use key_management::*;
pub use signing::{DraftBuilder, SigningCoordinator, SigningState, TransactionDraft};
pub use validation::*;
pub use wallet::*;
