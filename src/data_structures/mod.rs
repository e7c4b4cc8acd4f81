//! Ledger data structures: primitive types, UTXO snapshots, locking conditions and outputs

pub mod locking_condition;
pub mod locking_wire;
pub mod transaction_output;
pub mod types;
pub mod utxo;

pub use locking_condition::{default_single_key, LockingCondition, OperationTag, SignatureAlgorithm};
pub use transaction_output::{AssetContent, AssetKind, TransactionOutput};
pub use types::{Address, Amount, Hash256, TokenId};
pub use utxo::{Outpoint, Utxo};
