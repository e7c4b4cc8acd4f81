//! Error types for the wallet libraries
//!
//! Every fallible operation in the crate returns [`WalletResult`]. Sub-domain
//! errors (keys, keystore, locking-condition validation, serialization) are
//! their own enums and convert into [`WalletError`] with `?`.

use thiserror::Error;

use crate::data_structures::types::{Address, Amount};

/// Result type used throughout the crate
pub type WalletResult<T> = Result<T, WalletError>;

/// Top level error for every wallet operation
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Key management error: {0}")]
    KeyManagementError(#[from] KeyManagementError),

    #[error("Keystore error: {0}")]
    KeystoreError(#[from] KeystoreError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerializationError),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Malformed response from settlement authority: {0}")]
    MalformedResponse(String),

    #[error("Transaction {tx_hash} rejected by the ledger: {reason}")]
    Rejected { tx_hash: String, reason: String },

    #[error("Settlement authority returned error {code}: {message}")]
    AuthorityError { code: i64, message: String },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Invalid signing state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl WalletError {
    /// Errors from the remote authority are never retried by this crate;
    /// a rejection additionally means the draft itself is dead.
    pub fn requires_new_draft(&self) -> bool {
        matches!(
            self,
            WalletError::Rejected { .. } | WalletError::InsufficientBalance { .. }
        )
    }

    pub fn malformed(field: &str) -> Self {
        WalletError::MalformedResponse(format!("missing or invalid field `{field}`"))
    }
}

/// Key generation, import and signing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyManagementError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Random source failure: {0}")]
    RandomSourceFailure(String),
}

impl KeyManagementError {
    pub fn invalid_key(reason: &str) -> Self {
        KeyManagementError::InvalidKey(reason.to_string())
    }

    pub fn invalid_public_key(reason: &str) -> Self {
        KeyManagementError::InvalidPublicKey(reason.to_string())
    }
}

/// Encrypted-at-rest keystore errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeystoreError {
    #[error("Wrong password")]
    WrongPassword,

    #[error("Unsupported keystore: {0}")]
    UnsupportedVersion(String),

    #[error("Keystore corrupted: {0}")]
    Corrupted(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
}

/// Structural violations in locking conditions and draft requests
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Condition set is empty")]
    EmptyConditionSet,

    #[error("Contract {0} referenced more than once in the same condition set")]
    DuplicateContract(Address),

    #[error("Contract {0} locks back to itself through its dependencies")]
    ContractCycle(Address),

    #[error("Invalid threshold {threshold} for {total} keys")]
    InvalidThreshold { threshold: u32, total: usize },

    #[error("Declared {declared} parties but {actual} party keys were supplied")]
    PartyCountMismatch { declared: u32, actual: usize },

    #[error("Authorized key at index {index} is not a valid public key")]
    InvalidAuthorizedKey { index: usize },

    #[error("Duplicate authorized key at index {index}")]
    DuplicateAuthorizedKey { index: usize },

    #[error("Delegation must name at least one delegate")]
    EmptyDelegates,

    #[error("Required field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Contract dependency lookup failed for {address}: {reason}")]
    DependencyLookupFailed { address: Address, reason: String },
}

/// Encoding errors for hex, base58 and JSON payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("Hex decoding error: {0}")]
    HexDecodingError(String),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Base58 error: {0}")]
    Base58Error(String),

    #[error("JSON serialization error: {0}")]
    JsonSerializationError(String),

    #[error("JSON deserialization error: {0}")]
    JsonDeserializationError(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid outpoint: {0}")]
    InvalidOutpoint(String),
}

impl From<hex::FromHexError> for SerializationError {
    fn from(err: hex::FromHexError) -> Self {
        SerializationError::HexDecodingError(err.to_string())
    }
}

impl From<hex::FromHexError> for WalletError {
    fn from(err: hex::FromHexError) -> Self {
        WalletError::SerializationError(err.into())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::SerializationError(SerializationError::JsonDeserializationError(
            err.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_errors_convert_into_wallet_error() {
        let err: WalletError = KeystoreError::WrongPassword.into();
        assert!(matches!(
            err,
            WalletError::KeystoreError(KeystoreError::WrongPassword)
        ));

        let err: WalletError = KeyManagementError::invalid_key("zero scalar").into();
        assert!(err.to_string().contains("zero scalar"));
    }

    #[test]
    fn test_requires_new_draft() {
        let rejected = WalletError::Rejected {
            tx_hash: "0xabc".to_string(),
            reason: "input spent".to_string(),
        };
        assert!(rejected.requires_new_draft());
        assert!(!WalletError::TransportError("timeout".into()).requires_new_draft());
    }
}
