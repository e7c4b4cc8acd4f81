//! Wallet configuration
//!
//! [`WalletConfig`] gathers the knobs shared by the draft builder, the signing
//! coordinator and the settlement authority adapters. It works the same in
//! library integrations and in the command-line binary.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    data_structures::types::{amount_serde, Amount},
    errors::{WalletError, WalletResult},
    signing::models::SighashType,
};

/// How the draft builder reserves a fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "snake_case")]
pub enum FeePolicy {
    /// No fee reserved locally; the settlement authority prices the transaction
    #[default]
    Zero,
    /// Fixed absolute fee added to the selection target
    Flat(#[serde(with = "amount_serde")] Amount),
}

impl FeePolicy {
    pub fn fee(&self) -> Amount {
        match self {
            FeePolicy::Zero => Amount::zero(),
            FeePolicy::Flat(amount) => *amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletConfig {
    /// JSON-RPC endpoint of the settlement authority
    pub rpc_url: String,
    /// Per-request timeout for authority calls
    pub request_timeout: Duration,
    /// Sighash type sent with hash and finalize requests
    pub sighash_type: SighashType,
    /// Input index whose signature hash is requested
    pub input_index: u32,
    pub fee_policy: FeePolicy,
    /// Addresses per batch in multi-address UTXO queries
    pub batch_size: usize,
    /// Concurrent authority requests within a batch
    pub max_concurrency: usize,
    /// Lifetime of cached `getUTXO` responses
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    /// Accept contract locks whose dependencies loop back to themselves
    pub allow_contract_cycles: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            request_timeout: Duration::from_secs(30),
            sighash_type: SighashType::All,
            input_index: 0,
            fee_policy: FeePolicy::Zero,
            batch_size: 10,
            max_concurrency: 4,
            cache_ttl: Duration::from_secs(15),
            cache_max_entries: 1_000,
            allow_contract_cycles: false,
        }
    }
}

impl WalletConfig {
    pub fn new<S: Into<String>>(rpc_url: S) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            ..Self::default()
        }
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_sighash_type(mut self, sighash_type: SighashType) -> Self {
        self.sighash_type = sighash_type;
        self
    }

    pub fn with_input_index(mut self, input_index: u32) -> Self {
        self.input_index = input_index;
        self
    }

    pub fn with_fee_policy(mut self, fee_policy: FeePolicy) -> Self {
        self.fee_policy = fee_policy;
        self
    }

    /// Set batch size for multi-address queries
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set cache lifetime and capacity
    pub fn with_cache(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.cache_ttl = ttl;
        self.cache_max_entries = max_entries;
        self
    }

    pub fn with_allow_contract_cycles(mut self, allow: bool) -> Self {
        self.allow_contract_cycles = allow;
        self
    }

    /// Reject settings no component can run with
    pub fn validate(&self) -> WalletResult<()> {
        let invalid = |msg: &str| Err(WalletError::ConfigurationError(msg.to_string()));

        if self.rpc_url.trim().is_empty() {
            return invalid("rpc_url must not be empty");
        }
        let url = Url::parse(&self.rpc_url).map_err(|e| {
            WalletError::ConfigurationError(format!("rpc_url `{}` is not a valid URL: {e}", self.rpc_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return invalid("rpc_url must be an http(s) URL");
        }
        if url.host_str().map_or(true, str::is_empty) {
            return invalid("rpc_url must name a host");
        }
        if self.request_timeout.is_zero() {
            return invalid("request_timeout must be greater than zero");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be greater than zero");
        }
        if self.max_concurrency == 0 {
            return invalid("max_concurrency must be greater than zero");
        }
        if self.cache_max_entries == 0 {
            return invalid("cache_max_entries must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = WalletConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fee_policy, FeePolicy::Zero);
        assert_eq!(config.sighash_type, SighashType::All);
        assert_eq!(config.input_index, 0);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let bad = [
            WalletConfig::new(""),
            WalletConfig::new("ftp://node"),
            WalletConfig::new("http://"),
            WalletConfig::new("https://:8545"),
            WalletConfig::new("127.0.0.1:8545"),
            WalletConfig::new("not a url"),
            WalletConfig::default().with_batch_size(0),
            WalletConfig::default().with_max_concurrency(0),
            WalletConfig::default().with_request_timeout(Duration::ZERO),
            WalletConfig::default().with_cache(Duration::from_secs(1), 0),
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(WalletError::ConfigurationError(_))
            ));
        }
    }

    #[test]
    fn test_validate_accepts_http_and_https_endpoints() {
        for url in ["http://node:8545", "https://rpc.example.org/v1", "http://[::1]:8545"] {
            assert!(WalletConfig::new(url).validate().is_ok(), "{url}");
        }
    }

    #[test]
    fn test_fee_policy() {
        assert_eq!(FeePolicy::Zero.fee(), Amount::zero());
        assert_eq!(FeePolicy::Flat(Amount::from(25u64)).fee(), Amount::from(25u64));
        let value = serde_json::to_value(FeePolicy::Flat(Amount::from(25u64))).unwrap();
        assert_eq!(value["type"], "flat");
        assert_eq!(value["amount"], "25");
    }
}
