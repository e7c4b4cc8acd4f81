//! Wallet builder module providing a fluent API for wallet construction
//!
//! This module implements the builder pattern for creating wallets from fresh
//! entropy, an imported private key, or an encrypted keystore record. The
//! crypto provider is resolved once here and travels with the wallet.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::{
    crypto::{default_provider, CryptoProvider, PRIVATE_KEY_LEN},
    errors::{WalletError, WalletResult},
    key_management::{Keystore, KeystoreRecord},
    wallet::Wallet,
};

/// Wallet creation methods supported by the builder
enum WalletCreationMethod {
    /// Generate a new wallet with random entropy
    Generate,
    /// Import a raw 32-byte private key
    FromPrivateKey(Zeroizing<[u8; PRIVATE_KEY_LEN]>),
    /// Import a hex-encoded private key
    FromPrivateKeyHex(Zeroizing<String>),
    /// Decrypt a keystore record
    FromKeystore {
        record: Box<KeystoreRecord>,
        password: Zeroizing<String>,
    },
}

/// Builder for creating wallets
///
/// # Examples
///
/// ## Fresh wallet
///
/// ```rust,no_run
/// use ledger_wallet_libs::wallet::WalletBuilder;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let wallet = WalletBuilder::new().generate().build()?;
/// println!("{}", wallet.address());
/// # Ok(())
/// # }
/// ```
///
/// ## Wallet from a keystore file
///
/// ```rust,no_run
/// use ledger_wallet_libs::{key_management::KeystoreRecord, wallet::WalletBuilder};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let record = KeystoreRecord::load("wallet.json")?;
/// let wallet = WalletBuilder::new()
///     .from_keystore(record, "password")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct WalletBuilder {
    creation_method: Option<WalletCreationMethod>,
    provider: Option<Arc<dyn CryptoProvider>>,
}

impl WalletBuilder {
    /// Create a new wallet builder
    ///
    /// One of the creation methods (generate, from_private_key, etc.) must be
    /// called before building the wallet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the builder to generate a new wallet with random entropy
    pub fn generate(mut self) -> Self {
        self.creation_method = Some(WalletCreationMethod::Generate);
        self
    }

    /// Configure the builder to import a raw private key
    ///
    /// # Arguments
    ///
    /// * `private_key` - The 32-byte secp256k1 scalar
    pub fn from_private_key(mut self, private_key: [u8; PRIVATE_KEY_LEN]) -> Self {
        self.creation_method = Some(WalletCreationMethod::FromPrivateKey(Zeroizing::new(
            private_key,
        )));
        self
    }

    /// Configure the builder to import a hex private key, with or without `0x`
    pub fn from_private_key_hex<S: Into<String>>(mut self, private_key_hex: S) -> Self {
        self.creation_method = Some(WalletCreationMethod::FromPrivateKeyHex(Zeroizing::new(
            private_key_hex.into(),
        )));
        self
    }

    /// Configure the builder to decrypt a keystore record
    ///
    /// # Arguments
    ///
    /// * `record` - The parsed keystore JSON
    /// * `password` - Password the record was created with
    pub fn from_keystore<S: Into<String>>(mut self, record: KeystoreRecord, password: S) -> Self {
        self.creation_method = Some(WalletCreationMethod::FromKeystore {
            record: Box::new(record),
            password: Zeroizing::new(password.into()),
        });
        self
    }

    /// Use a specific crypto provider instead of the default secp256k1 one
    pub fn with_crypto_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the wallet
    ///
    /// # Errors
    ///
    /// * `ConfigurationError` - If no creation method was specified
    /// * `KeyManagementError` - If the key is invalid or entropy fails
    /// * `KeystoreError` - If the keystore cannot be decrypted
    pub fn build(self) -> WalletResult<Wallet> {
        let creation_method = self.creation_method.ok_or_else(|| {
            WalletError::ConfigurationError(
                "missing creation method (call generate, from_private_key, etc.)".to_string(),
            )
        })?;
        let provider = self.provider.unwrap_or_else(default_provider);

        match creation_method {
            WalletCreationMethod::Generate => Wallet::generate_with_provider(provider),
            WalletCreationMethod::FromPrivateKey(private_key) => {
                Wallet::from_private_key_with_provider(*private_key, provider)
            }
            WalletCreationMethod::FromPrivateKeyHex(private_key_hex) => {
                let wallet = Wallet::from_private_key_hex(&private_key_hex)?;
                Wallet::from_private_key_with_provider(*wallet.private_key_bytes(), provider)
            }
            WalletCreationMethod::FromKeystore { record, password } => {
                Keystore::new(provider).recover(&record, &password)
            }
        }
    }
}
