//! Password-encrypted keystore records
//!
//! A record stores one private key encrypted with AES-256-GCM under a key
//! derived from the password with PBKDF2-HMAC-SHA256. An HMAC-SHA256 over the
//! ciphertext, keyed with the derived key, is checked before any decryption so
//! a wrong password is reported as [`KeystoreError::WrongPassword`] and never
//! reaches the cipher.
//!
//! ```json
//! {
//!   "version": 3,
//!   "crypto": {
//!     "kdf": "pbkdf2",
//!     "kdfparams": { "c": 262144, "dklen": 32, "prf": "hmac-sha256", "salt": "…" },
//!     "cipher": "aes-256-gcm",
//!     "ciphertext": "…",
//!     "iv": "…",
//!     "mac": "…"
//!   },
//!   "address": "0x…"
//! }
//! ```

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::{
    crypto::{default_provider, CryptoProvider, GCM_IV_LEN, PRIVATE_KEY_LEN},
    data_structures::types::Address,
    errors::{KeystoreError, SerializationError, WalletError, WalletResult},
    hex_utils,
    wallet::Wallet,
};

pub const KEYSTORE_VERSION: u32 = 3;
pub const KDF_NAME: &str = "pbkdf2";
pub const KDF_PRF: &str = "hmac-sha256";
pub const CIPHER_NAME: &str = "aes-256-gcm";
/// 2^18 PBKDF2 rounds, written into every record and the lowest count accepted on read
pub const KDF_ITERATIONS: u32 = 1 << 18;
/// Highest round count accepted from a record (2^22)
pub const KDF_MAX_ITERATIONS: u32 = 1 << 22;
pub const DERIVED_KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub c: u32,
    pub dklen: usize,
    pub prf: String,
    pub salt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreCrypto {
    pub kdf: String,
    pub kdfparams: KdfParams,
    pub cipher: String,
    pub ciphertext: String,
    pub iv: String,
    pub mac: String,
}

/// Serialized keystore file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreRecord {
    pub version: u32,
    pub crypto: KeystoreCrypto,
    pub address: Address,
}

impl KeystoreRecord {
    pub fn to_json(&self) -> WalletResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            WalletError::SerializationError(SerializationError::JsonSerializationError(
                e.to_string(),
            ))
        })
    }

    pub fn from_json(json: &str) -> WalletResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> WalletResult<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json).map_err(|e| {
            WalletError::ConfigurationError(format!(
                "cannot write keystore {}: {e}",
                path.as_ref().display()
            ))
        })
    }

    pub fn load(path: impl AsRef<Path>) -> WalletResult<Self> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WalletError::ConfigurationError(format!(
                "cannot read keystore {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json(&json)
    }

    /// Reject anything other than the single supported parameter set.
    ///
    /// `min_iterations` is the floor for the stored round count; the ceiling
    /// is always [`KDF_MAX_ITERATIONS`].
    fn check_supported(&self, min_iterations: u32) -> Result<(), KeystoreError> {
        let crypto = &self.crypto;
        let unsupported = |what: String| Err(KeystoreError::UnsupportedVersion(what));

        if self.version != KEYSTORE_VERSION {
            return unsupported(format!("version {}", self.version));
        }
        if crypto.kdf != KDF_NAME {
            return unsupported(format!("kdf `{}`", crypto.kdf));
        }
        if crypto.kdfparams.prf != KDF_PRF {
            return unsupported(format!("prf `{}`", crypto.kdfparams.prf));
        }
        if crypto.kdfparams.dklen != DERIVED_KEY_LEN {
            return unsupported(format!("dklen {}", crypto.kdfparams.dklen));
        }
        if crypto.cipher != CIPHER_NAME {
            return unsupported(format!("cipher `{}`", crypto.cipher));
        }
        let c = crypto.kdfparams.c;
        if c < min_iterations || c > KDF_MAX_ITERATIONS {
            return unsupported(format!(
                "kdf round count {c} (accepted {min_iterations}..={KDF_MAX_ITERATIONS})"
            ));
        }
        Ok(())
    }
}

/// Decoded binary fields of a record
struct DecodedCrypto {
    salt: Vec<u8>,
    iv: [u8; GCM_IV_LEN],
    ciphertext: Vec<u8>,
    mac: Vec<u8>,
}

fn corrupted(field: &str) -> KeystoreError {
    KeystoreError::Corrupted(format!("field `{field}` is not valid"))
}

impl DecodedCrypto {
    fn from_record(crypto: &KeystoreCrypto) -> Result<Self, KeystoreError> {
        let salt = hex_utils::decode_hex(&crypto.kdfparams.salt).map_err(|_| corrupted("salt"))?;
        let iv = hex_utils::decode_hex_array::<GCM_IV_LEN>(&crypto.iv).map_err(|_| corrupted("iv"))?;
        let ciphertext =
            hex_utils::decode_hex(&crypto.ciphertext).map_err(|_| corrupted("ciphertext"))?;
        let mac = hex_utils::decode_hex(&crypto.mac).map_err(|_| corrupted("mac"))?;
        if salt.is_empty() {
            return Err(corrupted("salt"));
        }
        Ok(Self {
            salt,
            iv,
            ciphertext,
            mac,
        })
    }
}

/// Encrypts and recovers wallets with a password
#[derive(Debug, Clone)]
pub struct Keystore {
    provider: Arc<dyn CryptoProvider>,
    iterations: u32,
}

impl Default for Keystore {
    fn default() -> Self {
        Self::new(default_provider())
    }
}

impl Keystore {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self {
            provider,
            iterations: KDF_ITERATIONS,
        }
    }

    /// Lower the round count for unit tests. Records it writes are only
    /// readable by a keystore with the same or a lower count.
    #[cfg(test)]
    pub(crate) fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    fn derive_key(&self, password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; DERIVED_KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
        self.provider
            .pbkdf2_sha256(password.as_bytes(), salt, iterations, &mut key[..]);
        key
    }

    /// Encrypt `wallet`'s private key under `password`
    pub fn create(&self, wallet: &Wallet, password: &str) -> WalletResult<KeystoreRecord> {
        let mut salt = [0u8; SALT_LEN];
        self.provider.random_bytes(&mut salt)?;
        let mut iv = [0u8; GCM_IV_LEN];
        self.provider.random_bytes(&mut iv)?;

        let key = self.derive_key(password, &salt, self.iterations);
        let ciphertext = self
            .provider
            .aes_gcm_encrypt(&key, &iv, wallet.private_key_bytes())?;
        let mac = self.provider.hmac_sha256(&key[..], &ciphertext)?;

        debug!(address = %wallet.address(), iterations = self.iterations, "Created keystore record");

        Ok(KeystoreRecord {
            version: KEYSTORE_VERSION,
            crypto: KeystoreCrypto {
                kdf: KDF_NAME.to_string(),
                kdfparams: KdfParams {
                    c: self.iterations,
                    dklen: DERIVED_KEY_LEN,
                    prf: KDF_PRF.to_string(),
                    salt: hex::encode(salt),
                },
                cipher: CIPHER_NAME.to_string(),
                ciphertext: hex::encode(&ciphertext),
                iv: hex::encode(iv),
                mac: hex::encode(mac),
            },
            address: wallet.address(),
        })
    }

    /// Decrypt the record and rebuild the wallet it holds.
    ///
    /// Derivation uses the round count stored in the record.
    pub fn recover(&self, record: &KeystoreRecord, password: &str) -> WalletResult<Wallet> {
        record.check_supported(self.iterations)?;
        let decoded = DecodedCrypto::from_record(&record.crypto)?;
        let key = self.derive_key(password, &decoded.salt, record.crypto.kdfparams.c);

        if !self
            .provider
            .verify_hmac_sha256(&key[..], &decoded.ciphertext, &decoded.mac)
        {
            return Err(KeystoreError::WrongPassword.into());
        }

        let plaintext = Zeroizing::new(self.provider.aes_gcm_decrypt(
            &key,
            &decoded.iv,
            &decoded.ciphertext,
        )?);
        let private_key: [u8; PRIVATE_KEY_LEN] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| KeystoreError::Corrupted("decrypted key has the wrong length".to_string()))?;

        let wallet = Wallet::from_private_key_with_provider(private_key, self.provider.clone())
            .map_err(|_| KeystoreError::Corrupted("decrypted key is not a valid scalar".to_string()))?;

        if wallet.address() != record.address {
            warn!(
                stored = %record.address,
                derived = %wallet.address(),
                "Keystore address does not match decrypted key"
            );
            return Err(KeystoreError::Corrupted("address mismatch".to_string()).into());
        }

        Ok(wallet)
    }

    /// True when [`Keystore::recover`] succeeds for this password
    pub fn verify_password(&self, record: &KeystoreRecord, password: &str) -> bool {
        match self.recover(record, password) {
            Ok(_) => true,
            Err(e) => {
                debug!(address = %record.address, error = %e, "Keystore password check failed");
                false
            }
        }
    }
}
