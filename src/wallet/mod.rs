//! Process-lifetime signing wallet
//!
//! A [`Wallet`] holds one secp256k1 private key together with its public key
//! and derived address. The private key is zeroized on drop and is only ever
//! written out through [`crate::key_management::Keystore`].

pub mod builder;

pub use builder::WalletBuilder;

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use zeroize::Zeroizing;

use crate::{
    crypto::{
        default_provider, CryptoProvider, COMPRESSED_PUBLIC_KEY_LEN, PRIVATE_KEY_LEN, SIGNATURE_LEN,
    },
    data_structures::types::Address,
    errors::{KeyManagementError, WalletResult},
    hex_utils,
    key_management::{compress_public_key, derive_address, message_digest},
};

/// Upper bound on rejection sampling before the random source is considered broken
const MAX_KEYGEN_ATTEMPTS: usize = 64;

#[derive(Clone)]
pub struct Wallet {
    private_key: Zeroizing<[u8; PRIVATE_KEY_LEN]>,
    public_key: Vec<u8>,
    address: Address,
    provider: Arc<dyn CryptoProvider>,
}

impl Wallet {
    /// Generate a fresh wallet with the production crypto provider
    pub fn generate() -> WalletResult<Self> {
        Self::generate_with_provider(default_provider())
    }

    /// Draw 32 random bytes until they form a valid secp256k1 scalar
    pub fn generate_with_provider(provider: Arc<dyn CryptoProvider>) -> WalletResult<Self> {
        let mut candidate = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            provider.random_bytes(&mut candidate[..])?;
            if provider.is_valid_private_key(&candidate) {
                return Self::from_private_key_with_provider(*candidate, provider);
            }
        }
        Err(KeyManagementError::RandomSourceFailure(format!(
            "no valid scalar after {MAX_KEYGEN_ATTEMPTS} attempts"
        ))
        .into())
    }

    pub fn from_private_key(private_key: [u8; PRIVATE_KEY_LEN]) -> WalletResult<Self> {
        Self::from_private_key_with_provider(private_key, default_provider())
    }

    /// Import a raw key; rejects zero and out-of-range scalars with `InvalidKey`
    pub fn from_private_key_with_provider(
        private_key: [u8; PRIVATE_KEY_LEN],
        provider: Arc<dyn CryptoProvider>,
    ) -> WalletResult<Self> {
        let private_key = Zeroizing::new(private_key);
        if !provider.is_valid_private_key(&private_key) {
            return Err(KeyManagementError::invalid_key(
                "scalar is zero or not below the secp256k1 group order",
            )
            .into());
        }
        let public_key = provider.public_key(&private_key, false)?;
        let address = derive_address(provider.as_ref(), &public_key)?;

        Ok(Self {
            private_key,
            public_key,
            address,
            provider,
        })
    }

    /// Import a hex private key (with or without `0x`)
    pub fn from_private_key_hex(private_key_hex: &str) -> WalletResult<Self> {
        let bytes = Zeroizing::new(
            hex_utils::decode_hex(private_key_hex)
                .map_err(|_| KeyManagementError::invalid_key("private key is not valid hex"))?,
        );
        let private_key: [u8; PRIVATE_KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            KeyManagementError::InvalidKey(format!(
                "private key must be {PRIVATE_KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Self::from_private_key(private_key)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Base58 form of the address, as expected by `getUTXO`
    pub fn address_base58(&self) -> String {
        self.address.to_base58()
    }

    /// 65-byte uncompressed SEC1 public key
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn public_key_uncompressed(&self) -> &[u8] {
        self.public_key()
    }

    /// 33-byte compressed key sent across RPC boundaries
    pub fn public_key_compressed(&self) -> WalletResult<[u8; COMPRESSED_PUBLIC_KEY_LEN]> {
        Ok(compress_public_key(&self.public_key)?)
    }

    pub fn crypto_provider(&self) -> &Arc<dyn CryptoProvider> {
        &self.provider
    }

    /// Sign an already hashed 32-byte digest; returns compact `r || s`.
    ///
    /// The digest is signed as-is. Callers hash arbitrary data first (see
    /// [`Wallet::sign_message`]) so the bytes signed match what the settlement
    /// authority hashed.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> WalletResult<[u8; SIGNATURE_LEN]> {
        Ok(self.provider.sign_prehash(&self.private_key, digest)?)
    }

    /// SHA-256 the message, then sign the digest
    pub fn sign_message(&self, message: &[u8]) -> WalletResult<([u8; 32], [u8; SIGNATURE_LEN])> {
        let digest = message_digest(self.provider.as_ref(), message);
        let signature = self.sign_digest(&digest)?;
        Ok((digest, signature))
    }

    pub fn verify_digest(&self, digest: &[u8; 32], signature: &[u8; SIGNATURE_LEN]) -> bool {
        self.provider
            .verify_prehash(&self.public_key, digest, signature)
    }

    pub(crate) fn private_key_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.private_key
    }
}

impl PartialEq for Wallet {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.private_key[..] == other.private_key[..]
    }
}

impl Eq for Wallet {}

impl Debug for Wallet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("public_key", &hex::encode(&self.public_key))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        crypto::{Secp256k1Provider, GCM_IV_LEN, UNCOMPRESSED_PUBLIC_KEY_LEN},
        errors::{KeystoreError, WalletError},
    };

    /// Production provider with a scripted random source
    #[derive(Debug)]
    struct ScriptedEntropy {
        draws: Mutex<Vec<[u8; 32]>>,
        inner: Secp256k1Provider,
    }

    impl CryptoProvider for ScriptedEntropy {
        fn random_bytes(&self, out: &mut [u8]) -> Result<(), KeyManagementError> {
            let next = self.draws.lock().unwrap().remove(0);
            out.copy_from_slice(&next[..out.len()]);
            Ok(())
        }
        fn is_valid_private_key(&self, k: &[u8; 32]) -> bool {
            self.inner.is_valid_private_key(k)
        }
        fn public_key(&self, k: &[u8; 32], c: bool) -> Result<Vec<u8>, KeyManagementError> {
            self.inner.public_key(k, c)
        }
        fn decompress_public_key(
            &self,
            k: &[u8],
        ) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_LEN], KeyManagementError> {
            self.inner.decompress_public_key(k)
        }
        fn sign_prehash(&self, k: &[u8; 32], d: &[u8; 32]) -> Result<[u8; 64], KeyManagementError> {
            self.inner.sign_prehash(k, d)
        }
        fn verify_prehash(&self, k: &[u8], d: &[u8; 32], s: &[u8; 64]) -> bool {
            self.inner.verify_prehash(k, d, s)
        }
        fn keccak256(&self, data: &[u8]) -> [u8; 32] {
            self.inner.keccak256(data)
        }
        fn sha256(&self, data: &[u8]) -> [u8; 32] {
            self.inner.sha256(data)
        }
        fn pbkdf2_sha256(&self, p: &[u8], s: &[u8], i: u32, out: &mut [u8]) {
            self.inner.pbkdf2_sha256(p, s, i, out)
        }
        fn hmac_sha256(&self, k: &[u8], d: &[u8]) -> Result<[u8; 32], KeystoreError> {
            self.inner.hmac_sha256(k, d)
        }
        fn verify_hmac_sha256(&self, k: &[u8], d: &[u8], e: &[u8]) -> bool {
            self.inner.verify_hmac_sha256(k, d, e)
        }
        fn aes_gcm_encrypt(&self, k: &[u8; 32], iv: &[u8; GCM_IV_LEN], p: &[u8]) -> Result<Vec<u8>, KeystoreError> {
            self.inner.aes_gcm_encrypt(k, iv, p)
        }
        fn aes_gcm_decrypt(&self, k: &[u8; 32], iv: &[u8; GCM_IV_LEN], c: &[u8]) -> Result<Vec<u8>, KeystoreError> {
            self.inner.aes_gcm_decrypt(k, iv, c)
        }
    }

    #[test]
    fn test_generate_retries_invalid_scalars() {
        let valid = [0x42u8; 32];
        let provider = Arc::new(ScriptedEntropy {
            draws: Mutex::new(vec![[0u8; 32], [0xFF; 32], valid]),
            inner: Secp256k1Provider,
        });
        let wallet = Wallet::generate_with_provider(provider.clone()).unwrap();
        assert_eq!(wallet.private_key_bytes(), &valid);
        assert!(provider.draws.lock().unwrap().is_empty());
    }

    #[test]
    fn test_from_private_key_rejects_out_of_range() {
        for bad in [[0u8; 32], [0xFF; 32]] {
            let err = Wallet::from_private_key(bad).unwrap_err();
            assert!(matches!(
                err,
                WalletError::KeyManagementError(KeyManagementError::InvalidKey(_))
            ));
        }
        assert!(Wallet::from_private_key_hex("0x1234").is_err());
        assert!(Wallet::from_private_key_hex("zz").is_err());
    }

    #[test]
    fn test_generated_wallets_are_distinct_and_consistent() {
        let a = Wallet::generate().unwrap();
        let b = Wallet::generate().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.public_key().len(), 65);
        assert_eq!(a.public_key_compressed().unwrap().len(), 33);
        let derived = derive_address(a.crypto_provider().as_ref(), &a.public_key_compressed().unwrap()).unwrap();
        assert_eq!(derived, a.address());
    }

    #[test]
    fn test_sign_message_verifies() {
        let wallet = Wallet::from_private_key([0x33; 32]).unwrap();
        let (digest, signature) = wallet.sign_message(b"hello").unwrap();
        assert!(wallet.verify_digest(&digest, &signature));
        assert_eq!(wallet.sign_digest(&digest).unwrap(), signature);
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let wallet = Wallet::from_private_key([0x33; 32]).unwrap();
        let rendered = format!("{wallet:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&hex::encode([0x33u8; 32])));
    }
}
