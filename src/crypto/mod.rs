//! Cryptographic capabilities used by the key subsystem
//!
//! Wallets and keystores receive a [`CryptoProvider`] when they are built and
//! keep it for their lifetime; business logic never picks primitives itself.
//! [`Secp256k1Provider`] is the production implementation on top of the
//! RustCrypto crates and `tiny-keccak`.

use std::{fmt::Debug, sync::Arc};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use digest::Digest;
use hmac::{Hmac, Mac};
use k256::{
    ecdsa::{
        signature::hazmat::{PrehashSigner, PrehashVerifier},
        Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey,
};
use rand::rngs::OsRng;
use rand_core::RngCore;
use sha2::Sha256;
use tiny_keccak::{Hasher, Keccak};

use crate::errors::{KeyManagementError, KeystoreError};

pub const PRIVATE_KEY_LEN: usize = 32;
pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;
pub const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;
pub const SIGNATURE_LEN: usize = 64;
pub const GCM_IV_LEN: usize = 12;

/// Capability interface over every primitive the wallet needs
pub trait CryptoProvider: Send + Sync + Debug {
    /// Fill `out` from a cryptographically secure source
    fn random_bytes(&self, out: &mut [u8]) -> Result<(), KeyManagementError>;

    /// Whether `private_key` is a valid secp256k1 scalar (non-zero, below the group order)
    fn is_valid_private_key(&self, private_key: &[u8; PRIVATE_KEY_LEN]) -> bool;

    /// SEC1 public key, 33 bytes when `compressed`, 65 otherwise
    fn public_key(
        &self,
        private_key: &[u8; PRIVATE_KEY_LEN],
        compressed: bool,
    ) -> Result<Vec<u8>, KeyManagementError>;

    /// Expand a 33- or 65-byte SEC1 key to its 65-byte uncompressed form
    fn decompress_public_key(
        &self,
        public_key: &[u8],
    ) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_LEN], KeyManagementError>;

    /// Deterministic (RFC 6979) low-S ECDSA over an already hashed 32-byte digest
    fn sign_prehash(
        &self,
        private_key: &[u8; PRIVATE_KEY_LEN],
        digest: &[u8; 32],
    ) -> Result<[u8; SIGNATURE_LEN], KeyManagementError>;

    fn verify_prehash(&self, public_key: &[u8], digest: &[u8; 32], signature: &[u8; SIGNATURE_LEN]) -> bool;

    fn keccak256(&self, data: &[u8]) -> [u8; 32];

    fn sha256(&self, data: &[u8]) -> [u8; 32];

    fn pbkdf2_sha256(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]);

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<[u8; 32], KeystoreError>;

    /// Constant-time MAC comparison
    fn verify_hmac_sha256(&self, key: &[u8], data: &[u8], expected: &[u8]) -> bool;

    /// AES-256-GCM without associated data; output is ciphertext followed by the tag
    fn aes_gcm_encrypt(
        &self,
        key: &[u8; 32],
        iv: &[u8; GCM_IV_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, KeystoreError>;

    fn aes_gcm_decrypt(
        &self,
        key: &[u8; 32],
        iv: &[u8; GCM_IV_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, KeystoreError>;
}

/// Production provider: k256, tiny-keccak, sha2, pbkdf2, hmac and aes-gcm
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Provider;

/// Shared handle to the production provider
pub fn default_provider() -> Arc<dyn CryptoProvider> {
    Arc::new(Secp256k1Provider)
}

fn signing_key(private_key: &[u8; PRIVATE_KEY_LEN]) -> Result<SigningKey, KeyManagementError> {
    SigningKey::from_slice(private_key).map_err(|_| {
        KeyManagementError::invalid_key("scalar is zero or not below the secp256k1 group order")
    })
}

impl CryptoProvider for Secp256k1Provider {
    fn random_bytes(&self, out: &mut [u8]) -> Result<(), KeyManagementError> {
        OsRng
            .try_fill_bytes(out)
            .map_err(|e| KeyManagementError::RandomSourceFailure(e.to_string()))
    }

    fn is_valid_private_key(&self, private_key: &[u8; PRIVATE_KEY_LEN]) -> bool {
        SigningKey::from_slice(private_key).is_ok()
    }

    fn public_key(
        &self,
        private_key: &[u8; PRIVATE_KEY_LEN],
        compressed: bool,
    ) -> Result<Vec<u8>, KeyManagementError> {
        let key = signing_key(private_key)?;
        Ok(key
            .verifying_key()
            .to_encoded_point(compressed)
            .as_bytes()
            .to_vec())
    }

    fn decompress_public_key(
        &self,
        public_key: &[u8],
    ) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_LEN], KeyManagementError> {
        let key = PublicKey::from_sec1_bytes(public_key)
            .map_err(|_| KeyManagementError::invalid_public_key("not a point on secp256k1"))?;
        let point = key.to_encoded_point(false);
        point
            .as_bytes()
            .try_into()
            .map_err(|_| KeyManagementError::invalid_public_key("unexpected encoded length"))
    }

    fn sign_prehash(
        &self,
        private_key: &[u8; PRIVATE_KEY_LEN],
        digest: &[u8; 32],
    ) -> Result<[u8; SIGNATURE_LEN], KeyManagementError> {
        let key = signing_key(private_key)?;
        let signature: Signature = key
            .sign_prehash(digest)
            .map_err(|e| KeyManagementError::SigningFailed(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);

        let mut out = [0u8; SIGNATURE_LEN];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }

    fn verify_prehash(&self, public_key: &[u8], digest: &[u8; 32], signature: &[u8; SIGNATURE_LEN]) -> bool {
        let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        key.verify_prehash(digest, &signature).is_ok()
    }

    fn keccak256(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = Keccak::v256();
        hasher.update(data);
        let mut out = [0u8; 32];
        hasher.finalize(&mut out);
        out
    }

    fn sha256(&self, data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }

    fn pbkdf2_sha256(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out);
    }

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<[u8; 32], KeystoreError> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
            .map_err(|e| KeystoreError::EncryptionFailed(e.to_string()))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().into())
    }

    fn verify_hmac_sha256(&self, key: &[u8], data: &[u8], expected: &[u8]) -> bool {
        let Ok(mut mac) = <Hmac<Sha256> as Mac>::new_from_slice(key) else {
            return false;
        };
        mac.update(data);
        mac.verify_slice(expected).is_ok()
    }

    fn aes_gcm_encrypt(
        &self,
        key: &[u8; 32],
        iv: &[u8; GCM_IV_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, KeystoreError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| KeystoreError::EncryptionFailed(e.to_string()))?;
        cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|e| KeystoreError::EncryptionFailed(e.to_string()))
    }

    fn aes_gcm_decrypt(
        &self,
        key: &[u8; 32],
        iv: &[u8; GCM_IV_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, KeystoreError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| KeystoreError::Corrupted(e.to_string()))?;
        cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| KeystoreError::Corrupted("authentication tag mismatch".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_known_vector() {
        let provider = Secp256k1Provider;
        assert_eq!(
            hex::encode(provider.keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_sha256_known_vector() {
        let provider = Secp256k1Provider;
        assert_eq!(
            hex::encode(provider.sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_scalar_range() {
        let provider = Secp256k1Provider;
        assert!(!provider.is_valid_private_key(&[0u8; 32]));
        assert!(!provider.is_valid_private_key(&[0xFF; 32]));
        let mut one = [0u8; 32];
        one[31] = 1;
        assert!(provider.is_valid_private_key(&one));
    }

    #[test]
    fn test_sign_is_deterministic_and_verifies() {
        let provider = Secp256k1Provider;
        let private_key = [0x11u8; 32];
        let digest = provider.sha256(b"draft");
        let first = provider.sign_prehash(&private_key, &digest).unwrap();
        let second = provider.sign_prehash(&private_key, &digest).unwrap();
        assert_eq!(first, second);

        let public_key = provider.public_key(&private_key, true).unwrap();
        assert!(provider.verify_prehash(&public_key, &digest, &first));

        let other_digest = provider.sha256(b"other");
        assert!(!provider.verify_prehash(&public_key, &other_digest, &first));
    }

    #[test]
    fn test_aes_gcm_tag_is_checked() {
        let provider = Secp256k1Provider;
        let key = [7u8; 32];
        let iv = [9u8; GCM_IV_LEN];
        let mut ciphertext = provider.aes_gcm_encrypt(&key, &iv, b"secret").unwrap();
        assert_eq!(provider.aes_gcm_decrypt(&key, &iv, &ciphertext).unwrap(), b"secret");

        ciphertext[0] ^= 1;
        assert!(provider.aes_gcm_decrypt(&key, &iv, &ciphertext).is_err());
    }

    #[test]
    fn test_hmac_verify() {
        let provider = Secp256k1Provider;
        let mac = provider.hmac_sha256(b"key", b"data").unwrap();
        assert!(provider.verify_hmac_sha256(b"key", b"data", &mac));
        assert!(!provider.verify_hmac_sha256(b"other", b"data", &mac));
    }
}
