//! Key management: address derivation, public-key encoding and the keystore
//!
//! ## Address derivation
//!
//! An address is the last 20 bytes of Keccak-256 over the 64 coordinate bytes
//! of the uncompressed public key (the `0x04` prefix is stripped). Compressed
//! keys are expanded first, so both encodings of one key yield one address.
//!
//! ## Compression
//!
//! RPC boundaries expect 33-byte SEC1 keys: `0x02 | (y & 1)` followed by x.

pub mod keystore;

pub use keystore::{
    KdfParams, Keystore, KeystoreCrypto, KeystoreRecord, KDF_ITERATIONS, KDF_MAX_ITERATIONS,
};

use crate::{
    crypto::{CryptoProvider, COMPRESSED_PUBLIC_KEY_LEN, UNCOMPRESSED_PUBLIC_KEY_LEN},
    data_structures::types::Address,
    errors::KeyManagementError,
};

/// Compress a SEC1 public key to 33 bytes. Already-compressed keys pass through.
pub fn compress_public_key(
    public_key: &[u8],
) -> Result<[u8; COMPRESSED_PUBLIC_KEY_LEN], KeyManagementError> {
    match public_key.len() {
        COMPRESSED_PUBLIC_KEY_LEN if matches!(public_key[0], 0x02 | 0x03) => {
            let mut out = [0u8; COMPRESSED_PUBLIC_KEY_LEN];
            out.copy_from_slice(public_key);
            Ok(out)
        }
        UNCOMPRESSED_PUBLIC_KEY_LEN if public_key[0] == 0x04 => {
            let mut out = [0u8; COMPRESSED_PUBLIC_KEY_LEN];
            out[0] = 0x02 | (public_key[UNCOMPRESSED_PUBLIC_KEY_LEN - 1] & 1);
            out[1..].copy_from_slice(&public_key[1..COMPRESSED_PUBLIC_KEY_LEN]);
            Ok(out)
        }
        len => Err(KeyManagementError::InvalidPublicKey(format!(
            "unsupported public key encoding ({len} bytes)"
        ))),
    }
}

/// Derive the 20-byte address for a 33-, 64- or 65-byte public key
pub fn derive_address(
    provider: &dyn CryptoProvider,
    public_key: &[u8],
) -> Result<Address, KeyManagementError> {
    let coordinates: Vec<u8> = match public_key.len() {
        64 => public_key.to_vec(),
        UNCOMPRESSED_PUBLIC_KEY_LEN if public_key[0] == 0x04 => public_key[1..].to_vec(),
        COMPRESSED_PUBLIC_KEY_LEN => provider.decompress_public_key(public_key)?[1..].to_vec(),
        len => {
            return Err(KeyManagementError::InvalidPublicKey(format!(
                "cannot derive address from {len}-byte key"
            )))
        }
    };

    let hash = provider.keccak256(&coordinates);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(Address::new(address))
}

/// Pre-hash an arbitrary message to the digest the signer accepts
pub fn message_digest(provider: &dyn CryptoProvider, message: &[u8]) -> [u8; 32] {
    provider.sha256(message)
}
