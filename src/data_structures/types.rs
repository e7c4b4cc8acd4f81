//! Primitive ledger types: addresses, hashes, token identifiers and amounts

use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{errors::SerializationError, hex_utils};

/// Ledger amounts are unsigned 256-bit integers, carried as decimal strings on the wire
pub type Amount = primitive_types::U256;

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr, $prefixed:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, SerializationError> {
                let array: [u8; $len] =
                    bytes
                        .try_into()
                        .map_err(|_| SerializationError::InvalidLength {
                            expected: $len,
                            actual: bytes.len(),
                        })?;
                Ok(Self(array))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                if $prefixed {
                    hex_utils::to_hex_prefixed(&self.0)
                } else {
                    hex::encode(self.0)
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = SerializationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(hex_utils::decode_hex_array::<$len>(s)?))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// 20-byte account address: the last 20 bytes of Keccak-256 over the public key
    Address,
    20,
    true
);

fixed_bytes!(
    /// 32-byte transaction hash
    Hash256,
    32,
    false
);

fixed_bytes!(
    /// 32-byte token identifier. Absence of a token id denotes the native unit.
    TokenId,
    32,
    false
);

impl Address {
    /// Base58 form used by the `getUTXO` query
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn from_base58(s: &str) -> Result<Self, SerializationError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| SerializationError::Base58Error(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

/// Parse a decimal amount string as returned by the settlement authority
pub fn parse_amount(s: &str) -> Result<Amount, SerializationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SerializationError::InvalidAmount(s.to_string()));
    }
    Amount::from_dec_str(trimmed).map_err(|e| SerializationError::InvalidAmount(format!("{s}: {e:?}")))
}

/// Serde adapter carrying [`Amount`] as a decimal string
pub mod amount_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Amount;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AmountRepr {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        match AmountRepr::deserialize(deserializer)? {
            AmountRepr::Text(s) => super::parse_amount(&s).map_err(serde::de::Error::custom),
            AmountRepr::Number(n) => Ok(Amount::from(n)),
        }
    }
}
