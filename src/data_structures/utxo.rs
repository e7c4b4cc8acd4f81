use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    data_structures::types::{amount_serde, Amount, Hash256, TokenId},
    errors::SerializationError,
};

/// Reference to an output created by a previous transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Outpoint {
    pub transaction_id: Hash256,
    pub output_index: u32,
}

impl Outpoint {
    pub const fn new(transaction_id: Hash256, output_index: u32) -> Self {
        Self {
            transaction_id,
            output_index,
        }
    }
}

/// Text form is `txHash:index`, as used by `getUTXO`
impl Display for Outpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.output_index)
    }
}

impl FromStr for Outpoint {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hash, index) = s
            .rsplit_once(':')
            .ok_or_else(|| SerializationError::InvalidOutpoint(s.to_string()))?;
        let transaction_id = hash
            .parse::<Hash256>()
            .map_err(|e| SerializationError::InvalidOutpoint(format!("{s}: {e}")))?;
        let output_index = index
            .parse::<u32>()
            .map_err(|e| SerializationError::InvalidOutpoint(format!("{s}: {e}")))?;
        Ok(Self::new(transaction_id, output_index))
    }
}

impl Serialize for Outpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Outpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Snapshot of an unspent output as reported by the settlement authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: Outpoint,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
    #[serde(rename = "tokenID", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<TokenId>,
}

impl Utxo {
    pub fn native(outpoint: Outpoint, amount: Amount) -> Self {
        Self {
            outpoint,
            amount,
            token_id: None,
        }
    }

    pub fn token(outpoint: Outpoint, amount: Amount, token_id: TokenId) -> Self {
        Self {
            outpoint,
            amount,
            token_id: Some(token_id),
        }
    }

    /// `None` only matches untagged outputs; a concrete id only matches itself
    pub fn matches_token(&self, token_id: Option<&TokenId>) -> bool {
        self.token_id.as_ref() == token_id
    }
}
