//! Request and response payloads exchanged with the settlement authority

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    crypto::{COMPRESSED_PUBLIC_KEY_LEN, SIGNATURE_LEN},
    data_structures::{types::Hash256, Utxo},
    errors::{SerializationError, WalletError, WalletResult},
    hex_utils,
    signing::models::draft::TransactionDraft,
};

const ANYONE_CAN_PAY: u8 = 0x80;

/// Which parts of the transaction a signature commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SighashType {
    #[default]
    All,
    None,
    Single,
    AllAnyoneCanPay,
    NoneAnyoneCanPay,
    SingleAnyoneCanPay,
}

impl SighashType {
    pub fn as_u8(self) -> u8 {
        match self {
            SighashType::All => 0x01,
            SighashType::None => 0x02,
            SighashType::Single => 0x03,
            SighashType::AllAnyoneCanPay => 0x01 | ANYONE_CAN_PAY,
            SighashType::NoneAnyoneCanPay => 0x02 | ANYONE_CAN_PAY,
            SighashType::SingleAnyoneCanPay => 0x03 | ANYONE_CAN_PAY,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(SighashType::All),
            0x02 => Some(SighashType::None),
            0x03 => Some(SighashType::Single),
            0x81 => Some(SighashType::AllAnyoneCanPay),
            0x82 => Some(SighashType::NoneAnyoneCanPay),
            0x83 => Some(SighashType::SingleAnyoneCanPay),
            _ => None,
        }
    }

    pub fn anyone_can_pay(self) -> bool {
        self.as_u8() & ANYONE_CAN_PAY != 0
    }
}

impl Display for SighashType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x}", self.as_u8())
    }
}

impl Serialize for SighashType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for SighashType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        SighashType::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown sighash type {value:#04x}")))
    }
}

/// Parameters of `computeSignatureHashFromDraft`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashRequest {
    pub draft: TransactionDraft,
    pub input_index: u32,
    pub sighash_type: SighashType,
}

/// Raw `computeSignatureHashFromDraft` result as returned on the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHashResponse {
    pub hash: Option<String>,
    #[serde(default, alias = "unsigned_tx")]
    pub unsigned_tx: Option<String>,
}

/// Digest to sign plus the authority's opaque unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResponse {
    pub hash: Hash256,
    pub unsigned_tx: Option<String>,
}

impl HashResponse {
    /// Validate a raw response. A missing or non-32-byte hash is malformed.
    pub fn from_raw(raw: RawHashResponse) -> WalletResult<Self> {
        let hash = raw.hash.ok_or_else(|| WalletError::malformed("hash"))?;
        let bytes = hex_utils::decode_hex_array::<32>(&hash)
            .map_err(|e| WalletError::MalformedResponse(format!("hash: {e}")))?;
        Ok(Self {
            hash: Hash256::new(bytes),
            unsigned_tx: raw.unsigned_tx.filter(|tx| !tx.is_empty()),
        })
    }

    pub fn digest(&self) -> &[u8; 32] {
        self.hash.as_bytes()
    }
}

/// Parameters of `finalizeTransactionFromDraft`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizeRequest {
    pub draft: TransactionDraft,
    #[serde(rename = "unsignedTx", skip_serializing_if = "Option::is_none")]
    pub unsigned_tx: Option<String>,
    pub input_index: u32,
    pub sighash_type: SighashType,
    #[serde(rename = "pubkey", with = "hex_utils::serde_hex_vec")]
    pub public_key: Vec<u8>,
    #[serde(with = "hex_utils::serde_hex_vec")]
    pub signature: Vec<u8>,
}

impl FinalizeRequest {
    pub fn compressed_public_key(&self) -> Result<[u8; COMPRESSED_PUBLIC_KEY_LEN], SerializationError> {
        self.public_key
            .as_slice()
            .try_into()
            .map_err(|_| SerializationError::InvalidLength {
                expected: COMPRESSED_PUBLIC_KEY_LEN,
                actual: self.public_key.len(),
            })
    }

    pub fn signature_bytes(&self) -> Result<[u8; SIGNATURE_LEN], SerializationError> {
        self.signature
            .as_slice()
            .try_into()
            .map_err(|_| SerializationError::InvalidLength {
                expected: SIGNATURE_LEN,
                actual: self.signature.len(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub tx: String,
}

/// Outcome of `sendRawTransaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    pub tx_hash: String,
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `getUTXO` result: `{utxos: [{outpoint, amount, tokenID?}]}`
#[derive(Debug, Clone, Deserialize)]
pub struct UtxoListResponse {
    pub utxos: Vec<Utxo>,
}

/// An extra signer's contribution to a shared draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cosignature {
    #[serde(with = "hex_utils::serde_hex_vec")]
    pub public_key: Vec<u8>,
    #[serde(with = "hex_utils::serde_hex_vec")]
    pub signature: Vec<u8>,
    pub digest: Hash256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sighash_bytes() {
        assert_eq!(SighashType::default().as_u8(), 0x01);
        assert_eq!(SighashType::SingleAnyoneCanPay.as_u8(), 0x83);
        assert!(SighashType::NoneAnyoneCanPay.anyone_can_pay());
        assert!(!SighashType::Single.anyone_can_pay());
        assert_eq!(SighashType::from_u8(0x82), Some(SighashType::NoneAnyoneCanPay));
        assert_eq!(SighashType::from_u8(0x04), None);
        assert_eq!(serde_json::to_value(SighashType::All).unwrap(), 1);
        assert!(serde_json::from_str::<SighashType>("7").is_err());
    }

    #[test]
    fn test_hash_response_requires_32_bytes() {
        let ok = HashResponse::from_raw(RawHashResponse {
            hash: Some(format!("0x{}", "ab".repeat(32))),
            unsigned_tx: Some("00ff".into()),
        })
        .unwrap();
        assert_eq!(ok.digest(), &[0xab; 32]);
        assert_eq!(ok.unsigned_tx.as_deref(), Some("00ff"));

        for bad in [None, Some("0x1234".to_string()), Some("zz".repeat(32))] {
            let err = HashResponse::from_raw(RawHashResponse {
                hash: bad,
                unsigned_tx: None,
            })
            .unwrap_err();
            assert!(matches!(err, WalletError::MalformedResponse(_)));
        }
    }

    #[test]
    fn test_raw_hash_response_accepts_both_spellings() {
        let camel: RawHashResponse =
            serde_json::from_str(r#"{"hash":"0x00","unsignedTx":"aa"}"#).unwrap();
        let snake: RawHashResponse =
            serde_json::from_str(r#"{"hash":"0x00","unsigned_tx":"aa"}"#).unwrap();
        assert_eq!(camel.unsigned_tx, snake.unsigned_tx);
    }

    #[test]
    fn test_submit_result_wire_shape() {
        let result: SubmitResult =
            serde_json::from_str(r#"{"txHash":"0xabc","accepted":false,"reason":"spent"}"#).unwrap();
        assert!(!result.accepted);
        assert_eq!(result.reason.as_deref(), Some("spent"));

        let accepted: SubmitResult =
            serde_json::from_str(r#"{"txHash":"0xabc","accepted":true}"#).unwrap();
        assert_eq!(accepted.reason, None);
    }
}
