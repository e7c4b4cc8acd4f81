//! Wire codec for locking conditions
//!
//! Every condition serializes as `{"type": <tag>, "<tag>_lock": {...}}` with
//! snake_case fields. Both keys are always written because some consumers
//! dispatch on `type` and others on the nested key. Decoding accepts either.
//!
//! Batch decoding is lenient: an entry this client cannot understand (a newer
//! variant, or a malformed body) is dropped with a warning instead of failing
//! the whole list.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    data_structures::{
        locking_condition::{LockingCondition, OperationTag, SignatureAlgorithm},
        types::{amount_serde, Address, Amount},
    },
    errors::SerializationError,
    hex_utils::serde_hex_vec_list,
};

/// (type tag, nested body key) for every known variant
const VARIANT_KEYS: [(&str, &str); 7] = [
    ("single_key", "single_key_lock"),
    ("multi_key", "multi_key_lock"),
    ("threshold", "threshold_lock"),
    ("delegation", "delegation_lock"),
    ("contract", "contract_lock"),
    ("time", "time_lock"),
    ("height", "height_lock"),
];

#[derive(Serialize, Deserialize)]
struct SingleKeyBody {
    required_address_hash: Address,
    #[serde(default)]
    algorithm: SignatureAlgorithm,
}

#[derive(Serialize, Deserialize)]
struct MultiKeyBody {
    threshold: u32,
    #[serde(with = "serde_hex_vec_list")]
    authorized_keys: Vec<Vec<u8>>,
    #[serde(default)]
    ordered: bool,
}

#[derive(Serialize, Deserialize)]
struct ThresholdBody {
    threshold: u32,
    total_parties: u32,
    #[serde(with = "serde_hex_vec_list")]
    party_keys: Vec<Vec<u8>>,
}

#[derive(Serialize, Deserialize)]
struct DelegationBody {
    original_owner: Address,
    allowed_delegates: Vec<Address>,
    authorized_operations: Vec<OperationTag>,
    expiry_blocks: u64,
    #[serde(with = "amount_serde")]
    max_value_per_op: Amount,
}

#[derive(Serialize, Deserialize)]
struct ContractBody {
    contract_address: Address,
    required_method: String,
    #[serde(default)]
    parameter_schema: Value,
    #[serde(default)]
    state_requirements: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct TimeLockBody {
    unlock_timestamp: u64,
    base_lock: Value,
}

#[derive(Serialize, Deserialize)]
struct HeightLockBody {
    unlock_height: u64,
    base_lock: Value,
    #[serde(default)]
    confirmation_blocks: u32,
}

fn body_key(tag: &str) -> Option<&'static str> {
    VARIANT_KEYS
        .iter()
        .find(|(known, _)| *known == tag)
        .map(|(_, key)| *key)
}

fn to_body<T: Serialize>(body: &T) -> Result<Value, SerializationError> {
    serde_json::to_value(body).map_err(|e| SerializationError::JsonSerializationError(e.to_string()))
}

/// Encode a single condition into its tagged wire object
pub fn encode_condition(condition: &LockingCondition) -> Result<Value, SerializationError> {
    let body = match condition {
        LockingCondition::SingleKey {
            required_address_hash,
            algorithm,
        } => to_body(&SingleKeyBody {
            required_address_hash: *required_address_hash,
            algorithm: *algorithm,
        })?,
        LockingCondition::MultiKey {
            threshold,
            authorized_keys,
            ordered,
        } => to_body(&MultiKeyBody {
            threshold: *threshold,
            authorized_keys: authorized_keys.clone(),
            ordered: *ordered,
        })?,
        LockingCondition::Threshold {
            threshold,
            total_parties,
            party_keys,
        } => to_body(&ThresholdBody {
            threshold: *threshold,
            total_parties: *total_parties,
            party_keys: party_keys.clone(),
        })?,
        LockingCondition::Delegation {
            original_owner,
            allowed_delegates,
            authorized_operations,
            expiry_blocks,
            max_value_per_op,
        } => to_body(&DelegationBody {
            original_owner: *original_owner,
            allowed_delegates: allowed_delegates.clone(),
            authorized_operations: authorized_operations.clone(),
            expiry_blocks: *expiry_blocks,
            max_value_per_op: *max_value_per_op,
        })?,
        LockingCondition::Contract {
            contract_address,
            required_method,
            parameter_schema,
            state_requirements,
        } => to_body(&ContractBody {
            contract_address: *contract_address,
            required_method: required_method.clone(),
            parameter_schema: parameter_schema.clone(),
            state_requirements: state_requirements.clone(),
        })?,
        LockingCondition::TimeLock {
            unlock_timestamp,
            base_lock,
        } => to_body(&TimeLockBody {
            unlock_timestamp: *unlock_timestamp,
            base_lock: encode_condition(base_lock)?,
        })?,
        LockingCondition::HeightLock {
            unlock_height,
            base_lock,
            confirmation_blocks,
        } => to_body(&HeightLockBody {
            unlock_height: *unlock_height,
            base_lock: encode_condition(base_lock)?,
            confirmation_blocks: *confirmation_blocks,
        })?,
    };

    let tag = condition.variant_tag();
    let key = body_key(tag).ok_or_else(|| {
        SerializationError::JsonSerializationError(format!("no wire key for tag {tag}"))
    })?;
    let mut object = Map::new();
    object.insert("type".to_string(), Value::String(tag.to_string()));
    object.insert(key.to_string(), body);
    Ok(Value::Object(object))
}

/// Encode a condition set; order is preserved
pub fn encode(conditions: &[LockingCondition]) -> Result<Vec<Value>, SerializationError> {
    conditions.iter().map(encode_condition).collect()
}

fn from_body<T: for<'de> Deserialize<'de>>(tag: &str, body: &Value) -> Result<T, String> {
    serde_json::from_value(body.clone()).map_err(|e| format!("malformed {tag} body: {e}"))
}

/// Strict decode of one wire object
pub fn try_decode_condition(wire: &Value) -> Result<LockingCondition, String> {
    let object = wire
        .as_object()
        .ok_or_else(|| "locking condition is not an object".to_string())?;

    let (tag, key) = match object.get("type") {
        Some(Value::String(tag)) => {
            let key = body_key(tag).ok_or_else(|| format!("unknown locking condition type `{tag}`"))?;
            (tag.as_str(), key)
        }
        Some(other) => return Err(format!("`type` is not a string: {other}")),
        None => VARIANT_KEYS
            .iter()
            .find(|(_, key)| object.contains_key(*key))
            .map(|(tag, key)| (*tag, *key))
            .ok_or_else(|| "no `type` tag and no known lock body".to_string())?,
    };
    let body = object
        .get(key)
        .ok_or_else(|| format!("`{tag}` condition is missing `{key}`"))?;

    let condition = match tag {
        "single_key" => {
            let b: SingleKeyBody = from_body(tag, body)?;
            LockingCondition::SingleKey {
                required_address_hash: b.required_address_hash,
                algorithm: b.algorithm,
            }
        }
        "multi_key" => {
            let b: MultiKeyBody = from_body(tag, body)?;
            LockingCondition::MultiKey {
                threshold: b.threshold,
                authorized_keys: b.authorized_keys,
                ordered: b.ordered,
            }
        }
        "threshold" => {
            let b: ThresholdBody = from_body(tag, body)?;
            LockingCondition::Threshold {
                threshold: b.threshold,
                total_parties: b.total_parties,
                party_keys: b.party_keys,
            }
        }
        "delegation" => {
            let b: DelegationBody = from_body(tag, body)?;
            LockingCondition::Delegation {
                original_owner: b.original_owner,
                allowed_delegates: b.allowed_delegates,
                authorized_operations: b.authorized_operations,
                expiry_blocks: b.expiry_blocks,
                max_value_per_op: b.max_value_per_op,
            }
        }
        "contract" => {
            let b: ContractBody = from_body(tag, body)?;
            LockingCondition::Contract {
                contract_address: b.contract_address,
                required_method: b.required_method,
                parameter_schema: b.parameter_schema,
                state_requirements: b.state_requirements,
            }
        }
        "time" => {
            let b: TimeLockBody = from_body(tag, body)?;
            LockingCondition::TimeLock {
                unlock_timestamp: b.unlock_timestamp,
                base_lock: Box::new(try_decode_condition(&b.base_lock)?),
            }
        }
        "height" => {
            let b: HeightLockBody = from_body(tag, body)?;
            LockingCondition::HeightLock {
                unlock_height: b.unlock_height,
                base_lock: Box::new(try_decode_condition(&b.base_lock)?),
                confirmation_blocks: b.confirmation_blocks,
            }
        }
        other => return Err(format!("unknown locking condition type `{other}`")),
    };
    Ok(condition)
}

/// Lenient decode: returns `None` and logs when the entry is not understood
pub fn decode_condition(wire: &Value) -> Option<LockingCondition> {
    match try_decode_condition(wire) {
        Ok(condition) => Some(condition),
        Err(reason) => {
            warn!("Dropping locking condition: {}", reason);
            None
        }
    }
}

/// Decode a condition list, dropping entries that do not decode
pub fn decode(wire: &[Value]) -> Vec<LockingCondition> {
    wire.iter().filter_map(decode_condition).collect()
}

impl Serialize for LockingCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_condition(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LockingCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        try_decode_condition(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn owner() -> Address {
        Address::new([0xAA; 20])
    }

    #[test]
    fn test_single_key_wire_shape() {
        let wire = encode_condition(&LockingCondition::single_key(owner())).unwrap();
        assert_eq!(
            wire,
            json!({
                "type": "single_key",
                "single_key_lock": {
                    "required_address_hash": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                    "algorithm": "secp256k1"
                }
            })
        );
    }

    #[test]
    fn test_nested_time_lock_wire_shape() {
        let lock = LockingCondition::height_locked(
            1200,
            3,
            LockingCondition::time_locked(1_700_000_000, LockingCondition::single_key(owner())),
        );
        let wire = encode_condition(&lock).unwrap();
        assert_eq!(wire["type"], "height");
        assert_eq!(wire["height_lock"]["unlock_height"], 1200);
        assert_eq!(wire["height_lock"]["confirmation_blocks"], 3);
        assert_eq!(wire["height_lock"]["base_lock"]["type"], "time");
        assert_eq!(
            wire["height_lock"]["base_lock"]["time_lock"]["base_lock"]["type"],
            "single_key"
        );
        assert_eq!(try_decode_condition(&wire).unwrap(), lock);
    }

    #[test]
    fn test_delegation_and_contract_decode() {
        let delegation = json!({
            "type": "delegation",
            "delegation_lock": {
                "original_owner": owner().to_string(),
                "allowed_delegates": ["0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"],
                "authorized_operations": ["vote", "stake"],
                "expiry_blocks": 1000,
                "max_value_per_op": "5000"
            }
        });
        let decoded = decode_condition(&delegation).unwrap();
        match decoded {
            LockingCondition::Delegation {
                authorized_operations,
                max_value_per_op,
                ..
            } => {
                assert_eq!(
                    authorized_operations,
                    vec![OperationTag::Vote, OperationTag::Stake]
                );
                assert_eq!(max_value_per_op, Amount::from(5000u64));
            }
            other => panic!("unexpected condition {other:?}"),
        }

        let contract = json!({
            "type": "contract",
            "contract_lock": {
                "contract_address": "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c",
                "required_method": "release",
                "parameter_schema": {"beneficiary": "address"},
                "state_requirements": {"phase": "closed"}
            }
        });
        let decoded = decode_condition(&contract).unwrap();
        assert_eq!(decoded.referenced_contracts().len(), 1);
    }

    #[test]
    fn test_decode_by_nested_key_without_type() {
        let wire = json!({
            "multi_key_lock": {
                "threshold": 1,
                "authorized_keys": [format!("0x02{}", "11".repeat(32))]
            }
        });
        let decoded = decode_condition(&wire).unwrap();
        assert!(matches!(
            decoded,
            LockingCondition::MultiKey { threshold: 1, ordered: false, .. }
        ));
    }

    #[test]
    fn test_batch_decode_drops_unknown_and_malformed() {
        let wire = vec![
            encode_condition(&LockingCondition::single_key(owner())).unwrap(),
            json!({"type": "quantum_lock", "quantum_lock_lock": {}}),
            json!({"type": "threshold", "threshold_lock": {"threshold": "two"}}),
            json!("not an object"),
            json!({"type": "time", "time_lock": {"unlock_timestamp": 5, "base_lock": {"type": "nope"}}}),
        ];
        let decoded = decode(&wire);
        assert_eq!(decoded, vec![LockingCondition::single_key(owner())]);
    }

    #[test]
    fn test_serde_impls_use_wire_form() {
        let lock = LockingCondition::contract(Address::new([0x0C; 20]), "release");
        let text = serde_json::to_string(&lock).unwrap();
        assert!(text.contains(r#""type":"contract""#));
        assert!(text.contains(r#""contract_lock""#));
        let back: LockingCondition = serde_json::from_str(&text).unwrap();
        assert_eq!(back, lock);
    }
}
