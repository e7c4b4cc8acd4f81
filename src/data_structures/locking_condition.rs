//! Locking conditions attached to transaction outputs
//!
//! A locking condition is a predicate describing what must be proven to spend
//! an output later. Seven forms exist: five primitives (single key, multi key,
//! threshold, delegation, contract) and two combinators (time lock and height
//! lock) that wrap exactly one base condition. The recursive field is owned,
//! so a chain of wrappers can never form a cycle.
//!
//! The wire codec lives in [`crate::data_structures::locking_wire`] and
//! structural validation in [`crate::validation`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data_structures::types::{Address, Amount};

/// Signature scheme expected for a [`LockingCondition::SingleKey`] spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureAlgorithm {
    #[default]
    Secp256k1,
    Ed25519,
}

/// Operations a delegate may perform on behalf of the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationTag {
    Transfer,
    Stake,
    Unstake,
    Vote,
    Propose,
    Deploy,
    Invoke,
}

/// Serialized through the tagged wire form, see [`crate::data_structures::locking_wire`]
#[derive(Debug, Clone, PartialEq)]
pub enum LockingCondition {
    /// Spendable by the holder of the key hashing to `required_address_hash`
    SingleKey {
        required_address_hash: Address,
        algorithm: SignatureAlgorithm,
    },
    /// `threshold` of the individually listed keys must sign.
    /// With `ordered`, signatures must appear in key order.
    MultiKey {
        threshold: u32,
        authorized_keys: Vec<Vec<u8>>,
        ordered: bool,
    },
    /// n-of-m scheme over opaque party key material (not individual signatures)
    Threshold {
        threshold: u32,
        total_parties: u32,
        party_keys: Vec<Vec<u8>>,
    },
    Delegation {
        original_owner: Address,
        allowed_delegates: Vec<Address>,
        authorized_operations: Vec<OperationTag>,
        expiry_blocks: u64,
        max_value_per_op: Amount,
    },
    /// Spendable only by invoking `required_method` on the contract
    Contract {
        contract_address: Address,
        required_method: String,
        parameter_schema: serde_json::Value,
        state_requirements: BTreeMap<String, serde_json::Value>,
    },
    TimeLock {
        unlock_timestamp: u64,
        base_lock: Box<LockingCondition>,
    },
    HeightLock {
        unlock_height: u64,
        base_lock: Box<LockingCondition>,
        confirmation_blocks: u32,
    },
}

impl LockingCondition {
    pub fn single_key(address: Address) -> Self {
        LockingCondition::SingleKey {
            required_address_hash: address,
            algorithm: SignatureAlgorithm::default(),
        }
    }

    pub fn multi_key(threshold: u32, authorized_keys: Vec<Vec<u8>>, ordered: bool) -> Self {
        LockingCondition::MultiKey {
            threshold,
            authorized_keys,
            ordered,
        }
    }

    pub fn contract(contract_address: Address, required_method: impl Into<String>) -> Self {
        LockingCondition::Contract {
            contract_address,
            required_method: required_method.into(),
            parameter_schema: serde_json::Value::Null,
            state_requirements: BTreeMap::new(),
        }
    }

    /// Wrap `base` so it only becomes spendable after `unlock_timestamp` (unix seconds)
    pub fn time_locked(unlock_timestamp: u64, base: LockingCondition) -> Self {
        LockingCondition::TimeLock {
            unlock_timestamp,
            base_lock: Box::new(base),
        }
    }

    /// Wrap `base` so it only becomes spendable at `unlock_height` plus confirmations
    pub fn height_locked(unlock_height: u64, confirmation_blocks: u32, base: LockingCondition) -> Self {
        LockingCondition::HeightLock {
            unlock_height,
            base_lock: Box::new(base),
            confirmation_blocks,
        }
    }

    /// Discriminant carried in the wire `type` field
    pub fn variant_tag(&self) -> &'static str {
        match self {
            LockingCondition::SingleKey { .. } => "single_key",
            LockingCondition::MultiKey { .. } => "multi_key",
            LockingCondition::Threshold { .. } => "threshold",
            LockingCondition::Delegation { .. } => "delegation",
            LockingCondition::Contract { .. } => "contract",
            LockingCondition::TimeLock { .. } => "time",
            LockingCondition::HeightLock { .. } => "height",
        }
    }

    pub fn base_lock(&self) -> Option<&LockingCondition> {
        match self {
            LockingCondition::TimeLock { base_lock, .. }
            | LockingCondition::HeightLock { base_lock, .. } => Some(base_lock),
            _ => None,
        }
    }

    /// Number of wrappers plus one; a primitive has depth 1
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self;
        while let Some(base) = current.base_lock() {
            depth += 1;
            current = base;
        }
        depth
    }

    /// The primitive at the bottom of a wrapper chain
    pub fn innermost(&self) -> &LockingCondition {
        let mut current = self;
        while let Some(base) = current.base_lock() {
            current = base;
        }
        current
    }

    /// Contract addresses referenced by this condition, including wrapped ones
    pub fn referenced_contracts(&self) -> Vec<Address> {
        match self.innermost() {
            LockingCondition::Contract {
                contract_address, ..
            } => vec![*contract_address],
            _ => Vec::new(),
        }
    }
}

/// Fallback condition set when a caller supplies none: the owner is the sole key
pub fn default_single_key(address: Address) -> Vec<LockingCondition> {
    vec![LockingCondition::single_key(address)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_chain_navigation() {
        let owner = Address::new([0xAA; 20]);
        let lock = LockingCondition::time_locked(
            1_700_000_000,
            LockingCondition::height_locked(500, 6, LockingCondition::single_key(owner)),
        );
        assert_eq!(lock.depth(), 3);
        assert_eq!(lock.innermost(), &LockingCondition::single_key(owner));
        assert_eq!(lock.variant_tag(), "time");
        assert!(lock.referenced_contracts().is_empty());
    }

    #[test]
    fn test_referenced_contracts_sees_through_wrappers() {
        let contract = Address::new([0x0C; 20]);
        let lock = LockingCondition::height_locked(10, 0, LockingCondition::contract(contract, "release"));
        assert_eq!(lock.referenced_contracts(), vec![contract]);
    }

    #[test]
    fn test_default_single_key() {
        let owner = Address::new([1; 20]);
        let conditions = default_single_key(owner);
        assert_eq!(conditions.len(), 1);
        assert!(matches!(
            conditions[0],
            LockingCondition::SingleKey { required_address_hash, algorithm: SignatureAlgorithm::Secp256k1 }
                if required_address_hash == owner
        ));
    }
}
