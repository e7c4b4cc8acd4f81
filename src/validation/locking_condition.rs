use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::{
    crypto::{COMPRESSED_PUBLIC_KEY_LEN, UNCOMPRESSED_PUBLIC_KEY_LEN},
    data_structures::{locking_condition::LockingCondition, types::Address},
    errors::{ValidationError, WalletError, WalletResult},
    validation::contract_graph::ContractDependencyResolver,
};

fn is_sec1_public_key(key: &[u8]) -> bool {
    match key.len() {
        COMPRESSED_PUBLIC_KEY_LEN => matches!(key[0], 0x02 | 0x03),
        UNCOMPRESSED_PUBLIC_KEY_LEN => key[0] == 0x04,
        _ => false,
    }
}

fn check_threshold(threshold: u32, total: usize) -> Result<(), ValidationError> {
    if threshold == 0 || threshold as usize > total {
        return Err(ValidationError::InvalidThreshold { threshold, total });
    }
    Ok(())
}

/// Validate one condition, recursing through wrapper base locks
pub fn validate_condition(condition: &LockingCondition) -> Result<(), ValidationError> {
    match condition {
        // The address hash is a fixed 20-byte type; nothing left to check
        LockingCondition::SingleKey { .. } => Ok(()),
        LockingCondition::MultiKey {
            threshold,
            authorized_keys,
            ..
        } => {
            check_threshold(*threshold, authorized_keys.len())?;
            let mut seen = HashSet::new();
            for (index, key) in authorized_keys.iter().enumerate() {
                if !is_sec1_public_key(key) {
                    return Err(ValidationError::InvalidAuthorizedKey { index });
                }
                if !seen.insert(key.as_slice()) {
                    return Err(ValidationError::DuplicateAuthorizedKey { index });
                }
            }
            Ok(())
        }
        LockingCondition::Threshold {
            threshold,
            total_parties,
            party_keys,
        } => {
            if *total_parties as usize != party_keys.len() {
                return Err(ValidationError::PartyCountMismatch {
                    declared: *total_parties,
                    actual: party_keys.len(),
                });
            }
            check_threshold(*threshold, party_keys.len())?;
            match party_keys.iter().position(|key| key.is_empty()) {
                Some(index) => Err(ValidationError::InvalidAuthorizedKey { index }),
                None => Ok(()),
            }
        }
        LockingCondition::Delegation {
            allowed_delegates, ..
        } => {
            if allowed_delegates.is_empty() {
                return Err(ValidationError::EmptyDelegates);
            }
            Ok(())
        }
        LockingCondition::Contract {
            required_method, ..
        } => {
            if required_method.trim().is_empty() {
                return Err(ValidationError::EmptyField("required_method"));
            }
            Ok(())
        }
        LockingCondition::TimeLock { base_lock, .. }
        | LockingCondition::HeightLock { base_lock, .. } => validate_condition(base_lock),
    }
}

/// Local checks over a whole condition set: per-condition structure and
/// duplicate contract addresses (wrapped contracts included)
pub fn validate_structure(conditions: &[LockingCondition]) -> Result<(), ValidationError> {
    if conditions.is_empty() {
        return Err(ValidationError::EmptyConditionSet);
    }

    let mut contracts = HashSet::new();
    for condition in conditions {
        validate_condition(condition)?;
        for contract in condition.referenced_contracts() {
            if !contracts.insert(contract) {
                return Err(ValidationError::DuplicateContract(contract));
            }
        }
    }
    Ok(())
}

/// Reject any referenced contract that can reach itself through its dependencies
pub async fn detect_contract_cycles(
    conditions: &[LockingCondition],
    resolver: &dyn ContractDependencyResolver,
) -> WalletResult<()> {
    for condition in conditions {
        for root in condition.referenced_contracts() {
            if reaches_itself(root, resolver).await? {
                warn!(contract = %root, "Contract lock depends on itself");
                return Err(ValidationError::ContractCycle(root).into());
            }
        }
    }
    Ok(())
}

/// Breadth-first reachability from `root`'s dependencies back to `root`
async fn reaches_itself(root: Address, resolver: &dyn ContractDependencyResolver) -> WalletResult<bool> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        let deps = resolver.dependencies(&current).await.map_err(|e| {
            WalletError::from(ValidationError::DependencyLookupFailed {
                address: current,
                reason: e.to_string(),
            })
        })?;
        for dep in deps {
            if dep == root {
                return Ok(true);
            }
            if visited.insert(dep) {
                queue.push_back(dep);
            }
        }
    }
    debug!(contract = %root, visited = visited.len(), "No contract cycle");
    Ok(false)
}

/// Full validation: structure first, then the cycle check unless `allow_cycles`
pub async fn validate(
    conditions: &[LockingCondition],
    allow_cycles: bool,
    resolver: &dyn ContractDependencyResolver,
) -> WalletResult<()> {
    validate_structure(conditions)?;
    if !allow_cycles {
        detect_contract_cycles(conditions, resolver).await?;
    }
    Ok(())
}
