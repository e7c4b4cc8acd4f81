use serde::{Deserialize, Serialize};

use crate::data_structures::{
    locking_condition::LockingCondition,
    types::{amount_serde, Address, Amount, TokenId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    NativeCoin,
    ContractToken,
}

/// Value carried by an output: native coin, or a token balance tagged by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetContent {
    pub kind: AssetKind,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<TokenId>,
}

impl AssetContent {
    pub fn native(amount: Amount) -> Self {
        Self {
            kind: AssetKind::NativeCoin,
            amount,
            token_id: None,
        }
    }

    pub fn token(amount: Amount, token_id: TokenId) -> Self {
        Self {
            kind: AssetKind::ContractToken,
            amount,
            token_id: Some(token_id),
        }
    }

    pub fn for_token(amount: Amount, token_id: Option<TokenId>) -> Self {
        match token_id {
            Some(id) => Self::token(amount, id),
            None => Self::native(amount),
        }
    }
}

/// Output for a transaction, defining the new ownership of the value being moved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    owner: Address,
    asset_content: AssetContent,
    locking_condition: LockingCondition,
}

impl TransactionOutput {
    pub fn new(owner: Address, asset_content: AssetContent, locking_condition: LockingCondition) -> Self {
        Self {
            owner,
            asset_content,
            locking_condition,
        }
    }

    /// Output locked to its owner's key alone
    pub fn to_owner(owner: Address, amount: Amount, token_id: Option<TokenId>) -> Self {
        Self::new(
            owner,
            AssetContent::for_token(amount, token_id),
            LockingCondition::single_key(owner),
        )
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn asset_content(&self) -> &AssetContent {
        &self.asset_content
    }

    pub fn amount(&self) -> Amount {
        self.asset_content.amount
    }

    pub fn token_id(&self) -> Option<&TokenId> {
        self.asset_content.token_id.as_ref()
    }

    pub fn locking_condition(&self) -> &LockingCondition {
        &self.locking_condition
    }
}
