use tracing::debug;

use crate::{
    data_structures::{
        types::{Amount, TokenId},
        utxo::Utxo,
    },
    WalletError, WalletResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoSelection {
    pub utxos: Vec<Utxo>,
    pub total_value: Amount,
    /// Amount plus fee the selection had to cover
    pub target: Amount,
}

impl UtxoSelection {
    pub fn requires_change_output(&self) -> bool {
        self.total_value > self.target
    }

    /// Selected value left after the target; never negative
    pub fn change(&self) -> Amount {
        self.total_value.saturating_sub(self.target)
    }
}

/// Deterministic coin selection over a UTXO snapshot.
///
/// Order is preserved: the first UTXO that alone covers the target wins;
/// otherwise UTXOs are accumulated in snapshot order until the target is met.
#[derive(Debug, Clone, Default)]
pub struct InputSelector {
    token_id: Option<TokenId>,
}

impl InputSelector {
    pub fn new(token_id: Option<TokenId>) -> Self {
        Self { token_id }
    }

    pub fn native() -> Self {
        Self::new(None)
    }

    pub fn token_id(&self) -> Option<&TokenId> {
        self.token_id.as_ref()
    }

    pub fn select(&self, utxos: &[Utxo], amount: Amount, fee: Amount) -> WalletResult<UtxoSelection> {
        let matching: Vec<&Utxo> = utxos
            .iter()
            .filter(|utxo| utxo.matches_token(self.token_id.as_ref()))
            .collect();

        // No snapshot can cover a target past U256::MAX
        let Some(target) = amount.checked_add(fee) else {
            return Err(WalletError::InsufficientBalance {
                required: Amount::MAX,
                available: matching
                    .iter()
                    .fold(Amount::zero(), |acc, utxo| acc.saturating_add(utxo.amount)),
            });
        };

        if let Some(single) = matching.iter().find(|utxo| utxo.amount >= target) {
            debug!(outpoint = %single.outpoint, %target, "Single UTXO covers target");
            return Ok(UtxoSelection {
                utxos: vec![(*single).clone()],
                total_value: single.amount,
                target,
            });
        }

        let mut selected = Vec::new();
        let mut total_value = Amount::zero();
        for utxo in &matching {
            total_value = total_value.saturating_add(utxo.amount);
            selected.push((*utxo).clone());
            if total_value >= target {
                debug!(inputs = selected.len(), %total_value, %target, "Accumulated UTXOs cover target");
                return Ok(UtxoSelection {
                    utxos: selected,
                    total_value,
                    target,
                });
            }
        }

        Err(WalletError::InsufficientBalance {
            required: target,
            available: total_value,
        })
    }
}
