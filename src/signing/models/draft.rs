//! Unsigned transaction drafts
//!
//! A draft is what the settlement authority hashes and later finalizes. It is
//! built once by [`crate::signing::prepare::DraftBuilder`] and has no mutating
//! API afterwards, so the bytes hashed in the first signing phase are the same
//! bytes sent back for finalization.

use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{
        transaction_output::TransactionOutput,
        types::{Amount, Hash256},
        utxo::{Outpoint, Utxo},
    },
    signing::models::transaction_metadata::DraftMetadata,
};

/// Only deferred signing is supported: the draft travels unsigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignMode {
    #[default]
    DeferSign,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInput {
    pub source_tx_id: Hash256,
    pub source_output_index: u32,
    /// Read but not spent; carries no value into the transaction
    #[serde(default)]
    pub reference_only: bool,
}

impl DraftInput {
    pub fn spend(outpoint: &Outpoint) -> Self {
        Self {
            source_tx_id: outpoint.transaction_id,
            source_output_index: outpoint.output_index,
            reference_only: false,
        }
    }

    pub fn reference(outpoint: &Outpoint) -> Self {
        Self {
            reference_only: true,
            ..Self::spend(outpoint)
        }
    }

    pub fn outpoint(&self) -> Outpoint {
        Outpoint::new(self.source_tx_id, self.source_output_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    sign_mode: SignMode,
    inputs: Vec<DraftInput>,
    outputs: Vec<TransactionOutput>,
    metadata: DraftMetadata,
    /// Value of the spent inputs, kept locally for conservation checks
    #[serde(skip)]
    spent_total: Amount,
}

impl TransactionDraft {
    pub(crate) fn new(
        spent: &[Utxo],
        references: &[Outpoint],
        outputs: Vec<TransactionOutput>,
        metadata: DraftMetadata,
    ) -> Self {
        let inputs = spent
            .iter()
            .map(|utxo| DraftInput::spend(&utxo.outpoint))
            .chain(references.iter().map(DraftInput::reference))
            .collect();
        let spent_total = spent
            .iter()
            .fold(Amount::zero(), |acc, utxo| acc.saturating_add(utxo.amount));

        Self {
            sign_mode: SignMode::DeferSign,
            inputs,
            outputs,
            metadata,
            spent_total,
        }
    }

    pub fn sign_mode(&self) -> SignMode {
        self.sign_mode
    }

    pub fn inputs(&self) -> &[DraftInput] {
        &self.inputs
    }

    /// Inputs that move value, excluding reference-only reads
    pub fn spent_inputs(&self) -> impl Iterator<Item = &DraftInput> {
        self.inputs.iter().filter(|input| !input.reference_only)
    }

    pub fn outputs(&self) -> &[TransactionOutput] {
        &self.outputs
    }

    pub fn metadata(&self) -> &DraftMetadata {
        &self.metadata
    }

    pub fn fee(&self) -> Amount {
        self.metadata.fee
    }

    /// Sum of the selected UTXO amounts. Zero for a draft parsed from JSON.
    pub fn input_total(&self) -> Amount {
        self.spent_total
    }

    pub fn output_total(&self) -> Amount {
        self.outputs
            .iter()
            .fold(Amount::zero(), |acc, output| acc.saturating_add(output.amount()))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
