use serde::{Deserialize, Serialize};

use crate::data_structures::types::{amount_serde, Address, Amount};

/// Draft metadata; `caller_address` is always stamped by the builder
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMetadata {
    /// Address of the wallet that built the draft
    pub caller_address: Address,
    /// The absolute fee reserved by the draft, zero when the authority prices it
    #[serde(with = "amount_serde")]
    pub fee: Amount,
    /// Free-form label for the spending intent ("transfer", "vote", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl DraftMetadata {
    pub fn new(caller_address: Address, fee: Amount) -> Self {
        Self {
            caller_address,
            fee,
            intent: None,
        }
    }

    pub fn with_intent<S: Into<String>>(mut self, intent: S) -> Self {
        self.intent = Some(intent.into());
        self
    }
}
