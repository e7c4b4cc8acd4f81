use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    authority::SettlementAuthority,
    config::{FeePolicy, WalletConfig},
    data_structures::{
        locking_condition::LockingCondition,
        transaction_output::{AssetContent, TransactionOutput},
        types::{Address, Amount, TokenId},
        utxo::{Outpoint, Utxo},
    },
    errors::{ValidationError, WalletResult},
    signing::{
        models::{DraftMetadata, TransactionDraft},
        prepare::input_selector::{InputSelector, UtxoSelection},
    },
    validation::{self, ContractDependencyResolver, NoContractDependencies},
};

/// Spending intent handed to [`DraftBuilder::build`]
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRequest {
    /// Address that funds the draft and receives change
    pub from: Address,
    /// Owner of the primary output
    pub to: Address,
    pub amount: Amount,
    pub token_id: Option<TokenId>,
    /// Lock for the primary output; single-key to `to` when absent
    pub lock: Option<LockingCondition>,
    /// Outpoints attached as reference-only inputs
    pub references: Vec<Outpoint>,
    pub intent: Option<String>,
}

impl DraftRequest {
    pub fn transfer(from: Address, to: Address, amount: Amount, token_id: Option<TokenId>) -> Self {
        Self {
            from,
            to,
            amount,
            token_id,
            lock: None,
            references: Vec::new(),
            intent: None,
        }
    }

    pub fn with_lock(mut self, lock: LockingCondition) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn with_reference(mut self, outpoint: Outpoint) -> Self {
        self.references.push(outpoint);
        self
    }

    pub fn with_intent<S: Into<String>>(mut self, intent: S) -> Self {
        self.intent = Some(intent.into());
        self
    }

    fn primary_lock(&self) -> LockingCondition {
        self.lock
            .clone()
            .unwrap_or_else(|| LockingCondition::single_key(self.to))
    }
}

/// Assembles unsigned drafts from a UTXO snapshot
pub struct DraftBuilder {
    authority: Arc<dyn SettlementAuthority>,
    resolver: Arc<dyn ContractDependencyResolver>,
    fee_policy: FeePolicy,
    allow_contract_cycles: bool,
}

impl DraftBuilder {
    pub fn new(authority: Arc<dyn SettlementAuthority>, config: &WalletConfig) -> Self {
        Self {
            authority,
            resolver: Arc::new(NoContractDependencies),
            fee_policy: config.fee_policy,
            allow_contract_cycles: config.allow_contract_cycles,
        }
    }

    pub fn with_dependency_resolver(mut self, resolver: Arc<dyn ContractDependencyResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn fee_policy(&self) -> FeePolicy {
        self.fee_policy
    }

    /// Plain transfer: one output to `to`, change back to `from`
    pub async fn build_transfer(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
        token_id: Option<TokenId>,
    ) -> WalletResult<TransactionDraft> {
        self.build(DraftRequest::transfer(from, to, amount, token_id).with_intent("transfer"))
            .await
    }

    /// Transfer whose primary output carries `lock` instead of the default single key
    pub async fn build_with_lock(
        &self,
        owner: Address,
        beneficiary: Address,
        amount: Amount,
        token_id: Option<TokenId>,
        lock: LockingCondition,
    ) -> WalletResult<TransactionDraft> {
        self.build(DraftRequest::transfer(owner, beneficiary, amount, token_id).with_lock(lock))
            .await
    }

    /// Validate locally, fetch the funding snapshot, then assemble
    pub async fn build(&self, request: DraftRequest) -> WalletResult<TransactionDraft> {
        self.validate_request(&request).await?;

        let utxos = self.authority.get_utxos(&request.from).await?;
        debug!(address = %request.from, utxos = utxos.len(), "Fetched UTXO snapshot");

        self.assemble(&request, &utxos)
    }

    /// Checks that never need the authority
    async fn validate_request(&self, request: &DraftRequest) -> WalletResult<()> {
        if request.amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        if let Some(lock) = &request.lock {
            validation::validate(
                std::slice::from_ref(lock),
                self.allow_contract_cycles,
                self.resolver.as_ref(),
            )
            .await?;
        }
        Ok(())
    }

    /// Build the draft from an already fetched snapshot.
    ///
    /// The fee is always paid in the native unit. A token transfer with a
    /// non-zero fee selects native UTXOs for the fee separately and returns
    /// their surplus as a second, native change output.
    pub fn assemble(&self, request: &DraftRequest, utxos: &[Utxo]) -> WalletResult<TransactionDraft> {
        if request.amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        let fee = self.fee_policy.fee();
        let (selection, fee_selection) = match request.token_id {
            Some(token_id) if !fee.is_zero() => {
                let tokens =
                    InputSelector::new(Some(token_id)).select(utxos, request.amount, Amount::zero())?;
                let native = InputSelector::native().select(utxos, fee, Amount::zero())?;
                debug!(%token_id, %fee, fee_inputs = native.utxos.len(), "Selected native UTXOs for token transfer fee");
                (tokens, Some(native))
            }
            _ => (
                InputSelector::new(request.token_id).select(utxos, request.amount, fee)?,
                None,
            ),
        };

        let mut outputs = vec![TransactionOutput::new(
            request.to,
            AssetContent::for_token(request.amount, request.token_id),
            request.primary_lock(),
        )];
        outputs.extend(change_output(&selection, request.from, request.token_id));

        let mut spent = selection.utxos;
        if let Some(fee_selection) = fee_selection {
            outputs.extend(change_output(&fee_selection, request.from, None));
            spent.extend(fee_selection.utxos);
        }

        let mut metadata = DraftMetadata::new(request.from, fee);
        if let Some(intent) = &request.intent {
            metadata = metadata.with_intent(intent.clone());
        }

        let draft = TransactionDraft::new(&spent, &request.references, outputs, metadata);
        info!(
            from = %request.from,
            to = %request.to,
            amount = %request.amount,
            inputs = spent.len(),
            outputs = draft.outputs().len(),
            "Built transaction draft"
        );
        Ok(draft)
    }
}

/// Surplus of a selection back to `owner`, if there is any
fn change_output(
    selection: &UtxoSelection,
    owner: Address,
    token_id: Option<TokenId>,
) -> Option<TransactionOutput> {
    selection
        .requires_change_output()
        .then(|| TransactionOutput::to_owner(owner, selection.change(), token_id))
}
