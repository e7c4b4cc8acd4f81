//! Mock settlement authority for deterministic testing
//!
//! The mock keeps scripted UTXO snapshots per address, records every call, and
//! behaves like a strict authority at finalization: the submitted signature is
//! verified against the signature hash the mock itself issued for the draft.
//! Failure modes are one-shot and reset after they fire.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    authority::{methods, SettlementAuthority},
    crypto::{default_provider, CryptoProvider},
    data_structures::{types::Address, utxo::Utxo},
    errors::{WalletError, WalletResult},
    signing::models::{
        FinalizeRequest, FinalizeResponse, HashRequest, HashResponse, RawHashResponse,
        SighashType, SubmitResult, TransactionDraft,
    },
};

/// JSON-RPC error code returned when a signature does not verify
pub const INVALID_SIGNATURE_CODE: i64 = -32002;
/// JSON-RPC error code for a scripted generic failure
pub const MOCK_FAILURE_CODE: i64 = -32000;

#[derive(Debug, Clone, Default)]
pub struct MockAuthorityFailureModes {
    /// Fail next getUTXO call
    pub fail_get_utxo: bool,
    /// Fail next computeSignatureHashFromDraft call
    pub fail_compute_hash: bool,
    /// Fail next finalizeTransactionFromDraft call
    pub fail_finalize: bool,
    /// Fail next sendRawTransaction call
    pub fail_send: bool,
    /// Return a truncated hash from the next hash request
    pub malformed_hash: bool,
    /// Leave `unsignedTx` out of hash responses
    pub omit_unsigned_tx: bool,
    /// Return an authority error with this message for the next operation
    pub next_error_message: Option<String>,
    /// Simulate a transport timeout on the next operation
    pub simulate_timeout: bool,
}

#[derive(Debug, Default)]
struct MockState {
    utxos: HashMap<Address, Vec<Utxo>>,
    failing_addresses: HashSet<Address>,
    failure_modes: MockAuthorityFailureModes,
    rejection_reason: Option<String>,
    calls: Vec<String>,
    finalize_requests: Vec<FinalizeRequest>,
    submitted: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MockSettlementAuthority {
    state: Arc<Mutex<MockState>>,
    provider: Arc<dyn CryptoProvider>,
    network_delay: Duration,
}

impl Default for MockSettlementAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSettlementAuthority {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            provider: default_provider(),
            network_delay: Duration::ZERO,
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the UTXO snapshot returned for `address`
    pub fn set_utxos(&self, address: Address, utxos: Vec<Utxo>) {
        self.state().utxos.insert(address, utxos);
    }

    /// Every getUTXO for `address` fails with a transport error until cleared
    pub fn fail_address(&self, address: Address) {
        self.state().failing_addresses.insert(address);
    }

    pub fn clear_failing_addresses(&self) {
        self.state().failing_addresses.clear();
    }

    pub fn set_failure_modes(&self, modes: MockAuthorityFailureModes) {
        self.state().failure_modes = modes;
    }

    /// Report every following submission as not accepted with `reason`
    pub fn reject_submissions<S: Into<String>>(&self, reason: S) {
        self.state().rejection_reason = Some(reason.into());
    }

    pub fn accept_submissions(&self) {
        self.state().rejection_reason = None;
    }

    pub fn set_network_delay(&mut self, delay: Duration) {
        self.network_delay = delay;
    }

    /// Method names in call order
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state().calls.iter().filter(|m| *m == method).count()
    }

    pub fn finalize_requests(&self) -> Vec<FinalizeRequest> {
        self.state().finalize_requests.clone()
    }

    pub fn submitted_transactions(&self) -> Vec<String> {
        self.state().submitted.clone()
    }

    /// Reset scripted data, failure modes and recorded calls
    pub fn reset(&self) {
        *self.state() = MockState::default();
    }

    /// Digest the mock issues for a draft: SHA-256 over the draft JSON,
    /// the little-endian input index and the sighash byte
    pub fn signature_hash_for(
        &self,
        draft: &TransactionDraft,
        input_index: u32,
        sighash_type: SighashType,
    ) -> WalletResult<[u8; 32]> {
        let mut preimage = serde_json::to_vec(draft)?;
        preimage.extend_from_slice(&input_index.to_le_bytes());
        preimage.push(sighash_type.as_u8());
        Ok(self.provider.sha256(&preimage))
    }

    fn unsigned_tx_for(draft: &TransactionDraft) -> WalletResult<String> {
        Ok(hex::encode(serde_json::to_vec(draft)?))
    }

    async fn check_failure(&self, operation: &str) -> WalletResult<()> {
        if !self.network_delay.is_zero() {
            tokio::time::sleep(self.network_delay).await;
        }

        let mut state = self.state();
        state.calls.push(operation.to_string());
        let modes = &mut state.failure_modes;

        if modes.simulate_timeout {
            modes.simulate_timeout = false;
            return Err(WalletError::TransportError(
                "Mock timeout: operation timed out".to_string(),
            ));
        }
        if let Some(message) = modes.next_error_message.take() {
            return Err(WalletError::AuthorityError {
                code: MOCK_FAILURE_CODE,
                message,
            });
        }

        let flag = match operation {
            methods::GET_UTXO => &mut modes.fail_get_utxo,
            methods::COMPUTE_SIGNATURE_HASH => &mut modes.fail_compute_hash,
            methods::FINALIZE_TRANSACTION => &mut modes.fail_finalize,
            methods::SEND_RAW_TRANSACTION => &mut modes.fail_send,
            _ => return Ok(()),
        };
        if std::mem::take(flag) {
            return Err(WalletError::AuthorityError {
                code: MOCK_FAILURE_CODE,
                message: format!("Mock failure: {operation}"),
            });
        }
        Ok(())
    }

    fn invalid_signature(message: &str) -> WalletError {
        WalletError::AuthorityError {
            code: INVALID_SIGNATURE_CODE,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl SettlementAuthority for MockSettlementAuthority {
    async fn get_utxos(&self, address: &Address) -> WalletResult<Vec<Utxo>> {
        self.check_failure(methods::GET_UTXO).await?;
        let state = self.state();
        if state.failing_addresses.contains(address) {
            return Err(WalletError::TransportError(format!(
                "Mock failure: getUTXO for {address}"
            )));
        }
        Ok(state.utxos.get(address).cloned().unwrap_or_default())
    }

    async fn compute_signature_hash(&self, request: &HashRequest) -> WalletResult<HashResponse> {
        self.check_failure(methods::COMPUTE_SIGNATURE_HASH).await?;
        let digest = self.signature_hash_for(&request.draft, request.input_index, request.sighash_type)?;

        let (malformed, omit_unsigned_tx) = {
            let mut state = self.state();
            let modes = &mut state.failure_modes;
            (std::mem::take(&mut modes.malformed_hash), modes.omit_unsigned_tx)
        };

        let hash = if malformed {
            format!("0x{}", hex::encode(&digest[..16]))
        } else {
            format!("0x{}", hex::encode(digest))
        };
        let unsigned_tx = if omit_unsigned_tx {
            None
        } else {
            Some(Self::unsigned_tx_for(&request.draft)?)
        };

        HashResponse::from_raw(RawHashResponse {
            hash: Some(hash),
            unsigned_tx,
        })
    }

    async fn finalize_transaction(&self, request: &FinalizeRequest) -> WalletResult<FinalizeResponse> {
        self.check_failure(methods::FINALIZE_TRANSACTION).await?;
        self.state().finalize_requests.push(request.clone());

        let expected_unsigned = Self::unsigned_tx_for(&request.draft)?;
        if let Some(unsigned_tx) = &request.unsigned_tx {
            if unsigned_tx != &expected_unsigned {
                return Err(Self::invalid_signature("unsignedTx does not match draft"));
            }
        }

        let public_key = request
            .compressed_public_key()
            .map_err(|_| Self::invalid_signature("pubkey must be a 33-byte compressed key"))?;
        let signature = request
            .signature_bytes()
            .map_err(|_| Self::invalid_signature("signature must be 64 bytes"))?;
        let digest = self.signature_hash_for(&request.draft, request.input_index, request.sighash_type)?;

        if !self.provider.verify_prehash(&public_key, &digest, &signature) {
            return Err(Self::invalid_signature("signature does not match signature hash"));
        }

        Ok(FinalizeResponse {
            tx: format!(
                "{expected_unsigned}{}{}",
                hex::encode(public_key),
                hex::encode(signature)
            ),
        })
    }

    async fn send_raw_transaction(&self, signed_tx_hex: &str) -> WalletResult<SubmitResult> {
        self.check_failure(methods::SEND_RAW_TRANSACTION).await?;
        let tx_hash = format!(
            "0x{}",
            hex::encode(self.provider.sha256(signed_tx_hex.as_bytes()))
        );

        let mut state = self.state();
        state.submitted.push(signed_tx_hex.to_string());
        let reason = state.rejection_reason.clone();
        Ok(SubmitResult {
            tx_hash,
            accepted: reason.is_none(),
            reason,
        })
    }
}
