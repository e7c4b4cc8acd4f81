//! Two-phase signing against the settlement authority
//!
//! ```text
//! Built -> HashRequested -> Signed -> Finalized -> Submitted
//!    \___________\____________\__________\_______> Rejected
//! ```
//!
//! 1. The authority hashes the draft (`computeSignatureHashFromDraft`). The
//!    digest is used as returned and never recomputed locally.
//! 2. The wallet signs the digest.
//! 3. The authority assembles the signed transaction
//!    (`finalizeTransactionFromDraft`).
//! 4. The signed transaction is submitted (`sendRawTransaction`).
//!
//! Any failure after the session is built moves it to `Rejected`, which is
//! terminal: a new draft is needed. Additional signers of the same draft run
//! [`SigningCoordinator::cosign`], which stops after step 2.

use std::{fmt::Display, sync::Arc};

use tracing::{debug, info, warn};

use crate::{
    authority::SettlementAuthority,
    config::WalletConfig,
    crypto::{COMPRESSED_PUBLIC_KEY_LEN, SIGNATURE_LEN},
    errors::{WalletError, WalletResult},
    signing::models::{
        Cosignature, FinalizeRequest, HashRequest, HashResponse, SighashType, SubmitResult,
        TransactionDraft,
    },
    wallet::Wallet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningState {
    Built,
    HashRequested,
    Signed,
    Finalized,
    Submitted,
    Rejected,
}

impl SigningState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningState::Built => "Built",
            SigningState::HashRequested => "HashRequested",
            SigningState::Signed => "Signed",
            SigningState::Finalized => "Finalized",
            SigningState::Submitted => "Submitted",
            SigningState::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SigningState::Submitted | SigningState::Rejected)
    }
}

impl Display for SigningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One draft moving through the signing protocol
#[derive(Debug, Clone)]
pub struct SigningSession {
    draft: TransactionDraft,
    state: SigningState,
    hash: Option<HashResponse>,
    public_key: Option<[u8; COMPRESSED_PUBLIC_KEY_LEN]>,
    signature: Option<[u8; SIGNATURE_LEN]>,
    signed_tx: Option<String>,
    submission: Option<SubmitResult>,
    rejection_reason: Option<String>,
}

impl SigningSession {
    pub fn new(draft: TransactionDraft) -> Self {
        Self {
            draft,
            state: SigningState::Built,
            hash: None,
            public_key: None,
            signature: None,
            signed_tx: None,
            submission: None,
            rejection_reason: None,
        }
    }

    pub fn draft(&self) -> &TransactionDraft {
        &self.draft
    }

    pub fn state(&self) -> SigningState {
        self.state
    }

    pub fn hash(&self) -> Option<&HashResponse> {
        self.hash.as_ref()
    }

    pub fn signature(&self) -> Option<&[u8; SIGNATURE_LEN]> {
        self.signature.as_ref()
    }

    pub fn signed_transaction(&self) -> Option<&str> {
        self.signed_tx.as_deref()
    }

    pub fn submission(&self) -> Option<&SubmitResult> {
        self.submission.as_ref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    fn expect_state(&self, expected: SigningState) -> WalletResult<()> {
        if self.state != expected {
            return Err(WalletError::InvalidState {
                expected: expected.as_str(),
                actual: self.state.as_str(),
            });
        }
        Ok(())
    }

    fn advance(&mut self, next: SigningState) {
        debug!(from = %self.state, to = %next, "Signing state transition");
        self.state = next;
    }

    /// Record the failure and hand the error back to the caller
    fn reject(&mut self, error: WalletError) -> WalletError {
        warn!(state = %self.state, error = %error, "Signing session rejected");
        self.rejection_reason = Some(error.to_string());
        self.state = SigningState::Rejected;
        error
    }
}

pub struct SigningCoordinator {
    authority: Arc<dyn SettlementAuthority>,
    sighash_type: SighashType,
    input_index: u32,
}

impl SigningCoordinator {
    pub fn new(authority: Arc<dyn SettlementAuthority>, config: &WalletConfig) -> Self {
        Self {
            authority,
            sighash_type: config.sighash_type,
            input_index: config.input_index,
        }
    }

    pub fn sighash_type(&self) -> SighashType {
        self.sighash_type
    }

    /// Phase one: obtain the digest to sign
    pub async fn request_hash(&self, session: &mut SigningSession) -> WalletResult<()> {
        session.expect_state(SigningState::Built)?;
        let request = HashRequest {
            draft: session.draft.clone(),
            input_index: self.input_index,
            sighash_type: self.sighash_type,
        };

        match self.authority.compute_signature_hash(&request).await {
            Ok(response) => {
                debug!(
                    hash = %response.hash,
                    has_unsigned_tx = response.unsigned_tx.is_some(),
                    "Received signature hash"
                );
                session.hash = Some(response);
                session.advance(SigningState::HashRequested);
                Ok(())
            }
            Err(e) => Err(session.reject(e)),
        }
    }

    /// Sign the digest the authority returned
    pub fn sign(&self, session: &mut SigningSession, wallet: &Wallet) -> WalletResult<()> {
        session.expect_state(SigningState::HashRequested)?;
        let Some(hash) = session.hash.as_ref() else {
            return Err(session.reject(WalletError::malformed("hash")));
        };
        let digest = *hash.digest();

        let signed = wallet
            .public_key_compressed()
            .and_then(|public_key| Ok((public_key, wallet.sign_digest(&digest)?)));
        match signed {
            Ok((public_key, signature)) => {
                session.public_key = Some(public_key);
                session.signature = Some(signature);
                session.advance(SigningState::Signed);
                Ok(())
            }
            Err(e) => Err(session.reject(e)),
        }
    }

    /// Phase two: have the authority assemble the signed transaction
    pub async fn finalize(&self, session: &mut SigningSession) -> WalletResult<String> {
        session.expect_state(SigningState::Signed)?;
        let unsigned_tx = session.hash.as_ref().map(|hash| hash.unsigned_tx.clone());
        let (Some(unsigned_tx), Some(public_key), Some(signature)) =
            (unsigned_tx, session.public_key, session.signature)
        else {
            return Err(session.reject(WalletError::InvalidState {
                expected: "Signed",
                actual: "incomplete signature",
            }));
        };
        let request = FinalizeRequest {
            draft: session.draft.clone(),
            unsigned_tx,
            input_index: self.input_index,
            sighash_type: self.sighash_type,
            public_key: public_key.to_vec(),
            signature: signature.to_vec(),
        };

        match self.authority.finalize_transaction(&request).await {
            Ok(response) if response.tx.trim().is_empty() => {
                Err(session.reject(WalletError::malformed("tx")))
            }
            Ok(response) => {
                session.signed_tx = Some(response.tx.clone());
                session.advance(SigningState::Finalized);
                Ok(response.tx)
            }
            Err(e) => Err(session.reject(e)),
        }
    }

    /// Submit the finalized transaction; a non-accepted result is terminal
    pub async fn submit(&self, session: &mut SigningSession) -> WalletResult<SubmitResult> {
        session.expect_state(SigningState::Finalized)?;
        let Some(signed_tx) = session.signed_tx.clone() else {
            return Err(session.reject(WalletError::malformed("tx")));
        };

        let result = self.authority.send_raw_transaction(&signed_tx).await;
        if result.is_ok() {
            // Inputs are spent or contested either way; the next draft needs a fresh snapshot
            self.authority
                .invalidate_utxos(&session.draft.metadata().caller_address);
        }

        match result {
            Ok(result) if result.accepted => {
                info!(tx_hash = %result.tx_hash, "Transaction accepted");
                session.submission = Some(result.clone());
                session.advance(SigningState::Submitted);
                Ok(result)
            }
            Ok(result) => {
                let error = WalletError::Rejected {
                    tx_hash: result.tx_hash.clone(),
                    reason: result
                        .reason
                        .clone()
                        .unwrap_or_else(|| "no reason given".to_string()),
                };
                session.submission = Some(result);
                Err(session.reject(error))
            }
            Err(e) => Err(session.reject(e)),
        }
    }

    /// Run every phase for a single signer
    pub async fn sign_and_submit(
        &self,
        draft: TransactionDraft,
        wallet: &Wallet,
    ) -> WalletResult<(SigningSession, SubmitResult)> {
        let mut session = SigningSession::new(draft);
        self.request_hash(&mut session).await?;
        self.sign(&mut session, wallet)?;
        self.finalize(&mut session).await?;
        let result = self.submit(&mut session).await?;
        Ok((session, result))
    }

    /// Hash and sign `draft` for an additional signer without finalizing
    pub async fn cosign(&self, draft: &TransactionDraft, wallet: &Wallet) -> WalletResult<Cosignature> {
        let mut session = SigningSession::new(draft.clone());
        self.request_hash(&mut session).await?;
        self.sign(&mut session, wallet)?;

        match (session.hash, session.public_key, session.signature) {
            (Some(hash), Some(public_key), Some(signature)) => {
                debug!(signer = %wallet.address(), "Produced cosignature");
                Ok(Cosignature {
                    public_key: public_key.to_vec(),
                    signature: signature.to_vec(),
                    digest: hash.hash,
                })
            }
            _ => Err(WalletError::InvalidState {
                expected: "Signed",
                actual: "incomplete signature",
            }),
        }
    }
}
