//! Settlement authority boundary
//!
//! The settlement authority is the remote service that owns the ledger view.
//! The wallet asks it for UTXO snapshots, signature hashes, finalization and
//! submission, and treats every answer as authoritative. Errors from the
//! authority are never retried here.

pub mod caching;
#[cfg(feature = "http")]
pub mod http;
pub mod mocks;

pub use caching::CachingAuthority;
#[cfg(feature = "http")]
pub use http::HttpSettlementAuthority;
pub use mocks::{MockAuthorityFailureModes, MockSettlementAuthority};

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    data_structures::{types::Address, utxo::Utxo},
    errors::WalletResult,
    signing::models::{FinalizeRequest, FinalizeResponse, HashRequest, HashResponse, SubmitResult},
    utils::batch::BatchProcessor,
};

/// JSON-RPC method names
pub mod methods {
    pub const GET_UTXO: &str = "getUTXO";
    pub const COMPUTE_SIGNATURE_HASH: &str = "computeSignatureHashFromDraft";
    pub const FINALIZE_TRANSACTION: &str = "finalizeTransactionFromDraft";
    pub const SEND_RAW_TRANSACTION: &str = "sendRawTransaction";
}

#[async_trait]
pub trait SettlementAuthority: Send + Sync {
    /// `getUTXO`: unspent outputs owned by `address`, in ledger order
    async fn get_utxos(&self, address: &Address) -> WalletResult<Vec<Utxo>>;

    /// `computeSignatureHashFromDraft`
    async fn compute_signature_hash(&self, request: &HashRequest) -> WalletResult<HashResponse>;

    /// `finalizeTransactionFromDraft`
    async fn finalize_transaction(&self, request: &FinalizeRequest) -> WalletResult<FinalizeResponse>;

    /// `sendRawTransaction`
    async fn send_raw_transaction(&self, signed_tx_hex: &str) -> WalletResult<SubmitResult>;

    /// Called once the ledger has answered a submission spending from `address`.
    /// Adapters holding UTXO snapshots drop the one for `address`.
    fn invalidate_utxos(&self, _address: &Address) {}
}

#[async_trait]
impl<T: SettlementAuthority + ?Sized> SettlementAuthority for Arc<T> {
    async fn get_utxos(&self, address: &Address) -> WalletResult<Vec<Utxo>> {
        (**self).get_utxos(address).await
    }

    async fn compute_signature_hash(&self, request: &HashRequest) -> WalletResult<HashResponse> {
        (**self).compute_signature_hash(request).await
    }

    async fn finalize_transaction(&self, request: &FinalizeRequest) -> WalletResult<FinalizeResponse> {
        (**self).finalize_transaction(request).await
    }

    async fn send_raw_transaction(&self, signed_tx_hex: &str) -> WalletResult<SubmitResult> {
        (**self).send_raw_transaction(signed_tx_hex).await
    }

    fn invalidate_utxos(&self, address: &Address) {
        (**self).invalidate_utxos(address)
    }
}

/// Query several addresses through `processor`; one result per address, in order
pub async fn fetch_utxos_for_addresses(
    authority: Arc<dyn SettlementAuthority>,
    addresses: Vec<Address>,
    processor: &BatchProcessor,
) -> Vec<(Address, WalletResult<Vec<Utxo>>)> {
    let results = processor
        .run(addresses.clone(), move |address| {
            let authority = authority.clone();
            async move { authority.get_utxos(&address).await }
        })
        .await;
    addresses.into_iter().zip(results).collect()
}
