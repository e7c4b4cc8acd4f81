//! `getUTXO` response cache in front of another authority
//!
//! Only UTXO snapshots are cached. Hash, finalize and submit calls always go
//! to the inner authority. The signing coordinator invalidates the sender's
//! snapshot once the ledger answers a submission.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    authority::SettlementAuthority,
    config::WalletConfig,
    data_structures::{types::Address, utxo::Utxo},
    errors::WalletResult,
    signing::models::{FinalizeRequest, FinalizeResponse, HashRequest, HashResponse, SubmitResult},
    utils::cache::TtlCache,
};

pub struct CachingAuthority {
    inner: Arc<dyn SettlementAuthority>,
    utxo_cache: Mutex<TtlCache<Address, Vec<Utxo>>>,
}

impl CachingAuthority {
    pub fn new(inner: Arc<dyn SettlementAuthority>, config: &WalletConfig) -> Self {
        Self {
            inner,
            utxo_cache: Mutex::new(TtlCache::new(config.cache_ttl, config.cache_max_entries)),
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, TtlCache<Address, Vec<Utxo>>> {
        self.utxo_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the cached snapshot for `address`
    pub fn invalidate(&self, address: &Address) {
        if self.cache().remove(address).is_some() {
            debug!(%address, "Invalidated cached UTXO snapshot");
        }
    }

    pub fn invalidate_all(&self) {
        self.cache().clear();
    }
}

#[async_trait]
impl SettlementAuthority for CachingAuthority {
    async fn get_utxos(&self, address: &Address) -> WalletResult<Vec<Utxo>> {
        let cached = self.cache().get(address);
        if let Some(cached) = cached {
            debug!(%address, "UTXO cache hit");
            return Ok(cached);
        }
        debug!(%address, "UTXO cache miss");

        let utxos = self.inner.get_utxos(address).await?;
        self.cache().insert(*address, utxos.clone());
        Ok(utxos)
    }

    async fn compute_signature_hash(&self, request: &HashRequest) -> WalletResult<HashResponse> {
        self.inner.compute_signature_hash(request).await
    }

    async fn finalize_transaction(&self, request: &FinalizeRequest) -> WalletResult<FinalizeResponse> {
        self.inner.finalize_transaction(request).await
    }

    async fn send_raw_transaction(&self, signed_tx_hex: &str) -> WalletResult<SubmitResult> {
        self.inner.send_raw_transaction(signed_tx_hex).await
    }

    fn invalidate_utxos(&self, address: &Address) {
        self.invalidate(address);
        self.inner.invalidate_utxos(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        authority::mocks::MockSettlementAuthority,
        data_structures::{
            types::{Amount, Hash256},
            utxo::Outpoint,
        },
    };

    #[tokio::test]
    async fn test_cache_hit_and_invalidate() {
        let mock = Arc::new(MockSettlementAuthority::new());
        let address = Address::new([0xAA; 20]);
        let utxo = Utxo::native(Outpoint::new(Hash256::new([1; 32]), 0), Amount::from(10u64));
        mock.set_utxos(address, vec![utxo.clone()]);

        let caching = CachingAuthority::new(mock.clone(), &WalletConfig::default());
        assert_eq!(caching.get_utxos(&address).await.unwrap(), vec![utxo.clone()]);

        // Served from cache even though the ledger view changed
        mock.set_utxos(address, vec![]);
        assert_eq!(caching.get_utxos(&address).await.unwrap(), vec![utxo]);
        assert_eq!(mock.call_count("getUTXO"), 1);

        caching.invalidate(&address);
        assert!(caching.get_utxos(&address).await.unwrap().is_empty());
        assert_eq!(mock.call_count("getUTXO"), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let mock = Arc::new(MockSettlementAuthority::new());
        let address = Address::new([0xAB; 20]);
        mock.fail_address(address);

        let caching = CachingAuthority::new(mock.clone(), &WalletConfig::default());
        assert!(caching.get_utxos(&address).await.is_err());
        mock.clear_failing_addresses();
        assert!(caching.get_utxos(&address).await.is_ok());
        assert_eq!(mock.call_count("getUTXO"), 2);
    }
}
