//! JSON-RPC 2.0 settlement authority over HTTP
//!
//! ```rust,no_run
//! use ledger_wallet_libs::{authority::{HttpSettlementAuthority, SettlementAuthority}, WalletConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let authority = HttpSettlementAuthority::from_config(&WalletConfig::new("http://127.0.0.1:8545"))?;
//! let utxos = authority.get_utxos(&"0x00000000000000000000000000000000000000aa".parse()?).await?;
//! println!("{} unspent outputs", utxos.len());
//! # Ok(())
//! # }
//! ```

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    authority::{methods, SettlementAuthority},
    config::WalletConfig,
    data_structures::{types::Address, utxo::Utxo},
    errors::{WalletError, WalletResult},
    signing::models::{
        FinalizeRequest, FinalizeResponse, HashRequest, HashResponse, RawHashResponse,
        SubmitResult, UtxoListResponse,
    },
};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// HTTP client for a JSON-RPC settlement authority
#[derive(Debug)]
pub struct HttpSettlementAuthority {
    client: Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl HttpSettlementAuthority {
    pub fn new(rpc_url: String, timeout: Duration) -> WalletResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::TransportError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            rpc_url,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &WalletConfig) -> WalletResult<Self> {
        config.validate()?;
        Self::new(config.rpc_url.clone(), config.request_timeout)
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> WalletResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(method, id, "JSON-RPC request");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WalletError::TransportError(format!("{method}: {e}")))?;

        if !response.status().is_success() {
            return Err(WalletError::TransportError(format!(
                "{method}: HTTP error {}",
                response.status()
            )));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::MalformedResponse(format!("{method}: {e}")))?;

        if let Some(error) = body.error {
            return Err(WalletError::AuthorityError {
                code: error.code,
                message: error.message,
            });
        }
        let result = body.result.ok_or_else(|| WalletError::malformed("result"))?;
        serde_json::from_value(result).map_err(|e| WalletError::MalformedResponse(format!("{method}: {e}")))
    }
}

fn to_param<T: Serialize>(value: &T) -> WalletResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        WalletError::SerializationError(crate::errors::SerializationError::JsonSerializationError(
            e.to_string(),
        ))
    })
}

#[async_trait]
impl SettlementAuthority for HttpSettlementAuthority {
    async fn get_utxos(&self, address: &Address) -> WalletResult<Vec<Utxo>> {
        let response: UtxoListResponse = self
            .call(methods::GET_UTXO, vec![Value::String(address.to_base58())])
            .await?;
        Ok(response.utxos)
    }

    async fn compute_signature_hash(&self, request: &HashRequest) -> WalletResult<HashResponse> {
        let raw: RawHashResponse = self
            .call(methods::COMPUTE_SIGNATURE_HASH, vec![to_param(request)?])
            .await?;
        HashResponse::from_raw(raw)
    }

    async fn finalize_transaction(&self, request: &FinalizeRequest) -> WalletResult<FinalizeResponse> {
        self.call(methods::FINALIZE_TRANSACTION, vec![to_param(request)?])
            .await
    }

    async fn send_raw_transaction(&self, signed_tx_hex: &str) -> WalletResult<SubmitResult> {
        self.call(
            methods::SEND_RAW_TRANSACTION,
            vec![Value::String(signed_tx_hex.to_string())],
        )
        .await
    }
}
