//! JSON-RPC Chain Provider Adapter
//!
//! Implements `ChainProvider` over HTTP against a wallet-backed JSON-RPC
//! endpoint (a local signer, a wallet bridge, or a dev node with unlocked
//! accounts). JSON-RPC error objects are surfaced as [`RawChainError`] with
//! their code, message and data intact so the classifier sees everything.

use crate::domain::{
    GatewayConfig, RawChainError, RawLog, TransactionReceipt, TransactionRequest,
    DEFAULT_RECEIPT_MISS_LIMIT,
};
use crate::ports::ChainProvider;
use async_trait::async_trait;
use ls_types::{
    address_hex, hash_hex, parse_address, parse_hash, parse_quantity, Address, ChainId, TxHash,
    U256,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<JsonRpcErrorObject> for RawChainError {
    fn from(e: JsonRpcErrorObject) -> Self {
        let data = e.data.map(|d| match d {
            Value::String(s) => s,
            other => other.to_string(),
        });
        RawChainError {
            code: Some(e.code),
            symbol: None,
            message: e.message,
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: String,
    topics: Vec<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
    gas_used: String,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

fn malformed(what: &str, detail: impl std::fmt::Display) -> RawChainError {
    RawChainError::new(format!("malformed {what}: {detail}"))
}

fn decode_bytes(s: &str) -> Result<Vec<u8>, RawChainError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| malformed("hex data", e))
}

impl RpcReceipt {
    fn into_receipt(self) -> Result<Option<TransactionReceipt>, RawChainError> {
        // Pending receipts from some nodes carry no block number yet.
        let Some(block) = self.block_number else {
            return Ok(None);
        };
        let logs = self
            .logs
            .into_iter()
            .map(|log| {
                Ok(RawLog {
                    address: parse_address(&log.address).map_err(|e| malformed("log address", e))?,
                    topics: log
                        .topics
                        .iter()
                        .map(|t| parse_hash(t).map_err(|e| malformed("log topic", e)))
                        .collect::<Result<_, _>>()?,
                    data: decode_bytes(&log.data)?,
                })
            })
            .collect::<Result<Vec<_>, RawChainError>>()?;

        Ok(Some(TransactionReceipt {
            tx_hash: parse_hash(&self.transaction_hash).map_err(|e| malformed("receipt hash", e))?,
            block_number: parse_quantity(&block).map_err(|e| malformed("block number", e))?,
            status: self.status.as_deref() != Some("0x0"),
            gas_used: parse_quantity(&self.gas_used).map_err(|e| malformed("gas used", e))?,
            logs,
        }))
    }
}

fn u256_hex(v: &U256) -> String {
    format!("0x{v:x}")
}

fn tx_object(tx: &TransactionRequest) -> Value {
    let mut obj = json!({
        "from": address_hex(&tx.from),
        "to": address_hex(&tx.to),
        "data": format!("0x{}", hex::encode(&tx.data)),
    });
    if let Some(value) = &tx.value {
        obj["value"] = Value::String(u256_hex(value));
    }
    if let Some(gas) = tx.gas {
        obj["gas"] = Value::String(format!("0x{gas:x}"));
    }
    obj
}

/// HTTP JSON-RPC provider.
pub struct JsonRpcProvider {
    client: Client,
    url: String,
    poll_interval: Duration,
    miss_limit: u32,
    request_id: AtomicU64,
}

impl JsonRpcProvider {
    /// Provider for the endpoint at `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, RawChainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RawChainError::new(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            poll_interval: Duration::from_secs(2),
            miss_limit: DEFAULT_RECEIPT_MISS_LIMIT,
            request_id: AtomicU64::new(1),
        })
    }

    /// Provider polling receipts the way `config` asks.
    pub fn from_config(
        url: impl Into<String>,
        config: &GatewayConfig,
    ) -> Result<Self, RawChainError> {
        Ok(Self::new(url)?
            .with_poll_interval(config.receipt_poll_interval())
            .with_receipt_miss_limit(config.receipt_miss_limit))
    }

    /// Receipt polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Unknown-transaction polls before a broadcast counts as dropped.
    pub fn with_receipt_miss_limit(mut self, limit: u32) -> Self {
        self.miss_limit = limit.max(1);
        self
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<R>, RawChainError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id(),
        };
        trace!(method, "JSON-RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RawChainError::new(format!("no ethereum provider reachable at {}", self.url))
                } else {
                    RawChainError::new(format!("transport error: {e}"))
                }
            })?;

        let body: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| malformed("JSON-RPC response", e))?;

        if let Some(error) = body.error {
            debug!(method, code = error.code, "JSON-RPC error");
            return Err(error.into());
        }
        Ok(body.result)
    }

    async fn call_required<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, RawChainError> {
        self.call(method, params)
            .await?
            .ok_or_else(|| malformed("JSON-RPC response", format!("{method} returned no result")))
    }

    fn parse_accounts(raw: Vec<String>) -> Result<Vec<Address>, RawChainError> {
        raw.iter()
            .map(|a| parse_address(a).map_err(|e| malformed("account", e)))
            .collect()
    }
}

#[async_trait]
impl ChainProvider for JsonRpcProvider {
    async fn is_available(&self) -> bool {
        self.call::<String>("web3_clientVersion", json!([]))
            .await
            .is_ok()
    }

    async fn accounts(&self) -> Result<Vec<Address>, RawChainError> {
        let raw: Vec<String> = self.call_required("eth_accounts", json!([])).await?;
        Self::parse_accounts(raw)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, RawChainError> {
        let raw: Vec<String> = self
            .call_required("eth_requestAccounts", json!([]))
            .await?;
        Self::parse_accounts(raw)
    }

    async fn chain_id(&self) -> Result<ChainId, RawChainError> {
        let raw: String = self.call_required("eth_chainId", json!([])).await?;
        ChainId::from_hex(&raw).map_err(|e| malformed("chain id", e))
    }

    async fn switch_network(&self, chain_id: ChainId) -> Result<(), RawChainError> {
        self.call::<Value>(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id.to_hex() }]),
        )
        .await
        .map(|_| ())
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RawChainError> {
        let mut object = tx_object(tx);
        if let Some(map) = object.as_object_mut() {
            map.remove("gas");
        }
        let raw: String = self.call_required("eth_estimateGas", json!([object])).await?;
        parse_quantity(&raw).map_err(|e| malformed("gas estimate", e))
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, RawChainError> {
        let raw: String = self
            .call_required("eth_sendTransaction", json!([tx_object(tx)]))
            .await?;
        parse_hash(&raw).map_err(|e| malformed("transaction hash", e))
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RawChainError> {
        let mut misses = 0u32;
        loop {
            if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                return Ok(Some(receipt));
            }

            let known: Option<Value> = self
                .call("eth_getTransactionByHash", json!([hash_hex(&tx_hash)]))
                .await?;
            if known.map_or(true, |v| v.is_null()) {
                misses += 1;
                if misses >= self.miss_limit {
                    return Ok(None);
                }
            } else {
                misses = 0;
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RawChainError> {
        let receipt: Option<RpcReceipt> = self
            .call("eth_getTransactionReceipt", json!([hash_hex(&tx_hash)]))
            .await?;
        match receipt {
            Some(r) => r.into_receipt(),
            None => Ok(None),
        }
    }
}
