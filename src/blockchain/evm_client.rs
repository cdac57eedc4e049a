// src/blockchain/evm_client.rs

use crate::blockchain::client::{ChainGateway, TxReceipt};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, TransactionRequest, H256, U256};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

/// JSON-RPC client for a single EVM-compatible network
#[derive(Clone, Debug)]
pub struct EvmClient {
    client: Client,
    rpc_url: String,
    chain_id: u64,
}

impl EvmClient {
    /// Create a new EvmClient talking to `rpc_url`
    pub fn new(rpc_url: &str, chain_id: u64) -> Self {
        Self {
            client: Client::new(),
            rpc_url: rpc_url.to_string(),
            chain_id,
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Sends one JSON-RPC request and decodes its `result` field.
    async fn rpc<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        debug!(method, "Sending JSON-RPC request");

        let response: Value = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{} request failed", method))?
            .json()
            .await
            .with_context(|| format!("{} returned a non-JSON response", method))?;

        if let Some(err) = response.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(anyhow!("RPC error from {}: {}", method, message));
        }

        let result = response.get("result").cloned().unwrap_or(Value::Null);
        serde_json::from_value(result)
            .with_context(|| format!("Unexpected {} result in response: {}", method, response))
    }
}

#[async_trait]
impl ChainGateway for EvmClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn call(&self, contract: Address, data: Bytes) -> Result<Bytes> {
        self.rpc(
            "eth_call",
            json!([{ "to": contract, "data": data }, "latest"]),
        )
        .await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256> {
        let call_obj = serde_json::to_value(tx)?;
        self.rpc("eth_estimateGas", json!([call_obj])).await
    }

    async fn get_transaction_count(&self, address: Address) -> Result<U256> {
        self.rpc("eth_getTransactionCount", json!([address, "pending"]))
            .await
    }

    async fn get_gas_price(&self) -> Result<U256> {
        self.rpc("eth_gasPrice", json!([])).await
    }

    async fn submit(&self, raw_tx: Bytes) -> Result<H256> {
        self.rpc("eth_sendRawTransaction", json!([raw_tx])).await
    }

    async fn get_receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>> {
        self.rpc("eth_getTransactionReceipt", json!([tx_hash])).await
    }
}
