//! Blockchain gateway seam for EVM-compatible networks.
//!
//! Everything the bot needs from a node goes through [`ChainGateway`]: read-only
//! contract calls, fee/nonce lookups, signing, raw submission and receipt
//! lookups. [`EvmClient`] is the JSON-RPC implementation used in production;
//! tests substitute an in-memory gateway.

use anyhow::Result;
use async_trait::async_trait;
use ethers_core::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, H256, U64, U256,
};
use ethers_signers::{LocalWallet, Signer};
use serde::Deserialize;

pub use super::evm_client::EvmClient;

/// The subset of a transaction receipt the bot reports on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: H256,
    /// 1 for success, 0 for a reverted transaction
    #[serde(default)]
    pub status: Option<U64>,
    /// Set when the transaction created a contract
    #[serde(default)]
    pub contract_address: Option<Address>,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.status == Some(U64::one())
    }
}

/// Operations consumed from the blockchain node.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Chain id transactions are signed for
    fn chain_id(&self) -> u64;

    /// Read-only `eth_call` against `contract` with ABI-encoded `data`
    async fn call(&self, contract: Address, data: Bytes) -> Result<Bytes>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256>;

    /// Number of transactions sent from `address` (the next nonce)
    async fn get_transaction_count(&self, address: Address) -> Result<U256>;

    async fn get_gas_price(&self) -> Result<U256>;

    /// Signs `tx` with `signer` and returns the RLP-encoded signed transaction.
    async fn sign(&self, tx: &TransactionRequest, signer: &LocalWallet) -> Result<Bytes> {
        let typed: TypedTransaction = tx.clone().into();
        let signature = signer.sign_transaction(&typed).await?;
        Ok(typed.rlp_signed(&signature))
    }

    /// Broadcasts a signed transaction and returns its hash.
    async fn submit(&self, raw_tx: Bytes) -> Result<H256>;

    /// Receipt of `tx_hash`, `None` while the transaction is still pending.
    async fn get_receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_receipt_from_rpc_json() {
        let receipt: TxReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "ab".repeat(32)),
            "status": "0x1",
            "contractAddress": null,
            "blockNumber": "0x10",
            "gasUsed": "0x5208"
        }))
        .unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.contract_address, None);

        let reverted: TxReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "cd".repeat(32)),
            "status": "0x0",
            "contractAddress": "0x1111111111111111111111111111111111111111"
        }))
        .unwrap();
        assert!(!reverted.is_success());
        assert!(reverted.contract_address.is_some());
    }
}
