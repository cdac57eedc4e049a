// src/blockchain/services/transactions.rs

use std::time::Duration;

use anyhow::Result;
use ethers_core::types::{Address, TransactionRequest, H256};
use ethers_signers::{LocalWallet, Signer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::blockchain::{
    client::{ChainGateway, TxReceipt},
    nonce_manager::NonceManager,
};

/// How long and how often to poll for a receipt after submission.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReceiptWaitError {
    #[error("no receipt after {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Rpc(#[from] anyhow::Error),
}

/// Completes `tx_request` for `signer`, signs it and broadcasts it.
///
/// The nonce comes from the [`NonceManager`], the chain id from the gateway.
/// Gas limit is estimated and gas price fetched only when the request does not
/// already carry them.
pub async fn send_evm_transaction(
    gateway: &dyn ChainGateway,
    signer: &LocalWallet,
    nonce_manager: &NonceManager,
    tx_request: TransactionRequest,
) -> Result<H256> {
    let from_address = signer.address();

    let mut tx = tx_request.from(from_address).chain_id(gateway.chain_id());

    if tx.gas.is_none() {
        let gas = gateway.estimate_gas(&tx).await?;
        debug!(%gas, "Estimated gas limit");
        tx = tx.gas(gas);
    }

    if tx.gas_price.is_none() {
        tx = tx.gas_price(gateway.get_gas_price().await?);
    }

    let nonce = nonce_manager.next_nonce(from_address, gateway).await?;
    tx = tx.nonce(nonce);

    let submitted = async {
        let raw_tx = gateway.sign(&tx, signer).await?;
        gateway.submit(raw_tx).await
    }
    .await;

    match submitted {
        Ok(tx_hash) => {
            info!(tx_hash = ?tx_hash, from = ?from_address, %nonce, "Transaction submitted");
            Ok(tx_hash)
        }
        Err(e) => {
            nonce_manager.invalidate(from_address).await;
            Err(e)
        }
    }
}

/// [`wait_for_receipt`] for a transaction sent by `from`.
///
/// Giving up forgets the cached nonce of `from`: the transaction may have been
/// dropped, and later nonces must not leave a gap behind it.
pub async fn confirm_transaction(
    gateway: &dyn ChainGateway,
    nonce_manager: &NonceManager,
    from: Address,
    tx_hash: H256,
    policy: ReceiptPolicy,
) -> Result<TxReceipt, ReceiptWaitError> {
    let waited = wait_for_receipt(gateway, tx_hash, policy).await;
    if let Err(ReceiptWaitError::TimedOut(_)) = &waited {
        nonce_manager.invalidate(from).await;
    }
    waited
}

/// Polls for the receipt of `tx_hash` until it appears or the policy's timeout elapses.
pub async fn wait_for_receipt(
    gateway: &dyn ChainGateway,
    tx_hash: H256,
    policy: ReceiptPolicy,
) -> Result<TxReceipt, ReceiptWaitError> {
    let poll = async {
        loop {
            if let Some(receipt) = gateway.get_receipt(tx_hash).await? {
                return Ok::<_, anyhow::Error>(receipt);
            }
            debug!(tx_hash = ?tx_hash, "Transaction not confirmed yet...");
            tokio::time::sleep(policy.poll_interval).await;
        }
    };

    match tokio::time::timeout(policy.timeout, poll).await {
        Ok(receipt) => Ok(receipt?),
        Err(_) => {
            warn!(tx_hash = ?tx_hash, timeout = ?policy.timeout, "Gave up waiting for receipt");
            Err(ReceiptWaitError::TimedOut(policy.timeout))
        }
    }
}
