// src/blockchain/nonce_manager.rs

use std::sync::Arc;

use dashmap::DashMap;
use ethers_core::types::{Address, U256};
use tokio::sync::Mutex;

use crate::blockchain::client::ChainGateway;

// Hands out sequential nonces per signer so transfers and deployments started
// from different chats at the same time do not reuse a nonce.
#[derive(Debug, Default)]
pub struct NonceManager {
    // Each address gets its own state, protected by a Mutex.
    // The DashMap allows for concurrent access to different address states.
    nonces: DashMap<Address, Arc<Mutex<NonceState>>>,
}

#[derive(Debug)]
struct NonceState {
    next_nonce: Option<U256>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the next nonce for `address`.
    ///
    /// The first call (and the first call after [`NonceManager::invalidate`]) reads
    /// `eth_getTransactionCount` through the gateway; later calls increment locally.
    pub async fn next_nonce(
        &self,
        address: Address,
        gateway: &dyn ChainGateway,
    ) -> anyhow::Result<U256> {
        let address_nonce_lock = self
            .nonces
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(NonceState { next_nonce: None })))
            .clone();

        let mut state = address_nonce_lock.lock().await;

        let nonce_to_use = match state.next_nonce {
            Some(nonce) => nonce,
            None => gateway.get_transaction_count(address).await?,
        };

        state.next_nonce = Some(nonce_to_use + U256::one());

        Ok(nonce_to_use)
    }

    /// Forgets the cached nonce so the next call re-reads it from the chain.
    /// Called when a transaction using a handed-out nonce never reached the node,
    /// or was never seen mined.
    pub async fn invalidate(&self, address: Address) {
        if let Some(lock) = self.nonces.get(&address).map(|entry| Arc::clone(entry.value())) {
            lock.lock().await.next_nonce = None;
        }
    }
}
