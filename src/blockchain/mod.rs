// src/blockchain/mod.rs

pub mod client;
pub mod evm_client;
pub use client::{ChainGateway, EvmClient};

pub mod models;
pub mod nonce_manager;
pub mod services;

// Re-export commonly used types
pub use ethers_core::types::{Address, H256, U256};
