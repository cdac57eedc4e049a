// src/lib.rs

// Re-export commonly used types
pub use ethers_core::types::{Address, H256, U256};

pub mod assistant;
pub mod blockchain;
pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod utils;

pub use error::BotError;
