// src/blockchain/models.rs
use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::utils::percentage_of_supply;

// --- Token Models ---

/// Snapshot of an ERC20 token's metadata, fetched per request and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

/// Contract standards the bot can deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenStandard {
    Erc20,
    Erc721,
    Erc1155,
}

impl TokenStandard {
    pub const ALL: [TokenStandard; 3] = [Self::Erc20, Self::Erc721, Self::Erc1155];

    /// Display label, also the artifact file stem under the contracts directory.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Erc20 => "ERC20",
            Self::Erc721 => "ERC721",
            Self::Erc1155 => "ERC1155",
        }
    }
}

impl std::fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// --- Balance Models ---

/// Everything needed to render a token balance report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    /// Contract address as entered by the user
    pub contract_address: String,
    /// Wallet address as entered by the user
    pub wallet_address: String,
    pub token: TokenInfo,
    /// Raw balance in base units
    pub balance: U256,
}

impl BalanceReport {
    /// Share of the total supply held by the wallet, 0 for a zero supply.
    pub fn percentage_of_supply(&self) -> f64 {
        percentage_of_supply(self.balance, self.token.total_supply)
    }
}

// --- Transaction Models ---

/// Outcome of one submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    pub success: bool,
    pub tx_hash: H256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TransactionResult {
    pub fn succeeded(tx_hash: H256, contract_address: Option<Address>) -> Self {
        Self {
            success: true,
            tx_hash,
            contract_address,
            error_message: None,
        }
    }

    pub fn reverted(tx_hash: H256) -> Self {
        Self {
            success: false,
            tx_hash,
            contract_address: None,
            error_message: Some("Transaction reverted.".to_string()),
        }
    }
}

/// Result of a token transfer together with the data shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub token: TokenInfo,
    /// Amount as entered by the user
    pub amount: String,
    pub base_units: U256,
    pub from: Address,
    pub to_address: String,
    pub result: TransactionResult,
}

/// Result of a contract deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    pub standard: TokenStandard,
    pub deployer: Address,
    pub result: TransactionResult,
}
