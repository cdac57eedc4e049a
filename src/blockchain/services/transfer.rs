// src/blockchain/services/transfer.rs

use std::sync::Arc;

use ethers_core::types::{Address, TransactionRequest, U256};
use ethers_signers::{LocalWallet, Signer};
use tracing::{error, info};

use crate::blockchain::{
    client::ChainGateway,
    models::{TokenInfo, TransactionResult, TransferOutcome},
    nonce_manager::NonceManager,
    services::{
        token,
        transactions::{self, ReceiptPolicy, ReceiptWaitError},
    },
};
use crate::error::BotError;
use crate::utils::{parse_address, to_base_units};

/// A validated transfer with the token data read ahead of submission.
#[derive(Debug, Clone)]
pub struct PreparedTransfer {
    pub contract: Address,
    pub to: Address,
    pub to_address: String,
    pub amount: String,
    pub base_units: U256,
    pub token: TokenInfo,
    /// Signer balance before the transfer, informational only
    pub signer_balance: U256,
}

/// Sends ERC20 transfers signed by the configured transfer key.
#[derive(Clone)]
pub struct TransferService {
    gateway: Arc<dyn ChainGateway>,
    signer: LocalWallet,
    nonce_manager: Arc<NonceManager>,
    gas_limit: U256,
    receipt_policy: ReceiptPolicy,
}

impl TransferService {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        signer: LocalWallet,
        nonce_manager: Arc<NonceManager>,
        gas_limit: u64,
        receipt_policy: ReceiptPolicy,
    ) -> Self {
        Self {
            gateway,
            signer,
            nonce_manager,
            gas_limit: U256::from(gas_limit),
            receipt_policy,
        }
    }

    /// Address transfers are sent from
    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    /// Validates the inputs, reads token info and converts `amount` to base units.
    ///
    /// The signer's current balance is read for display; an insufficient
    /// balance does not stop the transfer.
    pub async fn prepare(
        &self,
        contract_address: &str,
        to_address: &str,
        amount: &str,
    ) -> Result<PreparedTransfer, BotError> {
        let contract = parse_address(contract_address)?;
        let to = parse_address(to_address)?;
        // reject malformed amounts before touching the chain
        to_base_units(amount, 0)?;

        let gateway = self.gateway.as_ref();
        let token = token::erc20_info(gateway, contract)
            .await
            .map_err(|e| BotError::ChainRead(format!("{:#}", e)))?;
        let base_units = to_base_units(amount, token.decimals)?;
        let signer_balance = token::erc20_balance_of(gateway, contract, self.signer_address())
            .await
            .map_err(|e| BotError::ChainRead(format!("{:#}", e)))?;

        Ok(PreparedTransfer {
            contract,
            to,
            to_address: to_address.to_string(),
            amount: amount.trim().to_string(),
            base_units,
            token,
            signer_balance,
        })
    }

    /// Signs and submits a prepared transfer, then blocks until its receipt is observed.
    pub async fn execute(&self, prepared: PreparedTransfer) -> Result<TransferOutcome, BotError> {
        let tx_request = TransactionRequest::new()
            .to(prepared.contract)
            .data(token::erc20_transfer_data(prepared.to, prepared.base_units))
            .gas(self.gas_limit);

        let gateway = self.gateway.as_ref();
        let tx_hash = transactions::send_evm_transaction(
            gateway,
            &self.signer,
            &self.nonce_manager,
            tx_request,
        )
        .await
        .map_err(|e| {
            error!(contract = ?prepared.contract, "Transfer submission failed: {:#}", e);
            BotError::ChainSubmission(format!("{:#}", e))
        })?;

        let receipt = transactions::confirm_transaction(
            gateway,
            &self.nonce_manager,
            self.signer_address(),
            tx_hash,
            self.receipt_policy,
        )
        .await
            .map_err(|e| match e {
                ReceiptWaitError::TimedOut(waited) => BotError::Timeout {
                    tx_hash,
                    waited_secs: waited.as_secs(),
                },
                ReceiptWaitError::Rpc(e) => BotError::ChainSubmission(format!("{:#}", e)),
            })?;

        let result = if receipt.is_success() {
            info!(tx_hash = ?tx_hash, amount = %prepared.amount, symbol = %prepared.token.symbol, "Transfer confirmed");
            TransactionResult::succeeded(receipt.transaction_hash, None)
        } else {
            error!(tx_hash = ?tx_hash, "Transfer reverted");
            TransactionResult::reverted(receipt.transaction_hash)
        };

        Ok(TransferOutcome {
            token: prepared.token,
            amount: prepared.amount,
            base_units: prepared.base_units,
            from: self.signer_address(),
            to_address: prepared.to_address,
            result,
        })
    }

    /// [`TransferService::prepare`] followed by [`TransferService::execute`].
    pub async fn transfer(
        &self,
        contract_address: &str,
        to_address: &str,
        amount: &str,
    ) -> Result<TransferOutcome, BotError> {
        let prepared = self.prepare(contract_address, to_address, amount).await?;
        self.execute(prepared).await
    }
}
