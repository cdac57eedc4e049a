use std::sync::Arc;

use tracing::{error, info};

use crate::blockchain::{client::ChainGateway, models::BalanceReport, services::token};
use crate::error::BotError;
use crate::utils::parse_address;

/// Builds token-info + balance reports from on-chain reads.
#[derive(Clone)]
pub struct BalanceService {
    gateway: Arc<dyn ChainGateway>,
}

impl BalanceService {
    pub fn new(gateway: Arc<dyn ChainGateway>) -> Self {
        Self { gateway }
    }

    /// Fetches symbol, decimals, name, totalSupply and `balanceOf(wallet)`.
    ///
    /// Both addresses are validated before any chain call. Any failed read
    /// discards everything fetched so far.
    pub async fn get_balance_report(
        &self,
        contract_address: &str,
        wallet_address: &str,
    ) -> Result<BalanceReport, BotError> {
        let contract = parse_address(contract_address)?;
        let wallet = parse_address(wallet_address)?;

        let gateway = self.gateway.as_ref();
        let read = async {
            let token = token::erc20_info(gateway, contract).await?;
            let balance = token::erc20_balance_of(gateway, contract, wallet).await?;
            Ok::<_, anyhow::Error>((token, balance))
        };

        let (token, balance) = read.await.map_err(|e| {
            error!(contract = contract_address, wallet = wallet_address, "Balance lookup failed: {:#}", e);
            BotError::ChainRead(format!("{:#}", e))
        })?;

        info!(contract = contract_address, wallet = wallet_address, %balance, "Balance fetched");

        Ok(BalanceReport {
            contract_address: contract_address.to_string(),
            wallet_address: wallet_address.to_string(),
            token,
            balance,
        })
    }
}
