// src/bot/format.rs

use crate::blockchain::models::{BalanceReport, DeploymentOutcome, TokenStandard, TransferOutcome};
use crate::bot::protocol::{
    Button, CALLBACK_CANCEL_DEPLOY, CALLBACK_DEPLOY_ERC1155, CALLBACK_DEPLOY_ERC20,
    CALLBACK_DEPLOY_ERC721,
};
use crate::error::{FAILURE_MARKER, SUCCESS_MARKER};
use crate::utils::format_token_amount;

pub const BALANCE_USAGE: &str = "/balance <contract_address> <wallet_address>";
pub const TRANSFER_USAGE: &str = "/transfer <contract_address> <to_address> <amount>";

pub const CHECKING_BALANCE: &str = "🔍 Checking token balance...";

pub const BALANCE_GUIDANCE: &str = "Please provide both contract and wallet addresses.\n\
Example: Check balance for contract 0x123... wallet 0x456...";
pub const TRANSFER_GUIDANCE: &str = "Please provide contract address, recipient address, and amount.\n\
Example: Transfer 100 tokens from contract 0x123... to 0x456...";

/// Full report with decimals, share of supply and explorer links.
pub fn balance_report(report: &BalanceReport, explorer_url: &str) -> String {
    let token = &report.token;
    format!(
        "💰 Token Balance Report\n\n\
         Token Information:\n\
         • Name: {name}\n\
         • Symbol: {symbol}\n\
         • Decimals: {decimals}\n\
         • Total Supply: {supply} {symbol}\n\n\
         Wallet Information:\n\
         • Address: {wallet}\n\
         • Balance: {balance} {symbol}\n\
         • % of Supply: {percentage:.4}%\n\n\
         🔍 View on Explorer:\n\
         • Token: {explorer}/token/{contract}\n\
         • Wallet: {explorer}/address/{wallet}",
        name = token.name,
        symbol = token.symbol,
        decimals = token.decimals,
        supply = token.total_supply,
        wallet = report.wallet_address,
        balance = format_token_amount(report.balance, token.decimals),
        percentage = report.percentage_of_supply(),
        explorer = explorer_url,
        contract = report.contract_address,
    )
}

/// Console report: raw figures, no decimals or percentage.
pub fn balance_report_plain(report: &BalanceReport, explorer_url: &str) -> String {
    let token = &report.token;
    format!(
        "💰 Token Balance Report\n\n\
         Token Name: {name}\n\
         Symbol: {symbol}\n\
         Total Supply: {supply} {symbol}\n\n\
         Wallet: {wallet}\n\
         Balance: {balance} {symbol}\n\n\
         🔍 View on Explorer:\n\
         Token: {explorer}/token/{contract}\n\
         Wallet: {explorer}/address/{wallet}",
        name = token.name,
        symbol = token.symbol,
        supply = token.total_supply,
        wallet = report.wallet_address,
        balance = report.balance,
        explorer = explorer_url,
        contract = report.contract_address,
    )
}

pub fn transfer_status(balance: &str, symbol: &str) -> String {
    format!("🔄 Processing transfer...\nCurrent balance: {} {}", balance, symbol)
}

pub fn transfer_result(outcome: &TransferOutcome, explorer_url: &str) -> String {
    let tx_link = format!("{}/tx/{:?}", explorer_url, outcome.result.tx_hash);
    if !outcome.result.success {
        return format!(
            "{} Transfer failed: {}\n\n🔍 View transaction:\n{}",
            FAILURE_MARKER,
            outcome.result.error_message.as_deref().unwrap_or("Transaction reverted."),
            tx_link
        );
    }
    format!(
        "{} Transfer Successful!\n\n\
         Token: {} ({})\n\
         Amount: {} {}\n\
         From: {:?}\n\
         To: {}\n\n\
         🔍 View transaction:\n{}",
        SUCCESS_MARKER,
        outcome.token.name,
        outcome.token.symbol,
        outcome.amount,
        outcome.token.symbol,
        outcome.from,
        outcome.to_address,
        tx_link
    )
}

pub fn deploying(standard: TokenStandard) -> String {
    format!("🚀 Deploying your {} contract...", standard)
}

pub fn deployment_result(outcome: &DeploymentOutcome, explorer_url: &str) -> String {
    let tx_link = format!("{}/tx/{:?}", explorer_url, outcome.result.tx_hash);
    match (outcome.result.success, outcome.result.contract_address) {
        (true, Some(contract)) => format!(
            "{} {} contract deployed!\n\n\
             Contract: {:?}\n\
             Deployer: {:?}\n\n\
             🔍 View on Explorer:\n\
             • Contract: {}/address/{:?}\n\
             • Transaction: {}",
            SUCCESS_MARKER,
            outcome.standard,
            contract,
            outcome.deployer,
            explorer_url,
            contract,
            tx_link
        ),
        _ => format!(
            "{} Deployment failed: {}\n\n🔍 View transaction:\n{}",
            FAILURE_MARKER,
            outcome
                .result
                .error_message
                .as_deref()
                .unwrap_or("Transaction reverted."),
            tx_link
        ),
    }
}

/// User-chosen, so neither a success nor a failure marker.
pub fn deployment_cancelled() -> String {
    "🛑 Deployment cancelled.".to_string()
}

pub fn session_already_active() -> String {
    format!(
        "{} A deployment is already in progress. Finish it or send /cancel first.",
        FAILURE_MARKER
    )
}

pub fn deployment_disabled() -> String {
    format!("{} Token deployment is not enabled on this bot.", FAILURE_MARKER)
}

/// One row per token standard plus a cancel row.
pub fn token_type_keyboard() -> Vec<Vec<Button>> {
    let mut rows: Vec<Vec<Button>> = TokenStandard::ALL
        .iter()
        .map(|standard| vec![Button::new(format!("Deploy {}", standard), deploy_callback(*standard))])
        .collect();
    rows.push(vec![Button::new("Cancel", CALLBACK_CANCEL_DEPLOY)]);
    rows
}

pub fn deploy_callback(standard: TokenStandard) -> &'static str {
    match standard {
        TokenStandard::Erc20 => CALLBACK_DEPLOY_ERC20,
        TokenStandard::Erc721 => CALLBACK_DEPLOY_ERC721,
        TokenStandard::Erc1155 => CALLBACK_DEPLOY_ERC1155,
    }
}

pub fn standard_for_callback(data: &str) -> Option<TokenStandard> {
    TokenStandard::ALL
        .into_iter()
        .find(|standard| deploy_callback(*standard) == data)
}

pub fn greeting(deploy_enabled: bool) -> String {
    if deploy_enabled {
        "👋 Hello! Which kind of token contract would you like to deploy?".to_string()
    } else {
        "👋 Hello! Send /help to see what I can do.".to_string()
    }
}

pub fn help(network_name: &str, deploy_enabled: bool) -> String {
    let mut text = format!(
        "🤖 Token assistant on {}\n\n\
         Available commands:\n\
         1. {}\n\
         2. {}\n\
         3. Natural language: 'Check balance for contract 0x... wallet 0x...'\n\
         4. Natural language: 'Transfer 100 tokens from contract 0x... to 0x...'",
        network_name, BALANCE_USAGE, TRANSFER_USAGE
    );
    if deploy_enabled {
        text.push_str("\n5. Say hi to deploy a new ERC20, ERC721 or ERC1155 contract (/cancel aborts)");
    }
    text.push_str("\n\nAnything else goes to the AI assistant.");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::models::{TokenInfo, TransactionResult};
    use ethers_core::types::{Address, H256, U256};

    fn report(balance: u64, supply: u64) -> BalanceReport {
        BalanceReport {
            contract_address: "0x1111111111111111111111111111111111111111".into(),
            wallet_address: "0x2222222222222222222222222222222222222222".into(),
            token: TokenInfo {
                name: "Test Token".into(),
                symbol: "TST".into(),
                decimals: 2,
                total_supply: U256::from(supply),
            },
            balance: U256::from(balance),
        }
    }

    #[test]
    fn test_balance_report_lines() {
        let text = balance_report(&report(2_500, 10_000), "https://explorer");
        assert!(text.starts_with("💰"));
        assert!(text.contains("• Decimals: 2"));
        assert!(text.contains("• Total Supply: 10000 TST"));
        assert!(text.contains("• Balance: 25 TST"));
        assert!(text.contains("• % of Supply: 25.0000%"));
        assert!(text.contains("https://explorer/token/0x1111111111111111111111111111111111111111"));
        assert!(text.contains("https://explorer/address/0x2222222222222222222222222222222222222222"));

        let zero = balance_report(&report(5, 0), "https://explorer");
        assert!(zero.contains("• % of Supply: 0.0000%"));
    }

    #[test]
    fn test_plain_report_omits_percentage() {
        let text = balance_report_plain(&report(2_500, 10_000), "https://explorer");
        assert!(text.contains("Balance: 2500 TST"));
        assert!(!text.contains("% of Supply"));
        assert!(!text.contains("Decimals"));
    }

    #[test]
    fn test_transfer_result_markers() {
        let mut outcome = TransferOutcome {
            token: report(0, 0).token,
            amount: "1.5".into(),
            base_units: U256::from(150u64),
            from: Address::zero(),
            to_address: "0x2222222222222222222222222222222222222222".into(),
            result: TransactionResult::succeeded(H256::repeat_byte(0xab), None),
        };
        let ok = transfer_result(&outcome, "https://explorer");
        assert!(ok.starts_with(SUCCESS_MARKER));
        assert!(ok.contains("Amount: 1.5 TST"));
        assert!(ok.contains(&format!("https://explorer/tx/0x{}", "ab".repeat(32))));

        outcome.result = TransactionResult::reverted(H256::repeat_byte(0xab));
        let failed = transfer_result(&outcome, "https://explorer");
        assert!(failed.starts_with(FAILURE_MARKER));
        assert!(failed.contains("reverted"));
    }

    #[test]
    fn test_cancellation_is_neither_success_nor_failure() {
        let text = deployment_cancelled();
        assert!(!text.starts_with(SUCCESS_MARKER));
        assert!(!text.starts_with(FAILURE_MARKER));
        assert!(text.contains("cancelled"));
    }

    #[test]
    fn test_keyboard_callbacks_round_trip() {
        let keyboard = token_type_keyboard();
        assert_eq!(keyboard.len(), 4);
        assert_eq!(keyboard[0][0].data, "deploy_erc20");
        assert_eq!(keyboard[3][0].data, "cancel_deploy");
        assert_eq!(standard_for_callback("deploy_erc1155"), Some(TokenStandard::Erc1155));
        assert_eq!(standard_for_callback("cancel_deploy"), None);
    }
}
