// src/main.rs

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use metis_token_bot::{
    assistant::{AssistantClient, OpenAiAssistant},
    blockchain::{
        client::{ChainGateway, EvmClient},
        nonce_manager::NonceManager,
        services::{
            balance::BalanceService,
            deploy::{ArtifactStore, Deployer},
            transfer::TransferService,
        },
    },
    bot::{Dispatcher, SessionStore},
    channels::{
        repl::{run_repl, ConsoleAgent},
        telegram::{run_telegram, TelegramApi},
    },
    config::{Config, RunMode},
    error::BotError,
};
use tokio::io::{self, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing; stdout belongs to the console agent
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metis_token_bot=debug,token_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mode = RunMode::from_env(env::args());

    // Load configuration
    let config = match Config::from_env(mode) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match config.mode {
        RunMode::Cli => run_cli(config).await,
        RunMode::Telegram => run_bot(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(config: Config) -> anyhow::Result<()> {
    let gateway: Arc<dyn ChainGateway> = Arc::new(EvmClient::new(
        &config.network.rpc_url,
        config.network.chain_id,
    ));
    let assistant: Arc<dyn AssistantClient> = Arc::new(OpenAiAssistant::new(config.assistant.clone()));

    let agent = ConsoleAgent::new(
        BalanceService::new(gateway),
        assistant,
        config.network.name.clone(),
        config.network.explorer_url.clone(),
    );
    run_repl(&agent, BufReader::new(io::stdin()), io::stdout()).await
}

async fn run_bot(config: Config) -> anyhow::Result<()> {
    // Both are checked by Config in Telegram mode
    let (Some(transfer_signer), Some(token)) =
        (config.transfer_signer.clone(), config.telegram_token.clone())
    else {
        return Err(BotError::Configuration("Telegram mode needs PRIVATE_KEY and TELEGRAM_BOT_TOKEN".into()).into());
    };

    let gateway: Arc<dyn ChainGateway> = Arc::new(EvmClient::new(
        &config.network.rpc_url,
        config.network.chain_id,
    ));
    let nonce_manager = Arc::new(NonceManager::new());
    let assistant: Arc<dyn AssistantClient> = Arc::new(OpenAiAssistant::new(config.assistant.clone()));

    let transfer = TransferService::new(
        Arc::clone(&gateway),
        transfer_signer,
        Arc::clone(&nonce_manager),
        config.transfer_gas_limit,
        config.receipt_policy,
    );
    info!(
        network = %config.network.name,
        wallet = ?transfer.signer_address(),
        "🔑 Using transfer wallet"
    );

    let mut dispatcher = Dispatcher::new(
        BalanceService::new(Arc::clone(&gateway)),
        transfer,
        assistant,
        Arc::new(SessionStore::new()),
        config.network.clone(),
    );
    if let Some(deployer_signer) = config.deployer_signer.clone() {
        let deployer = Deployer::new(
            Arc::clone(&gateway),
            deployer_signer,
            nonce_manager,
            ArtifactStore::new(&config.contracts_dir),
            config.receipt_policy,
        );
        info!(
            deployer = ?deployer.deployer_address(),
            contracts_dir = %config.contracts_dir.display(),
            "Token deployment enabled"
        );
        dispatcher = dispatcher.with_deployer(deployer);
    }

    let api = Arc::new(TelegramApi::new(&config.telegram_api_url, token));
    run_telegram(api, Arc::new(dispatcher)).await
}
