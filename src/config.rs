// src/config.rs

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use ethers_signers::{LocalWallet, Signer};
use secrecy::SecretString;

use crate::assistant::{AssistantSettings, CLI_PREAMBLE, TELEGRAM_PREAMBLE};
use crate::blockchain::services::transactions::ReceiptPolicy;
use crate::error::BotError;

const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Which front-end the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Line-oriented console agent
    Cli,
    /// Telegram long-polling bot
    Telegram,
}

impl RunMode {
    /// `--cli` on the command line or a truthy `CLI_MODE` selects the console agent.
    pub fn detect<I, F>(args: I, lookup: F) -> Self
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let flag = args.into_iter().any(|arg| arg == "--cli");
        let env_flag = lookup("CLI_MODE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if flag || env_flag {
            RunMode::Cli
        } else {
            RunMode::Telegram
        }
    }

    /// Loads `.env` into the environment first, so `CLI_MODE` may live there too.
    pub fn from_env<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        dotenvy::dotenv().ok();
        Self::detect(args, |key| env::var(key).ok())
    }
}

/// The single network the bot talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    /// Used only to build human-readable links
    pub explorer_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "Metis Sepolia".to_string(),
            chain_id: 59902,
            rpc_url: "https://sepolia.metisdevops.link".to_string(),
            explorer_url: "https://sepolia-explorer.metisdevops.link".to_string(),
        }
    }
}

// All configuration, loaded once at startup from the environment (and .env).
#[derive(Clone, Debug)]
pub struct Config {
    pub mode: RunMode,
    pub network: NetworkConfig,

    // Signers
    pub transfer_signer: Option<LocalWallet>,
    /// Distinct key for contract deployment; deployment is disabled without it
    pub deployer_signer: Option<LocalWallet>,

    // Telegram
    pub telegram_token: Option<SecretString>,
    pub telegram_api_url: String,

    pub assistant: AssistantSettings,

    // Transaction settings
    pub contracts_dir: PathBuf,
    pub transfer_gas_limit: u64,
    pub receipt_policy: ReceiptPolicy,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env(mode: RunMode) -> Result<Self, BotError> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();
        Self::from_lookup(mode, |key| env::var(key).ok())
    }

    /// Builds the configuration from `lookup`; blank values count as unset.
    pub fn from_lookup<F>(mode: RunMode, lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self::build(mode, &get).map_err(|e| BotError::Configuration(format!("{:#}", e)))
    }

    fn build(mode: RunMode, get: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = NetworkConfig::default();
        let network = NetworkConfig {
            name: defaults.name,
            chain_id: defaults.chain_id,
            rpc_url: checked_url(get("RPC_URL").unwrap_or(defaults.rpc_url), "RPC_URL")?,
            explorer_url: checked_url(
                get("EXPLORER_URL").unwrap_or(defaults.explorer_url),
                "EXPLORER_URL",
            )?
            .trim_end_matches('/')
            .to_string(),
        };

        let transfer_signer = get("PRIVATE_KEY")
            .map(|key| parse_signer(&key, network.chain_id).context("PRIVATE_KEY is not a valid private key"))
            .transpose()?;
        let deployer_signer = get("DEPLOYER_PRIVATE_KEY")
            .map(|key| {
                parse_signer(&key, network.chain_id)
                    .context("DEPLOYER_PRIVATE_KEY is not a valid private key")
            })
            .transpose()?;
        if let (Some(transfer), Some(deployer)) = (&transfer_signer, &deployer_signer) {
            if transfer.address() == deployer.address() {
                return Err(anyhow!(
                    "DEPLOYER_PRIVATE_KEY must be a different key from PRIVATE_KEY"
                ));
            }
        }
        let telegram_token = get("TELEGRAM_BOT_TOKEN").map(SecretString::new);

        if mode == RunMode::Telegram {
            if transfer_signer.is_none() {
                return Err(anyhow!("PRIVATE_KEY must be set to run the Telegram bot"));
            }
            if telegram_token.is_none() {
                return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set to run the Telegram bot"));
            }
        }

        let api_key = get("LLM_API_KEY")
            .or_else(|| get("OPENAI_API_KEY"))
            .context("LLM_API_KEY (or OPENAI_API_KEY) must be set")?;
        let assistant = AssistantSettings {
            api_url: checked_url(
                get("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
                "LLM_API_URL",
            )?,
            api_key: SecretString::new(api_key),
            model: get("LLM_MODEL").unwrap_or_else(|| "gpt-4".to_string()),
            preamble: match mode {
                RunMode::Cli => CLI_PREAMBLE,
                RunMode::Telegram => TELEGRAM_PREAMBLE,
            }
            .to_string(),
            timeout: Duration::from_secs(parse_or(get, "ASSISTANT_TIMEOUT_SECS", 60)?),
        };

        Ok(Config {
            mode,
            network,
            transfer_signer,
            deployer_signer,
            telegram_token,
            telegram_api_url: checked_url(
                get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
                "TELEGRAM_API_URL",
            )?
            .trim_end_matches('/')
            .to_string(),
            assistant,
            contracts_dir: PathBuf::from(get("CONTRACTS_DIR").unwrap_or_else(|| "contracts".to_string())),
            transfer_gas_limit: parse_or(get, "TRANSFER_GAS_LIMIT", 100_000)?,
            receipt_policy: ReceiptPolicy {
                poll_interval: Duration::from_millis(parse_or(get, "RECEIPT_POLL_INTERVAL_MS", 2_000)?),
                timeout: Duration::from_secs(parse_or(get, "RECEIPT_TIMEOUT_SECS", 120)?),
            },
        })
    }

    /// True when a deployer key is configured.
    pub fn deploy_enabled(&self) -> bool {
        self.deployer_signer.is_some()
    }
}

fn parse_signer(key: &str, chain_id: u64) -> Result<LocalWallet> {
    Ok(LocalWallet::from_str(key.trim())?.with_chain_id(chain_id))
}

fn parse_or(get: &dyn Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

fn checked_url(value: String, key: &str) -> Result<String> {
    url::Url::parse(&value).with_context(|| format!("{} must be a valid URL", key))?;
    Ok(value)
}
