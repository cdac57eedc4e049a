// src/blockchain/services/deploy.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, Bytes, TransactionRequest, U256};
use ethers_signers::{LocalWallet, Signer};
use serde_json::Value;
use tracing::{error, info};

use crate::blockchain::{
    client::ChainGateway,
    models::{DeploymentOutcome, TokenStandard, TransactionResult},
    nonce_manager::NonceManager,
    services::transactions::{self, ReceiptPolicy, ReceiptWaitError},
};
use crate::error::BotError;

/// Standard-specific constructor inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorParams {
    Erc20 { supply: U256 },
    Erc721 { base_uri: String },
    Erc1155 { uri: String },
}

/// Everything collected from the user for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub owner: Address,
    pub name: String,
    pub symbol: String,
    pub params: ConstructorParams,
}

impl DeploymentRequest {
    pub fn standard(&self) -> TokenStandard {
        match self.params {
            ConstructorParams::Erc20 { .. } => TokenStandard::Erc20,
            ConstructorParams::Erc721 { .. } => TokenStandard::Erc721,
            ConstructorParams::Erc1155 { .. } => TokenStandard::Erc1155,
        }
    }

    /// Constructor arguments in declaration order:
    /// ERC20 `(name, symbol, initialSupply, owner)`, ERC721 `(name, symbol, baseURI)`,
    /// ERC1155 `(uri)`.
    pub fn constructor_args(&self) -> Vec<Token> {
        match &self.params {
            ConstructorParams::Erc20 { supply } => vec![
                Token::String(self.name.clone()),
                Token::String(self.symbol.clone()),
                Token::Uint(*supply),
                Token::Address(self.owner),
            ],
            ConstructorParams::Erc721 { base_uri } => vec![
                Token::String(self.name.clone()),
                Token::String(self.symbol.clone()),
                Token::String(base_uri.clone()),
            ],
            ConstructorParams::Erc1155 { uri } => vec![Token::String(uri.clone())],
        }
    }
}

/// Compiled contract artifacts, one `<STANDARD>.json` per token standard.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, standard: TokenStandard) -> PathBuf {
        self.dir.join(format!("{}.json", standard.label()))
    }

    /// Creation bytecode for `standard`, read from disk on every call.
    pub async fn bytecode(&self, standard: TokenStandard) -> Result<Bytes> {
        let path = self.path_for(standard);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read contract artifact {}", path.display()))?;
        parse_artifact_bytecode(&content, &path)
    }
}

/// Accepts Hardhat (`"bytecode": "0x.."`) and Foundry (`"bytecode": {"object": "0x.."}`) artifacts.
fn parse_artifact_bytecode(content: &str, path: &Path) -> Result<Bytes> {
    let artifact: Value = serde_json::from_str(content)
        .with_context(|| format!("Invalid JSON in contract artifact {}", path.display()))?;
    let code = match artifact.get("bytecode") {
        Some(Value::String(s)) => s.as_str(),
        Some(Value::Object(obj)) => obj
            .get("object")
            .and_then(|o| o.as_str())
            .ok_or_else(|| anyhow!("{}: bytecode.object missing", path.display()))?,
        _ => return Err(anyhow!("{}: no bytecode field", path.display())),
    };
    let code = code.strip_prefix("0x").unwrap_or(code);
    if code.is_empty() {
        return Err(anyhow!("{}: bytecode is empty", path.display()));
    }
    Ok(Bytes::from(hex::decode(code).with_context(|| {
        format!("{}: bytecode is not valid hex", path.display())
    })?))
}

/// Deploys token contracts with the dedicated deployer key.
#[derive(Clone)]
pub struct Deployer {
    gateway: Arc<dyn ChainGateway>,
    signer: LocalWallet,
    nonce_manager: Arc<NonceManager>,
    artifacts: ArtifactStore,
    receipt_policy: ReceiptPolicy,
}

impl Deployer {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        signer: LocalWallet,
        nonce_manager: Arc<NonceManager>,
        artifacts: ArtifactStore,
        receipt_policy: ReceiptPolicy,
    ) -> Self {
        Self {
            gateway,
            signer,
            nonce_manager,
            artifacts,
            receipt_policy,
        }
    }

    pub fn deployer_address(&self) -> Address {
        self.signer.address()
    }

    /// Builds the creation transaction, lets the node estimate its gas, signs,
    /// submits and waits for the receipt.
    pub async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentOutcome, BotError> {
        let standard = request.standard();
        let deployment_error = |e: anyhow::Error| {
            error!(%standard, "Deployment failed: {:#}", e);
            BotError::Deployment(format!("{:#}", e))
        };

        let bytecode = self.artifacts.bytecode(standard).await.map_err(deployment_error)?;
        let mut data = bytecode.to_vec();
        data.extend_from_slice(&encode(&request.constructor_args()));

        let gateway = self.gateway.as_ref();
        let tx_hash = transactions::send_evm_transaction(
            gateway,
            &self.signer,
            &self.nonce_manager,
            TransactionRequest::new().data(Bytes::from(data)),
        )
        .await
        .map_err(deployment_error)?;

        let receipt = transactions::confirm_transaction(
            gateway,
            &self.nonce_manager,
            self.deployer_address(),
            tx_hash,
            self.receipt_policy,
        )
        .await
            .map_err(|e| match e {
                ReceiptWaitError::TimedOut(waited) => BotError::Timeout {
                    tx_hash,
                    waited_secs: waited.as_secs(),
                },
                ReceiptWaitError::Rpc(e) => deployment_error(e),
            })?;

        let result = match (receipt.is_success(), receipt.contract_address) {
            (true, Some(contract)) => {
                info!(%standard, tx_hash = ?tx_hash, contract = ?contract, "Contract deployed");
                TransactionResult::succeeded(receipt.transaction_hash, Some(contract))
            }
            (true, None) => {
                return Err(deployment_error(anyhow!(
                    "receipt for {:?} carries no contract address",
                    tx_hash
                )))
            }
            (false, _) => TransactionResult::reverted(receipt.transaction_hash),
        };

        Ok(DeploymentOutcome {
            standard,
            deployer: self.deployer_address(),
            result,
        })
    }
}
