//! In-memory fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers_core::abi::{encode, Token};
use ethers_core::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, H256, U256, U64,
};
use ethers_core::utils::keccak256;
use ethers_signers::{LocalWallet, Signer};

use metis_token_bot::assistant::AssistantClient;
use metis_token_bot::blockchain::client::{ChainGateway, TxReceipt};
use metis_token_bot::blockchain::services::transactions::ReceiptPolicy;
use metis_token_bot::bot::{MessageRef, Reply, ReplySink};
use metis_token_bot::error::BotError;

pub const CHAIN_ID: u64 = 59902;
pub const CONTRACT: &str = "0x1111111111111111111111111111111111111111";
pub const WALLET: &str = "0x2222222222222222222222222222222222222222";
pub const OWNER: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
pub const EXPLORER: &str = "https://sepolia-explorer.metisdevops.link";
const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const DEPLOYER_KEY: &str = "0x8da4ef21b864d2cc526dbdb2a120bd2874c36c9d0a1fb7f8c63d7f7a8b41de8f";

pub fn signer() -> LocalWallet {
    LocalWallet::from_str(KEY).unwrap().with_chain_id(CHAIN_ID)
}

pub fn deployer_signer() -> LocalWallet {
    LocalWallet::from_str(DEPLOYER_KEY).unwrap().with_chain_id(CHAIN_ID)
}

pub fn fast_receipts() -> ReceiptPolicy {
    ReceiptPolicy {
        poll_interval: Duration::from_millis(5),
        timeout: Duration::from_millis(200),
    }
}

/// First four bytes of `keccak256(sig)`.
pub fn selector(sig: &str) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&keccak256(sig.as_bytes())[..4]);
    out
}

/// How the fake node answers receipt lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    Success,
    Reverted,
    Never,
}

/// Fake node serving a single ERC20 token and recording everything it is asked to do.
pub struct MockGateway {
    responses: Mutex<HashMap<[u8; 4], Result<Bytes, String>>>,
    pub calls: Mutex<Vec<Bytes>>,
    pub signed: Mutex<Vec<TransactionRequest>>,
    pub estimates: Mutex<Vec<TransactionRequest>>,
    pub nonce_reads: Mutex<u32>,
    pub fail_submit: Mutex<bool>,
    pub receipt_mode: Mutex<ReceiptMode>,
    pub deployed_at: Address,
    start_nonce: U256,
}

impl MockGateway {
    pub fn erc20(name: &str, symbol: &str, decimals: u8, supply: U256, balance: U256) -> Self {
        let gateway = Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            signed: Mutex::new(Vec::new()),
            estimates: Mutex::new(Vec::new()),
            nonce_reads: Mutex::new(0),
            fail_submit: Mutex::new(false),
            receipt_mode: Mutex::new(ReceiptMode::Success),
            deployed_at: Address::repeat_byte(0xcc),
            start_nonce: U256::from(7u64),
        };
        gateway.respond("name()", &[Token::String(name.into())]);
        gateway.respond("symbol()", &[Token::String(symbol.into())]);
        gateway.respond("decimals()", &[Token::Uint(U256::from(decimals))]);
        gateway.respond("totalSupply()", &[Token::Uint(supply)]);
        gateway.respond("balanceOf(address)", &[Token::Uint(balance)]);
        gateway
    }

    pub fn respond(&self, sig: &str, tokens: &[Token]) {
        self.responses
            .lock()
            .unwrap()
            .insert(selector(sig), Ok(Bytes::from(encode(tokens))));
    }

    pub fn fail(&self, sig: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(selector(sig), Err(message.to_string()));
    }

    pub fn set_receipts(&self, mode: ReceiptMode) {
        *self.receipt_mode.lock().unwrap() = mode;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Selectors of every eth_call, in order.
    pub fn called_selectors(&self) -> Vec<[u8; 4]> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|data| {
                let mut sel = [0u8; 4];
                sel.copy_from_slice(&data[..4]);
                sel
            })
            .collect()
    }

    pub fn signed_txs(&self) -> Vec<TransactionRequest> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    fn chain_id(&self) -> u64 {
        CHAIN_ID
    }

    async fn call(&self, _contract: Address, data: Bytes) -> Result<Bytes> {
        self.calls.lock().unwrap().push(data.clone());
        let mut sel = [0u8; 4];
        sel.copy_from_slice(&data[..4]);
        match self.responses.lock().unwrap().get(&sel) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(message)) => Err(anyhow!("execution reverted: {}", message)),
            None => Err(anyhow!("unknown selector 0x{}", hex::encode(sel))),
        }
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256> {
        self.estimates.lock().unwrap().push(tx.clone());
        Ok(U256::from(1_500_000u64))
    }

    async fn get_transaction_count(&self, _address: Address) -> Result<U256> {
        *self.nonce_reads.lock().unwrap() += 1;
        Ok(self.start_nonce)
    }

    async fn get_gas_price(&self) -> Result<U256> {
        Ok(U256::from(1_000_000_000u64))
    }

    async fn sign(&self, tx: &TransactionRequest, signer: &LocalWallet) -> Result<Bytes> {
        self.signed.lock().unwrap().push(tx.clone());
        let typed: TypedTransaction = tx.clone().into();
        let signature = signer.sign_transaction(&typed).await?;
        Ok(typed.rlp_signed(&signature))
    }

    async fn submit(&self, raw_tx: Bytes) -> Result<H256> {
        if *self.fail_submit.lock().unwrap() {
            return Err(anyhow!("nonce too low"));
        }
        Ok(H256::from(keccak256(&raw_tx)))
    }

    async fn get_receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>> {
        let is_deploy = self
            .signed
            .lock()
            .unwrap()
            .last()
            .map(|tx| tx.to.is_none())
            .unwrap_or(false);
        let status = match *self.receipt_mode.lock().unwrap() {
            ReceiptMode::Never => return Ok(None),
            ReceiptMode::Success => U64::one(),
            ReceiptMode::Reverted => U64::zero(),
        };
        Ok(Some(TxReceipt {
            transaction_hash: tx_hash,
            status: Some(status),
            contract_address: is_deploy.then_some(self.deployed_at),
        }))
    }
}

/// Assistant that echoes prompts back and remembers them.
#[derive(Default)]
pub struct MockAssistant {
    pub prompts: Mutex<Vec<String>>,
    pub unavailable: bool,
}

impl MockAssistant {
    pub fn down() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl AssistantClient for MockAssistant {
    async fn complete(&self, prompt: &str) -> Result<String, BotError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.unavailable {
            return Err(BotError::Assistant("connection refused".into()));
        }
        Ok(format!("assistant: {}", prompt))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message(Reply),
    Edit { message_id: i64, text: String },
}

/// Reply sink that records what the bot said.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<Sent>>,
    next_id: AtomicI64,
    /// Delay before each send, to keep a handler suspended mid-message
    delay: Option<Duration>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// Text of every message and edit, in order.
    pub fn texts(&self) -> Vec<String> {
        self.take()
            .into_iter()
            .map(|sent| match sent {
                Sent::Message(reply) => reply.text,
                Sent::Edit { text, .. } => text,
            })
            .collect()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, reply: Reply) -> Result<Option<MessageRef>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.lock().unwrap().push(Sent::Message(reply));
        Ok(Some(MessageRef {
            chat_id: 1,
            message_id,
        }))
    }

    async fn edit(&self, message: MessageRef, text: String) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Edit {
            message_id: message.message_id,
            text,
        });
        Ok(())
    }
}
