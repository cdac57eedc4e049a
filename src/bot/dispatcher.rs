// src/bot/dispatcher.rs

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::assistant::AssistantClient;
use crate::blockchain::services::{balance::BalanceService, deploy::Deployer, transfer::TransferService};
use crate::bot::{
    format,
    protocol::{Inbound, InboundMessage, MessageRef, Reply, ReplySink, CALLBACK_CANCEL_DEPLOY},
    session::{DeploymentSession, SessionEvent, SessionStore},
};
use crate::config::NetworkConfig;
use crate::error::BotError;
use crate::utils::{find_addresses, find_numbers, format_token_amount, is_valid_address};

const GREETINGS: &[&str] = &["hi", "hello", "hey", "hola", "greetings"];

/// Slash commands the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Balance { contract: String, wallet: String },
    Transfer { contract: String, to: String, amount: String },
    /// Known command with the wrong number of arguments
    Malformed { usage: &'static str },
    Start,
    Help,
    Cancel,
}

/// Where a message without an active session goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    Greeting,
    NaturalBalance { contract: String, wallet: String },
    NaturalTransfer { contract: String, to: String, amount: String },
    /// Natural-language request missing addresses or an amount
    Guidance(&'static str),
    Fallback,
}

type Matcher = fn(&str) -> Option<Route>;

/// Evaluated in order; the first match wins.
const MATCHERS: &[(&str, Matcher)] = &[
    ("command", match_command),
    ("greeting", match_greeting),
    ("natural_balance", match_natural_balance),
    ("natural_transfer", match_natural_transfer),
];

/// Picks the route for `text`.
pub fn classify(text: &str) -> Route {
    MATCHERS
        .iter()
        .find_map(|(name, matcher)| {
            let route = matcher(text)?;
            debug!(matcher = name, "Message matched");
            Some(route)
        })
        .unwrap_or(Route::Fallback)
}

fn match_command(text: &str) -> Option<Route> {
    let content = text.trim().strip_prefix('/')?;
    let parts: Vec<&str> = content.split_whitespace().collect();
    let name = parts.first()?.split('@').next()?.to_lowercase();
    let args = &parts[1..];

    let command = match name.as_str() {
        "balance" => match args {
            [contract, wallet] => Command::Balance {
                contract: contract.to_string(),
                wallet: wallet.to_string(),
            },
            _ => Command::Malformed {
                usage: format::BALANCE_USAGE,
            },
        },
        "transfer" => match args {
            [contract, to, amount] => Command::Transfer {
                contract: contract.to_string(),
                to: to.to_string(),
                amount: amount.to_string(),
            },
            _ => Command::Malformed {
                usage: format::TRANSFER_USAGE,
            },
        },
        "start" => Command::Start,
        "help" => Command::Help,
        "cancel" => Command::Cancel,
        _ => return None,
    };
    Some(Route::Command(command))
}

fn match_greeting(text: &str) -> Option<Route> {
    let normalized = text
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
    GREETINGS.contains(&normalized.as_str()).then_some(Route::Greeting)
}

fn match_natural_balance(text: &str) -> Option<Route> {
    let lower = text.to_lowercase();
    if !(lower.contains("check balance") || lower.contains("show balance")) {
        return None;
    }
    Some(match find_addresses(text).as_slice() {
        [contract, wallet, ..] => Route::NaturalBalance {
            contract: contract.to_string(),
            wallet: wallet.to_string(),
        },
        _ => Route::Guidance(format::BALANCE_GUIDANCE),
    })
}

fn match_natural_transfer(text: &str) -> Option<Route> {
    if !text.to_lowercase().contains("transfer") {
        return None;
    }
    let addresses = find_addresses(text);
    let numbers = find_numbers(text);
    Some(match (addresses.as_slice(), numbers.first()) {
        ([contract, to, ..], Some(amount)) => Route::NaturalTransfer {
            contract: contract.to_string(),
            to: to.to_string(),
            amount: amount.to_string(),
        },
        _ => Route::Guidance(format::TRANSFER_GUIDANCE),
    })
}

/// Routes each inbound message to the active deployment session, a token
/// service, or the assistant, and writes the outcome to the reply sink.
pub struct Dispatcher {
    balance: BalanceService,
    transfer: TransferService,
    deployer: Option<Deployer>,
    assistant: Arc<dyn AssistantClient>,
    sessions: Arc<SessionStore>,
    network: NetworkConfig,
}

impl Dispatcher {
    pub fn new(
        balance: BalanceService,
        transfer: TransferService,
        assistant: Arc<dyn AssistantClient>,
        sessions: Arc<SessionStore>,
        network: NetworkConfig,
    ) -> Self {
        Self {
            balance,
            transfer,
            deployer: None,
            assistant,
            sessions,
            network,
        }
    }

    /// Enables the token-type keyboard and deployment sessions.
    pub fn with_deployer(mut self, deployer: Deployer) -> Self {
        self.deployer = Some(deployer);
        self
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.sessions)
    }

    pub fn deploy_enabled(&self) -> bool {
        self.deployer.is_some()
    }

    /// Handles one message to completion. The chat's session slot stays locked
    /// for the whole call, so messages of one chat never interleave.
    ///
    /// Only failures to deliver replies are returned; every bot-level error is
    /// reported to the user through `sink`.
    pub async fn handle(&self, message: &InboundMessage, sink: &dyn ReplySink) -> Result<()> {
        let chat_id = message.chat_id;
        let slot = self.sessions.slot(chat_id);
        let outcome = {
            let mut session = slot.lock().await;
            match &message.payload {
                Inbound::Callback(data) => self.on_callback(data, &mut session, sink).await,
                Inbound::Text(text) if session.is_some() => {
                    self.advance_session(text, &mut session, sink).await
                }
                Inbound::Text(text) => self.route(text, sink).await,
            }
        };
        drop(slot);
        self.sessions.release(chat_id);
        outcome
    }

    async fn on_callback(
        &self,
        data: &str,
        session: &mut Option<DeploymentSession>,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        if data == CALLBACK_CANCEL_DEPLOY {
            let text = match session.take() {
                Some(mut active) => {
                    active.cancel();
                    format::deployment_cancelled()
                }
                None => "No deployment in progress.".to_string(),
            };
            return send_text(sink, text).await;
        }

        let Some(standard) = format::standard_for_callback(data) else {
            warn!(data, "Ignoring unknown callback");
            return Ok(());
        };
        if self.deployer.is_none() {
            return send_text(sink, format::deployment_disabled()).await;
        }
        if session.is_some() {
            return send_text(sink, format::session_already_active()).await;
        }

        let (started, prompt) = DeploymentSession::start(standard);
        info!(%standard, "Deployment session started");
        *session = Some(started);
        send_text(sink, prompt).await
    }

    async fn advance_session(
        &self,
        text: &str,
        session: &mut Option<DeploymentSession>,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        let Some(active) = session.as_mut() else {
            return self.route(text, sink).await;
        };

        match active.advance(text) {
            SessionEvent::Prompt(prompt) => send_text(sink, prompt).await,
            SessionEvent::Rejected { error, prompt } => {
                send_text(sink, format!("{}\n\n{}", error.user_message(), prompt)).await
            }
            SessionEvent::Cancelled => {
                *session = None;
                send_text(sink, format::deployment_cancelled()).await
            }
            SessionEvent::Closed => {
                *session = None;
                self.route(text, sink).await
            }
            SessionEvent::Ready(request) => {
                let standard = request.standard();
                send_text(sink, format::deploying(standard)).await?;
                let text = match &self.deployer {
                    Some(deployer) => match deployer.deploy(&request).await {
                        Ok(outcome) => format::deployment_result(&outcome, &self.network.explorer_url),
                        Err(e) => e.user_message(),
                    },
                    None => format::deployment_disabled(),
                };
                // success or failure, the session ends here
                if let Some(mut finished) = session.take() {
                    finished.complete();
                }
                send_text(sink, text).await
            }
        }
    }

    async fn route(&self, text: &str, sink: &dyn ReplySink) -> Result<()> {
        let route = match classify(text) {
            // greetings only open the token-type keyboard
            Route::Greeting if !self.deploy_enabled() => Route::Fallback,
            route => route,
        };
        match route {
            Route::Command(Command::Balance { contract, wallet })
            | Route::NaturalBalance { contract, wallet } => {
                self.check_balance(&contract, &wallet, sink).await
            }
            Route::Command(Command::Transfer { contract, to, amount })
            | Route::NaturalTransfer { contract, to, amount } => {
                self.transfer(&contract, &to, &amount, sink).await
            }
            Route::Command(Command::Malformed { usage }) => {
                send_text(sink, BotError::MalformedCommand { usage }.user_message()).await
            }
            Route::Command(Command::Start) | Route::Greeting => self.greet(sink).await,
            Route::Command(Command::Help) => {
                send_text(sink, format::help(&self.network.name, self.deploy_enabled())).await
            }
            Route::Command(Command::Cancel) => send_text(sink, "No deployment in progress.").await,
            Route::Guidance(guidance) => send_text(sink, guidance).await,
            Route::Fallback => {
                let text = match self.assistant.complete(text).await {
                    Ok(completion) => completion,
                    Err(e) => e.user_message(),
                };
                send_text(sink, text).await
            }
        }
    }

    async fn greet(&self, sink: &dyn ReplySink) -> Result<()> {
        let reply = if self.deploy_enabled() {
            Reply::text(format::greeting(true)).with_buttons(format::token_type_keyboard())
        } else {
            Reply::text(format::greeting(false))
        };
        sink.send(reply).await.map(|_| ())
    }

    async fn check_balance(&self, contract: &str, wallet: &str, sink: &dyn ReplySink) -> Result<()> {
        if !is_valid_address(contract) || !is_valid_address(wallet) {
            return send_text(sink, BotError::InvalidAddress.user_message()).await;
        }

        let status = sink.send(Reply::text(format::CHECKING_BALANCE)).await?;
        let text = match self.balance.get_balance_report(contract, wallet).await {
            Ok(report) => format::balance_report(&report, &self.network.explorer_url),
            Err(e) => e.user_message(),
        };
        replace_status(sink, status, text).await
    }

    async fn transfer(&self, contract: &str, to: &str, amount: &str, sink: &dyn ReplySink) -> Result<()> {
        let prepared = match self.transfer.prepare(contract, to, amount).await {
            Ok(prepared) => prepared,
            Err(e) => return send_text(sink, e.user_message()).await,
        };

        let balance = format_token_amount(prepared.signer_balance, prepared.token.decimals);
        let status = sink
            .send(Reply::text(format::transfer_status(&balance, &prepared.token.symbol)))
            .await?;

        let text = match self.transfer.execute(prepared).await {
            Ok(outcome) => format::transfer_result(&outcome, &self.network.explorer_url),
            Err(e) => e.user_message(),
        };
        replace_status(sink, status, text).await
    }
}

async fn send_text(sink: &dyn ReplySink, text: impl Into<String>) -> Result<()> {
    sink.send(Reply::text(text)).await.map(|_| ())
}

/// Edits the status message in place when the surface allows it, otherwise sends a new one.
async fn replace_status(sink: &dyn ReplySink, status: Option<MessageRef>, text: String) -> Result<()> {
    match status {
        Some(message) => sink.edit(message, text).await,
        None => send_text(sink, text).await,
    }
}
