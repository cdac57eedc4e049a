// src/bot/session.rs

use std::sync::Arc;

use dashmap::DashMap;
use ethers_core::types::{Address, U256};
use tokio::sync::Mutex;

use crate::blockchain::models::TokenStandard;
use crate::blockchain::services::deploy::{ConstructorParams, DeploymentRequest};
use crate::bot::protocol::ChatId;
use crate::error::BotError;
use crate::utils::{parse_address, to_base_units};

/// Aborts the active session from any step.
pub const CANCEL_COMMAND: &str = "/cancel";

const CONFIRM_PROMPT: &str = "Type 'confirm' to deploy or 'cancel' to abort.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStep {
    AwaitOwner,
    AwaitName,
    AwaitSymbol,
    AwaitSupply,
    AwaitBaseUri,
    AwaitUri,
    AwaitConfirmation,
    Deploying,
    Done,
    Cancelled,
}

impl DeploymentStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

/// What the caller should do after feeding input to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Ask the user the next question (or repeat the current one)
    Prompt(String),
    /// Input failed validation; the step is unchanged
    Rejected { error: BotError, prompt: String },
    /// The user confirmed; deploy this request, then call [`DeploymentSession::complete`]
    Ready(DeploymentRequest),
    Cancelled,
    /// The session no longer accepts input
    Closed,
}

/// Collects deployment parameters for one chat, one answer at a time.
#[derive(Debug, Clone)]
pub struct DeploymentSession {
    standard: TokenStandard,
    step: DeploymentStep,
    owner: Option<(Address, String)>,
    name: Option<String>,
    symbol: Option<String>,
    supply: Option<(U256, String)>,
    uri: Option<String>,
}

impl DeploymentSession {
    /// Starts a session for `standard` and returns it with the first prompt.
    pub fn start(standard: TokenStandard) -> (Self, String) {
        let session = Self {
            standard,
            step: DeploymentStep::AwaitOwner,
            owner: None,
            name: None,
            symbol: None,
            supply: None,
            uri: None,
        };
        let prompt = session.prompt();
        (session, prompt)
    }

    pub fn standard(&self) -> TokenStandard {
        self.standard
    }

    pub fn step(&self) -> DeploymentStep {
        self.step
    }

    pub fn is_terminal(&self) -> bool {
        self.step.is_terminal()
    }

    /// The question for the current step.
    pub fn prompt(&self) -> String {
        match self.step {
            DeploymentStep::AwaitOwner => format!(
                "Deploying a new {} contract.\nPlease enter the owner address (0x...):",
                self.standard
            ),
            DeploymentStep::AwaitName => "Enter the token name:".to_string(),
            DeploymentStep::AwaitSymbol => "Enter the token symbol:".to_string(),
            DeploymentStep::AwaitSupply => "Enter the initial supply:".to_string(),
            DeploymentStep::AwaitBaseUri => "Enter the base URI for token metadata:".to_string(),
            DeploymentStep::AwaitUri => {
                "Enter the metadata URI (e.g. https://example.com/{id}.json):".to_string()
            }
            DeploymentStep::AwaitConfirmation => format!("{}\n\n{}", self.summary(), CONFIRM_PROMPT),
            DeploymentStep::Deploying => "Deployment in progress...".to_string(),
            DeploymentStep::Done | DeploymentStep::Cancelled => {
                "This deployment session has ended.".to_string()
            }
        }
    }

    /// All collected fields, one per line.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "📋 Deployment Summary".to_string(),
            format!("Type: {}", self.standard),
        ];
        if let Some((_, owner)) = &self.owner {
            lines.push(format!("Owner: {}", owner));
        }
        if let Some(name) = &self.name {
            lines.push(format!("Name: {}", name));
        }
        if let Some(symbol) = &self.symbol {
            lines.push(format!("Symbol: {}", symbol));
        }
        if let Some((_, supply)) = &self.supply {
            lines.push(format!("Initial Supply: {}", supply));
        }
        if let Some(uri) = &self.uri {
            let label = match self.standard {
                TokenStandard::Erc721 => "Base URI",
                _ => "URI",
            };
            lines.push(format!("{}: {}", label, uri));
        }
        lines.join("\n")
    }

    /// Feeds one user message to the session.
    pub fn advance(&mut self, input: &str) -> SessionEvent {
        let trimmed = input.trim();
        if self.is_terminal() || self.step == DeploymentStep::Deploying {
            return SessionEvent::Closed;
        }
        if trimmed.eq_ignore_ascii_case(CANCEL_COMMAND) {
            return self.cancel();
        }

        match self.step {
            DeploymentStep::AwaitOwner => match parse_address(trimmed) {
                Ok(owner) => {
                    self.owner = Some((owner, trimmed.to_string()));
                    self.goto(DeploymentStep::AwaitName)
                }
                Err(error) => SessionEvent::Rejected {
                    error,
                    prompt: self.prompt(),
                },
            },
            DeploymentStep::AwaitName => {
                if trimmed.is_empty() {
                    return SessionEvent::Prompt(self.prompt());
                }
                self.name = Some(input.to_string());
                self.goto(DeploymentStep::AwaitSymbol)
            }
            DeploymentStep::AwaitSymbol => {
                if trimmed.is_empty() {
                    return SessionEvent::Prompt(self.prompt());
                }
                self.symbol = Some(input.to_string());
                let next = match self.standard {
                    TokenStandard::Erc20 => DeploymentStep::AwaitSupply,
                    TokenStandard::Erc721 => DeploymentStep::AwaitBaseUri,
                    TokenStandard::Erc1155 => DeploymentStep::AwaitUri,
                };
                self.goto(next)
            }
            DeploymentStep::AwaitSupply => match to_base_units(trimmed, 0) {
                Ok(supply) => {
                    self.supply = Some((supply, trimmed.to_string()));
                    self.goto(DeploymentStep::AwaitConfirmation)
                }
                Err(error) => SessionEvent::Rejected {
                    error,
                    prompt: self.prompt(),
                },
            },
            DeploymentStep::AwaitBaseUri | DeploymentStep::AwaitUri => {
                self.uri = Some(input.to_string());
                self.goto(DeploymentStep::AwaitConfirmation)
            }
            DeploymentStep::AwaitConfirmation => {
                if trimmed.eq_ignore_ascii_case("confirm") {
                    match self.request() {
                        Some(request) => {
                            self.step = DeploymentStep::Deploying;
                            SessionEvent::Ready(request)
                        }
                        None => self.cancel(),
                    }
                } else if trimmed.eq_ignore_ascii_case("cancel") {
                    self.cancel()
                } else {
                    SessionEvent::Prompt(self.prompt())
                }
            }
            DeploymentStep::Deploying | DeploymentStep::Done | DeploymentStep::Cancelled => {
                SessionEvent::Closed
            }
        }
    }

    /// Aborts the session.
    pub fn cancel(&mut self) -> SessionEvent {
        self.step = DeploymentStep::Cancelled;
        SessionEvent::Cancelled
    }

    /// Marks a confirmed session as finished, whatever the deployment outcome.
    pub fn complete(&mut self) {
        self.step = DeploymentStep::Done;
    }

    fn goto(&mut self, step: DeploymentStep) -> SessionEvent {
        self.step = step;
        SessionEvent::Prompt(self.prompt())
    }

    fn request(&self) -> Option<DeploymentRequest> {
        let params = match self.standard {
            TokenStandard::Erc20 => ConstructorParams::Erc20 {
                supply: self.supply.as_ref()?.0,
            },
            TokenStandard::Erc721 => ConstructorParams::Erc721 {
                base_uri: self.uri.clone()?,
            },
            TokenStandard::Erc1155 => ConstructorParams::Erc1155 {
                uri: self.uri.clone()?,
            },
        };
        Some(DeploymentRequest {
            owner: self.owner.as_ref()?.0,
            name: self.name.clone()?,
            symbol: self.symbol.clone()?,
            params,
        })
    }
}

/// One chat's session slot. Holding its lock serializes that chat's messages.
pub type SessionSlot = Arc<Mutex<Option<DeploymentSession>>>;

/// Keyed store of in-progress deployment sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    slots: DashMap<ChatId, SessionSlot>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `chat_id`, created empty on first use.
    pub fn slot(&self, chat_id: ChatId) -> SessionSlot {
        Arc::clone(self.slots.entry(chat_id).or_default().value())
    }

    pub async fn is_active(&self, chat_id: ChatId) -> bool {
        let slot = match self.slots.get(&chat_id) {
            Some(entry) => Arc::clone(entry.value()),
            None => return false,
        };
        let session = slot.lock().await;
        session.as_ref().map_or(false, |s| !s.is_terminal())
    }

    /// Drops the slot for `chat_id` if it is empty and nobody else holds it.
    pub fn release(&self, chat_id: ChatId) {
        self.slots.remove_if(&chat_id, |_, slot| {
            Arc::strong_count(slot) == 1
                && slot.try_lock().map(|s| s.is_none()).unwrap_or(false)
        });
    }

    /// Number of chats with a slot.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
