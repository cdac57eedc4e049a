// src/bot/protocol.rs

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifies a conversation. The console REPL uses a single fixed id.
pub type ChatId = i64;

// --- Callback payloads of the token-type keyboard ---
pub const CALLBACK_DEPLOY_ERC20: &str = "deploy_erc20";
pub const CALLBACK_DEPLOY_ERC721: &str = "deploy_erc721";
pub const CALLBACK_DEPLOY_ERC1155: &str = "deploy_erc1155";
pub const CALLBACK_CANCEL_DEPLOY: &str = "cancel_deploy";

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Free text or a slash command
    Text(String),
    /// Inline button press carrying its callback data
    Callback(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub payload: Inbound,
}

impl InboundMessage {
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            payload: Inbound::Text(text.into()),
        }
    }

    pub fn callback(chat_id: ChatId, data: impl Into<String>) -> Self {
        Self {
            chat_id,
            payload: Inbound::Callback(data.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// One outbound message, optionally with an inline keyboard (rows of buttons).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Vec<Button>>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Handle to a sent message that can later be edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}

/// Where replies for one chat go.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Sends `reply`; returns a handle when the surface supports editing.
    async fn send(&self, reply: Reply) -> Result<Option<MessageRef>>;

    /// Replaces the text of an earlier message.
    async fn edit(&self, message: MessageRef, text: String) -> Result<()>;
}
