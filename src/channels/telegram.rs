//! Telegram Bot API front-end (long polling).
//!
//! Updates are fanned out to one worker task per chat, so a chat's messages
//! are handled strictly one after another while different chats run in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bot::dispatcher::Dispatcher;
use crate::bot::protocol::{ChatId, InboundMessage, MessageRef, Reply, ReplySink};

const LONG_POLL_SECS: u64 = 30;
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);
const WORKER_IDLE: Duration = Duration::from_secs(300);

// --- Bot API models ---

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl Update {
    /// The bot-level message carried by this update, if any.
    pub fn to_inbound(&self) -> Option<InboundMessage> {
        if let Some(callback) = &self.callback_query {
            let chat_id = callback.message.as_ref()?.chat.id;
            return Some(InboundMessage::callback(chat_id, callback.data.clone()?));
        }
        let message = self.message.as_ref()?;
        Some(InboundMessage::text(message.chat.id, message.text.clone()?))
    }
}

fn inline_keyboard(reply: &Reply) -> Value {
    let rows: Vec<Vec<Value>> = reply
        .buttons
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| json!({ "text": button.label, "callback_data": button.data }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

// --- REST client ---

/// Minimal Bot API client: polling, sending, editing and acknowledging callbacks.
pub struct TelegramApi {
    client: Client,
    api_url: String,
    token: SecretString,
}

impl TelegramApi {
    pub fn new(api_url: &str, token: SecretString) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.api_url, self.token.expose_secret(), method);
        let resp = self.client.post(url).json(&body).send().await?;
        let status = resp.status();
        debug!(method, status = %status, "Telegram API response status");

        let parsed: ApiResponse<T> = resp
            .json()
            .await
            .map_err(|e| anyhow!("Telegram API {} returned an unreadable body ({}): {}", method, status, e))?;
        if !parsed.ok {
            anyhow::bail!(
                "Telegram API error on {}: {} - {}",
                method,
                status,
                parsed.description.unwrap_or_default()
            );
        }
        parsed
            .result
            .ok_or_else(|| anyhow!("Telegram API {} returned no result", method))
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: ChatId, reply: &Reply) -> Result<Message> {
        let mut body = json!({ "chat_id": chat_id, "text": reply.text });
        if !reply.buttons.is_empty() {
            body["reply_markup"] = inline_keyboard(reply);
        }
        self.call("sendMessage", body).await
    }

    pub async fn edit_message_text(&self, chat_id: ChatId, message_id: i64, text: &str) -> Result<()> {
        let _: Value = self
            .call(
                "editMessageText",
                json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        let _: Value = self
            .call("answerCallbackQuery", json!({ "callback_query_id": callback_id }))
            .await?;
        Ok(())
    }
}

/// Replies for one Telegram chat.
pub struct TelegramSink {
    api: Arc<TelegramApi>,
    chat_id: ChatId,
}

impl TelegramSink {
    pub fn new(api: Arc<TelegramApi>, chat_id: ChatId) -> Self {
        Self { api, chat_id }
    }
}

#[async_trait]
impl ReplySink for TelegramSink {
    async fn send(&self, reply: Reply) -> Result<Option<MessageRef>> {
        let sent = self.api.send_message(self.chat_id, &reply).await?;
        Ok(Some(MessageRef {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        }))
    }

    async fn edit(&self, message: MessageRef, text: String) -> Result<()> {
        self.api
            .edit_message_text(message.chat_id, message.message_id, &text)
            .await
    }
}

// --- Polling loop ---

/// Long-polls for updates forever, handing each chat's messages to its worker.
pub async fn run_telegram(api: Arc<TelegramApi>, dispatcher: Arc<Dispatcher>) -> Result<()> {
    info!("🚀 Starting Telegram bot (long polling)...");
    let mut offset = 0;
    let mut workers = ChatWorkers::new(
        DispatchHandler {
            api: Arc::clone(&api),
            dispatcher,
        },
        WORKER_IDLE,
    );

    loop {
        let updates = match api.get_updates(offset, LONG_POLL_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Failed to fetch updates: {:#}", e);
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                continue;
            }
        };

        workers.prune();

        for update in updates {
            offset = offset.max(update.update_id + 1);

            if let Some(callback) = &update.callback_query {
                if let Err(e) = api.answer_callback_query(&callback.id).await {
                    warn!("Failed to answer callback query: {:#}", e);
                }
            }

            let Some(message) = update.to_inbound() else {
                debug!(update_id = update.update_id, "Skipping update without text or callback data");
                continue;
            };
            workers.enqueue(message);
        }
    }
}

/// Handles one chat message to completion.
#[async_trait]
trait ChatHandler: Send + Sync + 'static {
    async fn handle(&self, message: InboundMessage);
}

struct DispatchHandler {
    api: Arc<TelegramApi>,
    dispatcher: Arc<Dispatcher>,
}

#[async_trait]
impl ChatHandler for DispatchHandler {
    async fn handle(&self, message: InboundMessage) {
        let sink = TelegramSink::new(Arc::clone(&self.api), message.chat_id);
        if let Err(e) = self.dispatcher.handle(&message, &sink).await {
            error!(chat_id = message.chat_id, "Failed to deliver reply: {:#}", e);
        }
    }
}

struct ChatWorker {
    tx: mpsc::UnboundedSender<InboundMessage>,
    task: JoinHandle<()>,
}

/// One queue and task per chat. A worker that went idle closes its queue; its
/// replacement starts only after the old task has finished draining.
struct ChatWorkers<H> {
    handler: Arc<H>,
    idle: Duration,
    workers: HashMap<ChatId, ChatWorker>,
}

impl<H: ChatHandler> ChatWorkers<H> {
    fn new(handler: H, idle: Duration) -> Self {
        Self {
            handler: Arc::new(handler),
            idle,
            workers: HashMap::new(),
        }
    }

    /// Forgets workers whose task has ended.
    fn prune(&mut self) {
        self.workers.retain(|_, worker| !worker.task.is_finished());
    }

    fn enqueue(&mut self, message: InboundMessage) {
        let chat_id = message.chat_id;
        let (message, previous) = match self.workers.remove(&chat_id) {
            Some(worker) => match worker.tx.send(message) {
                Ok(()) => {
                    self.workers.insert(chat_id, worker);
                    return;
                }
                // idle worker closed its queue but may still be draining
                Err(mpsc::error::SendError(message)) => (message, Some(worker.task)),
            },
            None => (message, None),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(message);
        let task = tokio::spawn(chat_worker(
            chat_id,
            rx,
            previous,
            Arc::clone(&self.handler),
            self.idle,
        ));
        self.workers.insert(chat_id, ChatWorker { tx, task });
    }
}

async fn chat_worker<H: ChatHandler>(
    chat_id: ChatId,
    mut rx: mpsc::UnboundedReceiver<InboundMessage>,
    previous: Option<JoinHandle<()>>,
    handler: Arc<H>,
    idle: Duration,
) {
    if let Some(previous) = previous {
        if let Err(e) = previous.await {
            warn!(chat_id, "Previous chat worker failed: {}", e);
        }
    }
    debug!(chat_id, "Chat worker started");
    loop {
        let message = match tokio::time::timeout(idle, rx.recv()).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(_) => {
                // stop accepting, but finish whatever is already queued
                rx.close();
                while let Some(message) = rx.recv().await {
                    handler.handle(message).await;
                }
                break;
            }
        };
        handler.handle(message).await;
    }
    debug!(chat_id, "Chat worker stopped");
}
