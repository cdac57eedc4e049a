// src/bot/mod.rs

pub mod dispatcher;
pub mod format;
pub mod protocol;
pub mod session;

pub use dispatcher::Dispatcher;
pub use protocol::{ChatId, Inbound, InboundMessage, MessageRef, Reply, ReplySink};
pub use session::{DeploymentSession, SessionStore};
