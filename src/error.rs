// src/error.rs

use ethers_core::types::H256;
use thiserror::Error;

/// Leading token of every user-visible failure.
pub const FAILURE_MARKER: &str = "❌";
/// Leading token of every user-visible success.
pub const SUCCESS_MARKER: &str = "✅";

/// Error kinds surfaced to the user by the bot front-ends.
///
/// Every variant except `Configuration` is caught by the handler that produced
/// it and turned into a single chat/console message via [`BotError::user_message`].
/// `Configuration` is only raised at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    #[error("Invalid address format. Addresses should be 42 characters long and start with '0x'")]
    InvalidAddress,

    #[error("Invalid amount format: '{0}'. Please provide a valid non-negative number.")]
    InvalidAmount(String),

    #[error("Please use the format:\n{usage}")]
    MalformedCommand { usage: &'static str },

    #[error("Error reading token information: {0}")]
    ChainRead(String),

    #[error("Error during transfer: {0}")]
    ChainSubmission(String),

    #[error("Deployment failed: {0}")]
    Deployment(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Assistant is unavailable: {0}")]
    Assistant(String),

    #[error("Timed out after {waited_secs}s waiting for transaction {tx_hash:?} to be mined")]
    Timeout { tx_hash: H256, waited_secs: u64 },
}

impl BotError {
    /// Renders the error as the single text message shown to the user.
    pub fn user_message(&self) -> String {
        format!("{} {}", FAILURE_MARKER, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_marked_as_failure() {
        let msg = BotError::InvalidAddress.user_message();
        assert!(msg.starts_with(FAILURE_MARKER));
        assert!(msg.contains("42 characters"));

        let msg = BotError::MalformedCommand {
            usage: "/balance <contract_address> <wallet_address>",
        }
        .user_message();
        assert!(msg.starts_with(FAILURE_MARKER));
        assert!(msg.ends_with("/balance <contract_address> <wallet_address>"));
    }
}
