//! Console front-end: one line in, one answer out.
//!
//! `check <contract> <wallet>` prints a balance report, `exit`/`quit`/`bye`
//! ends the session, everything else is answered by the assistant.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::assistant::AssistantClient;
use crate::blockchain::services::balance::BalanceService;
use crate::bot::format;

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];
const GOODBYE: &str = "Agent: Goodbye! Have a great day!";

/// What the console should print for one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleReply {
    Lines(Vec<String>),
    Exit(String),
}

pub struct ConsoleAgent {
    balance: BalanceService,
    assistant: Arc<dyn AssistantClient>,
    network_name: String,
    explorer_url: String,
}

impl ConsoleAgent {
    pub fn new(
        balance: BalanceService,
        assistant: Arc<dyn AssistantClient>,
        network_name: impl Into<String>,
        explorer_url: impl Into<String>,
    ) -> Self {
        Self {
            balance,
            assistant,
            network_name: network_name.into(),
            explorer_url: explorer_url.into(),
        }
    }

    pub fn banner(&self) -> Vec<String> {
        vec![
            format!("🤖 Metis Token Balance Agent running on {}...", self.network_name),
            "This agent can check ERC20 token balances. Type 'exit' to quit.".to_string(),
            "Format: check <contract_address> <wallet_address>".to_string(),
        ]
    }

    pub async fn respond(&self, input: &str) -> ConsoleReply {
        let lower = input.trim().to_lowercase();
        if EXIT_WORDS.contains(&lower.as_str()) {
            return ConsoleReply::Exit(GOODBYE.to_string());
        }

        if lower.starts_with("check ") {
            let parts: Vec<&str> = input.split_whitespace().collect();
            return match parts.as_slice() {
                [_, contract, wallet, ..] => {
                    let result = match self.balance.get_balance_report(contract, wallet).await {
                        Ok(report) => format::balance_report_plain(&report, &self.explorer_url),
                        Err(e) => e.user_message(),
                    };
                    ConsoleReply::Lines(vec![
                        format::CHECKING_BALANCE.to_string(),
                        format!("Agent: {}", result),
                    ])
                }
                _ => ConsoleReply::Lines(vec![
                    "Agent: Please provide both contract and wallet addresses.".to_string(),
                    "Example: check 0x123... 0x456...".to_string(),
                ]),
            };
        }

        let answer = match self.assistant.complete(input).await {
            Ok(completion) => completion,
            Err(e) => e.user_message(),
        };
        ConsoleReply::Lines(vec![format!("Agent: {}", answer)])
    }
}

/// Runs the prompt loop until an exit word or end of input.
pub async fn run_repl<R, W>(agent: &ConsoleAgent, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Starting console agent");
    let mut lines = input.lines();

    for line in agent.banner() {
        output.write_all(format!("{}\n", line).as_bytes()).await?;
    }

    loop {
        output.write_all(b"\nYou: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            info!("EOF received, shutting down console agent");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received: {}", line);

        match agent.respond(&line).await {
            ConsoleReply::Lines(reply) => {
                for text in reply {
                    output.write_all(format!("{}\n", text).as_bytes()).await?;
                }
            }
            ConsoleReply::Exit(goodbye) => {
                output.write_all(format!("{}\n", goodbye).as_bytes()).await?;
                break;
            }
        }
    }

    output.flush().await?;
    Ok(())
}
