// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox status` and `lockbox sessions`.
//!
//! Both fall back gracefully when no agent is running.

use std::io::IsTerminal;

use lockbox_agent::AgentClient;
use lockbox_config::model::LockboxConfig;
use lockbox_core::{LockboxError, SessionInfo, Storage};
use serde::Serialize;

use crate::storage::FsStorage;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub agent_type: Option<String>,
    pub socket: String,
}

/// Runs the `lockbox status` command.
pub async fn run_status(
    config: &LockboxConfig,
    storage: &FsStorage,
    json: bool,
) -> Result<(), LockboxError> {
    let path = storage.socket_agent_path();
    let agent_type = match AgentClient::connect(&path, config.agent.dial_timeout()).await {
        Ok(mut client) => Some(client.agent_type().await?),
        Err(e) if e.is_agent_unavailable() => None,
        Err(e) => return Err(e),
    };

    let status = StatusResponse {
        running: agent_type.is_some(),
        agent_type,
        socket: path.display().to_string(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status, std::io::stdout().is_terminal());
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  lockbox status");
    println!("  {}", "-".repeat(35));
    match (&status.agent_type, use_color) {
        (Some(kind), true) => println!("    State:    {} running ({kind})", "✓".green()),
        (Some(kind), false) => println!("    State:    [OK] running ({kind})"),
        (None, true) => println!("    State:    {} {}", "✗".red(), "not running".red()),
        (None, false) => println!("    State:    [FAIL] not running"),
    }
    println!("    Socket:   {}", status.socket);
    if status.agent_type.is_none() {
        println!();
        println!("  Start with: lockbox agent");
    }
    println!();
}

/// Runs the `lockbox sessions` command.
pub async fn run_sessions(
    config: &LockboxConfig,
    storage: &FsStorage,
    json: bool,
) -> Result<(), LockboxError> {
    let mut client =
        AgentClient::connect(&storage.socket_agent_path(), config.agent.dial_timeout()).await?;
    let sessions = client.sessions().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
    } else {
        print!("{}", format_sessions(&sessions));
    }
    Ok(())
}

fn format_sessions(sessions: &[SessionInfo]) -> String {
    if sessions.is_empty() {
        return "no active sessions\n".to_string();
    }
    let width = sessions.iter().map(|s| s.vault.len()).max().unwrap_or(0).max(5);
    let mut out = format!("{:<width$}  SESSION\n", "VAULT");
    for session in sessions {
        out.push_str(&format!("{:<width$}  {}\n", session.vault, session.id));
    }
    out
}
