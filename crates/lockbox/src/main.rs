// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lockbox - a local credential-custody agent.
//!
//! This is the binary entry point: the agent itself plus the commands that
//! talk to it.

mod agent;
mod prompt;
mod pwgen;
mod status;
mod storage;
mod vault;

use clap::{Parser, Subcommand};
use lockbox_core::LockboxError;

use crate::pwgen::{PasswordKind, PwgenArgs};
use crate::storage::FsStorage;

/// Lockbox - a local credential-custody agent.
#[derive(Parser, Debug)]
#[command(name = "lockbox", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the agent in the foreground.
    Agent,
    /// Show whether an agent is running.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List unlocked vault sessions.
    Sessions {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create a passphrase-protected key for a vault.
    Keygen {
        /// Vault name.
        vault: String,
    },
    /// Decrypt a vault key and hand it to the agent.
    Unlock {
        /// Vault name.
        vault: String,
        /// Session lifetime in seconds (0 = until locked).
        #[arg(long)]
        lifetime: Option<u64>,
    },
    /// Revoke every session of a vault.
    Lock {
        /// Vault name.
        vault: String,
    },
    /// Generate a password.
    Pwgen {
        /// What to generate.
        #[arg(long, value_enum, default_value_t = PasswordKind::Random)]
        kind: PasswordKind,
        /// Characters (random, pin) or words (passphrase).
        #[arg(long)]
        length: Option<usize>,
        /// Leave symbols out of random passwords.
        #[arg(long)]
        no_symbols: bool,
        /// Derive from this vault's session key (needs LOCKBOX_SESSION).
        #[arg(long)]
        vault: Option<String>,
        /// Fixed salt, making the output reproducible for the same key.
        #[arg(long)]
        salt: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match lockbox_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            lockbox_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    agent::init_tracing(&config.agent.log_level);
    let storage = FsStorage::from_config(&config);

    let result: Result<(), LockboxError> = match cli.command {
        Commands::Agent => agent::run_agent(&config, &storage).await,
        Commands::Status { json } => status::run_status(&config, &storage, json).await,
        Commands::Sessions { json } => status::run_sessions(&config, &storage, json).await,
        Commands::Keygen { vault } => vault::run_keygen(&config, &storage, &vault),
        Commands::Unlock { vault, lifetime } => {
            vault::run_unlock(&config, &storage, &vault, lifetime).await
        }
        Commands::Lock { vault } => vault::run_lock(&config, &storage, &vault).await,
        Commands::Pwgen {
            kind,
            length,
            no_symbols,
            vault,
            salt,
        } => {
            let args = PwgenArgs {
                kind,
                length,
                no_symbols,
                vault,
                salt,
            };
            pwgen::run_pwgen(&config, &storage, &args).await
        }
    };

    if let Err(e) = result {
        eprintln!("lockbox: {e}");
        if e.is_agent_unavailable() {
            eprintln!("  start one with: lockbox agent");
        }
        std::process::exit(1);
    }
}
