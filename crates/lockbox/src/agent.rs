// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox agent` command implementation.
//!
//! Runs the agent in the foreground until SIGINT or SIGTERM. If an agent
//! already answers on the socket, reports it and exits instead of starting
//! a duplicate.

use std::sync::Arc;

use lockbox_agent::{AgentClient, AgentServer, AgentState};
use lockbox_config::model::LockboxConfig;
use lockbox_core::{AgentType, LockboxError, Storage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::FsStorage;

/// Runs the `lockbox agent` command.
pub async fn run_agent(config: &LockboxConfig, storage: &FsStorage) -> Result<(), LockboxError> {
    let path = storage.socket_agent_path();

    if let Ok(mut client) = AgentClient::connect(&path, config.agent.dial_timeout()).await {
        let running = client.agent_type().await?;
        info!(agent_type = %running, path = %path.display(), "agent already running");
        println!("lockbox: a {running} agent is already running at {}", path.display());
        return Ok(());
    }

    let agent_type: AgentType = config.agent.agent_type.parse().map_err(|_| {
        LockboxError::Config(format!("unknown agent type {:?}", config.agent.agent_type))
    })?;

    let state = Arc::new(AgentState::new(agent_type));
    let server = AgentServer::bind(&path, state)
        .await?
        .with_sweep_interval(config.agent.sweep_interval());

    info!(
        %agent_type,
        default_lifetime = ?config.agent.default_lifetime(),
        "starting agent"
    );
    server.serve(install_signal_handler()).await
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("received SIGINT (Ctrl+C), initiating shutdown");
                    }
                    _ = sigterm.recv() => {
                        info!("received SIGTERM, initiating shutdown");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot install SIGTERM handler, only Ctrl+C stops the agent");
                let _ = tokio::signal::ctrl_c().await;
                info!("received SIGINT (Ctrl+C), initiating shutdown");
            }
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lockbox={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
