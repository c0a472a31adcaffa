// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The agent server.
//!
//! One task per connection; each loops frame, dispatch, reply until the peer
//! hangs up. All connections share one [`AgentState`]. A sweeper task purges
//! expired sessions on a fixed interval.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use lockbox_core::{AgentType, LockboxError};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::extension::ExtensionRegistry;
use crate::keyring::{Keyring, SshKeyEntry};
use crate::session::SessionStore;
use crate::transport::{self, frame_codec};
use crate::wire::{Request, Response};

/// How long `bind` waits for an existing agent to answer.
const LIVE_AGENT_PROBE: Duration = Duration::from_millis(100);

/// State shared by every connection.
pub struct AgentState {
    sessions: Arc<SessionStore>,
    keyring: Keyring,
    registry: ExtensionRegistry,
}

impl AgentState {
    pub fn new(agent_type: AgentType) -> Self {
        let sessions = Arc::new(SessionStore::new());
        let registry = ExtensionRegistry::with_defaults(sessions.clone(), agent_type);
        Self {
            sessions,
            keyring: Keyring::new(),
            registry,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    /// Answer one request.
    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Extension { name, payload } => match self.registry.call(&name, payload) {
                Ok(reply) => Response::Success(reply),
                Err(err) => {
                    debug!(extension = %name, error = %err, "extension call failed");
                    Response::extension_failure(&err)
                }
            },
            Request::RequestIdentities => match self.keyring.identities() {
                Ok(identities) => Response::IdentitiesAnswer(identities),
                Err(err) => refuse("list identities", &err),
            },
            Request::Sign { key_blob, data, .. } => match self.keyring.sign(&key_blob, &data) {
                Ok(signature) => Response::SignResponse(signature),
                Err(err) => refuse("sign", &err),
            },
            Request::AddIdentity {
                key_type,
                public,
                private,
                comment,
            } => {
                let added = SshKeyEntry::from_wire(&key_type, &public, &private, &comment)
                    .and_then(|entry| self.keyring.add(entry));
                match added {
                    Ok(()) => Response::Success(Default::default()),
                    Err(err) => refuse("add identity", &err),
                }
            }
            Request::RemoveIdentity { key_blob } => match self.keyring.remove(&key_blob) {
                Ok(()) => Response::Success(Default::default()),
                Err(err) => refuse("remove identity", &err),
            },
            Request::RemoveAllIdentities => match self.keyring.remove_all() {
                Ok(_) => Response::Success(Default::default()),
                Err(err) => refuse("remove all identities", &err),
            },
        }
    }
}

fn refuse(operation: &str, err: &LockboxError) -> Response {
    debug!(operation, error = %err, "request refused");
    Response::Failure
}

/// A bound agent socket, ready to serve.
pub struct AgentServer {
    listener: UnixListener,
    path: PathBuf,
    state: Arc<AgentState>,
    sweep_interval: Option<Duration>,
}

impl AgentServer {
    /// Bind `path`, refusing if an agent already answers there.
    pub async fn bind(path: &Path, state: Arc<AgentState>) -> Result<Self, LockboxError> {
        if transport::dial(path, LIVE_AGENT_PROBE).await.is_ok() {
            return Err(LockboxError::Listen {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AddrInUse,
                    "an agent is already listening",
                ),
            });
        }

        let listener = transport::listen(path)?;
        info!(path = %path.display(), "agent listening");
        Ok(Self {
            listener,
            path: path.to_path_buf(),
            state,
            sweep_interval: None,
        })
    }

    /// Purge expired sessions every `interval` while serving.
    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.sweep_interval = interval.filter(|i| !i.is_zero());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &Arc<AgentState> {
        &self.state
    }

    /// Accept connections until `shutdown` is cancelled, then remove the
    /// socket file.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<(), LockboxError> {
        if let Some(interval) = self.sweep_interval {
            tokio::spawn(sweep(self.state.sessions.clone(), interval, shutdown.clone()));
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let state = self.state.clone();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            serve_connection(stream, state, shutdown).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
            }
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove agent socket"),
        }
        info!("agent stopped");
        Ok(())
    }
}

async fn serve_connection(stream: UnixStream, state: Arc<AgentState>, shutdown: CancellationToken) {
    let mut framed = Framed::new(stream, frame_codec());
    debug!("connection opened");

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = framed.next() => frame,
        };
        let frame = match frame {
            Some(Ok(frame)) => frame.freeze(),
            Some(Err(e)) => {
                let e = transport::frame_error(e);
                warn!(error = %e, "dropping connection after framing error");
                break;
            }
            None => break,
        };

        let response = match Request::decode(frame) {
            Ok(request) => state.handle(request),
            Err(err) => {
                debug!(error = %err, "undecodable request");
                Response::Failure
            }
        };

        if let Err(e) = framed.send(response.encode()).await {
            let e = transport::frame_error(e);
            error!(error = %e, "failed to write response");
            break;
        }
    }
    debug!("connection closed");
}

async fn sweep(sessions: Arc<SessionStore>, interval: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = sessions.purge_expired() {
                    error!(error = %e, "session sweep failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::extension::TYPE_EXTENSION;

    #[test]
    fn undecodable_key_is_refused() {
        let state = AgentState::new(AgentType::Cli);
        let response = state.handle(Request::AddIdentity {
            key_type: "ssh-rsa".to_string(),
            public: Bytes::new(),
            private: zeroize::Zeroizing::new(Vec::new()),
            comment: String::new(),
        });
        assert_eq!(response, Response::Failure);
    }

    #[test]
    fn extension_errors_become_extension_failures() {
        let state = AgentState::new(AgentType::Gui);
        let ok = state.handle(Request::Extension {
            name: TYPE_EXTENSION.to_string(),
            payload: Bytes::new(),
        });
        assert_eq!(ok, Response::Success(Bytes::from_static(b"gui")));

        let missing = state.handle(Request::Extension {
            name: "nope".to_string(),
            payload: Bytes::new(),
        });
        assert!(matches!(
            missing,
            Response::ExtensionFailure { ref kind, .. } if kind == "action-not-registered"
        ));
    }

    #[tokio::test]
    async fn sweeper_purges_without_requests() {
        let state = Arc::new(AgentState::new(AgentType::Cli));
        state
            .sessions()
            .unlock("v", lockbox_key::Key::generate(), Some(Duration::from_millis(10)))
            .unwrap();

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(sweep(
            state.sessions().clone(),
            Duration::from_millis(20),
            shutdown.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        task.await.unwrap();

        assert_eq!(state.sessions().held(), 0);
    }
}
