// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed client for the agent socket.
//!
//! Transport failures come back as [`LockboxError::AgentUnavailable`] or
//! [`LockboxError::Io`]; anything the agent itself rejected comes back as
//! [`LockboxError::SessionNotFound`] or [`LockboxError::Agent`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use ed25519_dalek::{SigningKey, VerifyingKey};
use futures::{SinkExt, StreamExt};
use lockbox_core::{LockboxError, SessionInfo};
use lockbox_key::Key;
use zeroize::Zeroizing;

use crate::extension::{SESSION_EXTENSION, SessionAction, TYPE_EXTENSION, UnlockRequest};
use crate::transport::{self, Connection};
use crate::wire::{ED25519_KEY_TYPE, Identity, Request, Response, ed25519_key_blob};

/// One connection to a running agent.
pub struct AgentClient {
    conn: Connection,
    path: PathBuf,
}

impl AgentClient {
    /// Dial the agent, waiting at most `timeout`.
    pub async fn connect(path: &Path, timeout: Duration) -> Result<Self, LockboxError> {
        let conn = transport::dial(path, timeout).await?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    async fn round_trip(&mut self, request: Request) -> Result<Response, LockboxError> {
        self.conn
            .send(request.encode())
            .await
            .map_err(transport::frame_error)?;
        match self.conn.next().await {
            Some(frame) => Response::decode(frame.map_err(transport::frame_error)?.freeze()),
            None => Err(LockboxError::AgentUnavailable {
                path: self.path.clone(),
                reason: "connection closed by agent".to_string(),
            }),
        }
    }

    async fn extension(&mut self, name: &str, payload: Vec<u8>) -> Result<Bytes, LockboxError> {
        self.round_trip(Request::Extension {
            name: name.to_string(),
            payload: Bytes::from(payload),
        })
        .await?
        .into_extension_result()
    }

    async fn session_call(
        &mut self,
        action: SessionAction,
        body: &[u8],
    ) -> Result<Bytes, LockboxError> {
        let mut payload = Vec::with_capacity(1 + body.len());
        payload.push(action.code());
        payload.extend_from_slice(body);
        self.extension(SESSION_EXTENSION, payload).await
    }

    async fn expect_success(&mut self, request: Request) -> Result<(), LockboxError> {
        match self.round_trip(request).await? {
            Response::Success(_) => Ok(()),
            other => Err(other.unexpected()),
        }
    }

    /// Hand a raw Ed25519 key to the agent's keyring.
    pub async fn add_ssh_key(
        &mut self,
        key: &SigningKey,
        comment: &str,
    ) -> Result<(), LockboxError> {
        let public = key.verifying_key().to_bytes();
        let mut private = Zeroizing::new(Vec::with_capacity(64));
        private.extend_from_slice(&key.to_bytes());
        private.extend_from_slice(&public);

        self.expect_success(Request::AddIdentity {
            key_type: ED25519_KEY_TYPE.to_string(),
            public: Bytes::copy_from_slice(&public),
            private,
            comment: comment.to_string(),
        })
        .await
    }

    pub async fn remove_ssh_key(&mut self, public: &VerifyingKey) -> Result<(), LockboxError> {
        self.expect_success(Request::RemoveIdentity {
            key_blob: ed25519_key_blob(public.as_bytes()),
        })
        .await
    }

    pub async fn remove_all_ssh_keys(&mut self) -> Result<(), LockboxError> {
        self.expect_success(Request::RemoveAllIdentities).await
    }

    pub async fn ssh_identities(&mut self) -> Result<Vec<Identity>, LockboxError> {
        match self.round_trip(Request::RequestIdentities).await? {
            Response::IdentitiesAnswer(identities) => Ok(identities),
            other => Err(other.unexpected()),
        }
    }

    /// Ask the agent to sign `data` with a key it holds. Returns the SSH
    /// signature blob.
    pub async fn sign(&mut self, key_blob: Bytes, data: &[u8]) -> Result<Bytes, LockboxError> {
        match self
            .round_trip(Request::Sign {
                key_blob,
                data: Bytes::copy_from_slice(data),
                flags: 0,
            })
            .await?
        {
            Response::SignResponse(signature) => Ok(signature),
            other => Err(other.unexpected()),
        }
    }

    pub async fn sessions(&mut self) -> Result<Vec<SessionInfo>, LockboxError> {
        let body = self.session_call(SessionAction::List, &[]).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn lock(&mut self, vault: &str) -> Result<(), LockboxError> {
        self.session_call(SessionAction::Lock, vault.as_bytes())
            .await?;
        Ok(())
    }

    pub async fn key(&mut self, vault: &str, session_id: &str) -> Result<Key, LockboxError> {
        let lookup = serde_json::to_vec(&SessionInfo {
            id: session_id.to_string(),
            vault: vault.to_string(),
        })?;
        let body = Zeroizing::new(self.session_call(SessionAction::Key, &lookup).await?.to_vec());
        Ok(serde_json::from_slice(&body)?)
    }

    /// Start a session; `None` or a zero lifetime never expires.
    pub async fn unlock(
        &mut self,
        vault: &str,
        key: &Key,
        lifetime: Option<Duration>,
    ) -> Result<String, LockboxError> {
        let request = UnlockRequest {
            vault: vault.to_string(),
            key: key.clone(),
            lifetime: lifetime.map_or(0, |l| u64::try_from(l.as_millis()).unwrap_or(u64::MAX)),
        };
        let body = Zeroizing::new(serde_json::to_vec(&request)?);
        let id = self.session_call(SessionAction::Unlock, &body).await?;
        String::from_utf8(id.to_vec())
            .map_err(|_| LockboxError::MalformedRequest("session id is not UTF-8".to_string()))
    }

    /// The flavor of agent answering.
    pub async fn agent_type(&mut self) -> Result<String, LockboxError> {
        let body = self.extension(TYPE_EXTENSION, Vec::new()).await?;
        String::from_utf8(body.to_vec())
            .map_err(|_| LockboxError::MalformedRequest("agent type is not UTF-8".to_string()))
    }
}
