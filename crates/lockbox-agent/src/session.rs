// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory vault sessions.
//!
//! A session is Active from Unlock until its lifetime elapses (Expired) or
//! its vault is locked (Revoked). Every operation runs under one mutex, so a
//! Lock is observed by every later List or Key call, and expired sessions
//! are purged before anything is read.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lockbox_core::{LockboxError, SessionInfo};
use lockbox_key::Key;
use tracing::{debug, info};
use uuid::Uuid;

/// One unlocked vault grant.
pub struct Session {
    pub id: String,
    pub vault: String,
    key: Key,
    pub created_at: DateTime<Utc>,
    started: Instant,
    /// `None` never expires.
    pub lifetime: Option<Duration>,
}

impl Session {
    fn is_expired(&self, now: Instant) -> bool {
        self.lifetime
            .is_some_and(|lifetime| now.duration_since(self.started) > lifetime)
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            vault: self.vault.clone(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("vault", &self.vault)
            .field("key", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Owner of every live session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>, LockboxError> {
        self.sessions
            .lock()
            .map_err(|_| LockboxError::Internal("session store lock poisoned".to_string()))
    }

    /// Take the lock and drop expired sessions.
    fn live(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>, LockboxError> {
        let mut sessions = self.guard()?;
        let now = Instant::now();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok(sessions)
    }

    /// Start a session for `vault`. A zero or absent lifetime never expires.
    pub fn unlock(
        &self,
        vault: &str,
        key: Key,
        lifetime: Option<Duration>,
    ) -> Result<String, LockboxError> {
        let lifetime = lifetime.filter(|l| !l.is_zero());
        let mut sessions = self.live()?;

        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        sessions.insert(
            id.clone(),
            Session {
                id: id.clone(),
                vault: vault.to_string(),
                key,
                created_at: Utc::now(),
                started: Instant::now(),
                lifetime,
            },
        );
        info!(vault, session = %id, ?lifetime, "vault unlocked");
        Ok(id)
    }

    /// Revoke every session of `vault`. Returns how many were removed.
    pub fn lock(&self, vault: &str) -> Result<usize, LockboxError> {
        let mut sessions = self.live()?;
        let before = sessions.len();
        sessions.retain(|_, session| session.vault != vault);
        let removed = before - sessions.len();
        info!(vault, removed, "vault locked");
        Ok(removed)
    }

    /// Every Active session, oldest first.
    pub fn sessions(&self) -> Result<Vec<SessionInfo>, LockboxError> {
        let sessions = self.live()?;
        let mut active: Vec<&Session> = sessions.values().collect();
        active.sort_by(|a, b| a.started.cmp(&b.started).then_with(|| a.id.cmp(&b.id)));
        Ok(active.into_iter().map(Session::info).collect())
    }

    /// The key of an Active session of `vault` with this `id`.
    ///
    /// Wrong id, wrong vault and expiry all yield
    /// [`LockboxError::SessionNotFound`].
    pub fn key(&self, vault: &str, id: &str) -> Result<Key, LockboxError> {
        let sessions = self.live()?;
        sessions
            .get(id)
            .filter(|session| session.vault == vault)
            .map(|session| session.key.clone())
            .ok_or(LockboxError::SessionNotFound)
    }

    /// Sessions in memory, expired ones included.
    #[cfg(test)]
    pub(crate) fn held(&self) -> usize {
        self.guard().map(|s| s.len()).unwrap_or_default()
    }

    /// Drop expired sessions now. Returns how many were dropped.
    pub fn purge_expired(&self) -> Result<usize, LockboxError> {
        let mut sessions = self.guard()?;
        let before = sessions.len();
        let now = Instant::now();
        sessions.retain(|_, session| !session.is_expired(now));
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "expired sessions purged");
        }
        Ok(purged)
    }
}
