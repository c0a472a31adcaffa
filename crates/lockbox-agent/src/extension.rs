// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extension multiplexer.
//!
//! Extensions are named sub-protocols. An extension registered with action
//! codes reads byte 0 of its payload as the action and hands the rest to the
//! handler owning that code; an extension registered without one gets the
//! whole payload.
//!
//! | Extension | Action | Body | Reply |
//! |---|---|---|---|
//! | `session@lockbox` | List `0x01` | none | JSON `[{id, vault}]` |
//! | `session@lockbox` | Lock `0x02` | vault name | empty |
//! | `session@lockbox` | Key `0x03` | JSON `{id, vault}` | JSON secret identity |
//! | `session@lockbox` | Unlock `0x04` | JSON `{vault, key, lifetime}` | session id |
//! | `type@lockbox` | none | none | agent type |

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use lockbox_core::{AgentType, LockboxError, SessionInfo};
use lockbox_key::Key;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::session::SessionStore;

pub const SESSION_EXTENSION: &str = "session@lockbox";
pub const TYPE_EXTENSION: &str = "type@lockbox";

/// Action codes of the session extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionAction {
    List = 0x01,
    Lock = 0x02,
    Key = 0x03,
    Unlock = 0x04,
}

impl SessionAction {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Body of an Unlock call. `lifetime` is in milliseconds, 0 meaning unbounded.
#[derive(Debug, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub vault: String,
    pub key: Key,
    pub lifetime: u64,
}

impl UnlockRequest {
    pub fn lifetime(&self) -> Option<Duration> {
        (self.lifetime > 0).then(|| Duration::from_millis(self.lifetime))
    }
}

/// A decoded extension call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRequest {
    pub extension: String,
    pub action: Option<u8>,
    pub body: Bytes,
}

impl ExtensionRequest {
    pub fn new(extension: impl Into<String>, action: Option<u8>, body: impl Into<Bytes>) -> Self {
        Self {
            extension: extension.into(),
            action,
            body: body.into(),
        }
    }
}

/// Handles one (extension, action) pair.
pub trait ExtensionHandler: Send + Sync {
    /// The action code this handler owns, if the extension uses them.
    fn action(&self) -> Option<u8>;

    /// Serve `request`. Implementations call [`ensure_action`] first.
    fn handle(&self, request: &ExtensionRequest) -> Result<Bytes, LockboxError>;
}

/// Reject a request that carries an action other than the handler's own.
pub fn ensure_action(
    handler: &dyn ExtensionHandler,
    request: &ExtensionRequest,
) -> Result<(), LockboxError> {
    if request.action != handler.action() {
        return Err(LockboxError::ActionHandlerMismatch {
            expected: handler.action(),
            actual: request.action,
        });
    }
    Ok(())
}

fn malformed(what: &str, err: impl std::fmt::Display) -> LockboxError {
    LockboxError::MalformedRequest(format!("{what}: {err}"))
}

struct ListHandler {
    store: Arc<SessionStore>,
}

impl ExtensionHandler for ListHandler {
    fn action(&self) -> Option<u8> {
        Some(SessionAction::List.code())
    }

    fn handle(&self, request: &ExtensionRequest) -> Result<Bytes, LockboxError> {
        ensure_action(self, request)?;
        Ok(serde_json::to_vec(&self.store.sessions()?)?.into())
    }
}

struct LockHandler {
    store: Arc<SessionStore>,
}

impl ExtensionHandler for LockHandler {
    fn action(&self) -> Option<u8> {
        Some(SessionAction::Lock.code())
    }

    fn handle(&self, request: &ExtensionRequest) -> Result<Bytes, LockboxError> {
        ensure_action(self, request)?;
        let vault = std::str::from_utf8(&request.body).map_err(|e| malformed("vault name", e))?;
        self.store.lock(vault)?;
        Ok(Bytes::new())
    }
}

struct KeyHandler {
    store: Arc<SessionStore>,
}

impl ExtensionHandler for KeyHandler {
    fn action(&self) -> Option<u8> {
        Some(SessionAction::Key.code())
    }

    fn handle(&self, request: &ExtensionRequest) -> Result<Bytes, LockboxError> {
        ensure_action(self, request)?;
        let lookup: SessionInfo =
            serde_json::from_slice(&request.body).map_err(|e| malformed("key request", e))?;
        let key = self.store.key(&lookup.vault, &lookup.id)?;
        Ok(serde_json::to_vec(&key)?.into())
    }
}

struct UnlockHandler {
    store: Arc<SessionStore>,
}

impl ExtensionHandler for UnlockHandler {
    fn action(&self) -> Option<u8> {
        Some(SessionAction::Unlock.code())
    }

    fn handle(&self, request: &ExtensionRequest) -> Result<Bytes, LockboxError> {
        ensure_action(self, request)?;
        let unlock: UnlockRequest =
            serde_json::from_slice(&request.body).map_err(|e| malformed("unlock request", e))?;
        let lifetime = unlock.lifetime();
        let id = self.store.unlock(&unlock.vault, unlock.key, lifetime)?;
        Ok(Bytes::from(id))
    }
}

struct TypeHandler {
    agent_type: AgentType,
}

impl ExtensionHandler for TypeHandler {
    fn action(&self) -> Option<u8> {
        None
    }

    fn handle(&self, request: &ExtensionRequest) -> Result<Bytes, LockboxError> {
        ensure_action(self, request)?;
        Ok(Bytes::from(self.agent_type.to_string()))
    }
}

/// Handler table keyed by extension name and action code.
#[derive(Default)]
pub struct ExtensionRegistry {
    handlers: HashMap<(String, Option<u8>), Box<dyn ExtensionHandler>>,
    with_actions: HashSet<String>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session and type extensions over `store`.
    pub fn with_defaults(store: Arc<SessionStore>, agent_type: AgentType) -> Self {
        let mut registry = Self::new();
        registry.register(
            SESSION_EXTENSION,
            ListHandler {
                store: store.clone(),
            },
        );
        registry.register(
            SESSION_EXTENSION,
            LockHandler {
                store: store.clone(),
            },
        );
        registry.register(
            SESSION_EXTENSION,
            KeyHandler {
                store: store.clone(),
            },
        );
        registry.register(SESSION_EXTENSION, UnlockHandler { store });
        registry.register(TYPE_EXTENSION, TypeHandler { agent_type });
        registry
    }

    /// Register `handler` under `extension` and the handler's own action.
    /// A later registration for the same pair replaces the earlier one.
    pub fn register(&mut self, extension: &str, handler: impl ExtensionHandler + 'static) {
        let action = handler.action();
        if action.is_some() {
            self.with_actions.insert(extension.to_string());
        }
        self.handlers
            .insert((extension.to_string(), action), Box::new(handler));
    }

    /// Split a raw extension payload into a request for this registry.
    pub fn parse(&self, extension: &str, payload: Bytes) -> ExtensionRequest {
        if self.with_actions.contains(extension) {
            match payload.split_first() {
                Some((&action, _)) => {
                    ExtensionRequest::new(extension, Some(action), payload.slice(1..))
                }
                None => ExtensionRequest::new(extension, None, Bytes::new()),
            }
        } else {
            ExtensionRequest::new(extension, None, payload)
        }
    }

    /// Route `request` to its handler.
    pub fn dispatch(&self, request: &ExtensionRequest) -> Result<Bytes, LockboxError> {
        let handler = self
            .handlers
            .get(&(request.extension.clone(), request.action))
            .ok_or_else(|| LockboxError::ActionNotRegistered {
                extension: request.extension.clone(),
                action: request.action,
            })?;
        debug!(
            extension = %request.extension,
            action = ?request.action,
            "dispatching extension call"
        );
        handler.handle(request)
    }

    /// Parse and dispatch a raw extension payload.
    pub fn call(&self, extension: &str, payload: Bytes) -> Result<Bytes, LockboxError> {
        self.dispatch(&self.parse(extension, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (Arc<SessionStore>, ExtensionRegistry) {
        let store = Arc::new(SessionStore::new());
        let registry = ExtensionRegistry::with_defaults(store.clone(), AgentType::Cli);
        (store, registry)
    }

    fn session_call(
        registry: &ExtensionRegistry,
        action: SessionAction,
        body: &[u8],
    ) -> Result<Bytes, LockboxError> {
        let mut payload = vec![action.code()];
        payload.extend_from_slice(body);
        registry.call(SESSION_EXTENSION, Bytes::from(payload))
    }

    #[test]
    fn unlock_list_key_lock() {
        let (_, registry) = registry();
        let key = Key::generate();
        let unlock = serde_json::to_vec(&UnlockRequest {
            vault: "personal".to_string(),
            key: key.clone(),
            lifetime: 0,
        })
        .unwrap();
        let id = session_call(&registry, SessionAction::Unlock, &unlock).unwrap();
        let id = String::from_utf8(id.to_vec()).unwrap();

        let listed: Vec<SessionInfo> =
            serde_json::from_slice(&session_call(&registry, SessionAction::List, b"").unwrap())
                .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);

        let lookup = serde_json::to_vec(&SessionInfo {
            id: id.clone(),
            vault: "personal".to_string(),
        })
        .unwrap();
        let got: Key =
            serde_json::from_slice(&session_call(&registry, SessionAction::Key, &lookup).unwrap())
                .unwrap();
        assert_eq!(got, key);

        let locked = session_call(&registry, SessionAction::Lock, b"personal").unwrap();
        assert!(locked.is_empty());
        let err = session_call(&registry, SessionAction::Key, &lookup).unwrap_err();
        assert!(err.is_session_not_found());
    }

    #[test]
    fn type_extension_reports_agent_type() {
        let (_, registry) = registry();
        let reply = registry.call(TYPE_EXTENSION, Bytes::new()).unwrap();
        assert_eq!(&reply[..], b"cli");
    }

    #[test]
    fn unknown_extension_or_action_is_not_registered() {
        let (_, registry) = registry();
        let unknown_name = registry.call("nope@lockbox", Bytes::new()).unwrap_err();
        assert!(matches!(
            unknown_name,
            LockboxError::ActionNotRegistered { ref extension, action: None } if extension == "nope@lockbox"
        ));

        let unknown_action = registry
            .call(SESSION_EXTENSION, Bytes::from_static(&[0x7f]))
            .unwrap_err();
        assert!(matches!(
            unknown_action,
            LockboxError::ActionNotRegistered { action: Some(0x7f), .. }
        ));

        let empty = registry.call(SESSION_EXTENSION, Bytes::new()).unwrap_err();
        assert!(matches!(
            empty,
            LockboxError::ActionNotRegistered { action: None, .. }
        ));
    }

    #[test]
    fn handler_rejects_foreign_action() {
        let store = Arc::new(SessionStore::new());
        let handler = LockHandler { store };
        let request = ExtensionRequest::new(
            SESSION_EXTENSION,
            Some(SessionAction::Unlock.code()),
            Bytes::from_static(b"personal"),
        );
        let err = handler.handle(&request).unwrap_err();
        assert!(matches!(
            err,
            LockboxError::ActionHandlerMismatch {
                expected: Some(0x02),
                actual: Some(0x04)
            }
        ));
    }

    #[test]
    fn malformed_bodies_are_reported() {
        let (_, registry) = registry();
        let err = session_call(&registry, SessionAction::Unlock, b"{not json").unwrap_err();
        assert!(matches!(err, LockboxError::MalformedRequest(_)));
        let err = session_call(&registry, SessionAction::Lock, &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, LockboxError::MalformedRequest(_)));
    }

    #[test]
    fn unlock_lifetime_is_milliseconds() {
        let (store, registry) = registry();
        let body = format!(
            r#"{{"vault":"v","key":"{}","lifetime":20}}"#,
            Key::generate().secret_identity().as_str()
        );
        session_call(&registry, SessionAction::Unlock, body.as_bytes()).unwrap();
        assert_eq!(store.sessions().unwrap().len(), 1);
        std::thread::sleep(Duration::from_millis(60));
        assert!(store.sessions().unwrap().is_empty());
    }
}
