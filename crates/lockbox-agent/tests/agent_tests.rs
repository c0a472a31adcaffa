// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: a real agent on a temporary socket, driven by the client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use lockbox_agent::wire::{Request, Response, ed25519_key_blob};
use lockbox_agent::{AgentClient, AgentServer, AgentState};
use lockbox_core::{AgentType, LockboxError, SessionInfo};
use lockbox_key::{Format, Key, PasswordRecipe, PasswordRequest};
use rand::rngs::OsRng;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_millis(500);

struct RunningAgent {
    _dir: TempDir,
    path: PathBuf,
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), LockboxError>>,
}

impl RunningAgent {
    async fn start(agent_type: AgentType) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lockbox").join("agent.sock");
        let state = Arc::new(AgentState::new(agent_type));
        let server = AgentServer::bind(&path, state)
            .await
            .unwrap()
            .with_sweep_interval(Some(Duration::from_millis(20)));
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(server.serve(shutdown.clone()));
        Self {
            _dir: dir,
            path,
            shutdown,
            task,
        }
    }

    async fn client(&self) -> AgentClient {
        AgentClient::connect(&self.path, TIMEOUT).await.unwrap()
    }

    async fn stop(self) -> PathBuf {
        self.shutdown.cancel();
        self.task.await.unwrap().unwrap();
        self.path
    }
}

/// Unlock, list, lock, then the key is gone.
#[tokio::test]
async fn session_lifecycle_scenario() {
    let agent = RunningAgent::start(AgentType::Cli).await;
    let mut client = agent.client().await;
    let key = Key::generate();

    let id = client.unlock("personal", &key, None).await.unwrap();
    assert_eq!(
        client.sessions().await.unwrap(),
        vec![SessionInfo {
            id: id.clone(),
            vault: "personal".to_string()
        }]
    );
    assert_eq!(client.key("personal", &id).await.unwrap(), key);

    client.lock("personal").await.unwrap();
    assert!(client.sessions().await.unwrap().is_empty());
    let err = client.key("personal", &id).await.unwrap_err();
    assert!(err.is_session_not_found(), "{err:?}");

    agent.stop().await;
}

/// Wrong vault, wrong id and expiry look the same to a caller.
#[tokio::test]
async fn session_errors_are_undifferentiated() {
    let agent = RunningAgent::start(AgentType::Cli).await;
    let mut client = agent.client().await;

    let id = client.unlock("work", &Key::generate(), None).await.unwrap();
    let short = client
        .unlock("work", &Key::generate(), Some(Duration::from_millis(10)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    let wrong_vault = client.key("home", &id).await.unwrap_err();
    let wrong_id = client.key("work", "missing").await.unwrap_err();
    let expired = client.key("work", &short).await.unwrap_err();
    for err in [&wrong_vault, &wrong_id, &expired] {
        assert!(err.is_session_not_found(), "{err:?}");
    }
    assert_eq!(client.sessions().await.unwrap().len(), 1);

    agent.stop().await;
}

/// A key fetched from a session derives the same passwords as the original.
#[tokio::test]
async fn session_key_derives_same_passwords() {
    let agent = RunningAgent::start(AgentType::Cli).await;
    let mut client = agent.client().await;
    let key = Key::generate();
    let id = client.unlock("personal", &key, None).await.unwrap();

    let fetched = client.key("personal", &id).await.unwrap();
    let request = PasswordRequest::new(PasswordRecipe::Random {
        length: 20,
        format: Format::default(),
    })
    .with_salt(b"example.org".to_vec());
    assert_eq!(
        key.generate_password(&request).unwrap(),
        fetched.generate_password(&request).unwrap()
    );

    agent.stop().await;
}

/// The type extension reports the agent flavor.
#[tokio::test]
async fn agent_type_is_reported() {
    let agent = RunningAgent::start(AgentType::Gui).await;
    let mut client = agent.client().await;
    assert_eq!(client.agent_type().await.unwrap(), "gui");
    agent.stop().await;
}

/// Raw SSH keys can be added, listed, used and removed.
#[tokio::test]
async fn ssh_keyring_over_the_socket() {
    let agent = RunningAgent::start(AgentType::Cli).await;
    let mut client = agent.client().await;
    let key = SigningKey::generate(&mut OsRng);
    let blob = ed25519_key_blob(key.verifying_key().as_bytes());

    client.add_ssh_key(&key, "laptop").await.unwrap();
    let identities = client.ssh_identities().await.unwrap();
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].key_blob, blob);
    assert_eq!(identities[0].comment, "laptop");

    let signature = client.sign(blob.clone(), b"challenge").await.unwrap();
    assert!(signature.len() > 64);

    client.remove_ssh_key(&key.verifying_key()).await.unwrap();
    assert!(client.ssh_identities().await.unwrap().is_empty());

    let err = client.remove_ssh_key(&key.verifying_key()).await.unwrap_err();
    assert!(matches!(err, LockboxError::Agent { ref kind, .. } if kind == "failure"));

    client.add_ssh_key(&key, "again").await.unwrap();
    client.remove_all_ssh_keys().await.unwrap();
    assert!(client.ssh_identities().await.unwrap().is_empty());

    agent.stop().await;
}

/// Unknown extensions are reported verbatim with their error kind.
#[tokio::test]
async fn unknown_extension_is_reported() {
    let agent = RunningAgent::start(AgentType::Cli).await;
    let stream = tokio::net::UnixStream::connect(&agent.path).await.unwrap();
    let mut framed = tokio_util::codec::Framed::new(stream, lockbox_agent::transport::frame_codec());

    use futures::{SinkExt, StreamExt};
    let request = Request::Extension {
        name: "clipboard@lockbox".to_string(),
        payload: bytes::Bytes::new(),
    };
    framed.send(request.encode()).await.unwrap();
    let reply = framed.next().await.unwrap().unwrap().freeze();
    match Response::decode(reply).unwrap() {
        Response::ExtensionFailure { kind, message } => {
            assert_eq!(kind, "action-not-registered");
            assert!(message.contains("clipboard@lockbox"));
        }
        other => panic!("unexpected reply: {other:?}"),
    }

    agent.stop().await;
}

/// Dialing a socket nobody listens on fails fast as "unavailable".
#[tokio::test]
async fn missing_agent_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let started = std::time::Instant::now();
    let err = AgentClient::connect(&dir.path().join("agent.sock"), Duration::from_millis(100))
        .await
        .err()
        .unwrap();
    assert!(err.is_agent_unavailable(), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

/// A second agent refuses to take over a live socket.
#[tokio::test]
async fn second_agent_refuses_live_socket() {
    let agent = RunningAgent::start(AgentType::Cli).await;
    let err = AgentServer::bind(&agent.path, Arc::new(AgentState::new(AgentType::Gui)))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LockboxError::Listen { .. }), "{err:?}");

    // The first agent is still serving.
    let mut client = agent.client().await;
    assert_eq!(client.agent_type().await.unwrap(), "cli");
    agent.stop().await;
}

/// Shutting down removes the socket; clients then see "unavailable".
#[tokio::test]
async fn shutdown_removes_socket() {
    let agent = RunningAgent::start(AgentType::Cli).await;
    let path = agent.stop().await;
    assert!(!path.exists());
}

/// Concurrent unlocks and a lock never leave a partial result behind.
#[tokio::test]
async fn concurrent_clients_share_state() {
    let agent = RunningAgent::start(AgentType::Cli).await;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let path = agent.path.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = AgentClient::connect(&path, TIMEOUT).await.unwrap();
            client.unlock("shared", &Key::generate(), None).await.unwrap()
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);

    let mut client = agent.client().await;
    assert_eq!(client.sessions().await.unwrap().len(), 16);
    client.lock("shared").await.unwrap();

    let mut other = agent.client().await;
    assert!(other.sessions().await.unwrap().is_empty());

    agent.stop().await;
}

/// Readers polling during a lock see every session of the vault or none.
#[tokio::test]
async fn lock_is_atomic_for_concurrent_readers() {
    const SESSIONS: usize = 12;
    let agent = RunningAgent::start(AgentType::Cli).await;
    let mut client = agent.client().await;
    for _ in 0..SESSIONS {
        client.unlock("shared", &Key::generate(), None).await.unwrap();
    }

    let locked = CancellationToken::new();
    let mut readers = Vec::new();
    for _ in 0..4 {
        let path = agent.path.clone();
        let locked = locked.clone();
        readers.push(tokio::spawn(async move {
            let mut reader = AgentClient::connect(&path, TIMEOUT).await.unwrap();
            let mut snapshots = Vec::new();
            loop {
                let done = locked.is_cancelled();
                snapshots.push(reader.sessions().await.unwrap().len());
                if done {
                    break snapshots;
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    client.lock("shared").await.unwrap();
    locked.cancel();

    for reader in readers {
        let snapshots = reader.await.unwrap();
        assert!(
            snapshots.iter().all(|&n| n == 0 || n == SESSIONS),
            "partial snapshot: {snapshots:?}"
        );
        assert_eq!(snapshots.last(), Some(&0));
    }
    agent.stop().await;
}

/// A request over the frame limit fails locally without breaking the connection.
#[tokio::test]
async fn oversized_request_is_frame_too_large() {
    let agent = RunningAgent::start(AgentType::Cli).await;
    let mut client = agent.client().await;
    let signing = SigningKey::generate(&mut OsRng);
    client.add_ssh_key(&signing, "big").await.unwrap();

    let blob = ed25519_key_blob(signing.verifying_key().as_bytes());
    let huge = vec![0u8; lockbox_agent::transport::MAX_FRAME_LEN + 1];
    let err = client.sign(blob, &huge).await.unwrap_err();
    assert!(matches!(err, LockboxError::FrameTooLarge { .. }), "{err:?}");

    assert_eq!(client.agent_type().await.unwrap(), "cli");
    agent.stop().await;
}
