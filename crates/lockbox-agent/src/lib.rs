// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Lockbox credential agent.
//!
//! A local process reachable only over a Unix socket. It keeps unlocked
//! vault keys ([`session`]) and raw SSH keys ([`keyring`]) in memory and
//! serves them over a framed protocol ([`wire`]) whose named extensions are
//! routed through an [`extension::ExtensionRegistry`].

pub mod client;
pub mod extension;
pub mod keyring;
pub mod server;
pub mod session;
pub mod transport;
pub mod wire;

pub use client::AgentClient;
pub use extension::{ExtensionHandler, ExtensionRegistry, ExtensionRequest, SessionAction};
pub use server::{AgentServer, AgentState};
pub use session::SessionStore;
