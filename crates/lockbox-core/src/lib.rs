// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lockbox credential agent.
//!
//! This crate provides the error taxonomy, the small set of types that cross
//! the agent socket, and the collaborator contracts used throughout the
//! Lockbox workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LockboxError;
pub use traits::Storage;
pub use types::{AgentType, SessionInfo};
