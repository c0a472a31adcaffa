// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the agent, its client and the CLI.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Public view of a live vault session, as returned by the session List action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub vault: String,
}

/// The flavor of agent answering on the socket.
///
/// Callers only use it to detect that an agent is already running.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    /// Started from the command line.
    Cli,
    /// Started by the desktop application.
    Gui,
}
