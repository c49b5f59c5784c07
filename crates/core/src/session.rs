// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-visitor session: state machine and durable fields.
//!
//! A [`Session`] is pure data — no locks, no I/O. The lifecycle coordinator
//! wraps it in a lock and persists it through `demo-storage`; this module
//! only encodes the shape and the (de)serialization contract of the
//! persisted document.

use crate::ids::{DbName, GuiSecret};
use serde::{Deserialize, Serialize};

/// Where a session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "CREATING_DATABASE")]
    CreatingDatabase,
    #[serde(rename = "STARTING_LOADGEN")]
    StartingLoadgen,
}

/// Severity of a one-shot user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// A single, one-shot message to surface to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub text: String,
    pub severity: Severity,
}

impl UserMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}

// `(text, severity)` on the wire, per the persisted-state schema in the spec.
impl Serialize for UserMessagePair {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.0.text, self.0.severity).serialize(serializer)
    }
}

/// Newtype so `UserMessage` can serialize as a 2-tuple without affecting its
/// own struct-shaped (de)serialization used elsewhere.
#[derive(Debug, Clone)]
struct UserMessagePair<'a>(&'a UserMessage);

impl<'de> Deserialize<'de> for UserMessage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (text, severity) = <(String, Severity)>::deserialize(deserializer)?;
        Ok(UserMessage { text, severity })
    }
}

/// A per-visitor session: one isolated slice of the shared benchmark cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub status: Status,
    #[serde(default, serialize_with = "serialize_user_message")]
    pub user_message: Option<UserMessage>,
    #[serde(default)]
    pub loadgen_port_offset: Option<u32>,
    #[serde(default)]
    pub loadgen_pids: Option<Vec<u32>>,
    #[serde(default)]
    pub db: Option<DbName>,
    #[serde(default)]
    pub expires_at: Option<f64>,
}

fn serialize_user_message<S: serde::Serializer>(
    msg: &Option<UserMessage>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    msg.as_ref().map(UserMessagePair).serialize(serializer)
}

impl Default for Session {
    fn default() -> Self {
        Self::fresh()
    }
}

impl Session {
    /// A brand-new session: NORMAL, nothing provisioned.
    pub fn fresh() -> Self {
        Self {
            status: Status::Normal,
            user_message: None,
            loadgen_port_offset: None,
            loadgen_pids: None,
            db: None,
            expires_at: None,
        }
    }

    pub fn can_create_database(&self) -> bool {
        self.status == Status::Normal && self.db.is_none()
    }

    pub fn can_run_loadgen(&self) -> bool {
        self.status == Status::Normal && self.db.is_some() && self.loadgen_pids.is_none()
    }

    pub fn can_open_loadgen_ui(&self) -> bool {
        self.status == Status::Normal && self.db.is_some() && self.loadgen_pids.is_some()
    }

    pub fn is_expired(&self, now: f64) -> bool {
        self.status == Status::Normal
            && self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Whether this session currently counts against the global database cap
    /// (invariant 6 in the spec: `db` set or mid-creation).
    pub fn occupies_database_slot(&self) -> bool {
        self.db.is_some() || self.status == Status::CreatingDatabase
    }
}

/// The full persisted document: `<DURABLE_DIR>/demo_state.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedDocument {
    #[serde(default)]
    pub next_loadgen_port_offset: u32,
    #[serde(default)]
    pub user_sessions: std::collections::HashMap<GuiSecret, Session>,
}

impl Default for PersistedDocument {
    fn default() -> Self {
        Self {
            next_loadgen_port_offset: 0,
            user_sessions: std::collections::HashMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
