// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! demo-core: session model and view-model projection for the demo
//! orchestration server.
//!
//! This crate is pure — no locks, no I/O, no async. `demo-daemon` wraps
//! [`Session`] in a lock and persists [`PersistedDocument`] through
//! `demo-storage`.

pub mod clock;
pub mod ids;
pub mod session;
pub mod view_model;

pub use clock::{Clock, FakeClock, SystemClock};
pub use ids::{DbName, GuiSecret};
pub use session::{PersistedDocument, Session, Severity, Status, UserMessage};
pub use view_model::{derive as derive_view_model, Highlight, ViewModel};

/// Default number of sessions that may simultaneously occupy a database slot.
pub const DEFAULT_MAX_ACTIVE_DATABASES: u32 = 6;

/// Default session time-to-live, in seconds, set on successful database creation.
pub const DEFAULT_SESSION_TTL_SECONDS: f64 = 900.0;

/// Number of distinct port offsets in the pool (`[0, 10000)`).
pub const PORT_OFFSET_SPACE: u32 = 10_000;

/// Base port for a session's load-generator master.
pub const LOADGEN_MASTER_BASE_PORT: u16 = 33_000;

/// Base port for a session's load-generator web UI.
pub const LOADGEN_WEB_BASE_PORT: u16 = 44_000;
