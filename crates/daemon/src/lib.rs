// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! demo-daemon: the multi-tenant demo-orchestration coordinator.
//!
//! Wires `demo-core`'s pure session model, `demo-storage`'s durable
//! document/log, and `demo-adapters`' process/SQL/proxy drivers behind a
//! two-level lock hierarchy ([`app_state`]) and an HTTP surface ([`http`]).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app_state;
pub mod config;
pub mod env;
pub mod http;
pub mod lifecycle;
pub mod maintenance;
pub mod startup;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use app_state::{AppState, GlobalState, LockedSession};
pub use config::Config;
