// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TTL expiry: periodically evicts expired NORMAL sessions, revokes their
//! proxy access, then tears down their database and load-gen processes.
//!
//! Eviction removes the session from the durable map under the global lock
//! in one step (rather than renaming the key to a `_removing_` placeholder
//! first) since [`demo_core::GuiSecret`] only accepts the fixed 20-hex shape
//! used on the wire. The externally observable effect is the same: the
//! secret disappears from the proxy mapping before teardown starts.

use std::sync::Arc;
use std::time::Duration;

use demo_core::Clock;
use serde_json::json;

use crate::app_state::AppState;
use crate::lifecycle::{build_proxy_entries, EvictedSession};

const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Run one sweep: evict everything expired, reinstall the proxy config if
/// anything was evicted, then tear down each evicted session's resources.
pub async fn run_once<C: Clock>(state: &Arc<AppState<C>>) {
    let now = state.clock.now();

    let evicted: Vec<EvictedSession> = {
        let mut global = state.global.lock().await;
        let expired: Vec<_> = global
            .sessions
            .iter()
            .filter(|(_, session)| session.is_expired(now))
            .map(|(secret, _)| secret.clone())
            .collect();

        if expired.is_empty() {
            return;
        }

        let evicted: Vec<EvictedSession> = expired
            .into_iter()
            .filter_map(|secret| global.sessions.remove(&secret).map(|s| (secret, s).into()))
            .collect();

        let doc = global.to_document();
        drop(global);
        state.write_document(doc).await;
        evicted
    };

    {
        let global = state.global.lock().await;
        let entries = build_proxy_entries(&global);
        drop(global);
        if let Err(e) = state.proxy.install(&entries).await {
            state
                .logger
                .error("proxy reload failed during maintenance sweep", json!({ "cause": e.to_string() }));
        }
    }

    for session in evicted {
        if let Some(db) = &session.db {
            if let Err(e) = state
                .sql
                .run_batch(&[format!("DROP DATABASE IF EXISTS {}", db.as_str())])
                .await
            {
                state.logger.error(
                    "expiry teardown: drop database failed",
                    json!({ "session": session.secret.as_str(), "db": db.as_str(), "cause": e.to_string() }),
                );
            }
        }
        if let Some(pids) = &session.loadgen_pids {
            state.supervisor.terminate_group(pids).await;
        }
        state
            .logger
            .info("session expired and torn down", json!({ "session": session.secret.as_str() }));
    }
}

/// Runs [`run_once`] on a fixed cadence until `shutdown` fires.
pub async fn run<C: Clock>(state: Arc<AppState<C>>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(SWEEP_INTERVAL) => {
                run_once(&state).await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
