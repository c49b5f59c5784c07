// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup reconciliation: resolve any session left mid-transition by a
//! prior process exit back to NORMAL before serving traffic.

use std::sync::Arc;

use demo_core::{Clock, DbName, Status};
use serde_json::json;

use crate::app_state::AppState;

/// Scan persisted sessions for `CREATING_DATABASE`/`STARTING_LOADGEN` and
/// resolve each back to `NORMAL`, undoing whatever partial work it left
/// behind (drop an orphaned database, kill orphaned pids).
pub async fn reconcile<C: Clock>(state: &Arc<AppState<C>>) {
    let (to_drop, to_terminate): (Vec<DbName>, Vec<u32>) = {
        let global = state.global.lock().await;
        let mut to_drop = Vec::new();
        let mut to_terminate = Vec::new();
        for session in global.sessions.values() {
            match session.status {
                Status::CreatingDatabase => {
                    if let Some(db) = &session.db {
                        to_drop.push(db.clone());
                    }
                }
                Status::StartingLoadgen => {
                    if let Some(pids) = &session.loadgen_pids {
                        to_terminate.extend(pids.iter().copied());
                    }
                }
                Status::Normal => {}
            }
        }
        (to_drop, to_terminate)
    };

    for db in &to_drop {
        if let Err(e) = state
            .sql
            .run_batch(&[format!("DROP DATABASE IF EXISTS {}", db.as_str())])
            .await
        {
            state.logger.error(
                "startup reconciliation: drop database failed",
                json!({ "db": db.as_str(), "cause": e.to_string() }),
            );
        }
    }
    if !to_terminate.is_empty() {
        state.supervisor.terminate_group(&to_terminate).await;
    }

    let mut global = state.global.lock().await;
    let mut changed = false;
    for session in global.sessions.values_mut() {
        match session.status {
            Status::CreatingDatabase => {
                session.db = None;
                session.status = Status::Normal;
                changed = true;
            }
            Status::StartingLoadgen => {
                session.loadgen_pids = None;
                session.status = Status::Normal;
                changed = true;
            }
            Status::Normal => {}
        }
    }
    if changed {
        let doc = global.to_document();
        drop(global);
        state.write_document(doc).await;
        state.logger.info("startup reconciliation resolved orphaned sessions", json!({}));
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
