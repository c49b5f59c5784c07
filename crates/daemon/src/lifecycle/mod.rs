// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State transitions for create-database and run-loadgen, and the
//! background jobs they enqueue.
//!
//! Each public entry point performs the synchronous part of a transition
//! (validate, mutate, persist) while still holding both locks, releases the
//! global lock, and — on success — spawns a background job that re-enters
//! the lock discipline from scratch via [`AppState::begin`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use demo_adapters::AccessEntry;
use demo_core::{
    derive_view_model, Clock, DbName, GuiSecret, Session, Status, UserMessage, ViewModel,
    DEFAULT_MAX_ACTIVE_DATABASES, DEFAULT_SESSION_TTL_SECONDS, LOADGEN_MASTER_BASE_PORT,
    LOADGEN_WEB_BASE_PORT,
};
use serde_json::json;
use tracing::warn;

use crate::app_state::{AppState, GlobalState};

/// Outcome of a synchronous lifecycle transition: every endpoint returns
/// the post-transition view model regardless of whether it succeeded.
pub enum CoordinatorOutcome {
    Started(ViewModel),
    Busy(ViewModel),
}

/// Build the reverse-proxy access/port mapping from the current session
/// map. Must be called with the global lock held.
pub fn build_proxy_entries(global: &GlobalState) -> BTreeMap<String, AccessEntry> {
    global
        .sessions
        .iter()
        .map(|(secret, session)| {
            (
                secret.as_str().to_string(),
                AccessEntry {
                    access: true,
                    loadgen_ui_port: session
                        .loadgen_port_offset
                        .map(|offset| LOADGEN_WEB_BASE_PORT + offset as u16),
                },
            )
        })
        .collect()
}

async fn reinstall_proxy_config<C: Clock>(state: &Arc<AppState<C>>, entries: BTreeMap<String, AccessEntry>) {
    if let Err(e) = state.proxy.install(&entries).await {
        state.logger.error("proxy reload failed", json!({ "cause": e.to_string() }));
        warn!(error = %e, "proxy reload failed");
    }
}

/// `GET /create-database`.
pub async fn create_database<C: Clock>(
    state: &Arc<AppState<C>>,
    secret: &GuiSecret,
) -> CoordinatorOutcome {
    let mut locked = state.begin(secret).await;

    if !locked.session().can_create_database() {
        return CoordinatorOutcome::Busy(derive_view_model(locked.session()));
    }
    if locked.global_mut().active_database_count() >= DEFAULT_MAX_ACTIVE_DATABASES {
        locked.session_mut().user_message = Some(UserMessage::error(
            "Maximum number of databases reached, please try again later.",
        ));
        locked.persist().await;
        let view = derive_view_model(locked.session());
        return CoordinatorOutcome::Busy(view);
    }

    let db = DbName::generate();
    let now = state.clock.now();
    {
        let session = locked.session_mut();
        session.status = Status::CreatingDatabase;
        session.db = Some(db.clone());
        session.expires_at = Some(now + DEFAULT_SESSION_TTL_SECONDS);
    }
    locked.persist().await;
    let view = derive_view_model(locked.session());
    locked.release_global();

    let state = Arc::clone(state);
    let secret = secret.clone();
    tokio::spawn(async move {
        run_create_database_job(state, secret, db).await;
    });

    CoordinatorOutcome::Started(view)
}

async fn run_create_database_job<C: Clock>(state: Arc<AppState<C>>, secret: GuiSecret, db: DbName) {
    let statements = vec![
        format!("CREATE DATABASE {}", db.as_str()),
        "USE benchmark".to_string(),
        format!(
            "CALL generate_table_data('{}', 'bench_tbl', 10, 100000, 1000, 1)",
            db.as_str()
        ),
    ];
    let result = state.sql.run_batch(&statements).await;

    let mut locked = state.begin(&secret).await;
    match result {
        Ok(()) => {
            {
                let session = locked.session_mut();
                session.status = Status::Normal;
                session.user_message = Some(UserMessage::info("Database created"));
            }
            locked.persist().await;
            state
                .logger
                .info("database created", json!({ "session": secret.as_str(), "db": db.as_str() }));
            let entries = build_proxy_entries(locked.global_mut());
            locked.release_global();
            reinstall_proxy_config(&state, entries).await;
        }
        Err(e) => {
            {
                let session = locked.session_mut();
                session.db = None;
                session.status = Status::Normal;
                session.user_message = Some(UserMessage::error("Failed to create database"));
            }
            locked.persist().await;
            state.logger.error(
                "database creation failed",
                json!({ "session": secret.as_str(), "db": db.as_str(), "cause": e.to_string() }),
            );
            locked.release_global();
            drop(locked);

            if let Err(e) = state
                .sql
                .run_batch(&[format!("DROP DATABASE IF EXISTS {}", db.as_str())])
                .await
            {
                state.logger.error(
                    "cleanup drop-database failed",
                    json!({ "db": db.as_str(), "cause": e.to_string() }),
                );
            }
        }
    }
}

/// `GET /run-loadgen`.
#[allow(clippy::expect_used)]
pub async fn run_loadgen<C: Clock>(
    state: &Arc<AppState<C>>,
    secret: &GuiSecret,
) -> CoordinatorOutcome {
    let mut locked = state.begin(secret).await;

    if !locked.session().can_run_loadgen() {
        return CoordinatorOutcome::Busy(derive_view_model(locked.session()));
    }

    let offset = match locked.session().loadgen_port_offset {
        Some(offset) => offset,
        None => {
            let allocated = locked.global_mut().allocate_port_offset();
            locked.session_mut().loadgen_port_offset = Some(allocated);
            locked.persist().await;
            allocated
        }
    };

    locked.session_mut().status = Status::StartingLoadgen;
    locked.persist().await;
    let db = locked
        .session()
        .db
        .clone()
        .expect("can_run_loadgen() implies db is set");
    let view = derive_view_model(locked.session());
    locked.release_global();

    let master_port = LOADGEN_MASTER_BASE_PORT + offset as u16;
    let http_port = LOADGEN_WEB_BASE_PORT + offset as u16;

    let state = Arc::clone(state);
    let secret = secret.clone();
    tokio::spawn(async move {
        run_loadgen_job(state, secret, db, master_port, http_port).await;
    });

    CoordinatorOutcome::Started(view)
}

async fn fail_loadgen<C: Clock>(state: &Arc<AppState<C>>, secret: &GuiSecret, message: &str) {
    let mut locked = state.begin(secret).await;
    {
        let session = locked.session_mut();
        session.loadgen_pids = None;
        session.status = Status::Normal;
        session.user_message = Some(UserMessage::error(message));
    }
    locked.persist().await;
    state
        .logger
        .error("loadgen start failed", json!({ "session": secret.as_str(), "cause": message }));
}

async fn run_loadgen_job<C: Clock>(
    state: Arc<AppState<C>>,
    secret: GuiSecret,
    db: DbName,
    master_port: u16,
    http_port: u16,
) {
    if state
        .sql
        .run_batch(&[format!("USE {}", db.as_str())])
        .await
        .is_err()
    {
        fail_loadgen(&state, &secret, "database not found").await;
        return;
    }

    let stdio_dir = state.config.loadgen_stdio_dir();
    let mut pids = Vec::new();

    let master_args = vec![
        "-f".to_string(),
        state.config.loadgen_script_path().display().to_string(),
        "--host".to_string(),
        state.config.rdrs_uri.clone(),
        "--batch-size=100".to_string(),
        "--table-size=100000".to_string(),
        format!("--database-name={}", db.as_str()),
        format!("--master-bind-port={master_port}"),
        format!("--web-port={http_port}"),
        "--master".to_string(),
    ];
    let master_pid = match state.supervisor.spawn_detached(
        &state.config.loadgen_binary,
        &master_args,
        None,
        &[],
        &stdio_dir.join(format!("{}-master.out", secret.as_str())),
        &stdio_dir.join(format!("{}-master.err", secret.as_str())),
    ) {
        Ok(pid) => pid,
        Err(e) => {
            warn!(error = %e, "failed to spawn loadgen master");
            fail_loadgen(&state, &secret, "failed to start load generator").await;
            return;
        }
    };
    pids.push(master_pid);

    tokio::time::sleep(Duration::from_secs(1)).await;

    for i in 0..state.config.loadgen_worker_count {
        let worker_args = vec![
            "-f".to_string(),
            state.config.loadgen_script_path().display().to_string(),
            "--worker".to_string(),
            format!("--master-port={master_port}"),
        ];
        match state.supervisor.spawn_detached(
            &state.config.loadgen_binary,
            &worker_args,
            None,
            &[],
            &stdio_dir.join(format!("{}-worker-{i}.out", secret.as_str())),
            &stdio_dir.join(format!("{}-worker-{i}.err", secret.as_str())),
        ) {
            Ok(pid) => pids.push(pid),
            Err(e) => {
                warn!(error = %e, "failed to spawn loadgen worker, tearing down started pids");
                state.supervisor.terminate_group(&pids).await;
                fail_loadgen(&state, &secret, "failed to start load generator").await;
                return;
            }
        }
    }

    let mut locked = state.begin(&secret).await;
    {
        let session = locked.session_mut();
        session.status = Status::Normal;
        session.loadgen_pids = Some(pids);
        session.user_message = Some(UserMessage::info("Load generator running"));
    }
    locked.persist().await;
    state
        .logger
        .info("loadgen started", json!({ "session": secret.as_str() }));
    let entries = build_proxy_entries(locked.global_mut());
    locked.release_global();
    reinstall_proxy_config(&state, entries).await;
}

/// An in-memory-only snapshot of a session evicted by the maintenance loop,
/// carrying what teardown needs (db name, pids) after the session has
/// already been removed from the durable map.
#[derive(Debug, Clone)]
pub struct EvictedSession {
    pub secret: GuiSecret,
    pub db: Option<DbName>,
    pub loadgen_pids: Option<Vec<u32>>,
}

impl From<(GuiSecret, Session)> for EvictedSession {
    fn from((secret, session): (GuiSecret, Session)) -> Self {
        Self {
            secret,
            db: session.db,
            loadgen_pids: session.loadgen_pids,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
