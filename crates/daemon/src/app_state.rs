// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared coordinator state and its two-level lock hierarchy.
//!
//! The *global* lock protects the session map, `next_loadgen_port_offset`,
//! and any multi-session read (admission counting, port allocation, proxy
//! config rendering). The *per-session* lock protects one session's fields.
//! Acquisition order is strictly global before session; [`AppState::begin`]
//! is the only place that takes both, and it hands the caller a guard that
//! can drop the global half early while keeping the session half.
//!
//! Once the global half is released, never re-acquire it while still
//! holding a session lock: a concurrent `begin()` for the same secret
//! already holds global and is waiting on that very session lock, and
//! re-acquiring global here would deadlock against it. [`LockedSession`]'s
//! API is shaped to make that impossible — persist while global is held,
//! release it, then let the guard drop.

use demo_adapters::{ProcessSupervisor, ProxyConfigWriter, SqlExecutor};
use demo_core::{Clock, GuiSecret, PersistedDocument, Session, PORT_OFFSET_SPACE};
use demo_storage::{EventLogger, PersistenceStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::Config;

/// Everything guarded by the global lock.
#[derive(Debug, Default)]
pub struct GlobalState {
    pub sessions: HashMap<GuiSecret, Session>,
    pub next_loadgen_port_offset: u32,
}

impl GlobalState {
    pub fn from_document(doc: PersistedDocument) -> Self {
        Self {
            sessions: doc.user_sessions,
            next_loadgen_port_offset: doc.next_loadgen_port_offset,
        }
    }

    pub fn to_document(&self) -> PersistedDocument {
        PersistedDocument {
            next_loadgen_port_offset: self.next_loadgen_port_offset,
            user_sessions: self.sessions.clone(),
        }
    }

    /// Count of sessions currently occupying a database admission slot.
    pub fn active_database_count(&self) -> u32 {
        self.sessions
            .values()
            .filter(|s| s.occupies_database_slot())
            .count() as u32
    }

    /// Allocate the next free port offset, advance the hint, and return it.
    /// Must run under the global lock so concurrent allocations never
    /// collide.
    pub fn allocate_port_offset(&mut self) -> u32 {
        let taken: std::collections::HashSet<u32> = self
            .sessions
            .values()
            .filter_map(|s| s.loadgen_port_offset)
            .collect();

        let mut candidate = self.next_loadgen_port_offset % PORT_OFFSET_SPACE;
        while taken.contains(&candidate) {
            candidate = (candidate + 1) % PORT_OFFSET_SPACE;
        }
        self.next_loadgen_port_offset = (candidate + 1) % PORT_OFFSET_SPACE;
        candidate
    }
}

/// Shared coordinator state: durable sessions plus handles to every external
/// system a background job can touch.
pub struct AppState<C: Clock> {
    pub global: Mutex<GlobalState>,
    session_locks: Mutex<HashMap<GuiSecret, Arc<Mutex<()>>>>,
    pub store: PersistenceStore,
    pub logger: EventLogger,
    pub supervisor: ProcessSupervisor,
    pub sql: SqlExecutor,
    pub proxy: ProxyConfigWriter,
    pub clock: C,
    pub config: Config,
}

impl<C: Clock> AppState<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        initial: GlobalState,
        store: PersistenceStore,
        logger: EventLogger,
        supervisor: ProcessSupervisor,
        sql: SqlExecutor,
        proxy: ProxyConfigWriter,
        clock: C,
        config: Config,
    ) -> Self {
        Self {
            global: Mutex::new(initial),
            session_locks: Mutex::new(HashMap::new()),
            store,
            logger,
            supervisor,
            sql,
            proxy,
            clock,
            config,
        }
    }

    /// Get-or-create the per-session lock handle for `secret`.
    pub async fn session_lock(&self, secret: &GuiSecret) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks
            .entry(secret.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the global lock, ensure `secret` has a session, then acquire
    /// that session's lock — in that order, per the lock hierarchy. Returns
    /// a [`LockedSession`] the caller can use to read/mutate, and that can
    /// drop the global half early via [`LockedSession::release_global`].
    pub async fn begin(self: &Arc<Self>, secret: &GuiSecret) -> LockedSession<C> {
        let mut global = self.global.lock().await;
        if !global.sessions.contains_key(secret) {
            global.sessions.insert(secret.clone(), Session::fresh());
            let doc = global.to_document();
            // Held across this await: fine for tokio::sync::Mutex, and it
            // keeps the insert-then-persist pair atomic with respect to any
            // other begin() for the same secret.
            self.write_document(doc).await;
        }

        let session_lock = self.session_lock(secret).await;
        let session_guard = session_lock.lock_owned().await;

        LockedSession {
            state: Arc::clone(self),
            secret: secret.clone(),
            global: Some(global),
            _session_guard: session_guard,
        }
    }

    /// Write `doc` to the durable store on a blocking thread.
    pub async fn write_document(&self, doc: PersistedDocument) {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || store.update(move |_| doc.clone())).await;
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "failed to persist durable state"),
            Err(e) => tracing::error!(error = %e, "persistence task panicked"),
        }
    }
}

/// Holds the session lock (always) and optionally the global lock, acquired
/// via [`AppState::begin`]. Dropping this releases whichever locks remain.
pub struct LockedSession<C: Clock> {
    state: Arc<AppState<C>>,
    secret: GuiSecret,
    global: Option<OwnedMutexGuard<GlobalState>>,
    _session_guard: OwnedMutexGuard<()>,
}

impl<C: Clock> LockedSession<C> {
    pub fn secret(&self) -> &GuiSecret {
        &self.secret
    }

    /// Read this session through the still-held global lock.
    #[allow(clippy::expect_used)]
    pub fn session(&self) -> &Session {
        self.global
            .as_ref()
            .expect("session() called after release_global()")
            .sessions
            .get(&self.secret)
            .expect("begin() always inserts the session before constructing LockedSession")
    }

    #[allow(clippy::expect_used)]
    pub fn session_mut(&mut self) -> &mut Session {
        self.global
            .as_mut()
            .expect("session_mut() called after release_global()")
            .sessions
            .get_mut(&self.secret)
            .expect("begin() always inserts the session before constructing LockedSession")
    }

    /// Borrow the whole global state (for admission counting, port
    /// allocation) through the still-held lock.
    #[allow(clippy::expect_used)]
    pub fn global_mut(&mut self) -> &mut GlobalState {
        self.global
            .as_mut()
            .expect("global_mut() called after release_global()")
    }

    /// Write the current in-memory document to durable storage. Must be
    /// called while the global lock is still held — persist before you
    /// release, never after.
    #[allow(clippy::expect_used)]
    pub async fn persist(&self) {
        let doc = self
            .global
            .as_ref()
            .expect("persist() called after release_global()")
            .to_document();
        self.state.write_document(doc).await;
    }

    /// Drop the global lock while keeping the session lock, so the handler
    /// can keep mutating this session without blocking unrelated requests.
    /// Idempotent: a second call is a no-op. Always persist before calling
    /// this, never after.
    pub fn release_global(&mut self) {
        self.global.take();
    }

    pub fn app(&self) -> &Arc<AppState<C>> {
        &self.state
    }
}

#[cfg(test)]
#[path = "app_state_tests.rs"]
mod tests;
