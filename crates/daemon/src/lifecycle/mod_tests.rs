// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::test_app_state;
use demo_core::{DbName, GuiSecret, Status};

#[tokio::test]
async fn create_database_rejects_a_session_already_mid_creation() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(dir.path());
    let secret = GuiSecret::generate();

    {
        let mut locked = state.begin(&secret).await;
        locked.session_mut().status = Status::CreatingDatabase;
        locked.persist().await;
    }

    match create_database(&state, &secret).await {
        CoordinatorOutcome::Busy(view) => assert!(!view.can_create_database),
        CoordinatorOutcome::Started(_) => panic!("expected Busy"),
    }
}

#[tokio::test]
async fn create_database_rejects_when_admission_is_full() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(dir.path());

    {
        let mut global = state.global.lock().await;
        for _ in 0..demo_core::DEFAULT_MAX_ACTIVE_DATABASES {
            let mut s = demo_core::Session::fresh();
            s.db = Some(DbName::generate());
            global.sessions.insert(GuiSecret::generate(), s);
        }
    }

    let secret = GuiSecret::generate();
    match create_database(&state, &secret).await {
        CoordinatorOutcome::Busy(_) => {}
        CoordinatorOutcome::Started(_) => panic!("expected Busy under full admission"),
    }
}

#[tokio::test]
async fn create_database_transitions_to_creating_and_persists_before_returning() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(dir.path());
    let secret = GuiSecret::generate();

    let outcome = create_database(&state, &secret).await;
    let view = match outcome {
        CoordinatorOutcome::Started(view) => view,
        CoordinatorOutcome::Busy(_) => panic!("expected Started"),
    };
    assert!(!view.can_create_database);

    let doc = state.store.load().unwrap();
    let session = doc.user_sessions.get(&secret).unwrap();
    assert_eq!(session.status, Status::CreatingDatabase);
    assert!(session.db.is_some());
}

#[tokio::test]
async fn run_loadgen_rejects_without_a_database() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(dir.path());
    let secret = GuiSecret::generate();

    match run_loadgen(&state, &secret).await {
        CoordinatorOutcome::Busy(view) => assert!(!view.can_run_loadgen),
        CoordinatorOutcome::Started(_) => panic!("expected Busy without a database"),
    }
}

#[tokio::test]
async fn run_loadgen_allocates_a_port_offset_and_persists_it() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(dir.path());
    let secret = GuiSecret::generate();

    {
        let mut locked = state.begin(&secret).await;
        locked.session_mut().db = Some(DbName::generate());
        locked.persist().await;
    }

    let _ = run_loadgen(&state, &secret).await;

    let doc = state.store.load().unwrap();
    let session = doc.user_sessions.get(&secret).unwrap();
    assert!(session.loadgen_port_offset.is_some());
    assert_eq!(session.status, Status::StartingLoadgen);
}

#[test]
fn build_proxy_entries_maps_each_session_to_its_loadgen_port() {
    let mut global = GlobalState::default();
    let secret = GuiSecret::generate();
    let mut session = demo_core::Session::fresh();
    session.loadgen_port_offset = Some(3);
    global.sessions.insert(secret.clone(), session);

    let entries = build_proxy_entries(&global);
    let entry = entries.get(secret.as_str()).unwrap();
    assert!(entry.access);
    assert_eq!(entry.loadgen_ui_port, Some(demo_core::LOADGEN_WEB_BASE_PORT + 3));
}
