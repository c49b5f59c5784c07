// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure projection of a [`Session`] into the record the browser UI polls.

use crate::session::{Session, Status, UserMessage};
use serde::Serialize;

/// Which part of the UI should draw the user's attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    None,
    Db,
    Loadgen,
    Latency,
}

/// Display-ready projection of a session, returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub can_create_database: bool,
    pub can_run_loadgen: bool,
    pub can_open_observability: bool,
    pub can_open_loadgen_ui: bool,
    pub db_status_text: &'static str,
    pub locust_status_text: &'static str,
    pub suggestion: &'static str,
    pub highlight: Highlight,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<UserMessage>,
}

/// Derive the view model from a session. Pure: no I/O, no locks.
pub fn derive(session: &Session) -> ViewModel {
    let db_status_text = match (session.status, session.db.is_some()) {
        (_, false) => "Not created",
        (Status::CreatingDatabase, true) => "Creating",
        (_, true) => "Created",
    };

    let locust_status_text = match (session.loadgen_pids.is_some(), session.status) {
        (false, Status::StartingLoadgen) => "Starting",
        (false, _) => "Not started",
        (true, _) => "Running",
    };

    let can_open_observability = db_status_text == "Created";

    let (suggestion, highlight) = if session.can_create_database() {
        ("Click on 'Create Database'", Highlight::Db)
    } else if session.status == Status::CreatingDatabase {
        ("Creating database...", Highlight::Db)
    } else if session.can_run_loadgen() {
        ("Click on 'Run Loadgen'", Highlight::Loadgen)
    } else if session.status == Status::StartingLoadgen {
        ("Starting load generator...", Highlight::Loadgen)
    } else if session.can_open_loadgen_ui() {
        ("Open the load generator UI to watch latency", Highlight::Latency)
    } else {
        ("", Highlight::None)
    };

    ViewModel {
        can_create_database: session.can_create_database(),
        can_run_loadgen: session.can_run_loadgen(),
        can_open_observability,
        can_open_loadgen_ui: session.can_open_loadgen_ui(),
        db_status_text,
        locust_status_text,
        suggestion,
        highlight,
        user_message: session.user_message.clone(),
    }
}

#[cfg(test)]
#[path = "view_model_tests.rs"]
mod tests;
