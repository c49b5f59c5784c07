// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: cookie-based visitor identification plus the session
//! endpoints.

mod handlers;
mod middleware;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use demo_core::Clock;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub use middleware::AUTH_COOKIE_NAME;

/// Build the router. Every route passes through [`middleware::auth_cookie`],
/// which resolves or mints the visitor's secret and, for a new one, attaches
/// the `Set-Cookie` header to the response.
pub fn router<C: Clock + Send + Sync + 'static>(state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route("/favicon.png", get(handlers::favicon))
        .route("/", get(handlers::index))
        .route("/try", get(handlers::try_key))
        .route("/viewmodel", get(handlers::viewmodel::<C>))
        .route("/create-database", get(handlers::create_database::<C>))
        .route("/run-loadgen", get(handlers::run_loadgen::<C>))
        .layer(axum::middleware::from_fn(middleware::auth_cookie))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
