// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use demo_core::{derive_view_model, Clock, GuiSecret};

use crate::app_state::AppState;
use crate::http::middleware::set_cookie_header;
use crate::lifecycle::{self, CoordinatorOutcome};

const INDEX_HTML: &str = include_str!("index.html");

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /try?key=...`: log in as an explicit secret (e.g. the cluster
/// operator's) and redirect to `/`. Bypasses the usual cookie-or-mint
/// resolution since the caller is asserting an identity, not discovering one.
pub async fn try_key(Query(params): Query<HashMap<String, String>>) -> Response {
    let Some(secret) = params.get("key").and_then(|raw| GuiSecret::parse(raw)) else {
        return (StatusCode::BAD_REQUEST, "invalid key").into_response();
    };

    let mut response = Redirect::to("/").into_response();
    *response.status_mut() = StatusCode::SEE_OTHER;
    if let Ok(value) = HeaderValue::from_str(&set_cookie_header(&secret)) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

pub async fn viewmodel<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Extension(secret): Extension<GuiSecret>,
) -> Response {
    let locked = state.begin(&secret).await;
    Json(derive_view_model(locked.session())).into_response()
}

pub async fn create_database<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Extension(secret): Extension<GuiSecret>,
) -> Response {
    match lifecycle::create_database(&state, &secret).await {
        CoordinatorOutcome::Started(view) => Json(view).into_response(),
        CoordinatorOutcome::Busy(view) => (StatusCode::CONFLICT, Json(view)).into_response(),
    }
}

pub async fn run_loadgen<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Extension(secret): Extension<GuiSecret>,
) -> Response {
    match lifecycle::run_loadgen(&state, &secret).await {
        CoordinatorOutcome::Started(view) => Json(view).into_response(),
        CoordinatorOutcome::Busy(view) => (StatusCode::CONFLICT, Json(view)).into_response(),
    }
}
