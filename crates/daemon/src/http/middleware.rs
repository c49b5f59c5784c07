// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves or mints the visitor's `GuiSecret` from the `X-AUTH` cookie.
//!
//! Locking and persistence for a freshly minted secret happen later, inside
//! whichever handler calls [`crate::app_state::AppState::begin`] — this
//! layer only decides which secret the request belongs to and, for a new
//! one, arranges for the cookie to be set on the way out.

use axum::extract::Request;
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use demo_core::GuiSecret;

pub const AUTH_COOKIE_NAME: &str = "X-AUTH";

pub async fn auth_cookie(mut req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let (secret, must_set_cookie) = match jar
        .get(AUTH_COOKIE_NAME)
        .and_then(|cookie| GuiSecret::parse(cookie.value()))
    {
        Some(secret) => (secret, false),
        None => (GuiSecret::generate(), true),
    };

    req.extensions_mut().insert(secret.clone());
    let mut response = next.run(req).await;

    if must_set_cookie {
        if let Ok(value) = HeaderValue::from_str(&set_cookie_header(&secret)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

pub fn set_cookie_header(secret: &GuiSecret) -> String {
    format!("{AUTH_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax", secret.as_str())
}

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;
