// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::Body;
use axum::http::Request;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Extension, Router};

async fn echo_secret(Extension(secret): Extension<GuiSecret>) -> String {
    secret.as_str().to_string()
}

fn app() -> Router {
    Router::new()
        .route("/", get(echo_secret))
        .layer(from_fn(auth_cookie))
}

#[tokio::test]
async fn mints_a_fresh_secret_and_sets_the_cookie_when_none_is_present() {
    use tower::ServiceExt;

    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("a fresh visitor must get a Set-Cookie header");
    assert!(set_cookie.to_str().unwrap().starts_with("X-AUTH="));
}

#[tokio::test]
async fn reuses_a_valid_cookie_without_setting_a_new_one() {
    use tower::ServiceExt;

    let secret = GuiSecret::generate();
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, format!("X-AUTH={}", secret.as_str()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body, secret.as_str().as_bytes());
}

#[tokio::test]
async fn an_invalid_cookie_value_is_treated_as_absent() {
    use tower::ServiceExt;

    let response = app()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, "X-AUTH=not-hex")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().get(header::SET_COOKIE).is_some());
}
