// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn unreachable_config() -> SqlConfig {
    SqlConfig {
        host: "127.0.0.1".into(),
        // Port 1 is reserved and nothing binds to it; connect fails fast.
        port: 1,
        user: "demo".into(),
        password: "demo".into(),
    }
}

#[tokio::test]
async fn connect_failure_surfaces_as_sql_error_connect() {
    let executor = SqlExecutor::new(unreachable_config());
    let err = executor
        .run_batch(&["SELECT 1".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlError::Connect(_)));
}

#[tokio::test]
async fn empty_batch_against_unreachable_backend_still_tries_to_connect() {
    let executor = SqlExecutor::new(unreachable_config());
    let err = executor.run_batch(&[]).await.unwrap_err();
    assert!(matches!(err, SqlError::Connect(_)));
}

// Requires a live MySQL instance reachable with DEMO_SQL_TEST_* env vars;
// not run by default.
#[tokio::test]
#[ignore]
async fn statement_failure_carries_its_index() {
    let host = std::env::var("DEMO_SQL_TEST_HOST").unwrap();
    let port: u16 = std::env::var("DEMO_SQL_TEST_PORT").unwrap().parse().unwrap();
    let user = std::env::var("DEMO_SQL_TEST_USER").unwrap();
    let password = std::env::var("DEMO_SQL_TEST_PASSWORD").unwrap();

    let executor = SqlExecutor::new(SqlConfig { host, port, user, password });
    let statements = vec![
        "CREATE DATABASE demo_sql_test_batch".to_string(),
        "USE demo_sql_test_batch".to_string(),
        "THIS IS NOT VALID SQL".to_string(),
    ];
    let err = executor.run_batch(&statements).await.unwrap_err();
    match err {
        SqlError::Statement { index, .. } => assert_eq!(index, 2),
        other => panic!("expected SqlError::Statement, got {other:?}"),
    }
}
