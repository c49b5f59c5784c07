// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures for building an [`AppState`] against a scratch
//! directory, without touching the environment or a real MySQL/proxy.

use crate::app_state::{AppState, GlobalState};
use crate::config::Config;
use demo_adapters::{ClusterSecret, ProcessSupervisor, ProxyConfigWriter, SqlConfig, SqlExecutor};
use demo_core::{FakeClock, PersistedDocument};
use demo_storage::{EventLogger, PersistenceStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Build a fully wired [`AppState`] rooted at `dir`, with a fast
/// [`ProcessSupervisor`] retry interval and a [`FakeClock`] so TTL logic is
/// deterministic.
pub fn test_app_state(dir: &Path) -> Arc<AppState<FakeClock>> {
    let config = Config::for_test(dir);
    std::fs::create_dir_all(&config.durable_dir).unwrap();
    std::fs::create_dir_all(&config.config_files_dir).unwrap();

    let store = PersistenceStore::new(config.state_path());
    let logger = EventLogger::spawn(config.log_path());
    let supervisor = ProcessSupervisor::new().with_interval(Duration::from_millis(5));
    let sql = SqlExecutor::new(SqlConfig {
        host: config.mysqld.host.clone(),
        port: config.mysqld.port,
        user: "demo".into(),
        password: config.demo_mysql_password.clone(),
    });
    let proxy = ProxyConfigWriter::new(
        config.proxy_fragment_path(),
        "true",
        ["--reload"],
        config.nginx_main_config_path(),
        config.nginx_error_log.clone(),
        ClusterSecret {
            secret: config.cluster_secret.clone(),
            port: config.grafana.port,
        },
    );

    Arc::new(AppState::new(
        GlobalState::from_document(PersistedDocument::default()),
        store,
        logger,
        supervisor,
        sql,
        proxy,
        FakeClock::new(1_000_000.0),
        config,
    ))
}
