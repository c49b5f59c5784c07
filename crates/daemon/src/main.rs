// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! demo-daemond
//!
//! Background process that coordinates per-visitor demo sessions: database
//! creation, load-generator processes, reverse-proxy routing, and TTL
//! expiry, behind an HTTP surface the browser UI polls.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use demo_adapters::{ClusterSecret, ProcessSupervisor, ProxyConfigWriter, SqlConfig, SqlExecutor};
use demo_core::{PersistedDocument, SystemClock};
use demo_daemon::app_state::{AppState, GlobalState};
use demo_daemon::{config::Config, http, maintenance, startup};
use demo_storage::{EventLogger, PersistenceStore};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let _log_guard = setup_logging(&config)?;

    info!("starting demo-daemond");

    std::fs::create_dir_all(&config.durable_dir)?;
    std::fs::create_dir_all(&config.config_files_dir)?;
    std::fs::create_dir_all(config.loadgen_stdio_dir())?;

    let store = PersistenceStore::new(config.state_path());
    let doc = store.load().unwrap_or_else(|e| {
        error!(error = %e, "failed to load durable state, starting from an empty document");
        PersistedDocument::default()
    });

    let logger = EventLogger::spawn(config.log_path());
    let supervisor = ProcessSupervisor::new();
    let sql = SqlExecutor::new(SqlConfig {
        host: config.mysqld.host.clone(),
        port: config.mysqld.port,
        user: "demo".to_string(),
        password: config.demo_mysql_password.clone(),
    });
    let proxy = ProxyConfigWriter::new(
        config.proxy_fragment_path(),
        "nginx",
        ["-s", "reload"],
        config.nginx_main_config_path(),
        config.nginx_error_log.clone(),
        ClusterSecret {
            secret: config.cluster_secret.clone(),
            port: config.grafana.port,
        },
    );

    let state = Arc::new(AppState::new(
        GlobalState::from_document(doc),
        store,
        logger,
        supervisor,
        sql,
        proxy,
        SystemClock,
        config.clone(),
    ));

    info!("running startup reconciliation");
    startup::reconcile(&state).await;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(maintenance::run(Arc::clone(&state), shutdown_rx));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let app = http::router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM"),
                _ = sigint.recv() => info!("received SIGINT"),
            }
        })
        .await?;

    let _ = shutdown_tx.send(true);
    info!("demo-daemond shut down");
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        log_path.parent().ok_or("durable dir has no parent")?,
        log_path.file_name().ok_or("log path has no file name")?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
