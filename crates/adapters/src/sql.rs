// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sequential DDL/CALL execution against the shared MySQL backend.
//!
//! Each call opens a fresh connection, runs every statement in order inside
//! one transaction, and commits at the end. No statement templating is
//! offered: callers pass pre-formatted SQL, the executor does not sanitize.
//! Runs on a worker thread via `spawn_blocking`-free async I/O (sqlx's own
//! async driver), but callers should still treat it as blocking work with
//! respect to the request scheduler, since a slow backend ties up whichever
//! task awaits it.

use sqlx::mysql::MySqlConnectOptions;
use sqlx::{Connection, Executor, MySqlConnection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("failed to connect to sql backend: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("statement {index} failed: {source}")]
    Statement {
        index: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] sqlx::Error),
}

/// Connection parameters for the shared SQL backend.
#[derive(Debug, Clone)]
pub struct SqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl SqlConfig {
    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
    }
}

/// Executes statement batches against the shared SQL backend.
#[derive(Debug, Clone)]
pub struct SqlExecutor {
    config: SqlConfig,
}

impl SqlExecutor {
    pub fn new(config: SqlConfig) -> Self {
        Self { config }
    }

    /// Runs every statement in `statements` sequentially on one fresh
    /// connection inside a single transaction, committing at the end. On
    /// failure, the transaction is dropped (rolling back) and the error
    /// names the zero-based index of the statement that failed.
    pub async fn run_batch(&self, statements: &[String]) -> Result<(), SqlError> {
        let mut conn = MySqlConnection::connect_with(&self.config.connect_options())
            .await
            .map_err(SqlError::Connect)?;

        let mut tx = conn.begin().await.map_err(SqlError::Connect)?;
        for (index, statement) in statements.iter().enumerate() {
            tx.execute(statement.as_str())
                .await
                .map_err(|source| SqlError::Statement { index, source })?;
        }
        tx.commit().await.map_err(SqlError::Commit)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sql_tests.rs"]
mod tests;
