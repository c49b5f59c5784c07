// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, assembled once at startup from the environment.

use crate::env::{self, EnvError, HostPort};
use std::path::PathBuf;

/// Number of load-gen worker processes started per session, unless
/// overridden.
pub const DEFAULT_LOADGEN_WORKER_COUNT: u32 = 2;

/// Binary invoked for both the load-gen master and its workers; the CLI
/// flags `run_loadgen` builds (`-f`, `--master`, `--worker`, `--master-port`,
/// `--web-port`) are this tool's.
pub const DEFAULT_LOADGEN_BINARY: &str = "locust";

#[derive(Debug, Clone)]
pub struct Config {
    pub node_user: String,
    pub run_dir: PathBuf,
    pub durable_dir: PathBuf,
    pub config_files_dir: PathBuf,
    pub mysqld: HostPort,
    pub demo_mysql_password: String,
    pub grafana: HostPort,
    pub cluster_secret: String,
    pub rdrs_major_version: String,
    pub rdrs_uri: String,
    pub nginx_error_log: PathBuf,
    pub loadgen_worker_count: u32,
    pub loadgen_binary: String,
    pub http_addr: std::net::SocketAddr,
}

impl Config {
    pub fn load() -> Result<Self, EnvError> {
        let loadgen_worker_count = std::env::var("LOADGEN_WORKER_COUNT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_LOADGEN_WORKER_COUNT);

        let http_addr = std::env::var("DEMO_HTTP_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| std::net::SocketAddr::from(([0, 0, 0, 0], 8080)));

        let loadgen_binary =
            std::env::var("LOADGEN_BINARY").unwrap_or_else(|_| DEFAULT_LOADGEN_BINARY.to_string());

        Ok(Self {
            node_user: env::node_user()?,
            run_dir: env::run_dir()?,
            durable_dir: env::durable_dir()?,
            config_files_dir: env::config_files_dir()?,
            mysqld: env::mysqld_pri_1()?,
            demo_mysql_password: env::demo_mysql_pw()?,
            grafana: env::grafana_pri_1()?,
            cluster_secret: env::gui_secret()?,
            rdrs_major_version: env::rdrs_major_version()?,
            rdrs_uri: env::rdrs_uri()?,
            nginx_error_log: env::nginx_error_log()?,
            loadgen_worker_count,
            loadgen_binary,
            http_addr,
        })
    }

    pub fn state_path(&self) -> PathBuf {
        self.durable_dir.join("demo_state.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.durable_dir.join("demo.log")
    }

    pub fn proxy_fragment_path(&self) -> PathBuf {
        self.config_files_dir.join("nginx-dynamic.conf")
    }

    pub fn nginx_main_config_path(&self) -> PathBuf {
        self.config_files_dir.join("nginx.conf")
    }

    pub fn loadgen_stdio_dir(&self) -> PathBuf {
        self.run_dir.join("loadgen")
    }

    /// Path to the load-gen script invoked for this RDRS major version.
    pub fn loadgen_script_path(&self) -> PathBuf {
        self.run_dir
            .join(format!("loadgen_scripts/{}", self.rdrs_major_version))
            .join("loadgen_batch_read.py")
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Config {
    /// A config pointing everything at `dir`, for tests.
    pub fn for_test(dir: &std::path::Path) -> Self {
        Self {
            node_user: "demo".into(),
            run_dir: dir.join("run"),
            durable_dir: dir.join("durable"),
            config_files_dir: dir.join("config"),
            mysqld: env::HostPort { host: "127.0.0.1".into(), port: 1 },
            demo_mysql_password: "test".into(),
            grafana: env::HostPort { host: "127.0.0.1".into(), port: 3000 },
            cluster_secret: "clustersecret00000000000000000000".into(),
            rdrs_major_version: "24".into(),
            rdrs_uri: "https://rdrs.test".into(),
            nginx_error_log: dir.join("nginx-dynamic-err.log"),
            loadgen_worker_count: DEFAULT_LOADGEN_WORKER_COUNT,
            loadgen_binary: DEFAULT_LOADGEN_BINARY.to_string(),
            http_addr: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
