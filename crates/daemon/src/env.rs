// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

fn required(name: &'static str) -> Result<String, EnvError> {
    std::env::var(name).map_err(|_| EnvError::Missing(name))
}

/// `host:port` pair parsed out of an environment variable like
/// `MYSQLD_PRI_1` or `GRAFANA_PRI_1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

fn parse_host_port(name: &'static str, raw: &str) -> Result<HostPort, EnvError> {
    let (host, port) = raw.rsplit_once(':').ok_or_else(|| EnvError::Invalid {
        name,
        value: raw.to_string(),
        reason: "expected host:port".into(),
    })?;
    let port = port.parse::<u16>().map_err(|e| EnvError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(HostPort {
        host: host.to_string(),
        port,
    })
}

/// The unprivileged OS user the coordinator and its children should run as.
pub fn node_user() -> Result<String, EnvError> {
    required("NODE_USER")
}

/// Scratch/runtime directory: sockets, pid files, load-gen stdio.
pub fn run_dir() -> Result<PathBuf, EnvError> {
    required("RUN_DIR").map(PathBuf::from)
}

/// Durable directory: `demo_state.json` and `demo.log` live here.
pub fn durable_dir() -> Result<PathBuf, EnvError> {
    required("DURABLE_DIR").map(PathBuf::from)
}

/// Directory holding `nginx.conf` (the proxy's main config) and the
/// generated `nginx-dynamic.conf` fragment.
pub fn config_files_dir() -> Result<PathBuf, EnvError> {
    required("CONFIG_FILES").map(PathBuf::from)
}

/// `host:port` of the primary MySQL node the SQL executor targets.
pub fn mysqld_pri_1() -> Result<HostPort, EnvError> {
    let raw = required("MYSQLD_PRI_1")?;
    parse_host_port("MYSQLD_PRI_1", &raw)
}

/// Password for the demo MySQL account.
pub fn demo_mysql_pw() -> Result<String, EnvError> {
    required("DEMO_MYSQL_PW")
}

/// `host:port` of the primary Grafana node; the cluster secret's proxy
/// mapping routes to this port.
pub fn grafana_pri_1() -> Result<HostPort, EnvError> {
    let raw = required("GRAFANA_PRI_1")?;
    parse_host_port("GRAFANA_PRI_1", &raw)
}

/// The cluster operator's hard-coded, never-expiring GUI secret.
pub fn gui_secret() -> Result<String, EnvError> {
    required("GUI_SECRET")
}

/// Major version of RonDB/RDRS in use; selects the load-gen script variant.
pub fn rdrs_major_version() -> Result<String, EnvError> {
    required("RDRS_MAJOR_VERSION")
}

/// URI the load-gen master connects to for its workload.
pub fn rdrs_uri() -> Result<String, EnvError> {
    required("RDRS_URI")
}

/// Path the reverse proxy's reload command should log a known spurious
/// warning to, instead of its main error log.
pub fn nginx_error_log() -> Result<PathBuf, EnvError> {
    required("NGINX_ERROR_LOG").map(PathBuf::from)
}
