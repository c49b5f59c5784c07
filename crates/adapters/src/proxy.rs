// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Renders and installs the reverse-proxy access/routing fragment.
//!
//! Two mappings are emitted: GUI-secret to access boolean, and GUI-secret to
//! the load-generator master's web-UI port. A statically configured cluster
//! secret is always present, mapping to a well-known port, and never
//! expires. Installation is atomic (temp file + rename); after install the
//! proxy is told to reload by invoking its binary with its reload arguments,
//! the main config path, and a dedicated error-log path.

use crate::subprocess::{run_with_timeout, PROXY_RELOAD_TIMEOUT};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ProxyConfigError {
    #[error("failed to render proxy config at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to install proxy config at {path}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("proxy reload failed: {0}")]
    Reload(String),
}

/// One entry in the rendered mapping: whether the session is known, and the
/// port its load-gen master UI listens on (if it has one allocated yet).
#[derive(Debug, Clone, Copy)]
pub struct AccessEntry {
    pub access: bool,
    pub loadgen_ui_port: Option<u16>,
}

/// The cluster operator's hard-coded, never-expiring secret and the port it
/// always maps to.
#[derive(Debug, Clone)]
pub struct ClusterSecret {
    pub secret: String,
    pub port: u16,
}

/// Renders and atomically installs the reverse-proxy fragment, then
/// triggers a reload.
#[derive(Debug, Clone)]
pub struct ProxyConfigWriter {
    config_path: PathBuf,
    reload_binary: PathBuf,
    reload_args: Vec<String>,
    main_config_path: PathBuf,
    reload_error_log: PathBuf,
    cluster_secret: ClusterSecret,
}

impl ProxyConfigWriter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config_path: impl Into<PathBuf>,
        reload_binary: impl Into<PathBuf>,
        reload_args: impl IntoIterator<Item = impl Into<String>>,
        main_config_path: impl Into<PathBuf>,
        reload_error_log: impl Into<PathBuf>,
        cluster_secret: ClusterSecret,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            reload_binary: reload_binary.into(),
            reload_args: reload_args.into_iter().map(Into::into).collect(),
            main_config_path: main_config_path.into(),
            reload_error_log: reload_error_log.into(),
            cluster_secret,
        }
    }

    /// Renders the fragment for `entries`, installs it atomically, and
    /// reloads the proxy. `entries` need not include the cluster secret;
    /// it is always appended.
    pub async fn install(
        &self,
        entries: &BTreeMap<String, AccessEntry>,
    ) -> Result<(), ProxyConfigError> {
        let rendered = self.render(entries);
        self.write_atomic(&rendered)?;
        self.reload().await
    }

    fn render(&self, entries: &BTreeMap<String, AccessEntry>) -> String {
        let mut out = String::new();
        out.push_str("# generated, do not edit by hand\n");
        for (secret, entry) in entries {
            out.push_str(&format!(
                "map {secret} {};\n",
                if entry.access { 1 } else { 0 }
            ));
            if let Some(port) = entry.loadgen_ui_port {
                out.push_str(&format!("\"{secret}\" {port};\n"));
            }
        }
        out.push_str(&format!("map {} 1;\n", self.cluster_secret.secret));
        out.push_str(&format!(
            "\"{}\" {};\n",
            self.cluster_secret.secret, self.cluster_secret.port
        ));
        out
    }

    fn write_atomic(&self, rendered: &str) -> Result<(), ProxyConfigError> {
        let tmp_path = tmp_path_for(&self.config_path);
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ProxyConfigError::Write {
                path: self.config_path.clone(),
                source,
            })?;
        }
        std::fs::write(&tmp_path, rendered).map_err(|source| ProxyConfigError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.config_path).map_err(|source| {
            ProxyConfigError::Install {
                path: self.config_path.clone(),
                source,
            }
        })?;
        Ok(())
    }

    async fn reload(&self) -> Result<(), ProxyConfigError> {
        let mut cmd = Command::new(&self.reload_binary);
        cmd.args(&self.reload_args)
            .arg("-c")
            .arg(&self.main_config_path)
            .arg("--error-log")
            .arg(&self.reload_error_log);

        let output = run_with_timeout(cmd, PROXY_RELOAD_TIMEOUT, "proxy reload")
            .await
            .map_err(ProxyConfigError::Reload)?;
        if !output.status.success() {
            return Err(ProxyConfigError::Reload(format!(
                "exit status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
