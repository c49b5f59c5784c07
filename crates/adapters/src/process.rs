// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detached subprocess spawn and supervised termination.
//!
//! Load-generator master/worker processes must outlive a coordinator
//! restart, so they are spawned detached (own session, stdio redirected to
//! files) rather than as tracked [`tokio::process::Child`] handles. The
//! supervisor therefore only ever deals in raw pids: termination sends
//! signals and polls liveness with `kill(pid, 0)`, which still works after a
//! coordinator restart since the pid was persisted to durable state.

use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open stdio file {path}: {source}")]
    Stdio {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How a [`ProcessSupervisor::terminate`] call resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// The process was already gone when we looked.
    AlreadyGone,
    /// Exited after one or more SIGTERMs.
    TerminatedBySigterm,
    /// Did not respond to SIGTERM; exited after escalating to SIGKILL.
    TerminatedBySigkill,
    /// Exhausted the SIGKILL attempt budget; still alive. Logged and abandoned.
    GaveUp,
}

/// Counters describing a single [`ProcessSupervisor::terminate`] call, useful
/// for tests and for the structured log entry the spec requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationReport {
    pub pid: u32,
    pub sigterm_count: u32,
    pub sigkill_count: u32,
    pub outcome: TerminationOutcome,
}

/// Spawns detached children and supervises their termination.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    signal_interval: Duration,
    max_sigterm_attempts: u32,
    max_sigkill_attempts: u32,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self {
            signal_interval: Duration::from_secs(1),
            max_sigterm_attempts: 20,
            max_sigkill_attempts: 100,
        }
    }
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the retry interval — used by tests so they don't take
    /// multiple real seconds to exercise the escalation path.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.signal_interval = interval;
        self
    }

    /// Spawn `program` fully detached: own session (re-parented to init on
    /// coordinator exit/restart, never killed by it), stdin from
    /// `/dev/null`, stdout/stderr appended to the given files. Returns the
    /// child's OS pid.
    pub fn spawn_detached(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
        env: &[(String, String)],
        stdout_path: &Path,
        stderr_path: &Path,
    ) -> Result<u32, SupervisorError> {
        let stdin = Stdio::null();
        let stdout = open_append(stdout_path)?;
        let stderr = open_append(stderr_path)?;

        let mut cmd = std::process::Command::new(program);
        cmd.args(args).stdin(stdin).stdout(stdout).stderr(stderr);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in env {
            cmd.env(k, v);
        }

        // SAFETY: `setsid` is async-signal-safe and touches no state shared
        // with the parent. It detaches the child into its own session so it
        // survives this process dying or being re-exec'd, and so signals
        // sent to our process group don't reach it.
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid().map_err(std::io::Error::from).map(|_| ())
            });
        }

        let child = cmd.spawn().map_err(|e| SupervisorError::Spawn {
            program: program.to_string(),
            source: e,
        })?;
        let pid = child.id();
        // Detached: we deliberately drop the Child handle without waiting on
        // it. The OS reaps it via init once it exits; we track it by pid in
        // durable state instead.
        std::mem::forget(child);
        info!(pid, program, "spawned detached process");
        Ok(pid)
    }

    /// Terminate `pid`: SIGTERM every `signal_interval` up to
    /// `max_sigterm_attempts` times, then escalate to SIGKILL on the same
    /// cadence up to `max_sigkill_attempts` times. A pid that's already gone
    /// is reported as success with zero counts.
    pub async fn terminate(&self, pid: u32) -> TerminationReport {
        if !process_alive(pid) {
            return TerminationReport {
                pid,
                sigterm_count: 0,
                sigkill_count: 0,
                outcome: TerminationOutcome::AlreadyGone,
            };
        }

        let mut sigterm_count = 0;
        for _ in 0..self.max_sigterm_attempts {
            send_signal(pid, nix::sys::signal::Signal::SIGTERM);
            sigterm_count += 1;
            tokio::time::sleep(self.signal_interval).await;
            if !process_alive(pid) {
                info!(pid, sigterm_count, "process exited after SIGTERM");
                return TerminationReport {
                    pid,
                    sigterm_count,
                    sigkill_count: 0,
                    outcome: TerminationOutcome::TerminatedBySigterm,
                };
            }
        }

        warn!(pid, sigterm_count, "process ignored SIGTERM, escalating to SIGKILL");
        let mut sigkill_count = 0;
        for _ in 0..self.max_sigkill_attempts {
            send_signal(pid, nix::sys::signal::Signal::SIGKILL);
            sigkill_count += 1;
            tokio::time::sleep(self.signal_interval).await;
            if !process_alive(pid) {
                info!(pid, sigterm_count, sigkill_count, "process exited after SIGKILL");
                return TerminationReport {
                    pid,
                    sigterm_count,
                    sigkill_count,
                    outcome: TerminationOutcome::TerminatedBySigkill,
                };
            }
        }

        warn!(
            pid,
            sigterm_count, sigkill_count, "giving up on terminating process"
        );
        TerminationReport {
            pid,
            sigterm_count,
            sigkill_count,
            outcome: TerminationOutcome::GaveUp,
        }
    }

    /// Terminate a group of pids in parallel; resolves once every pid has
    /// reached a terminal outcome.
    pub async fn terminate_group(&self, pids: &[u32]) -> Vec<TerminationReport> {
        let futures = pids.iter().map(|&pid| self.terminate(pid));
        futures::future::join_all(futures).await
    }
}

fn open_append(path: &Path) -> Result<std::fs::File, SupervisorError> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SupervisorError::Stdio {
            path: path.to_path_buf(),
            source: e,
        })
}

fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        Err(_) => true, // e.g. EPERM: exists, just not ours to signal
    }
}

fn send_signal(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::unistd::Pid;
    // ESRCH here just means the process exited between our liveness check
    // and the send; the next liveness poll will observe that.
    let _ = nix::sys::signal::kill(Pid::from_raw(pid as i32), signal);
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
