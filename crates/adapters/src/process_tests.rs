// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn fast_supervisor() -> ProcessSupervisor {
    ProcessSupervisor::new().with_interval(Duration::from_millis(5))
}

#[tokio::test]
async fn spawn_detached_redirects_stdio_and_returns_a_pid() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = dir.path().join("out.log");
    let stderr = dir.path().join("err.log");

    let supervisor = fast_supervisor();
    let pid = supervisor
        .spawn_detached(
            "sh",
            &["-c".into(), "echo hello; sleep 5".into()],
            None,
            &[],
            &stdout,
            &stderr,
        )
        .unwrap();

    assert!(pid > 0);
    for _ in 0..50 {
        if std::fs::read_to_string(&stdout).unwrap_or_default().contains("hello") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(std::fs::read_to_string(&stdout).unwrap().trim(), "hello");

    supervisor.terminate(pid).await;
}

#[tokio::test]
async fn terminate_reports_already_gone_for_a_dead_pid() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = fast_supervisor();
    let pid = supervisor
        .spawn_detached(
            "sh",
            &["-c".into(), "true".into()],
            None,
            &[],
            &dir.path().join("out.log"),
            &dir.path().join("err.log"),
        )
        .unwrap();

    // Give the quick-exiting child time to actually exit.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let report = supervisor.terminate(pid).await;
    assert_eq!(report.outcome, TerminationOutcome::AlreadyGone);
    assert_eq!(report.sigterm_count, 0);
    assert_eq!(report.sigkill_count, 0);
}

#[tokio::test]
async fn terminate_exits_a_cooperative_process_via_sigterm() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = fast_supervisor();
    let pid = supervisor
        .spawn_detached(
            "sh",
            &["-c".into(), "sleep 100".into()],
            None,
            &[],
            &dir.path().join("out.log"),
            &dir.path().join("err.log"),
        )
        .unwrap();

    let report = supervisor.terminate(pid).await;
    assert_eq!(report.outcome, TerminationOutcome::TerminatedBySigterm);
    assert_eq!(report.sigterm_count, 1);
    assert_eq!(report.sigkill_count, 0);
}

#[tokio::test]
async fn terminate_escalates_to_sigkill_exactly_on_the_21st_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = fast_supervisor();
    let pid = supervisor
        .spawn_detached(
            "sh",
            &["-c".into(), "trap '' TERM; sleep 100".into()],
            None,
            &[],
            &dir.path().join("out.log"),
            &dir.path().join("err.log"),
        )
        .unwrap();

    // Let the trap installation land before we start signalling.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let report = supervisor.terminate(pid).await;
    assert_eq!(report.outcome, TerminationOutcome::TerminatedBySigkill);
    assert_eq!(report.sigterm_count, 20);
    assert_eq!(report.sigkill_count, 1);
}

#[tokio::test]
async fn terminate_group_resolves_all_members() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = fast_supervisor();
    let mut pids = Vec::new();
    for i in 0..3 {
        let pid = supervisor
            .spawn_detached(
                "sh",
                &["-c".into(), "sleep 100".into()],
                None,
                &[],
                &dir.path().join(format!("out{i}.log")),
                &dir.path().join(format!("err{i}.log")),
            )
            .unwrap();
        pids.push(pid);
    }

    let reports = supervisor.terminate_group(&pids).await;
    assert_eq!(reports.len(), 3);
    assert!(reports
        .iter()
        .all(|r| r.outcome == TerminationOutcome::TerminatedBySigterm));
}
