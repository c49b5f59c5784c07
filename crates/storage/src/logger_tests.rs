// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::thread::sleep;
use std::time::Duration;

fn read_lines(path: &std::path::Path) -> Vec<Value> {
    // Give the background writer thread a moment to flush.
    for _ in 0..50 {
        if path.exists() {
            break;
        }
        sleep(Duration::from_millis(10));
    }
    sleep(Duration::from_millis(50));
    let content = std::fs::read_to_string(path).unwrap_or_default();
    content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn writes_one_json_object_per_line_with_required_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.log");
    let logger = EventLogger::spawn(&path);
    logger.info("session created", json!({ "session": "abc" }));

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["type"], "info");
    assert_eq!(lines[0]["msg"], "session created");
    assert_eq!(lines[0]["session"], "abc");
    assert!(lines[0]["ts"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn error_severity_is_tagged_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.log");
    let logger = EventLogger::spawn(&path);
    logger.error("sql failed", json!({ "cause": "timeout" }));

    let lines = read_lines(&path);
    assert_eq!(lines[0]["type"], "error");
    assert_eq!(lines[0]["cause"], "timeout");
}

#[test]
fn multiple_entries_append_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.log");
    let logger = EventLogger::spawn(&path);
    for i in 0..5 {
        logger.info(format!("entry {i}"), json!({}));
    }

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 5);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["msg"], format!("entry {i}"));
    }
}
