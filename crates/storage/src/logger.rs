// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSON-lines structured logger for `<DURABLE_DIR>/demo.log`.
//!
//! Every entry carries `ts` (UTC millisecond ISO-8601 with `Z`), `type`
//! (`info` | `error`), `msg`, and arbitrary structured fields (session id,
//! pid, db name, cause, ...). Writes happen on a dedicated worker thread so a
//! slow disk never stalls a request handler; write failures are reported to
//! stderr as a JSON object and never propagate.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
        }
    }
}

struct Record {
    ts: String,
    severity: Severity,
    msg: String,
    fields: Value,
}

/// Handle to the background-writer structured logger. Cheap to clone.
#[derive(Clone)]
pub struct EventLogger {
    tx: Sender<Record>,
}

impl EventLogger {
    /// Spawn the writer thread and open `path` for appending.
    #[allow(clippy::expect_used)]
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::channel::<Record>();

        thread::Builder::new()
            .name("demo-event-logger".into())
            .spawn(move || {
                if let Some(parent) = path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                let mut file = match OpenOptions::new().create(true).append(true).open(&path) {
                    Ok(f) => Some(f),
                    Err(e) => {
                        report_failure(&format!("failed to open log file: {e}"));
                        None
                    }
                };

                for record in rx {
                    let line = json!({
                        "ts": record.ts,
                        "type": record.severity.as_str(),
                        "msg": record.msg,
                    });
                    let line = merge_fields(line, record.fields);

                    let Some(f) = file.as_mut() else { continue };
                    if let Err(e) = writeln!(f, "{line}") {
                        report_failure(&format!("failed to write log line: {e}"));
                    }
                }
            })
            .expect("failed to spawn event logger thread");

        Self { tx }
    }

    pub fn info(&self, msg: impl Into<String>, fields: Value) {
        self.log(Severity::Info, msg, fields)
    }

    pub fn error(&self, msg: impl Into<String>, fields: Value) {
        self.log(Severity::Error, msg, fields)
    }

    pub fn log(&self, severity: Severity, msg: impl Into<String>, fields: Value) {
        let record = Record {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            severity,
            msg: msg.into(),
            fields,
        };
        // A full receiver only happens if the writer thread died; in that
        // case there's nothing useful left to do with the record.
        let _ = self.tx.send(record);
    }
}

fn merge_fields(mut base: Value, fields: Value) -> Value {
    if let (Some(base_obj), Value::Object(fields_obj)) = (base.as_object_mut(), fields) {
        for (k, v) in fields_obj {
            base_obj.insert(k, v);
        }
    }
    base
}

fn report_failure(msg: &str) {
    eprintln!("{}", json!({ "type": "error", "msg": msg }));
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
