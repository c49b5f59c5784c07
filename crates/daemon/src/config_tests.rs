// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

const REQUIRED_VARS: &[(&str, &str)] = &[
    ("NODE_USER", "demo"),
    ("RUN_DIR", "/run/demo"),
    ("DURABLE_DIR", "/var/lib/demo"),
    ("CONFIG_FILES", "/etc/demo"),
    ("MYSQLD_PRI_1", "10.0.0.1:3306"),
    ("DEMO_MYSQL_PW", "secret"),
    ("GRAFANA_PRI_1", "10.0.0.2:3000"),
    ("GUI_SECRET", "clustersecret00000000000000000000"),
    ("RDRS_MAJOR_VERSION", "24"),
    ("RDRS_URI", "https://rdrs.internal"),
    ("NGINX_ERROR_LOG", "/var/log/nginx-dynamic-err.log"),
];

fn set_all() {
    for (k, v) in REQUIRED_VARS {
        std::env::set_var(k, v);
    }
    std::env::remove_var("LOADGEN_WORKER_COUNT");
    std::env::remove_var("DEMO_HTTP_ADDR");
}

fn clear_all() {
    for (k, _) in REQUIRED_VARS {
        std::env::remove_var(k);
    }
}

#[test]
#[serial]
fn load_succeeds_with_all_required_vars_set() {
    set_all();
    let config = Config::load().unwrap();
    assert_eq!(config.node_user, "demo");
    assert_eq!(config.mysqld.host, "10.0.0.1");
    assert_eq!(config.mysqld.port, 3306);
    assert_eq!(config.loadgen_worker_count, DEFAULT_LOADGEN_WORKER_COUNT);
    clear_all();
}

#[test]
#[serial]
fn load_fails_when_a_required_var_is_missing() {
    set_all();
    std::env::remove_var("RDRS_URI");
    let err = Config::load().unwrap_err();
    assert!(matches!(err, EnvError::Missing("RDRS_URI")));
    clear_all();
}

#[test]
#[serial]
fn load_rejects_a_malformed_host_port() {
    set_all();
    std::env::set_var("MYSQLD_PRI_1", "not-a-host-port");
    let err = Config::load().unwrap_err();
    assert!(matches!(err, EnvError::Invalid { name: "MYSQLD_PRI_1", .. }));
    clear_all();
}

#[test]
#[serial]
fn state_and_log_paths_are_under_durable_dir() {
    set_all();
    let config = Config::load().unwrap();
    assert_eq!(config.state_path(), std::path::PathBuf::from("/var/lib/demo/demo_state.json"));
    assert_eq!(config.log_path(), std::path::PathBuf::from("/var/lib/demo/demo.log"));
    clear_all();
}
