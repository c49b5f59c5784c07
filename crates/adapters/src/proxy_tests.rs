// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn writer(dir: &std::path::Path, reload_binary: &str) -> ProxyConfigWriter {
    ProxyConfigWriter::new(
        dir.join("proxy.conf"),
        reload_binary,
        ["--reload"],
        dir.join("nginx.conf"),
        dir.join("reload-error.log"),
        ClusterSecret {
            secret: "clustersecret00000000000000000000".into(),
            port: 9999,
        },
    )
}

#[tokio::test]
async fn install_writes_entries_and_cluster_secret() {
    let dir = tempfile::tempdir().unwrap();
    let writer = writer(dir.path(), "true");

    let mut entries = BTreeMap::new();
    entries.insert(
        "abc123".to_string(),
        AccessEntry {
            access: true,
            loadgen_ui_port: Some(44007),
        },
    );
    entries.insert(
        "revoked".to_string(),
        AccessEntry {
            access: false,
            loadgen_ui_port: None,
        },
    );

    writer.install(&entries).await.unwrap();

    let content = std::fs::read_to_string(dir.path().join("proxy.conf")).unwrap();
    assert!(content.contains("map abc123 1;"));
    assert!(content.contains("\"abc123\" 44007;"));
    assert!(content.contains("map revoked 0;"));
    assert!(!content.contains("\"revoked\""));
    assert!(content.contains("map clustersecret00000000000000000000 1;"));
    assert!(content.contains("\"clustersecret00000000000000000000\" 9999;"));
}

#[tokio::test]
async fn install_leaves_no_temp_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let writer = writer(dir.path(), "true");
    writer.install(&BTreeMap::new()).await.unwrap();
    assert!(!dir.path().join("proxy.conf.tmp").exists());
}

#[tokio::test]
async fn reload_failure_is_propagated() {
    let dir = tempfile::tempdir().unwrap();
    let writer = writer(dir.path(), "false");
    let err = writer.install(&BTreeMap::new()).await.unwrap_err();
    assert!(matches!(err, ProxyConfigError::Reload(_)));
    // The config must already be installed even though the reload failed.
    assert!(dir.path().join("proxy.conf").exists());
}
