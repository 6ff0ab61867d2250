//! Integration test: file-backed nodes.
//!
//! Shards written as files survive a restart; missing or truncated shard
//! files count as lost shards.

use reef_integration_tests::{IntegrationCluster, test_data};
use reef_types::ShardManifest;

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_roundtrip_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let data = test_data(50_000);

    let json = {
        let c = IntegrationCluster::with_file_stores(dir.path(), 6, 4, 2);
        let manifest = c.engine().put_object("docs/report.pdf", &data).await.unwrap();
        manifest.to_json().unwrap()
    };

    assert!(dir.path().join("node-0/docs/report.pdf.0").is_file());
    assert!(dir.path().join("node-5/docs/report.pdf.5").is_file());

    // A fresh cluster over the same directories reads the old manifest.
    let c = IntegrationCluster::with_file_stores(dir.path(), 6, 4, 2);
    let manifest = ShardManifest::from_json(&json).unwrap();
    assert_eq!(c.engine().get_object(&manifest).await.unwrap(), data);
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_deleted_shard_files_are_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let c = IntegrationCluster::with_file_stores(dir.path(), 6, 4, 2);
    let data = test_data(12_345);
    let manifest = c.engine().put_object("obj", &data).await.unwrap();

    std::fs::remove_file(dir.path().join("node-0/obj.0")).unwrap();
    std::fs::remove_file(dir.path().join("node-3/obj.3")).unwrap();

    assert_eq!(c.engine().get_object(&manifest).await.unwrap(), data);
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_truncated_shard_file_is_lost() {
    let dir = tempfile::tempdir().unwrap();
    let c = IntegrationCluster::with_file_stores(dir.path(), 6, 4, 2);
    let data = test_data(4_000);
    let manifest = c.engine().put_object("obj", &data).await.unwrap();

    let path = dir.path().join("node-2/obj.2");
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert_eq!(c.engine().get_object(&manifest).await.unwrap(), data);
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_manifest_without_size_or_checksum() {
    // Older manifests carry only path and node (`ip`).
    let dir = tempfile::tempdir().unwrap();
    let c = IntegrationCluster::with_file_stores(dir.path(), 6, 4, 2);
    let data = test_data(999);
    let manifest = c.engine().put_object("legacy", &data).await.unwrap();

    let bare: Vec<String> = manifest
        .descriptors()
        .iter()
        .map(|d| format!(r#"{{"path":"{}","ip":"{}"}}"#, d.path, d.node))
        .collect();
    let legacy = ShardManifest::from_json(&format!("[{}]", bare.join(","))).unwrap();
    assert!(legacy.descriptors().iter().all(|d| d.size.is_none()));

    std::fs::remove_file(dir.path().join("node-1/legacy.1")).unwrap();
    assert_eq!(c.engine().get_object(&legacy).await.unwrap(), data);
}
