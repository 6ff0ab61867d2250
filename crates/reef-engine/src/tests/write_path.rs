//! Write path: manifest layout and shard placement.

use std::sync::Arc;

use reef_store::ShardStore;
use reef_types::{Checksum, ErasureConfig};

use crate::error::{EngineError, NodeError};
use crate::node::{ReefNode, ReefNodeConfig};

use super::helpers::{fast_fetch, memory_node, memory_router, test_data};

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_manifest_layout() {
    let node = memory_node(4, 2, 4);
    let manifest = node.put_object("photos/cat.jpg", &test_data(1000)).await.unwrap();

    assert_eq!(manifest.len(), 6);
    for (i, d) in manifest.descriptors().iter().enumerate() {
        assert_eq!(d.path, format!("photos/cat.jpg.{i}"));
        assert_eq!(d.node, format!("node-{}", i % 4));
        // (1000 + 4) / 4 = 251 bytes per shard.
        assert_eq!(d.size, Some(251));
        assert!(d.checksum.is_some());
    }
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_stored_shards_match_checksums() {
    let node = memory_node(4, 2, 2);
    let manifest = node.put_object("obj", &test_data(333)).await.unwrap();
    for d in manifest.descriptors() {
        let store = node.router().store(&d.node).unwrap();
        let bytes = store.get(&d.path).await.unwrap().unwrap();
        assert_eq!(d.checksum, Some(Checksum::from_data(&bytes)));
        assert_eq!(d.size, Some(bytes.len() as u32));
    }
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_manifest_json_roundtrip_decodes() {
    let node = memory_node(4, 2, 3);
    let data = test_data(64);
    let manifest = node.put_object("obj", &data).await.unwrap();
    let parsed = reef_types::ShardManifest::from_json(&manifest.to_json().unwrap()).unwrap();
    assert_eq!(parsed, manifest);
    assert_eq!(node.get_object(&parsed).await.unwrap(), data);
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_no_nodes_configured() {
    let node = ReefNode::new(
        ReefNodeConfig {
            erasure: ErasureConfig::default(),
            fetch: fast_fetch(),
            nodes: Vec::new(),
        },
        memory_router(0),
    )
    .unwrap();
    assert!(matches!(
        node.put_object("obj", b"data").await,
        Err(EngineError::NoNodes)
    ));
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_unknown_write_node_fails() {
    let node = ReefNode::new(
        ReefNodeConfig {
            erasure: ErasureConfig::default(),
            fetch: fast_fetch(),
            nodes: vec!["node-0".into(), "ghost".into()],
        },
        memory_router(1),
    )
    .unwrap();
    let err = node.put_object("obj", b"data").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Write {
            index: 1,
            source: NodeError::Unreachable(_)
        }
    ));
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_invalid_key_rejected_by_store() {
    let node = memory_node(4, 2, 1);
    let err = node.put_object("../escape", b"data").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Write {
            source: NodeError::Store(reef_store::StoreError::InvalidPath { .. }),
            ..
        }
    ));
}

#[test]
fn test_invalid_erasure_config_rejected() {
    let result = ReefNode::new(
        ReefNodeConfig {
            erasure: ErasureConfig::new(200, 100),
            ..Default::default()
        },
        Arc::new(crate::reader::NodeRouter::new()),
    );
    assert!(matches!(result, Err(EngineError::Erasure(_))));
}
