//! Integration test: node failure.
//!
//! Nodes go down or slow down after objects are written; reads must succeed
//! while at most `m` shards are missing and fail cleanly beyond that.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reef_engine::{EngineError, FetchConfig};
use reef_integration_tests::{IntegrationCluster, test_data_seeded};
use reef_store::{MemoryStore, ShardStore};
use reef_types::ErasureConfig;

/// 6 nodes, 4+2, write 30 objects, kill 2 nodes → every object readable.
#[tokio::test]
#[ntest::timeout(20000)]
async fn test_kill_two_nodes_all_objects_readable() {
    let c = IntegrationCluster::new(6, 4, 2);

    let mut objects = Vec::new();
    for i in 0..30 {
        let data = test_data_seeded(2000 + i * 50, i as u32 + 1);
        let manifest = c
            .engine()
            .put_object(&format!("obj-{i:03}"), &data)
            .await
            .unwrap();
        objects.push((manifest, data));
    }

    c.kill_node(1);
    c.kill_node(4);

    for (manifest, expected) in &objects {
        let got = c.engine().get_object(manifest).await.unwrap();
        assert_eq!(&got, expected);
    }
}

/// A third node down makes objects unrecoverable; reviving one restores reads.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_kill_three_nodes_then_revive() {
    let c = IntegrationCluster::new(6, 4, 2);
    let data = test_data_seeded(5000, 7);
    let manifest = c.engine().put_object("obj", &data).await.unwrap();

    for i in [0, 2, 5] {
        c.kill_node(i);
    }
    assert!(matches!(
        c.engine().get_object(&manifest).await,
        Err(EngineError::InsufficientShards { needed: 4, .. })
    ));

    c.revive_node(2);
    assert_eq!(c.engine().get_object(&manifest).await.unwrap(), data);
}

/// 4+2 over 3 nodes: one node down loses two shards, still readable.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_shared_node_failure() {
    let c = IntegrationCluster::new(3, 4, 2);
    let data = test_data_seeded(777, 3);
    let manifest = c.engine().put_object("obj", &data).await.unwrap();

    c.kill_node(0);
    assert_eq!(c.engine().get_object(&manifest).await.unwrap(), data);

    c.kill_node(1);
    assert!(c.engine().get_object(&manifest).await.is_err());
}

/// Two nodes slower than the per-shard timeout do not delay the read
/// beyond what the four fast shards need.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_slow_nodes_are_skipped() {
    let c = IntegrationCluster::new(6, 4, 2);
    let data = test_data_seeded(10_000, 11);
    let manifest = c.engine().put_object("obj", &data).await.unwrap();

    c.slow_node(0, Duration::from_secs(5));
    c.slow_node(3, Duration::from_secs(5));

    let start = Instant::now();
    assert_eq!(c.engine().get_object(&manifest).await.unwrap(), data);
    assert!(start.elapsed() < Duration::from_secs(2), "{:?}", start.elapsed());
}

/// Three slow nodes: every per-shard timeout fires and the read fails fast.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_three_slow_nodes_are_insufficient() {
    let c = IntegrationCluster::new(6, 4, 2);
    let manifest = c
        .engine()
        .put_object("obj", &test_data_seeded(100, 5))
        .await
        .unwrap();

    for i in [1, 2, 3] {
        c.slow_node(i, Duration::from_secs(5));
    }
    assert!(matches!(
        c.engine().get_object(&manifest).await,
        Err(EngineError::InsufficientShards { .. })
    ));
}

/// The overall deadline elapses before the per-shard timeouts do.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_deadline_elapses_before_verdict() {
    let stores: Vec<Arc<dyn ShardStore>> = (0..6)
        .map(|_| Arc::new(MemoryStore::new(u64::MAX)) as Arc<dyn ShardStore>)
        .collect();
    let c = IntegrationCluster::from_stores(
        stores,
        ErasureConfig::new(4, 2),
        FetchConfig {
            shard_timeout: Duration::from_secs(5),
            deadline: Duration::from_millis(300),
            early_exit: true,
        },
    );
    let manifest = c
        .engine()
        .put_object("obj", &test_data_seeded(100, 9))
        .await
        .unwrap();

    for i in [0, 1, 2] {
        c.slow_node(i, Duration::from_secs(3));
    }
    let err = c.engine().get_object(&manifest).await.unwrap_err();
    assert!(
        matches!(err, EngineError::Timeout { present: 3, needed: 4, .. }),
        "{err}"
    );
}
