//! Integration test: full write, lose, read pipeline on in-memory nodes.

use reef_engine::EngineError;
use reef_integration_tests::{IntegrationCluster, test_data, test_data_seeded};
use reef_store::ShardStore;

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_roundtrip_across_configs_and_sizes() {
    for (k, m) in [(1, 1), (2, 1), (4, 2), (6, 3), (10, 4)] {
        let c = IntegrationCluster::new(k + m, k, m);
        for size in [0, 1, 3, 4 * k, 1000, 65_537] {
            let data = test_data_seeded(size, (k * 1000 + size) as u32);
            let key = format!("obj-{k}-{m}-{size}");
            let manifest = c.engine().put_object(&key, &data).await.unwrap();
            assert_eq!(manifest.len(), k + m);
            let got = c.engine().get_object(&manifest).await.unwrap();
            assert_eq!(got, data, "{k}+{m}, {size} bytes");
        }
    }
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_hello_world_shards_on_disk_layout() {
    let c = IntegrationCluster::new(6, 4, 2);
    let manifest = c.engine().put_object("hello", b"hello world").await.unwrap();

    let expected: [&[u8]; 6] = [
        &[0, 0, 0, 11],
        b"hell",
        b"o wo",
        b"rld\0",
        &[210, 193, 42, 241],
        &[153, 82, 89, 166],
    ];
    for (i, want) in expected.iter().enumerate() {
        let d = manifest.get(i).unwrap();
        assert_eq!(d.node, c.name(i));
        let store = c.router().store(&d.node).unwrap();
        let got = store.get(&d.path).await.unwrap().unwrap();
        assert_eq!(got.as_ref(), *want, "shard {i}");
    }

    c.lose_shard(&manifest, 1).await;
    c.lose_shard(&manifest, 4).await;
    assert_eq!(
        c.engine().get_object(&manifest).await.unwrap(),
        b"hello world"
    );
}

#[tokio::test]
#[ntest::timeout(20000)]
async fn test_every_two_shard_loss_recovers() {
    let data = test_data(10_000);
    for a in 0..6 {
        for b in (a + 1)..6 {
            let c = IntegrationCluster::new(6, 4, 2);
            let manifest = c.engine().put_object("obj", &data).await.unwrap();
            c.lose_shard(&manifest, a).await;
            c.lose_shard(&manifest, b).await;
            let got = c.engine().get_object(&manifest).await.unwrap();
            assert_eq!(got, data, "lost {a} and {b}");
        }
    }
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_three_losses_fail_without_output() {
    let c = IntegrationCluster::new(6, 4, 2);
    let manifest = c.engine().put_object("obj", &test_data(500)).await.unwrap();
    for i in [0, 3, 5] {
        c.lose_shard(&manifest, i).await;
    }
    let err = c.engine().get_object(&manifest).await.unwrap_err();
    assert!(
        matches!(err, EngineError::InsufficientShards { needed: 4, .. }),
        "{err}"
    );
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_repeated_reads_are_identical() {
    let c = IntegrationCluster::new(6, 4, 2);
    let data = test_data(4096);
    let manifest = c.engine().put_object("obj", &data).await.unwrap();
    c.lose_shard(&manifest, 0).await;
    c.lose_shard(&manifest, 2).await;

    let first = c.engine().get_object(&manifest).await.unwrap();
    let second = c.engine().get_object(&manifest).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, data);
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_corrupted_shards_are_treated_as_lost() {
    let c = IntegrationCluster::new(6, 4, 2);
    let data = test_data(3000);
    let manifest = c.engine().put_object("obj", &data).await.unwrap();

    c.corrupt_shard(&manifest, 1).await;
    c.corrupt_shard(&manifest, 2).await;
    assert_eq!(c.engine().get_object(&manifest).await.unwrap(), data);

    c.corrupt_shard(&manifest, 3).await;
    assert!(matches!(
        c.engine().get_object(&manifest).await,
        Err(EngineError::InsufficientShards { .. })
    ));
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_round_robin_over_fewer_nodes() {
    // 4+2 over 3 nodes: node i holds shards i and i + 3.
    let c = IntegrationCluster::new(3, 4, 2);
    let manifest = c.engine().put_object("obj", &test_data(100)).await.unwrap();
    for i in 0..3 {
        assert_eq!(c.shard_count(i).await, 2);
    }
    assert_eq!(manifest.get(4).unwrap().node, "node-1");
}
