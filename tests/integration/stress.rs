//! Integration test: stress.
//!
//! Concurrent writers and readers over one engine, with random shard losses.
//! Verifies no data corruption under load.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reef_integration_tests::{IntegrationCluster, test_data_seeded};
use tokio::sync::Barrier;

/// 8 concurrent writers, 25 objects each, then 8 concurrent readers.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(60000)]
async fn test_concurrent_writers_and_readers() {
    let c = Arc::new(IntegrationCluster::new(6, 4, 2));
    let barrier = Arc::new(Barrier::new(8));

    let mut handles = Vec::new();
    for w in 0..8u32 {
        let c = c.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let mut written = Vec::new();
            for i in 0..25u32 {
                let data = test_data_seeded(500 + (i as usize) * 37, w * 1000 + i + 1);
                let manifest = c
                    .engine()
                    .put_object(&format!("w{w}/obj-{i}"), &data)
                    .await
                    .unwrap();
                written.push((manifest, data));
            }
            written
        }));
    }

    let mut objects = Vec::new();
    for handle in handles {
        objects.extend(handle.await.unwrap());
    }
    assert_eq!(objects.len(), 200);

    let objects = Arc::new(objects);
    let mut readers = Vec::new();
    for r in 0..8 {
        let c = c.clone();
        let objects = objects.clone();
        readers.push(tokio::spawn(async move {
            for (manifest, expected) in objects.iter().skip(r).step_by(8) {
                let got = c.engine().get_object(manifest).await.unwrap();
                assert_eq!(&got, expected);
            }
        }));
    }
    for reader in readers {
        reader.await.unwrap();
    }
}

/// Random losses of up to `m` shards per object never corrupt a read.
#[tokio::test]
#[ntest::timeout(60000)]
async fn test_random_losses() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let (k, m) = (6, 3);
    let c = IntegrationCluster::new(k + m, k, m);

    for i in 0..60u32 {
        let data = test_data_seeded(rng.random_range(0..8192), i + 1);
        let manifest = c
            .engine()
            .put_object(&format!("obj-{i}"), &data)
            .await
            .unwrap();

        let lost = rng.random_range(0..=m);
        for index in rand::seq::index::sample(&mut rng, k + m, lost) {
            c.lose_shard(&manifest, index).await;
        }
        assert_eq!(c.engine().get_object(&manifest).await.unwrap(), data, "object {i}");
    }
}
