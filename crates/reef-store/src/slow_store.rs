//! A [`ShardStore`] wrapper that adds configurable random IO latency.
//!
//! `SlowStore` wraps any `Arc<dyn ShardStore>` and sleeps for a random
//! duration before each read or write. The RNG is seeded, so a test that
//! depends on which fetches straggle behaves the same on every run.
//!
//! ```ignore
//! let slow = SlowStore::new(inner)
//!     .read_latency(5, 20)    // 5–20 ms per read
//!     .write_latency(10, 30)  // 10–30 ms per write
//!     .seed(42);
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::StoreError;
use crate::traits::ShardStore;

/// A [`ShardStore`] wrapper that injects random latency before IO operations.
pub struct SlowStore {
    inner: Arc<dyn ShardStore>,
    read_latency_ms: (u64, u64),
    write_latency_ms: (u64, u64),
    rng: Mutex<StdRng>,
}

impl SlowStore {
    /// Wrap an existing store with zero latency (pass-through) by default.
    pub fn new(inner: Arc<dyn ShardStore>) -> Self {
        Self {
            inner,
            read_latency_ms: (0, 0),
            write_latency_ms: (0, 0),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    /// Set the read latency range in milliseconds (uniform random).
    pub fn read_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.read_latency_ms = (min_ms, max_ms.max(min_ms));
        self
    }

    /// Set the write latency range in milliseconds (uniform random).
    pub fn write_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.write_latency_ms = (min_ms, max_ms.max(min_ms));
        self
    }

    /// Set the RNG seed.
    pub fn seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    async fn delay(&self, (min, max): (u64, u64)) {
        if max == 0 {
            return;
        }

        let ms = if min == max {
            min
        } else {
            self.rng
                .lock()
                .expect("lock poisoned")
                .random_range(min..=max)
        };

        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait::async_trait]
impl ShardStore for SlowStore {
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError> {
        self.delay(self.write_latency_ms).await;
        self.inner.put(path, data).await
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>, StoreError> {
        self.delay(self.read_latency_ms).await;
        self.inner.get(path).await
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.delay(self.write_latency_ms).await;
        self.inner.delete(path).await
    }

    async fn contains(&self, path: &str) -> Result<bool, StoreError> {
        self.delay(self.read_latency_ms).await;
        self.inner.contains(path).await
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        self.inner.list().await
    }
}
