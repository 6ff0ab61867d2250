//! Parallel shard fetch.
//!
//! One task per descriptor, each bounded by a per-shard timeout, all bounded
//! by an overall deadline. Individual failures become [`AbsentReason`]s in a
//! fixed-size report; only the feasibility verdict can fail the fetch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reef_erasure::PresenceBitmap;
use reef_types::{ErasureConfig, ShardDescriptor, ShardManifest};
use tokio::task::JoinSet;
use tokio::time::{Instant, error::Elapsed};
use tracing::{debug, warn};

use crate::error::{EngineError, NodeError};
use crate::reader::ShardReader;

/// Timing knobs for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Upper bound on a single shard read.
    pub shard_timeout: Duration,
    /// Upper bound on the whole fetch.
    pub deadline: Duration,
    /// Stop waiting as soon as `data_shards` shards are present.
    pub early_exit: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            shard_timeout: Duration::from_secs(2),
            deadline: Duration::from_secs(10),
            early_exit: true,
        }
    }
}

/// Why a shard is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsentReason {
    /// The manifest names a node nobody serves.
    Unreachable,
    /// The node has nothing at the path.
    NotFound,
    /// The node's store returned an error.
    ReadFailed(String),
    /// The read did not finish within the per-shard timeout.
    TimedOut,
    /// The bytes disagree with the authoritative shard size.
    SizeMismatch {
        /// Authoritative size.
        expected: usize,
        /// Size actually read.
        actual: usize,
    },
    /// The bytes do not hash to the manifest checksum.
    ChecksumMismatch,
    /// Enough shards arrived before this one; it was never awaited.
    Abandoned,
}

impl AbsentReason {
    /// Whether the shard was read but its bytes are wrong.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::SizeMismatch { .. } | Self::ChecksumMismatch)
    }
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => f.write_str("node unreachable"),
            Self::NotFound => f.write_str("not found"),
            Self::ReadFailed(e) => write!(f, "read failed: {e}"),
            Self::TimedOut => f.write_str("timed out"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size {actual}, expected {expected}")
            }
            Self::ChecksumMismatch => f.write_str("checksum mismatch"),
            Self::Abandoned => f.write_str("abandoned"),
        }
    }
}

/// The result of fetching one shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardOutcome {
    /// Bytes arrived intact.
    Present(Bytes),
    /// No usable bytes.
    Absent(AbsentReason),
}

impl ShardOutcome {
    /// Whether the shard is usable.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// Per-index outcomes of one fetch, plus the shard size they agree on.
#[derive(Debug, Clone)]
pub struct FetchReport {
    outcomes: Vec<ShardOutcome>,
    shard_size: Option<usize>,
}

impl FetchReport {
    /// Outcomes in index order.
    pub fn outcomes(&self) -> &[ShardOutcome] {
        &self.outcomes
    }

    /// Authoritative shard size, if any shard was present or declared.
    pub fn shard_size(&self) -> Option<usize> {
        self.shard_size
    }

    /// Number of present shards.
    pub fn present_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_present()).count()
    }

    /// Presence flag per index.
    pub fn presence(&self) -> PresenceBitmap {
        let mut bitmap = PresenceBitmap::absent(self.outcomes.len());
        for (index, outcome) in self.outcomes.iter().enumerate() {
            if outcome.is_present() {
                bitmap.set_present(index);
            }
        }
        bitmap
    }

    /// Indices and reasons of every absent shard.
    pub fn absent(&self) -> impl Iterator<Item = (usize, &AbsentReason)> + '_ {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| match o {
                ShardOutcome::Absent(reason) => Some((i, reason)),
                ShardOutcome::Present(_) => None,
            })
    }

    /// One slot per index, `None` where the shard is absent.
    pub fn into_shards(self) -> Vec<Option<Bytes>> {
        self.outcomes
            .into_iter()
            .map(|o| match o {
                ShardOutcome::Present(bytes) => Some(bytes),
                ShardOutcome::Absent(_) => None,
            })
            .collect()
    }
}

/// Fetches every shard of a manifest concurrently.
#[derive(Clone)]
pub struct ShardFetcher {
    reader: Arc<dyn ShardReader>,
    config: FetchConfig,
}

type ReadResult = Result<Result<Bytes, NodeError>, Elapsed>;

impl ShardFetcher {
    /// Fetcher reading through `reader`.
    pub fn new(reader: Arc<dyn ShardReader>, config: FetchConfig) -> Self {
        Self { reader, config }
    }

    /// The timing configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch the shards of `manifest`.
    ///
    /// Returns once every shard responded, or as soon as `data_shards` are
    /// present (with `early_exit`). Fails with
    /// [`EngineError::InsufficientShards`] as soon as more than
    /// `parity_shards` are absent, and with [`EngineError::Timeout`] when the
    /// deadline passes first. Outstanding reads are aborted either way.
    pub async fn fetch(
        &self,
        manifest: &ShardManifest,
        erasure: ErasureConfig,
    ) -> Result<FetchReport, EngineError> {
        let declared_size = manifest.validate(&erasure)?;
        let needed = erasure.data_shards;
        let deadline = Instant::now() + self.config.deadline;

        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::new();
        for (index, descriptor) in manifest.descriptors().iter().cloned().enumerate() {
            let reader = self.reader.clone();
            let shard_timeout = self.config.shard_timeout;
            let handle = tasks.spawn(async move {
                let result: ReadResult =
                    tokio::time::timeout(shard_timeout, reader.read_shard(&descriptor)).await;
                (index, descriptor, result)
            });
            task_index.insert(handle.id(), index);
        }

        let mut collector = Collector::new(erasure.total_shards(), declared_size);

        loop {
            if collector.absent > erasure.parity_shards {
                tasks.abort_all();
                warn!(
                    needed,
                    present = collector.present,
                    absent = collector.absent,
                    "too many shards absent, object unrecoverable"
                );
                return Err(EngineError::InsufficientShards {
                    needed,
                    present: collector.present,
                });
            }
            if self.config.early_exit && collector.present >= needed {
                break;
            }

            let joined = match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                Ok(Some(joined)) => joined,
                Ok(None) => break,
                Err(_) if collector.present >= needed => break,
                Err(_) => {
                    tasks.abort_all();
                    warn!(
                        deadline_ms = self.config.deadline.as_millis() as u64,
                        needed,
                        present = collector.present,
                        "shard fetch deadline elapsed"
                    );
                    return Err(EngineError::Timeout {
                        deadline: self.config.deadline,
                        present: collector.present,
                        needed,
                    });
                }
            };

            match joined {
                Ok((_, (index, descriptor, result))) => collector.record(index, &descriptor, result),
                Err(e) => {
                    if let Some(&index) = task_index.get(&e.id()) {
                        warn!(index, error = %e, "shard fetch task failed");
                        collector.mark_absent(index, AbsentReason::ReadFailed(e.to_string()));
                    }
                }
            }
        }

        tasks.abort_all();
        let report = collector.finish();
        debug!(
            present = report.present_count(),
            shard_size = ?report.shard_size(),
            "shard fetch complete"
        );
        Ok(report)
    }
}

/// Accumulates outcomes as fetch tasks complete.
struct Collector {
    slots: Vec<Option<ShardOutcome>>,
    shard_size: Option<usize>,
    present: usize,
    absent: usize,
}

impl Collector {
    fn new(total: usize, declared_size: Option<usize>) -> Self {
        Self {
            slots: vec![None; total],
            shard_size: declared_size,
            present: 0,
            absent: 0,
        }
    }

    fn record(&mut self, index: usize, descriptor: &ShardDescriptor, result: ReadResult) {
        let bytes = match result {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                debug!(index, node = %descriptor.node, path = %descriptor.path, error = %e, "shard absent");
                let reason = match e {
                    NodeError::Unreachable(_) => AbsentReason::Unreachable,
                    NodeError::NotFound { .. } => AbsentReason::NotFound,
                    NodeError::Store(e) => AbsentReason::ReadFailed(e.to_string()),
                };
                self.mark_absent(index, reason);
                return;
            }
            Err(_) => {
                debug!(index, node = %descriptor.node, path = %descriptor.path, "shard read timed out");
                self.mark_absent(index, AbsentReason::TimedOut);
                return;
            }
        };

        if let Some(checksum) = &descriptor.checksum
            && !checksum.matches(&bytes)
        {
            warn!(
                index,
                node = %descriptor.node,
                path = %descriptor.path,
                "shard checksum mismatch, treating as absent"
            );
            self.mark_absent(index, AbsentReason::ChecksumMismatch);
            return;
        }

        match self.shard_size {
            Some(expected) if bytes.len() != expected => {
                warn!(
                    index,
                    node = %descriptor.node,
                    path = %descriptor.path,
                    expected,
                    actual = bytes.len(),
                    "shard size mismatch, treating as corrupt"
                );
                self.mark_absent(
                    index,
                    AbsentReason::SizeMismatch {
                        expected,
                        actual: bytes.len(),
                    },
                );
            }
            _ => {
                self.shard_size.get_or_insert(bytes.len());
                debug!(index, size = bytes.len(), "shard present");
                self.slots[index] = Some(ShardOutcome::Present(bytes));
                self.present += 1;
            }
        }
    }

    fn mark_absent(&mut self, index: usize, reason: AbsentReason) {
        self.slots[index] = Some(ShardOutcome::Absent(reason));
        self.absent += 1;
    }

    fn finish(self) -> FetchReport {
        FetchReport {
            outcomes: self
                .slots
                .into_iter()
                .map(|slot| slot.unwrap_or(ShardOutcome::Absent(AbsentReason::Abandoned)))
                .collect(),
            shard_size: self.shard_size,
        }
    }
}
