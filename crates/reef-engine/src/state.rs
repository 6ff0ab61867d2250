//! Lifecycle of one decode request.
//!
//! ```text
//! PendingFetch ──► Fetched ──► Reconstructing ──► Assembled
//!      │                             │
//!      ├──► Insufficient             └──► ReconstructionFailed
//!      └──► TimedOut
//! ```
//!
//! `Assembled` is the only successful terminal state.

use std::fmt;
use std::time::Instant;

use tracing::debug;

use crate::error::EngineError;

/// Where a decode request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeState {
    /// Shard fetches are in flight.
    PendingFetch,
    /// At least `data_shards` shards arrived intact.
    Fetched,
    /// Too many shards are absent.
    Insufficient,
    /// The deadline passed before the fetch reached a verdict.
    TimedOut,
    /// Missing data shards are being rebuilt.
    Reconstructing,
    /// The payload was recovered.
    Assembled,
    /// Reconstruction or assembly failed.
    ReconstructionFailed,
}

impl DecodeState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Insufficient | Self::TimedOut | Self::Assembled | Self::ReconstructionFailed
        )
    }

    /// Whether moving from `self` to `next` is legal.
    pub fn can_transition_to(self, next: DecodeState) -> bool {
        use DecodeState::*;
        matches!(
            (self, next),
            (PendingFetch, Fetched | Insufficient | TimedOut)
                | (Fetched, Reconstructing)
                | (Reconstructing, Assembled | ReconstructionFailed)
        )
    }
}

impl fmt::Display for DecodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PendingFetch => "pending_fetch",
            Self::Fetched => "fetched",
            Self::Insufficient => "insufficient",
            Self::TimedOut => "timed_out",
            Self::Reconstructing => "reconstructing",
            Self::Assembled => "assembled",
            Self::ReconstructionFailed => "reconstruction_failed",
        };
        f.write_str(name)
    }
}

/// Tracks the state of one decode request and rejects illegal moves.
#[derive(Debug)]
pub struct DecodeTracker {
    state: DecodeState,
    started: Instant,
}

impl DecodeTracker {
    /// A new request, waiting on its fetches.
    pub fn new() -> Self {
        Self {
            state: DecodeState::PendingFetch,
            started: Instant::now(),
        }
    }

    /// Current state.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Move to `next`, or fail without changing state.
    pub fn transition(&mut self, next: DecodeState) -> Result<(), EngineError> {
        if !self.state.can_transition_to(next) {
            return Err(EngineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(
            from = %self.state,
            to = %next,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "decode state transition"
        );
        self.state = next;
        Ok(())
    }
}

impl Default for DecodeTracker {
    fn default() -> Self {
        Self::new()
    }
}
