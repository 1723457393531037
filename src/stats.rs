//! Engine statistics counters.
//!
//! Two monotonically increasing counters, incremented by the producer once
//! per production cycle and read by anyone at any time. Reads are plain
//! atomic loads and never slow the producer down. Counters survive
//! reconfiguration and are never reset for the life of the engine.
//!
//! Evicted (overwritten) samples are deliberately not tracked: the total
//! counts productions, whether or not the push displaced an unread sample.

use core::sync::atomic::{AtomicU64, Ordering};
use std::fmt::Write as _;

/// Thread-safe counter block.
pub struct EngineStats {
    /// Samples produced since engine start.
    total_samples: AtomicU64,

    /// Threshold crossings detected since engine start.
    threshold_crossings: AtomicU64,
}

impl EngineStats {
    pub const fn new() -> Self {
        Self {
            total_samples: AtomicU64::new(0),
            threshold_crossings: AtomicU64::new(0),
        }
    }

    /// Record one production cycle.
    #[inline]
    pub fn record_sample(&self, crossed: bool) {
        self.total_samples.fetch_add(1, Ordering::Relaxed);
        if crossed {
            self.threshold_crossings.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn total_samples(&self) -> u64 {
        self.total_samples.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn threshold_crossings(&self) -> u64 {
        self.threshold_crossings.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of both counters.
    #[inline]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_samples: self.total_samples(),
            threshold_crossings: self.threshold_crossings(),
        }
    }

    /// Format the counters as the `key=value` lines exposed on the
    /// read-only `stats` attribute.
    pub fn format(&self) -> String {
        let snap = self.snapshot();
        let mut out = String::with_capacity(64);
        // Writes to a String cannot fail.
        let _ = writeln!(out, "total_samples={}", snap.total_samples);
        let _ = writeln!(out, "threshold_crossings={}", snap.threshold_crossings);
        out
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters captured at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_samples: u64,
    pub threshold_crossings: u64,
}
