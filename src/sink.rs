//! Shared, append-only store of latency samples
//!
//! Receive loops append through [`LatencySink::record`]; the run reads the
//! samples exactly once with [`LatencySink::take`] after every writer task
//! has been joined.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct SinkInner {
    samples: Mutex<Vec<u64>>,
    dropped_malformed: AtomicU64,
    dropped_skewed: AtomicU64,
}

/// Cloneable handle to the run's latency samples (microseconds)
#[derive(Debug, Clone, Default)]
pub struct LatencySink {
    inner: Arc<SinkInner>,
}

/// Counters of payloads that produced no sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub malformed: u64,
    pub skewed: u64,
}

impl LatencySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn samples(&self) -> MutexGuard<'_, Vec<u64>> {
        // A panicking writer cannot leave a Vec half-pushed; keep its data.
        self.inner.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one sample in arrival order
    pub fn record(&self, latency_us: u64) {
        self.samples().push(latency_us);
    }

    /// Count a payload that failed to decode
    pub fn note_malformed(&self) {
        self.inner.dropped_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a message stamped in the receiver's future
    pub fn note_skewed(&self) {
        self.inner.dropped_skewed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.samples().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dropped(&self) -> DropCounts {
        DropCounts {
            malformed: self.inner.dropped_malformed.load(Ordering::Relaxed),
            skewed: self.inner.dropped_skewed.load(Ordering::Relaxed),
        }
    }

    /// Copy of the samples recorded so far
    pub fn snapshot(&self) -> Vec<u64> {
        self.samples().clone()
    }

    /// Remove and return every sample. Call once, after all writers stopped.
    pub fn take(&self) -> Vec<u64> {
        std::mem::take(&mut *self.samples())
    }
}
