//! Bounded sample ring buffer.
//!
//! Fixed-capacity circular store with an evict-oldest policy: the producer
//! never blocks and never fails, a slow consumer loses the oldest unread
//! samples instead. All operations run inside one short `spin::Mutex`
//! critical section doing only index arithmetic and a 16-byte copy — no
//! allocation, no formatting, nothing that can sleep. That keeps the
//! producer's time-sensitive path safe to call from a context that must
//! not suspend.
//!
//! N must be a power of 2 for mask indexing.

use spin::Mutex;

use crate::sample::Sample;

/// Ring capacity used by the engine.
pub const DEFAULT_RING_CAPACITY: usize = 64;

struct RingState<const N: usize> {
    slots: [Sample; N],
    /// Next write position (monotonically increasing, wraps via mask).
    write_idx: usize,
    /// Next read position. `read_idx == write_idx` means empty.
    read_idx: usize,
}

/// Evict-oldest sample buffer shared between one producer and any number of
/// concurrent readers. Each popped sample goes to exactly one reader.
pub struct SampleRing<const N: usize = DEFAULT_RING_CAPACITY> {
    state: Mutex<RingState<N>>,
}

impl<const N: usize> SampleRing<N> {
    const MASK: usize = N - 1;

    pub const fn new() -> Self {
        // Compile-time check that N is power of 2
        const { assert!(N.is_power_of_two(), "Ring capacity must be power of 2") };

        Self {
            state: Mutex::new(RingState {
                slots: [Sample::EMPTY; N],
                write_idx: 0,
                read_idx: 0,
            }),
        }
    }

    /// Push a sample. Never fails, never blocks beyond the O(1) critical
    /// section; if the ring is full the oldest unread sample is evicted.
    #[inline]
    pub fn push(&self, sample: Sample) {
        let mut st = self.state.lock();

        // Full: advance the read index past the oldest sample.
        if st.write_idx.wrapping_sub(st.read_idx) >= N {
            st.read_idx = st.read_idx.wrapping_add(1);
        }

        let idx = st.write_idx & Self::MASK;
        st.slots[idx] = sample;
        st.write_idx = st.write_idx.wrapping_add(1);
    }

    /// Pop the oldest sample, or `None` if the ring is empty. Non-blocking.
    #[inline]
    pub fn pop(&self) -> Option<Sample> {
        let mut st = self.state.lock();

        if st.read_idx == st.write_idx {
            return None;
        }

        let idx = st.read_idx & Self::MASK;
        let sample = st.slots[idx];
        st.read_idx = st.read_idx.wrapping_add(1);
        Some(sample)
    }

    /// Number of unread samples, at most N.
    #[inline]
    pub fn len(&self) -> usize {
        let st = self.state.lock();
        st.write_idx.wrapping_sub(st.read_idx)
    }

    /// True when there is nothing to read. This is the readiness query:
    /// readable ⇔ `!is_empty()` at the moment of the check.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard all unread samples.
    #[inline]
    pub fn clear(&self) {
        let mut st = self.state.lock();
        st.read_idx = st.write_idx;
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for SampleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
