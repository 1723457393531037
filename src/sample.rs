//! Module: sample
//!
//! Purpose: the Sample record produced once per sampling period. Represents
//! one reading of the simulated sensor at a specific monotonic instant.
//!
//! Architecture:
//! - Compact 16-byte record, no padding (wire-compatible with the byte channel)
//! - Timestamps are monotonic nanoseconds since engine start
//! - Temperature is milli-degrees Celsius (signed integer, no floats on the hot path)
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

use bitflags::bitflags;

/// Size of one encoded sample record on the byte channel.
///
/// Layout: `[timestamp_ns: 8][temp_mc: 4][flags: 4]`, little-endian,
/// no padding. A read request smaller than this is rejected whole.
pub const RECORD_SIZE: usize = 16;

bitflags! {
    /// Per-sample flag bitset.
    ///
    /// Serialized as the low 32 bits of the record. Bit positions are part
    /// of the wire format and must not change.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SampleFlags: u32 {
        /// Set on every produced sample.
        const NEW = 1 << 0;
        /// The reading crossed the configured threshold (sign change of
        /// `temp - threshold` relative to the previous sample).
        const THRESHOLD_CROSSED = 1 << 1;
    }
}

/// A single sensor reading.
///
/// Created once per production cycle, copied into the ring buffer, and
/// handed to consumers by value. Never mutated after creation.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Monotonic timestamp in nanoseconds since engine start.
    pub timestamp_ns: u64,

    /// Temperature in milli-degrees Celsius (42_123 = 42.123 °C).
    pub temp_mc: i32,

    /// Flag bitset, see [`SampleFlags`].
    pub flags: SampleFlags,
}

impl Sample {
    /// A zeroed sample, used for buffer initialization and tests.
    pub const EMPTY: Self = Self {
        timestamp_ns: 0,
        temp_mc: 0,
        flags: SampleFlags::empty(),
    };

    /// Build a freshly produced sample. The NEW flag is always set.
    pub fn new(timestamp_ns: u64, temp_mc: i32, crossed: bool) -> Self {
        let mut flags = SampleFlags::NEW;
        if crossed {
            flags |= SampleFlags::THRESHOLD_CROSSED;
        }
        Self {
            timestamp_ns,
            temp_mc,
            flags,
        }
    }

    /// True if this reading crossed the threshold.
    pub fn crossed(&self) -> bool {
        self.flags.contains(SampleFlags::THRESHOLD_CROSSED)
    }

    /// Encode into the fixed 16-byte record format.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..8].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        buf[8..12].copy_from_slice(&self.temp_mc.to_le_bytes());
        buf[12..16].copy_from_slice(&self.flags.bits().to_le_bytes());
        buf
    }

    /// Decode from the fixed 16-byte record format.
    ///
    /// Unknown flag bits are preserved as-is so a newer producer can talk
    /// to an older consumer.
    pub fn from_bytes(buf: &[u8; RECORD_SIZE]) -> Self {
        let timestamp_ns = u64::from_le_bytes([
            buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
        ]);
        let temp_mc = i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let flags =
            SampleFlags::from_bits_retain(u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]));
        Self {
            timestamp_ns,
            temp_mc,
            flags,
        }
    }
}
