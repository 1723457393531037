//! Engine configuration parameters.
//!
//! Three independently settable parameters, each validated before apply.
//! All fields are atomics so the producer reads the committed values fresh
//! every cycle without taking a lock. An invalid write changes nothing.
//!
//! Attribute names on the text surface keep the original device casing
//! (`threshold_mC`, milli-degrees Celsius); existing clients depend on it.

use core::sync::atomic::{AtomicI32, AtomicU32, AtomicU8, Ordering};

use crate::error::ConfigError;
use crate::generator::Mode;

/// Accepted sampling period range, in milliseconds.
pub const SAMPLING_MS_MIN: u32 = 1;
pub const SAMPLING_MS_MAX: u32 = 10_000;

/// Accepted alert threshold range, in milli-degrees. Covers the plausible
/// range of a real silicon temperature sensor.
pub const THRESHOLD_MC_MIN: i32 = -40_000;
pub const THRESHOLD_MC_MAX: i32 = 125_000;

/// Defaults applied at engine start.
pub const DEFAULT_SAMPLING_MS: u32 = 100;
pub const DEFAULT_THRESHOLD_MC: i32 = 42_000;
pub const DEFAULT_MODE: Mode = Mode::Normal;

/// Concurrently writable parameter block.
pub struct EngineConfig {
    sampling_ms: AtomicU32,
    threshold_mc: AtomicI32,
    mode: AtomicU8,
}

impl EngineConfig {
    pub const fn new() -> Self {
        Self {
            sampling_ms: AtomicU32::new(DEFAULT_SAMPLING_MS),
            threshold_mc: AtomicI32::new(DEFAULT_THRESHOLD_MC),
            mode: AtomicU8::new(DEFAULT_MODE as u8),
        }
    }

    #[inline]
    pub fn sampling_ms(&self) -> u32 {
        self.sampling_ms.load(Ordering::Acquire)
    }

    #[inline]
    pub fn threshold_mc(&self) -> i32 {
        self.threshold_mc.load(Ordering::Acquire)
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Set the sampling period. Takes effect when the scheduler restarts
    /// its timer, which the engine does on every successful call.
    pub fn set_sampling_ms(&self, value: u32) -> Result<(), ConfigError> {
        if !(SAMPLING_MS_MIN..=SAMPLING_MS_MAX).contains(&value) {
            return Err(ConfigError::OutOfRange {
                attr: "sampling_ms",
                value: i64::from(value),
                min: i64::from(SAMPLING_MS_MIN),
                max: i64::from(SAMPLING_MS_MAX),
            });
        }
        self.sampling_ms.store(value, Ordering::Release);
        Ok(())
    }

    /// Set the alert threshold. Takes effect on the next production cycle.
    pub fn set_threshold_mc(&self, value: i32) -> Result<(), ConfigError> {
        if !(THRESHOLD_MC_MIN..=THRESHOLD_MC_MAX).contains(&value) {
            return Err(ConfigError::OutOfRange {
                attr: "threshold_mC",
                value: i64::from(value),
                min: i64::from(THRESHOLD_MC_MIN),
                max: i64::from(THRESHOLD_MC_MAX),
            });
        }
        self.threshold_mc.store(value, Ordering::Release);
        Ok(())
    }

    /// Set the generation mode. Takes effect on the next production cycle.
    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    /// Parse-and-set from boundary text. Trailing whitespace/newlines are
    /// tolerated (the attribute channel is newline-terminated text).
    pub fn write_text(&self, attr: &str, text: &str) -> Result<(), ConfigError> {
        let text = text.trim();
        match attr {
            "sampling_ms" => {
                let value: u32 = text.parse().map_err(|_| ConfigError::Malformed {
                    attr: "sampling_ms",
                    text: text.to_string(),
                })?;
                self.set_sampling_ms(value)
            }
            "threshold_mC" => {
                let value: i32 = text.parse().map_err(|_| ConfigError::Malformed {
                    attr: "threshold_mC",
                    text: text.to_string(),
                })?;
                self.set_threshold_mc(value)
            }
            "mode" => {
                let mode: Mode = text.parse()?;
                self.set_mode(mode);
                Ok(())
            }
            "stats" => Err(ConfigError::ReadOnly("stats")),
            other => Err(ConfigError::UnknownAttr(other.to_string())),
        }
    }

    /// Format one read/write attribute as boundary text.
    pub fn read_text(&self, attr: &str) -> Result<String, ConfigError> {
        match attr {
            "sampling_ms" => Ok(self.sampling_ms().to_string()),
            "threshold_mC" => Ok(self.threshold_mc().to_string()),
            "mode" => Ok(self.mode().to_string()),
            other => Err(ConfigError::UnknownAttr(other.to_string())),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
