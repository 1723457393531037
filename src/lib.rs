//! # simtemp
//!
//! A simulated periodic temperature sensor with bounded, low-latency
//! sample delivery and race-free live reconfiguration.
//!
//! ## Architecture
//!
//! All data flows one way through the engine:
//!
//! ```text
//! Scheduler ─▶ Generator ─▶ Detector ─▶ SampleRing ─(wake)─▶ readers
//!                  ▲             ▲
//!                  └── EngineConfig (concurrent writers) ──┘
//! ```
//!
//! - One producer thread per engine; it never blocks on consumer behavior
//!   (a full ring evicts the oldest sample instead).
//! - Any number of concurrent readers; each popped sample is delivered to
//!   exactly one of them, in production order.
//! - Configuration writes are validated whole-value and take effect
//!   atomically with respect to the producer.

pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod generator;
pub mod ring;
pub mod sample;
pub mod stats;

pub use config::EngineConfig;
pub use detector::ThresholdDetector;
pub use engine::SimtempEngine;
pub use error::{ConfigError, ReadError};
pub use generator::{Mode, SampleGenerator};
pub use ring::SampleRing;
pub use sample::{Sample, SampleFlags, RECORD_SIZE};
pub use stats::{EngineStats, StatsSnapshot};
