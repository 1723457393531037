//! The sampling/delivery engine.
//!
//! One producer thread per engine, running a two-phase cycle:
//!
//! ```text
//! Trigger (time-critical)          Production (deferred work)
//! ───────────────────────          ──────────────────────────
//! wait until deadline      ──────▶ generate → detect → push ring
//! re-arm from "now"                bump counters, wake readers
//! ```
//!
//! The trigger phase only computes deadlines and hands off; all real work
//! happens in the production phase with no lock held across it. Deadlines
//! are always re-armed relative to the current time, so a stall produces
//! one late sample instead of a burst of catch-up firings.
//!
//! Consumers block on a `Condvar` retry loop and only ever receive copies
//! of popped samples; the ring's spinlock is never held across a wait.
//!
//! Shutdown is ordered: stop the trigger, join the in-flight production,
//! then wake every blocked reader with `ReadError::Shutdown`. Start is the
//! reverse: all state exists before the producer thread does.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::config::EngineConfig;
use crate::detector::ThresholdDetector;
use crate::error::{ConfigError, ReadError};
use crate::generator::{Mode, SampleGenerator};
use crate::ring::{SampleRing, DEFAULT_RING_CAPACITY};
use crate::sample::{Sample, RECORD_SIZE};
use crate::stats::{EngineStats, StatsSnapshot};

/// Locks a std mutex, ignoring poisoning (a panicked writer leaves no
/// invalid state behind: everything guarded here is plain data).
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Timer control word. Held only around cancel/reconfigure/restart so a
/// period change cannot race a trigger firing.
struct TimerCtl {
    /// Bumped on every timer restart request.
    epoch: u64,
}

/// State shared between the engine handle and the producer thread.
struct Shared {
    ring: SampleRing<DEFAULT_RING_CAPACITY>,
    config: EngineConfig,
    stats: EngineStats,

    /// Cleared once, at shutdown. Readers re-check it on every wakeup.
    running: AtomicBool,

    /// Serializes period reconfiguration against trigger firings.
    timer: Mutex<TimerCtl>,
    timer_cv: Condvar,

    /// Wait gate for blocked readers. Never held while popping more than
    /// one sample; the ring has its own O(1) lock.
    gate: Mutex<()>,
    data_cv: Condvar,

    /// Zero point for sample timestamps.
    origin: Instant,
}

impl Shared {
    /// One production cycle: read the committed config fresh, generate,
    /// detect, publish, account, wake.
    fn produce(&self, generator: &mut SampleGenerator, detector: &mut ThresholdDetector) {
        let mode = self.config.mode();
        let threshold = self.config.threshold_mc();

        let temp_mc = generator.next(mode);
        let crossed = detector.check(temp_mc, threshold);
        let timestamp_ns = self.origin.elapsed().as_nanos() as u64;

        self.ring.push(Sample::new(timestamp_ns, temp_mc, crossed));
        self.stats.record_sample(crossed);

        if crossed {
            log::trace!("threshold crossing at {temp_mc} m°C (threshold {threshold})");
        }

        // Lock-then-drop pairs the notify with the readers' empty check,
        // so a push between "saw empty" and "wait" cannot lose the wakeup.
        drop(lock(&self.gate));
        self.data_cv.notify_all();
    }
}

/// The simulated sensor engine.
///
/// Explicitly constructed and explicitly owned; there is no global device
/// state. Any number of threads may read samples and write configuration
/// concurrently through a shared reference. Dropping the engine shuts it
/// down and joins the producer thread.
pub struct SimtempEngine {
    shared: Arc<Shared>,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl SimtempEngine {
    /// Build the engine state and start the producer thread.
    ///
    /// Fails only if the thread cannot be spawned; in that case nothing is
    /// left running and no partially constructed engine escapes.
    pub fn start() -> io::Result<Self> {
        let shared = Arc::new(Shared {
            ring: SampleRing::new(),
            config: EngineConfig::new(),
            stats: EngineStats::new(),
            running: AtomicBool::new(true),
            timer: Mutex::new(TimerCtl { epoch: 0 }),
            timer_cv: Condvar::new(),
            gate: Mutex::new(()),
            data_cv: Condvar::new(),
            origin: Instant::now(),
        });

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15);

        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("simtemp-producer".into())
            .spawn(move || producer_loop(worker, seed))?;

        log::info!(
            "simtemp engine started (period {} ms, capacity {})",
            shared.config.sampling_ms(),
            shared.ring.capacity()
        );

        Ok(Self {
            shared,
            producer: Mutex::new(Some(handle)),
        })
    }

    // --- Consumer gateway -------------------------------------------------

    /// Non-blocking read. An empty buffer is a would-block condition, not
    /// a failure of the engine.
    pub fn try_read(&self) -> Result<Sample, ReadError> {
        match self.shared.ring.pop() {
            Some(sample) => Ok(sample),
            None if self.shared.running.load(Ordering::Acquire) => Err(ReadError::WouldBlock),
            None => Err(ReadError::Shutdown),
        }
    }

    /// Blocking read: suspends the caller until a sample arrives or the
    /// engine shuts down. Safe against spurious wakeups and competing
    /// readers; each sample is delivered to exactly one of them.
    pub fn read_blocking(&self) -> Result<Sample, ReadError> {
        let mut gate = lock(&self.shared.gate);
        loop {
            if let Some(sample) = self.shared.ring.pop() {
                return Ok(sample);
            }
            if !self.shared.running.load(Ordering::Acquire) {
                return Err(ReadError::Shutdown);
            }
            gate = self
                .shared
                .data_cv
                .wait(gate)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocking read with a caller-side deadline. Expiry surfaces as
    /// `Interrupted`, distinct from both would-block and data.
    pub fn read_timeout(&self, timeout: Duration) -> Result<Sample, ReadError> {
        let deadline = Instant::now() + timeout;
        let mut gate = lock(&self.shared.gate);
        loop {
            if let Some(sample) = self.shared.ring.pop() {
                return Ok(sample);
            }
            if !self.shared.running.load(Ordering::Acquire) {
                return Err(ReadError::Shutdown);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ReadError::Interrupted);
            }
            gate = self
                .shared
                .data_cv
                .wait_timeout(gate, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Readiness query: true exactly when at least one sample is waiting.
    /// Integrable into any caller-side event loop; crossing samples are
    /// distinguished by inspecting the flag bits after reading.
    pub fn poll_ready(&self) -> bool {
        !self.shared.ring.is_empty()
    }

    /// Byte-channel read: one full 16-byte record or nothing.
    ///
    /// A destination smaller than [`RECORD_SIZE`] is an input-size error
    /// and consumes no sample. On success exactly `RECORD_SIZE` bytes are
    /// written and their count returned.
    pub fn read_record(&self, buf: &mut [u8], blocking: bool) -> Result<usize, ReadError> {
        if buf.len() < RECORD_SIZE {
            return Err(ReadError::short(buf.len()));
        }
        let sample = if blocking {
            self.read_blocking()?
        } else {
            self.try_read()?
        };
        buf[..RECORD_SIZE].copy_from_slice(&sample.to_bytes());
        Ok(RECORD_SIZE)
    }

    /// Discard all pending samples, returning how many were dropped.
    /// Lets a caller observe only post-reconfiguration data.
    pub fn drain(&self) -> usize {
        let mut count = 0;
        while self.shared.ring.pop().is_some() {
            count += 1;
        }
        count
    }

    // --- Configuration surface --------------------------------------------

    /// Write one text attribute (`sampling_ms`, `threshold_mC`, `mode`).
    /// Whole-value, newline-tolerant; a rejected write changes nothing.
    pub fn write_attr(&self, attr: &str, text: &str) -> Result<(), ConfigError> {
        self.shared.config.write_text(attr, text)?;
        if attr == "sampling_ms" {
            self.restart_timer();
        }
        log::debug!("attribute {attr} set to {:?}", text.trim());
        Ok(())
    }

    /// Read one text attribute, including the read-only `stats` block.
    pub fn read_attr(&self, attr: &str) -> Result<String, ConfigError> {
        if attr == "stats" {
            return Ok(self.shared.stats.format());
        }
        self.shared.config.read_text(attr)
    }

    /// Typed accessors over the same validated parameters.
    pub fn set_sampling_ms(&self, value: u32) -> Result<(), ConfigError> {
        self.shared.config.set_sampling_ms(value)?;
        self.restart_timer();
        Ok(())
    }

    pub fn set_threshold_mc(&self, value: i32) -> Result<(), ConfigError> {
        self.shared.config.set_threshold_mc(value)
    }

    pub fn set_mode(&self, mode: Mode) {
        self.shared.config.set_mode(mode);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Point-in-time counter snapshot. Never blocks the producer.
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    // --- Lifecycle ---------------------------------------------------------

    /// Stop sampling and release the producer thread. Safe to call more
    /// than once; blocked readers are woken with `ReadError::Shutdown`.
    pub fn shutdown(&self) {
        // 1. Stop the trigger so no new production is scheduled.
        {
            let mut ctl = lock(&self.shared.timer);
            self.shared.running.store(false, Ordering::Release);
            ctl.epoch += 1;
        }
        self.shared.timer_cv.notify_all();

        // 2. Wait for any in-flight production to finish.
        if let Some(handle) = lock(&self.producer).take() {
            let _ = handle.join();
            log::info!("simtemp engine stopped after {} samples", self.shared.stats.total_samples());
        }

        // 3. Wake everyone still blocked on the data channel.
        drop(lock(&self.shared.gate));
        self.shared.data_cv.notify_all();
    }

    /// Cancel the pending trigger and restart it with the current period,
    /// measured from now. Serialized against firings by the timer lock.
    fn restart_timer(&self) {
        {
            let mut ctl = lock(&self.shared.timer);
            ctl.epoch += 1;
        }
        self.shared.timer_cv.notify_all();
        log::debug!("timer restarted, period {} ms", self.shared.config.sampling_ms());
    }
}

impl Drop for SimtempEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Producer thread body.
fn producer_loop(shared: Arc<Shared>, seed: u64) {
    let mut generator = SampleGenerator::new(seed);
    let mut detector = ThresholdDetector::new();

    let period = |ms: u32| Duration::from_millis(u64::from(ms));
    let mut deadline = Instant::now() + period(shared.config.sampling_ms());
    let mut seen_epoch = lock(&shared.timer).epoch;

    loop {
        // Trigger phase: nothing here but deadline bookkeeping.
        {
            let mut ctl = lock(&shared.timer);
            loop {
                if !shared.running.load(Ordering::Acquire) {
                    return;
                }
                if ctl.epoch != seen_epoch {
                    // Period write cancelled the timer: restart from now.
                    seen_epoch = ctl.epoch;
                    deadline = Instant::now() + period(shared.config.sampling_ms());
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                ctl = shared
                    .timer_cv
                    .wait_timeout(ctl, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            // Re-arm relative to now, not the intended schedule point: a
            // late firing must not trigger a storm of catch-up cycles.
            deadline = Instant::now() + period(shared.config.sampling_ms());
        }

        // Production phase, no lock held from the trigger.
        shared.produce(&mut generator, &mut detector);
    }
}
