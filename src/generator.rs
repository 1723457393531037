//! Synthetic temperature source.
//!
//! Pure logic, no hardware dependencies. Threads its own state explicitly
//! (previous ramp value, PRNG words); fully testable on host.
//!
//! # Modes
//!
//! - **Normal**: constant reading.
//! - **Noisy**: uniform jitter in a fixed band around the baseline.
//! - **Ramp**: sawtooth from the band floor to the band ceiling, then wrap.

use core::fmt;
use core::str::FromStr;

use crate::error::ConfigError;

/// Baseline reading for Normal and Noisy modes, in milli-degrees.
pub const BASELINE_MC: i32 = 42_123;

/// Half-width of the Noisy jitter band, in milli-degrees.
pub const NOISE_SPAN_MC: i32 = 2_000;

/// Lowest value the Ramp emits (and the wrap target), in milli-degrees.
pub const RAMP_FLOOR_MC: i32 = 20_000;

/// Highest value the Ramp may emit before wrapping, in milli-degrees.
pub const RAMP_CEIL_MC: i32 = 45_000;

/// Per-sample Ramp increment, in milli-degrees.
pub const RAMP_STEP_MC: i32 = 123;

/// Generation mode. Stored as a small integer in the engine config;
/// text parsing/formatting happens only at the configuration boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    Normal = 0,
    Noisy = 1,
    Ramp = 2,
}

impl Mode {
    /// Convert from the raw config byte. Unknown values fall back to Normal;
    /// they cannot occur through the validated setter.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Mode::Noisy,
            2 => Mode::Ramp,
            _ => Mode::Normal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Noisy => "noisy",
            Mode::Ramp => "ramp",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Normal
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Mode::Normal),
            "noisy" => Ok(Mode::Noisy),
            "ramp" => Ok(Mode::Ramp),
            other => Err(ConfigError::BadMode(other.to_string())),
        }
    }
}

/// Stateful sample source. One instance lives on the producer thread; the
/// ramp position and PRNG words survive mode switches so returning to Ramp
/// resumes where it left off.
#[derive(Debug)]
pub struct SampleGenerator {
    /// Last emitted ramp value; primed so the first Ramp reading is the floor.
    ramp_mc: i32,
    /// xoshiro256** state for Noisy mode.
    rng_state: [u64; 4],
}

impl SampleGenerator {
    pub fn new(seed: u64) -> Self {
        // splitmix64 expansion of the seed, standard xoshiro initialization.
        let mut s = seed;
        let mut next = || {
            s = s.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = s;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^ (z >> 31)
        };
        Self {
            ramp_mc: RAMP_FLOOR_MC - RAMP_STEP_MC,
            rng_state: [next(), next(), next(), next()],
        }
    }

    /// Produce the next raw temperature for the given mode.
    pub fn next(&mut self, mode: Mode) -> i32 {
        match mode {
            Mode::Normal => BASELINE_MC,
            Mode::Noisy => {
                let span = (2 * NOISE_SPAN_MC + 1) as u64;
                let offset = (self.next_u64() % span) as i32 - NOISE_SPAN_MC;
                BASELINE_MC + offset
            }
            Mode::Ramp => {
                let mut next = self.ramp_mc + RAMP_STEP_MC;
                if next > RAMP_CEIL_MC {
                    next = RAMP_FLOOR_MC; // sawtooth, not a bounce
                }
                self.ramp_mc = next;
                next
            }
        }
    }

    /// xoshiro256** next word.
    fn next_u64(&mut self) -> u64 {
        let s = &mut self.rng_state;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;
        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_is_constant() {
        let mut gen = SampleGenerator::new(1);
        for _ in 0..10 {
            assert_eq!(gen.next(Mode::Normal), BASELINE_MC);
        }
    }

    #[test]
    fn test_noisy_stays_in_band() {
        let mut gen = SampleGenerator::new(7);
        for _ in 0..1_000 {
            let v = gen.next(Mode::Noisy);
            assert!(v >= BASELINE_MC - NOISE_SPAN_MC);
            assert!(v <= BASELINE_MC + NOISE_SPAN_MC);
        }
    }

    #[test]
    fn test_noisy_actually_varies() {
        let mut gen = SampleGenerator::new(7);
        let first = gen.next(Mode::Noisy);
        let varied = (0..100).any(|_| gen.next(Mode::Noisy) != first);
        assert!(varied);
    }

    #[test]
    fn test_ramp_starts_at_floor() {
        let mut gen = SampleGenerator::new(0);
        assert_eq!(gen.next(Mode::Ramp), RAMP_FLOOR_MC);
        assert_eq!(gen.next(Mode::Ramp), RAMP_FLOOR_MC + RAMP_STEP_MC);
    }

    #[test]
    fn test_ramp_wraps_to_floor() {
        let mut gen = SampleGenerator::new(0);
        let mut prev = gen.next(Mode::Ramp);
        let mut wrapped = false;
        // One full sweep plus a little extra.
        for _ in 0..((RAMP_CEIL_MC - RAMP_FLOOR_MC) / RAMP_STEP_MC + 2) {
            let v = gen.next(Mode::Ramp);
            if v < prev {
                assert_eq!(v, RAMP_FLOOR_MC);
                wrapped = true;
            } else {
                assert_eq!(v, prev + RAMP_STEP_MC);
            }
            assert!(v >= RAMP_FLOOR_MC && v <= RAMP_CEIL_MC);
            prev = v;
        }
        assert!(wrapped);
    }

    #[test]
    fn test_ramp_position_survives_mode_switch() {
        let mut gen = SampleGenerator::new(0);
        let a = gen.next(Mode::Ramp);
        let _ = gen.next(Mode::Normal);
        let b = gen.next(Mode::Ramp);
        assert_eq!(b, a + RAMP_STEP_MC);
    }

    #[test]
    fn test_mode_text_round_trip() {
        for mode in [Mode::Normal, Mode::Noisy, Mode::Ramp] {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
        assert!("invalid".parse::<Mode>().is_err());
        assert!("RAMP".parse::<Mode>().is_err());
    }
}
