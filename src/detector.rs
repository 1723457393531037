//! Threshold crossing detector.
//!
//! Turns raw readings into crossing events by watching for a sign change of
//! `temp - threshold` between consecutive samples. A reading that merely
//! stays above the line does not re-signal: only the transition does.
//!
//! A value exactly equal to the threshold counts as "above", so a ramp that
//! lands on the threshold and then steps past it signals exactly once.

/// Per-engine detector state. Mutated exactly once per production cycle by
/// the producer; consumers never see it directly.
#[derive(Debug, Default)]
pub struct ThresholdDetector {
    /// Was the previous accepted sample at or above the threshold?
    /// Starts false, so a first reading already above the line is a crossing.
    was_above: bool,
}

impl ThresholdDetector {
    pub fn new() -> Self {
        Self { was_above: false }
    }

    /// Accept one reading against the current threshold. Returns true when
    /// the side of the threshold changed since the previous reading.
    pub fn check(&mut self, temp_mc: i32, threshold_mc: i32) -> bool {
        let above = temp_mc >= threshold_mc;
        let crossed = above != self.was_above;
        self.was_above = above;
        crossed
    }
}
