//! Conversion of raw GPS fixes into speed samples.
//!
//! Consecutive fixes are turned into (speed, timestamp) samples for the peak
//! detector, after a noise filter: a fix must be at least a few meters away
//! from the anchor and imply a speed above drifting pace.
//!
//! A fix that is merely too close leaves the anchor in place, so slow
//! progress still adds up once it clears the distance filter. A fix that is
//! too slow, or that arrives after a long gap, becomes the new anchor: speed
//! is never averaged over a rest.

use tracing::{debug, warn};

use crate::config::GpsFilterConfig;
use crate::geo::{distance, instantaneous_speed};
use crate::types::{GpsFix, Sample};

/// Why a fix did not produce a speed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    /// First fix of the session; stored as the anchor.
    Anchored,
    /// Accepted; a speed sample was produced.
    Accepted,
    /// Non-finite coordinates.
    Invalid,
    /// Timestamp not after the anchor.
    NoElapsedTime,
    /// Moved less than the minimum displacement.
    TooClose,
    /// Implied speed below the minimum; the fix becomes the anchor.
    TooSlow,
    /// Too long after the anchor to give a current speed; the fix becomes the anchor.
    Stale,
}

/// Tracks distance covered and derives speed from consecutive fixes.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsTracker {
    config: GpsFilterConfig,
    anchor: Option<GpsFix>,
    total_distance_m: f64,
    last_speed_mps: Option<f64>,
    accepted_fixes: u64,
    last_outcome: Option<FixOutcome>,
}

impl GpsTracker {
    pub fn new(config: GpsFilterConfig) -> Self {
        Self {
            config,
            anchor: None,
            total_distance_m: 0.0,
            last_speed_mps: None,
            accepted_fixes: 0,
            last_outcome: None,
        }
    }

    /// Feed one fix. Returns a speed sample when the fix passes the filter.
    pub fn observe_fix(&mut self, fix: GpsFix) -> Option<Sample> {
        let (outcome, sample) = self.evaluate(fix);
        self.last_outcome = Some(outcome);
        sample
    }

    fn evaluate(&mut self, fix: GpsFix) -> (FixOutcome, Option<Sample>) {
        if !fix.lat.is_finite() || !fix.lng.is_finite() {
            warn!(lat = fix.lat, lng = fix.lng, "non-finite GPS fix ignored");
            return (FixOutcome::Invalid, None);
        }

        let Some(anchor) = self.anchor else {
            self.anchor = Some(fix);
            return (FixOutcome::Anchored, None);
        };

        if fix.timestamp_ms <= anchor.timestamp_ms {
            warn!(
                anchor_ms = anchor.timestamp_ms,
                timestamp_ms = fix.timestamp_ms,
                "GPS fix without elapsed time ignored"
            );
            return (FixOutcome::NoElapsedTime, None);
        }

        let gap_ms = fix.timestamp_ms - anchor.timestamp_ms;
        if gap_ms > self.config.max_fix_gap_ms {
            debug!(gap_ms, "GPS fix after a long gap re-anchors");
            self.anchor = Some(fix);
            return (FixOutcome::Stale, None);
        }

        let moved_m = distance(anchor.point(), fix.point());
        if moved_m < self.config.min_displacement_m {
            return (FixOutcome::TooClose, None);
        }

        let elapsed_s = gap_ms as f64 / 1000.0;
        let Some(speed) = instantaneous_speed(moved_m, elapsed_s) else {
            return (FixOutcome::NoElapsedTime, None);
        };
        if speed < self.config.min_speed_mps {
            self.anchor = Some(fix);
            return (FixOutcome::TooSlow, None);
        }

        self.total_distance_m += moved_m;
        self.last_speed_mps = Some(speed);
        self.accepted_fixes += 1;
        self.anchor = Some(fix);
        (FixOutcome::Accepted, Some(Sample::new(speed, fix.timestamp_ms)))
    }

    /// Distance accumulated from accepted fixes, in meters.
    pub fn total_distance_m(&self) -> f64 {
        self.total_distance_m
    }

    pub fn last_speed_mps(&self) -> Option<f64> {
        self.last_speed_mps
    }

    pub fn accepted_fixes(&self) -> u64 {
        self.accepted_fixes
    }

    /// Classification of the most recent fix.
    pub fn last_outcome(&self) -> Option<FixOutcome> {
        self.last_outcome
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}

impl Default for GpsTracker {
    fn default() -> Self {
        Self::new(GpsFilterConfig::default())
    }
}
