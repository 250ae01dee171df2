//! Core data types for the stroke sensing engine.
//!
//! Every concept that crosses a module boundary gets a type here: raw
//! samples, detection events, rate records and the method selector used by
//! the display layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StrokeError;
use crate::geo::GeoPoint;
use crate::window::Timestamped;

// ============================================================================
// SAMPLES
// ============================================================================

/// A single timestamped scalar observation.
///
/// `value` is an acceleration magnitude (m/s²) for the motion detector or an
/// instantaneous speed (m/s) for the GPS detector. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Observed value.
    pub value: f64,
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl Sample {
    pub fn new(value: f64, timestamp_ms: u64) -> Self {
        Self {
            value,
            timestamp_ms,
        }
    }

    /// Build a motion sample from a raw three-axis accelerometer reading.
    ///
    /// The magnitude is orientation independent: √(x² + y² + z²).
    pub fn from_acceleration(accel: [f64; 3], timestamp_ms: u64) -> Self {
        let magnitude = (accel[0] * accel[0] + accel[1] * accel[1] + accel[2] * accel[2]).sqrt();
        Self::new(magnitude, timestamp_ms)
    }
}

impl Timestamped for Sample {
    fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// A raw GPS fix as delivered by the geolocation source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Timestamp of the fix in milliseconds.
    pub timestamp_ms: u64,
}

impl GpsFix {
    pub fn new(lat: f64, lng: f64, timestamp_ms: u64) -> Self {
        Self {
            lat,
            lng,
            timestamp_ms,
        }
    }

    /// The fix position without its timestamp.
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

// ============================================================================
// DETECTION OUTPUT
// ============================================================================

/// Emitted by a detector when its trigger condition fires.
///
/// Ephemeral: handed to the rate aggregator and then dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionEvent {
    /// Timestamp of the triggering sample.
    pub timestamp_ms: u64,
    /// Rate computed at this detection, in strokes per minute (0 = not yet known).
    pub rate_spm: u32,
    /// Baseline (rolling mean) the trigger was evaluated against.
    pub source_avg: f64,
    /// The sample value that crossed the threshold.
    pub triggering_value: f64,
}

/// Which detector produced a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Acceleration spike detector.
    Motion,
    /// GPS speed peak detector.
    Gps,
}

/// A rate observation retained for the session average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRecord {
    /// Strokes per minute.
    pub rate_spm: u32,
    /// When the rate was computed.
    pub timestamp_ms: u64,
}

impl RateRecord {
    pub fn new(rate_spm: u32, timestamp_ms: u64) -> Self {
        Self {
            rate_spm,
            timestamp_ms,
        }
    }
}

impl Timestamped for RateRecord {
    fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    fn value(&self) -> f64 {
        self.rate_spm as f64
    }
}

// ============================================================================
// METHOD SELECTION
// ============================================================================

/// Active detection mode, as chosen in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// GPS speed peaks only.
    Gps,
    /// Accelerometer spikes only.
    Motion,
    /// Both, shown side by side without reconciliation.
    #[default]
    Both,
}

impl DetectionMethod {
    /// Lowercase name as used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Gps => "gps",
            DetectionMethod::Motion => "motion",
            DetectionMethod::Both => "both",
        }
    }

    /// Whether rates from `source` are displayed under this method.
    pub fn uses(&self, source: RateSource) -> bool {
        matches!(
            (self, source),
            (DetectionMethod::Both, _)
                | (DetectionMethod::Motion, RateSource::Motion)
                | (DetectionMethod::Gps, RateSource::Gps)
        )
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = StrokeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gps" => Ok(DetectionMethod::Gps),
            "motion" => Ok(DetectionMethod::Motion),
            "both" => Ok(DetectionMethod::Both),
            other => Err(StrokeError::UnknownMethod(other.to_string())),
        }
    }
}

/// Rate(s) returned by method selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SelectedRate {
    /// A single rate for `gps` or `motion` (also the 0 fallback for unknown methods).
    Single(u32),
    /// Both rates, tagged by source.
    Both { motion: u32, gps: u32 },
}

impl SelectedRate {
    /// The single rate, if this is not a `Both` result.
    pub fn single(&self) -> Option<u32> {
        match self {
            SelectedRate::Single(rate) => Some(*rate),
            SelectedRate::Both { .. } => None,
        }
    }
}
