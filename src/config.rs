//! Tuning parameters for the detectors, the aggregator and the GPS filter.
//!
//! The defaults are the empirically tuned values for a handheld device in a
//! rowing boat. They are kept exactly for behavioral parity; none of them has
//! a derivation beyond "works on the water". Tuning for another boat or
//! device is a config file change.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StrokeError, StrokeResult};
use crate::types::DetectionMethod;

/// Acceleration spike detector parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionDetectorConfig {
    /// How long acceleration samples are retained (ms).
    pub sample_retention_ms: u64,
    /// Samples required before detection arms; also the baseline length.
    pub baseline_sample_size: usize,
    /// Additive margin above the baseline that a spike must exceed (m/s²).
    pub accel_margin: f64,
    /// How much the rate-counting threshold is relaxed below the firing threshold.
    pub rate_margin_relief: f64,
    /// Debounce interval between two strokes (ms).
    pub min_stroke_interval_ms: u64,
    /// Window over which spikes are counted for the rate (ms).
    pub rate_window_ms: u64,
    /// Upper bound on any reported rate (SPM).
    pub max_stroke_rate: u32,
}

impl Default for MotionDetectorConfig {
    fn default() -> Self {
        Self {
            sample_retention_ms: 10_000,
            baseline_sample_size: 20,    // ~1/3 s at 60 Hz
            accel_margin: 4.0,           // boat-mounted device
            rate_margin_relief: 1.0,     // count at baseline + 3
            min_stroke_interval_ms: 800, // max 75 SPM before the cap
            rate_window_ms: 10_000,
            max_stroke_rate: 40,
        }
    }
}

impl MotionDetectorConfig {
    pub fn validate(&self) -> StrokeResult<()> {
        require_nonzero("motion.sample_retention_ms", self.sample_retention_ms)?;
        require_nonzero("motion.rate_window_ms", self.rate_window_ms)?;
        if self.baseline_sample_size == 0 {
            return Err(StrokeError::invalid_config(
                "motion.baseline_sample_size",
                "must be at least 1",
            ));
        }
        if !self.accel_margin.is_finite() || self.accel_margin < 0.0 {
            return Err(StrokeError::invalid_config(
                "motion.accel_margin",
                format!("must be a non-negative number, got {}", self.accel_margin),
            ));
        }
        if !self.rate_margin_relief.is_finite()
            || self.rate_margin_relief < 0.0
            || self.rate_margin_relief > self.accel_margin
        {
            return Err(StrokeError::invalid_config(
                "motion.rate_margin_relief",
                format!(
                    "must be within [0, accel_margin={}], got {}",
                    self.accel_margin, self.rate_margin_relief
                ),
            ));
        }
        if self.rate_window_ms > self.sample_retention_ms {
            return Err(StrokeError::invalid_config(
                "motion.rate_window_ms",
                "cannot exceed sample_retention_ms",
            ));
        }
        require_nonzero("motion.max_stroke_rate", self.max_stroke_rate as u64)
    }
}

/// GPS speed peak detector parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsDetectorConfig {
    /// How long speed samples are retained (ms).
    pub sample_retention_ms: u64,
    /// Prior samples required before a peak can be accepted.
    pub min_samples_for_detection: usize,
    /// Number of trailing samples averaged for the peak test.
    pub average_sample_size: usize,
    /// A peak must exceed the trailing average times this factor.
    pub peak_multiplier: f64,
    /// Debounce interval between two peaks (ms).
    pub min_time_between_peaks_ms: u64,
    /// How long accepted peaks are retained for the rate (ms).
    pub peak_retention_ms: u64,
    /// Upper bound on any reported rate (SPM).
    pub max_stroke_rate: u32,
}

impl Default for GpsDetectorConfig {
    fn default() -> Self {
        Self {
            sample_retention_ms: 30_000,
            min_samples_for_detection: 5,
            average_sample_size: 10,
            peak_multiplier: 1.10,
            min_time_between_peaks_ms: 1_000,
            peak_retention_ms: 30_000,
            max_stroke_rate: 40,
        }
    }
}

impl GpsDetectorConfig {
    pub fn validate(&self) -> StrokeResult<()> {
        require_nonzero("gps.sample_retention_ms", self.sample_retention_ms)?;
        require_nonzero("gps.peak_retention_ms", self.peak_retention_ms)?;
        if self.average_sample_size == 0 {
            return Err(StrokeError::invalid_config(
                "gps.average_sample_size",
                "must be at least 1",
            ));
        }
        if self.min_samples_for_detection == 0 {
            return Err(StrokeError::invalid_config(
                "gps.min_samples_for_detection",
                "must be at least 1",
            ));
        }
        if !self.peak_multiplier.is_finite() || self.peak_multiplier <= 0.0 {
            return Err(StrokeError::invalid_config(
                "gps.peak_multiplier",
                format!("must be a positive number, got {}", self.peak_multiplier),
            ));
        }
        require_nonzero("gps.max_stroke_rate", self.max_stroke_rate as u64)
    }
}

/// Session rate history parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// How long rate records are kept for the session average (ms).
    pub history_retention_ms: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            history_retention_ms: 120_000,
        }
    }
}

impl AggregatorConfig {
    pub fn validate(&self) -> StrokeResult<()> {
        require_nonzero("aggregator.history_retention_ms", self.history_retention_ms)
    }
}

/// Noise filter applied to consecutive GPS fixes before they become speed samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsFilterConfig {
    /// Fixes closer than this to the previous accepted fix are dropped (m).
    pub min_displacement_m: f64,
    /// Speeds below this are treated as drifting at rest (m/s).
    pub min_speed_mps: f64,
    /// A fix further than this after the anchor starts over from it (ms).
    pub max_fix_gap_ms: u64,
}

impl Default for GpsFilterConfig {
    fn default() -> Self {
        Self {
            min_displacement_m: 3.0,
            min_speed_mps: 0.5,
            max_fix_gap_ms: 30_000, // GPS sample retention
        }
    }
}

impl GpsFilterConfig {
    pub fn validate(&self) -> StrokeResult<()> {
        if !self.min_displacement_m.is_finite() || self.min_displacement_m < 0.0 {
            return Err(StrokeError::invalid_config(
                "gps_filter.min_displacement_m",
                "must be a non-negative number",
            ));
        }
        if !self.min_speed_mps.is_finite() || self.min_speed_mps < 0.0 {
            return Err(StrokeError::invalid_config(
                "gps_filter.min_speed_mps",
                "must be a non-negative number",
            ));
        }
        require_nonzero("gps_filter.max_fix_gap_ms", self.max_fix_gap_ms)
    }
}

/// Complete configuration for one workout session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Which detector(s) feed the displayed rate.
    pub method: DetectionMethod,
    pub motion: MotionDetectorConfig,
    pub gps: GpsDetectorConfig,
    pub aggregator: AggregatorConfig,
    pub gps_filter: GpsFilterConfig,
}

impl SessionConfig {
    /// Load a [`SessionConfig`] from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`StrokeError::FileAccess`] if the file cannot be read,
    /// [`StrokeError::Json`] if it is malformed, and
    /// [`StrokeError::InvalidConfig`] if a value fails validation.
    pub fn from_json(path: &Path) -> StrokeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| StrokeError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SessionConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty-printed JSON.
    pub fn to_json(&self, path: &Path) -> StrokeResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| StrokeError::FileAccess {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate every section, returning the first problem found.
    pub fn validate(&self) -> StrokeResult<()> {
        self.motion.validate()?;
        self.gps.validate()?;
        self.aggregator.validate()?;
        self.gps_filter.validate()
    }
}

fn require_nonzero(field: &str, value: u64) -> StrokeResult<()> {
    if value == 0 {
        Err(StrokeError::invalid_config(field, "must be greater than zero"))
    } else {
        Ok(())
    }
}
