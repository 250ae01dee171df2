//! Stroke detection from GPS speed peaks.
//!
//! Boat speed surges during the drive and sags during the recovery. A peak is
//! a speed sample that exceeds the trailing average of the previous samples
//! by a multiplicative margin. Peaks are debounced, retained for a longer
//! window, and the rate comes from the span between the oldest and newest
//! retained peak.
//!
//! GPS arrives at roughly 1 Hz, so this detector is coarse next to the motion
//! one. It needs no device mounting assumptions.

use crate::config::GpsDetectorConfig;
use crate::detector::{
    AdaptiveThresholdDetector, BaselinePolicy, DetectorConfig, DetectorPhase, RateEstimator,
    ThresholdRule,
};
use crate::types::DetectionEvent;

impl From<&GpsDetectorConfig> for DetectorConfig {
    fn from(config: &GpsDetectorConfig) -> Self {
        Self {
            sample_retention_ms: config.sample_retention_ms,
            min_samples: config.min_samples_for_detection,
            baseline_samples: config.average_sample_size,
            baseline: BaselinePolicy::PriorOnly,
            threshold: ThresholdRule::Multiplicative {
                factor: config.peak_multiplier,
            },
            debounce_ms: config.min_time_between_peaks_ms,
            rate: RateEstimator::PeakInterval {
                retention_ms: config.peak_retention_ms,
            },
            max_rate_spm: config.max_stroke_rate,
        }
    }
}

/// GPS speed peak stroke detector.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsPeakDetector {
    config: GpsDetectorConfig,
    inner: AdaptiveThresholdDetector,
}

impl GpsPeakDetector {
    pub fn new(config: GpsDetectorConfig) -> Self {
        let inner = AdaptiveThresholdDetector::new(DetectorConfig::from(&config));
        Self { config, inner }
    }

    /// Observe one instantaneous speed (m/s). Returns the event when it is an accepted peak.
    pub fn observe(&mut self, speed_mps: f64, timestamp_ms: u64) -> Option<DetectionEvent> {
        self.inner.observe(speed_mps, timestamp_ms)
    }

    /// Current rate in SPM; 0 until two peaks have been retained.
    pub fn current_rate(&self) -> u32 {
        self.inner.current_rate()
    }

    pub fn has_rate(&self) -> bool {
        self.inner.has_rate()
    }

    pub fn phase(&self) -> DetectorPhase {
        self.inner.phase()
    }

    /// Trailing average speed used for the latest peak test.
    pub fn average_speed(&self) -> Option<f64> {
        self.inner.baseline()
    }

    pub fn last_peak_ms(&self) -> Option<u64> {
        self.inner.last_trigger_ms()
    }

    /// Peaks currently inside the retention window.
    pub fn retained_peaks(&self) -> usize {
        self.inner.retained_peaks()
    }

    pub fn peaks_detected(&self) -> u64 {
        self.inner.detections()
    }

    pub fn rejected_samples(&self) -> u64 {
        self.inner.rejected_samples()
    }

    pub fn buffered_samples(&self) -> usize {
        self.inner.window_len()
    }

    pub fn config(&self) -> &GpsDetectorConfig {
        &self.config
    }

    /// Clear all state. Idempotent.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for GpsPeakDetector {
    fn default() -> Self {
        Self::new(GpsDetectorConfig::default())
    }
}
