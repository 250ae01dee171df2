//! Stroke detection from acceleration magnitude spikes.
//!
//! The rower's drive jolts the handheld device. A stroke is flagged when the
//! acceleration magnitude rises a fixed margin above the rolling mean of the
//! last few samples, with a debounce so the ringing of a single drive is not
//! counted twice.
//!
//! The rate estimate uses a looser threshold (margin minus a relief) than the
//! firing test, and counts every sample above it over the rate window. Firing
//! stays crisp while the rate is smoothed.

use crate::config::MotionDetectorConfig;
use crate::detector::{
    AdaptiveThresholdDetector, BaselinePolicy, DetectorConfig, DetectorPhase, RateEstimator,
    ThresholdRule,
};
use crate::types::{DetectionEvent, Sample};

impl From<&MotionDetectorConfig> for DetectorConfig {
    fn from(config: &MotionDetectorConfig) -> Self {
        Self {
            sample_retention_ms: config.sample_retention_ms,
            min_samples: config.baseline_sample_size,
            baseline_samples: config.baseline_sample_size,
            baseline: BaselinePolicy::IncludeCurrent,
            threshold: ThresholdRule::Additive {
                margin: config.accel_margin,
            },
            debounce_ms: config.min_stroke_interval_ms,
            rate: RateEstimator::SpikeDensity {
                window_ms: config.rate_window_ms,
                relief: config.rate_margin_relief,
            },
            max_rate_spm: config.max_stroke_rate,
        }
    }
}

/// Acceleration spike stroke detector.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionStrokeDetector {
    config: MotionDetectorConfig,
    inner: AdaptiveThresholdDetector,
}

impl MotionStrokeDetector {
    pub fn new(config: MotionDetectorConfig) -> Self {
        let inner = AdaptiveThresholdDetector::new(DetectorConfig::from(&config));
        Self { config, inner }
    }

    /// Observe one acceleration magnitude (m/s²).
    pub fn observe(&mut self, magnitude: f64, timestamp_ms: u64) -> Option<DetectionEvent> {
        self.inner.observe(magnitude, timestamp_ms)
    }

    /// Observe a raw three-axis accelerometer reading.
    pub fn observe_acceleration(
        &mut self,
        accel: [f64; 3],
        timestamp_ms: u64,
    ) -> Option<DetectionEvent> {
        let sample = Sample::from_acceleration(accel, timestamp_ms);
        self.observe(sample.value, sample.timestamp_ms)
    }

    /// Process a batch of `(magnitude, timestamp_ms)` pairs and return every stroke.
    pub fn observe_batch(&mut self, samples: &[(f64, u64)]) -> Vec<DetectionEvent> {
        samples
            .iter()
            .filter_map(|&(magnitude, ts)| self.observe(magnitude, ts))
            .collect()
    }

    /// Current stroke rate in SPM, 0 when unknown.
    pub fn current_rate(&self) -> u32 {
        self.inner.current_rate()
    }

    pub fn has_rate(&self) -> bool {
        self.inner.has_rate()
    }

    /// Whether the baseline has filled yet.
    pub fn is_armed(&self) -> bool {
        self.inner.phase() == DetectorPhase::Armed
    }

    pub fn phase(&self) -> DetectorPhase {
        self.inner.phase()
    }

    /// Rolling baseline from the latest armed evaluation.
    pub fn baseline(&self) -> Option<f64> {
        self.inner.baseline()
    }

    pub fn last_stroke_ms(&self) -> Option<u64> {
        self.inner.last_trigger_ms()
    }

    pub fn strokes_detected(&self) -> u64 {
        self.inner.detections()
    }

    pub fn rejected_samples(&self) -> u64 {
        self.inner.rejected_samples()
    }

    /// Acceleration samples currently retained.
    pub fn buffered_samples(&self) -> usize {
        self.inner.window_len()
    }

    pub fn config(&self) -> &MotionDetectorConfig {
        &self.config
    }

    /// Clear all state. Idempotent.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for MotionStrokeDetector {
    fn default() -> Self {
        Self::new(MotionDetectorConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
