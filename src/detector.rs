//! Adaptive-threshold event detector.
//!
//! Both stroke sources answer the same question: "is the current sample far
//! enough above its recent baseline, and has enough time passed since the
//! last event?" This module implements that once, parameterized by:
//! - how the baseline is formed ([`BaselinePolicy`], baseline sample count)
//! - how the threshold is derived from it ([`ThresholdRule`])
//! - the debounce interval
//! - how a rate is extrapolated from detections ([`RateEstimator`])
//!
//! The detector is causal: it only sees past samples, so a "peak" here is a
//! sample that stands out from its trailing baseline, not a two-sided local
//! maximum.
//!
//! Not thread-safe by construction (`&mut self` everywhere). Callers with
//! several sensor threads must funnel observations through one owner.

use tracing::{debug, warn};

use crate::error::StrokeError;
use crate::types::{DetectionEvent, Sample};
use crate::window::SlidingWindow;

/// How the trigger threshold is derived from the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdRule {
    /// `baseline + margin`
    Additive { margin: f64 },
    /// `baseline * factor`
    Multiplicative { factor: f64 },
}

impl ThresholdRule {
    pub fn threshold(&self, baseline: f64) -> f64 {
        match *self {
            ThresholdRule::Additive { margin } => baseline + margin,
            ThresholdRule::Multiplicative { factor } => baseline * factor,
        }
    }
}

/// Which samples the baseline is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselinePolicy {
    /// Append the sample first; the baseline includes it.
    IncludeCurrent,
    /// Evaluate against the samples seen before this one, then append it.
    PriorOnly,
}

/// How a stroke rate is extrapolated when a detection fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateEstimator {
    /// Count samples above `threshold - relief` within `window_ms` and scale
    /// the count to a per-minute rate.
    SpikeDensity { window_ms: u64, relief: f64 },
    /// Keep accepted detections for `retention_ms` and derive the rate from
    /// the span between the oldest and newest of them.
    PeakInterval { retention_ms: u64 },
}

/// Full parameter set of one detector instance.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Retention of the raw sample window (ms).
    pub sample_retention_ms: u64,
    /// Samples that must be available before a detection may fire.
    pub min_samples: usize,
    /// Number of most recent samples averaged into the baseline.
    pub baseline_samples: usize,
    pub baseline: BaselinePolicy,
    pub threshold: ThresholdRule,
    /// Two detections must be strictly more than this far apart (ms).
    pub debounce_ms: u64,
    pub rate: RateEstimator,
    /// Every reported rate is clamped to this (SPM).
    pub max_rate_spm: u32,
}

/// Operational state of a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    /// No sample has been tested against a full baseline yet.
    Accumulating,
    /// At least one sample was tested against a full baseline: `min_samples`
    /// in the window including it under [`BaselinePolicy::IncludeCurrent`],
    /// before it under [`BaselinePolicy::PriorOnly`]. Stays here until reset,
    /// even if a gap later empties the window.
    Armed,
}

/// Rolling-baseline, debounced event detector with a windowed rate estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveThresholdDetector {
    config: DetectorConfig,

    samples: SlidingWindow<Sample>,
    /// Retained detections; only kept for [`RateEstimator::PeakInterval`].
    peaks: Option<SlidingWindow<Sample>>,

    phase: DetectorPhase,
    rejected_samples: u64,
    detections: u64,

    last_trigger_ms: Option<u64>,
    current_rate: Option<u32>,
    last_baseline: Option<f64>,
}

impl AdaptiveThresholdDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let peaks = match config.rate {
            RateEstimator::PeakInterval { retention_ms } => Some(SlidingWindow::new(retention_ms)),
            RateEstimator::SpikeDensity { .. } => None,
        };
        Self {
            samples: SlidingWindow::new(config.sample_retention_ms),
            peaks,
            config,
            phase: DetectorPhase::Accumulating,
            rejected_samples: 0,
            detections: 0,
            last_trigger_ms: None,
            current_rate: None,
            last_baseline: None,
        }
    }

    /// Feed one sample. Returns the detection event if this sample triggered one.
    ///
    /// Non-finite values and timestamps earlier than the newest sample are
    /// dropped, logged and counted; they never produce a detection.
    pub fn observe(&mut self, value: f64, timestamp_ms: u64) -> Option<DetectionEvent> {
        if !value.is_finite() {
            self.reject(StrokeError::NonFiniteValue {
                value,
                timestamp_ms,
            });
            return None;
        }

        let sample = Sample::new(value, timestamp_ms);
        let baseline = match self.config.baseline {
            BaselinePolicy::IncludeCurrent => {
                self.accept(sample)?;
                if self.samples.len() < self.config.min_samples {
                    return None;
                }
                self.samples.mean_recent(self.config.baseline_samples)
            }
            BaselinePolicy::PriorOnly => {
                if let Some(previous_ms) = self.samples.newest().map(|s| s.timestamp_ms) {
                    if timestamp_ms < previous_ms {
                        self.reject(StrokeError::OutOfOrder {
                            previous_ms,
                            timestamp_ms,
                        });
                        return None;
                    }
                }
                // The prior samples must lie inside the window as seen from this one.
                self.samples.evict_until(timestamp_ms);
                let ready = self.samples.len() >= self.config.min_samples;
                let baseline = self.samples.mean_recent(self.config.baseline_samples);
                self.accept(sample)?;
                if !ready {
                    return None;
                }
                baseline
            }
        };
        self.phase = DetectorPhase::Armed;
        self.last_baseline = Some(baseline);

        let threshold = self.config.threshold.threshold(baseline);
        // Strict: a value exactly at the threshold does not fire.
        if value <= threshold {
            return None;
        }

        // Strict as well, so repeated timestamps can never fire twice.
        if let Some(last) = self.last_trigger_ms {
            if timestamp_ms.saturating_sub(last) <= self.config.debounce_ms {
                return None;
            }
        }

        Some(self.fire(sample, baseline, threshold))
    }

    fn accept(&mut self, sample: Sample) -> Option<()> {
        if let Err(err) = self.samples.append(sample) {
            self.reject(err);
            return None;
        }
        Some(())
    }

    fn reject(&mut self, err: StrokeError) {
        self.rejected_samples += 1;
        warn!(%err, rejected = self.rejected_samples, "sample ignored");
    }

    fn fire(&mut self, sample: Sample, baseline: f64, threshold: f64) -> DetectionEvent {
        self.last_trigger_ms = Some(sample.timestamp_ms);
        self.detections += 1;

        let rate = match self.config.rate {
            RateEstimator::SpikeDensity { window_ms, relief } => {
                let rate_threshold = threshold - relief;
                let count = self.samples.count_within(window_ms, |v| v > rate_threshold);
                Some(spike_density_rate(count, window_ms, self.config.max_rate_spm))
            }
            RateEstimator::PeakInterval { .. } => match self.peaks.as_mut() {
                Some(peaks) => {
                    if let Err(err) = peaks.append(sample) {
                        // Unreachable while samples are ordered; keep the detection anyway.
                        warn!(%err, "peak not retained");
                    }
                    match (peaks.oldest(), peaks.newest()) {
                        (Some(oldest), Some(newest)) if peaks.len() >= 2 => Some(peak_interval_rate(
                            peaks.len(),
                            newest.timestamp_ms - oldest.timestamp_ms,
                            self.config.max_rate_spm,
                        )),
                        _ => None,
                    }
                }
                None => None,
            },
        };
        if rate.is_some() {
            self.current_rate = rate;
        }

        debug!(
            timestamp_ms = sample.timestamp_ms,
            value = sample.value,
            baseline,
            threshold,
            rate = ?rate,
            "detection"
        );

        DetectionEvent {
            timestamp_ms: sample.timestamp_ms,
            rate_spm: self.current_rate(),
            source_avg: baseline,
            triggering_value: sample.value,
        }
    }

    /// Clear all windows and state. Idempotent; the result equals a freshly
    /// constructed detector with the same configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Last computed rate, 0 when none has been computed yet.
    pub fn current_rate(&self) -> u32 {
        self.current_rate.unwrap_or(0)
    }

    /// Last computed rate, `None` when none has been computed yet.
    pub fn rate(&self) -> Option<u32> {
        self.current_rate
    }

    pub fn has_rate(&self) -> bool {
        self.current_rate.is_some()
    }

    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    pub fn last_trigger_ms(&self) -> Option<u64> {
        self.last_trigger_ms
    }

    /// Baseline used by the most recent armed evaluation.
    pub fn baseline(&self) -> Option<f64> {
        self.last_baseline
    }

    pub fn detections(&self) -> u64 {
        self.detections
    }

    pub fn rejected_samples(&self) -> u64 {
        self.rejected_samples
    }

    /// Samples currently retained in the sample window.
    pub fn window_len(&self) -> usize {
        self.samples.len()
    }

    /// Detections currently retained for the peak-interval rate.
    pub fn retained_peaks(&self) -> usize {
        self.peaks.as_ref().map_or(0, SlidingWindow::len)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

/// Per-minute rate from `count` events observed over `window_ms`.
pub fn spike_density_rate(count: usize, window_ms: u64, max_rate_spm: u32) -> u32 {
    if window_ms == 0 {
        return 0;
    }
    let window_s = window_ms as f64 / 1000.0;
    cap_rate(count as f64 / window_s * 60.0, max_rate_spm)
}

/// Per-minute rate from `peaks` events spanning `span_ms`.
///
/// N peaks bound N-1 stroke cycles. A zero span (all peaks at one instant)
/// yields 0 instead of dividing by zero.
pub fn peak_interval_rate(peaks: usize, span_ms: u64, max_rate_spm: u32) -> u32 {
    if peaks < 2 || span_ms == 0 {
        return 0;
    }
    let span_s = span_ms as f64 / 1000.0;
    cap_rate((peaks - 1) as f64 / span_s * 60.0, max_rate_spm)
}

fn cap_rate(raw_spm: f64, max_rate_spm: u32) -> u32 {
    if !raw_spm.is_finite() || raw_spm <= 0.0 {
        return 0;
    }
    // `as` saturates for out-of-range floats.
    (raw_spm.round() as u32).min(max_rate_spm)
}
