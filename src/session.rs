//! Workout session: the owner of every detector for one row.
//!
//! A session is created at workout start and discarded (or reset) at the
//! end. It wires the sensor callbacks into the detectors, records rates for
//! the active method, and produces the end-of-workout summary.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start--> Running --stop--> Stopped
//!   ^                                  |
//!   +-------------- reset -------------+
//! ```
//!
//! Observations are only processed while `Running`. `reset()` from any state
//! replaces every window and counter at once, so there is never a partially
//! cleared session.
use tracing::{info, warn};

use crate::aggregator::{select, RateAggregator};
use crate::config::SessionConfig;
use crate::error::StrokeResult;
use crate::geo::split_seconds;
use crate::gps::GpsTracker;
use crate::gps_peaks::GpsPeakDetector;
use crate::motion::MotionStrokeDetector;
use crate::summary::WorkoutSummary;
use crate::types::{DetectionEvent, DetectionMethod, GpsFix, RateSource, Sample, SelectedRate};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

/// One workout's worth of stroke detection state.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    config: SessionConfig,
    state: SessionState,

    started_ms: Option<u64>,
    stopped_ms: Option<u64>,
    last_observed_ms: Option<u64>,

    motion: MotionStrokeDetector,
    gps_peaks: GpsPeakDetector,
    tracker: GpsTracker,
    aggregator: RateAggregator,
}

impl WorkoutSession {
    /// Create an idle session. The configuration is used as given.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            motion: MotionStrokeDetector::new(config.motion.clone()),
            gps_peaks: GpsPeakDetector::new(config.gps.clone()),
            tracker: GpsTracker::new(config.gps_filter.clone()),
            aggregator: RateAggregator::new(&config.aggregator),
            config,
            state: SessionState::Idle,
            started_ms: None,
            stopped_ms: None,
            last_observed_ms: None,
        }
    }

    /// Create an idle session after validating the configuration.
    pub fn try_new(config: SessionConfig) -> StrokeResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Start recording. Starting a stopped session begins a fresh workout.
    pub fn start(&mut self, timestamp_ms: u64) {
        match self.state {
            SessionState::Running => {
                warn!(timestamp_ms, "start ignored: session already running");
                return;
            }
            SessionState::Stopped => self.reset(),
            SessionState::Idle => {}
        }
        self.state = SessionState::Running;
        self.started_ms = Some(timestamp_ms);
        info!(timestamp_ms, method = %self.config.method, "workout started");
    }

    /// Stop recording and return the summary.
    pub fn stop(&mut self, timestamp_ms: u64) -> WorkoutSummary {
        if self.state == SessionState::Running {
            self.state = SessionState::Stopped;
            self.stopped_ms = Some(timestamp_ms);
            info!(
                timestamp_ms,
                average_rate = self.aggregator.average_rate(),
                distance_m = self.tracker.total_distance_m(),
                "workout stopped"
            );
        } else {
            warn!(timestamp_ms, state = ?self.state, "stop ignored: session not running");
        }
        self.summary()
    }

    /// Discard all windows and state, keeping configuration and method.
    ///
    /// Idempotent: the result equals a freshly constructed session.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
        info!("workout session reset");
    }

    /// Feed an acceleration magnitude (m/s²).
    pub fn observe_motion(&mut self, magnitude: f64, timestamp_ms: u64) -> Option<DetectionEvent> {
        if !self.accepting(timestamp_ms) {
            return None;
        }
        let event = self.motion.observe(magnitude, timestamp_ms)?;
        if self.config.method.uses(RateSource::Motion) {
            self.aggregator
                .record(RateSource::Motion, event.rate_spm, event.timestamp_ms);
        }
        Some(event)
    }

    /// Feed a raw three-axis accelerometer reading (m/s²).
    pub fn observe_acceleration(
        &mut self,
        accel: [f64; 3],
        timestamp_ms: u64,
    ) -> Option<DetectionEvent> {
        let sample = Sample::from_acceleration(accel, timestamp_ms);
        self.observe_motion(sample.value, sample.timestamp_ms)
    }

    /// Feed a raw GPS fix. Returns the peak event if the derived speed was one.
    pub fn observe_fix(&mut self, fix: GpsFix) -> Option<DetectionEvent> {
        if !self.accepting(fix.timestamp_ms) {
            return None;
        }
        let sample = self.tracker.observe_fix(fix)?;
        self.detect_gps_peak(sample.value, sample.timestamp_ms)
    }

    /// Feed a speed (m/s) from a source that already derives it.
    pub fn observe_speed(&mut self, speed_mps: f64, timestamp_ms: u64) -> Option<DetectionEvent> {
        if !self.accepting(timestamp_ms) {
            return None;
        }
        self.detect_gps_peak(speed_mps, timestamp_ms)
    }

    fn detect_gps_peak(&mut self, speed_mps: f64, timestamp_ms: u64) -> Option<DetectionEvent> {
        let event = self.gps_peaks.observe(speed_mps, timestamp_ms)?;
        if self.gps_peaks.retained_peaks() >= 2 && self.config.method.uses(RateSource::Gps) {
            self.aggregator
                .record(RateSource::Gps, event.rate_spm, event.timestamp_ms);
        }
        Some(event)
    }

    fn accepting(&mut self, timestamp_ms: u64) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        let newest = self
            .last_observed_ms
            .map_or(timestamp_ms, |t| t.max(timestamp_ms));
        self.last_observed_ms = Some(newest);
        true
    }

    /// Rate(s) to display for the active method.
    pub fn current_rate(&self) -> SelectedRate {
        select(
            self.config.method,
            self.motion.current_rate(),
            self.gps_peaks.current_rate(),
        )
    }

    /// Current rate of a single source, 0 when unknown.
    pub fn current_rate_for(&self, source: RateSource) -> u32 {
        match source {
            RateSource::Motion => self.motion.current_rate(),
            RateSource::Gps => self.gps_peaks.current_rate(),
        }
    }

    /// Session average over the retained rate history.
    pub fn average_rate(&self) -> u32 {
        self.aggregator.average_rate()
    }

    pub fn set_method(&mut self, method: DetectionMethod) {
        self.config.method = method;
    }

    pub fn method(&self) -> DetectionMethod {
        self.config.method
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Elapsed workout time: up to the stop, or to the newest observation while running.
    pub fn duration_ms(&self) -> u64 {
        let Some(started) = self.started_ms else {
            return 0;
        };
        let end = self.stopped_ms.or(self.last_observed_ms).unwrap_or(started);
        end.saturating_sub(started)
    }

    /// Build the end-of-workout summary from the current state.
    pub fn summary(&self) -> WorkoutSummary {
        let duration_ms = self.duration_ms();
        let distance_m = self.tracker.total_distance_m();
        let avg_speed_mps = if duration_ms > 0 && distance_m > 0.0 {
            Some(distance_m / (duration_ms as f64 / 1000.0))
        } else {
            None
        };
        WorkoutSummary {
            method: self.config.method,
            started_ms: self.started_ms,
            ended_ms: self.stopped_ms.or(self.last_observed_ms),
            duration_ms,
            distance_m,
            avg_speed_mps,
            avg_split_s: avg_speed_mps.and_then(split_seconds),
            average_rate_spm: self.aggregator.average_rate(),
            motion_strokes: self.motion.strokes_detected(),
            gps_peaks: self.gps_peaks.peaks_detected(),
            rejected_samples: self.motion.rejected_samples() + self.gps_peaks.rejected_samples(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn motion(&self) -> &MotionStrokeDetector {
        &self.motion
    }

    pub fn gps_peaks(&self) -> &GpsPeakDetector {
        &self.gps_peaks
    }

    pub fn tracker(&self) -> &GpsTracker {
        &self.tracker
    }

    pub fn aggregator(&self) -> &RateAggregator {
        &self.aggregator
    }
}

impl Default for WorkoutSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke_magnitudes(session: &mut WorkoutSession, from_ms: u64, to_ms: u64, period_ms: u64) {
        let mut t = from_ms;
        while t < to_ms {
            let magnitude = if t > from_ms && t % period_ms == 0 { 16.0 } else { 10.0 };
            session.observe_motion(magnitude, t);
            t += 20;
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = WorkoutSession::default();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.method(), DetectionMethod::Both);
        assert_eq!(session.current_rate(), SelectedRate::Both { motion: 0, gps: 0 });
        assert_eq!(session.duration_ms(), 0);
    }

    #[test]
    fn test_try_new_validates() {
        let mut config = SessionConfig::default();
        config.gps.average_sample_size = 0;
        assert!(WorkoutSession::try_new(config).is_err());
        assert!(WorkoutSession::try_new(SessionConfig::default()).is_ok());
    }

    #[test]
    fn test_observations_ignored_unless_running() {
        let mut session = WorkoutSession::default();
        stroke_magnitudes(&mut session, 0, 5_000, 1_000);
        assert_eq!(session.motion().strokes_detected(), 0);
        assert_eq!(session, WorkoutSession::default());
    }

    #[test]
    fn test_motion_method_records_motion_only() {
        let mut session = WorkoutSession::default();
        session.set_method(DetectionMethod::Motion);
        session.start(0);
        stroke_magnitudes(&mut session, 0, 15_000, 2_000);
        for s in 0..15u64 {
            session.observe_speed(if s % 2 == 0 && s > 6 { 5.0 } else { 4.0 }, s * 1_000);
        }
        assert!(session.aggregator().record_count(RateSource::Motion) > 0);
        assert_eq!(session.aggregator().record_count(RateSource::Gps), 0);
        assert!(session.gps_peaks().peaks_detected() > 0);
        assert_eq!(session.current_rate(), SelectedRate::Single(30));
    }

    #[test]
    fn test_stop_freezes_and_summarizes() {
        let mut session = WorkoutSession::default();
        session.start(1_000);
        stroke_magnitudes(&mut session, 1_000, 13_000, 2_000);
        let summary = session.stop(13_000);
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(summary.duration_ms, 12_000);
        assert!(summary.motion_strokes > 0);

        assert!(session.observe_motion(50.0, 14_000).is_none());
        assert_eq!(session.summary(), summary);
    }

    #[test]
    fn test_start_twice_is_ignored() {
        let mut session = WorkoutSession::default();
        session.start(0);
        session.start(5_000);
        session.observe_motion(10.0, 6_000);
        assert_eq!(session.duration_ms(), 6_000);
    }

    #[test]
    fn test_restart_after_stop_is_fresh() {
        let mut session = WorkoutSession::default();
        session.start(0);
        stroke_magnitudes(&mut session, 0, 12_000, 1_000);
        session.stop(12_000);
        session.start(100_000);
        assert_eq!(session.motion().strokes_detected(), 0);
        assert!(session.aggregator().is_empty());
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn test_reset_twice_equals_fresh_and_keeps_method() {
        let mut session = WorkoutSession::default();
        session.set_method(DetectionMethod::Gps);
        session.start(0);
        stroke_magnitudes(&mut session, 0, 12_000, 1_000);
        session.reset();
        let once = session.clone();
        session.reset();
        assert_eq!(session, once);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.method(), DetectionMethod::Gps);

        let mut expected_config = SessionConfig::default();
        expected_config.method = DetectionMethod::Gps;
        assert_eq!(session, WorkoutSession::new(expected_config));
    }

    #[test]
    fn test_raw_acceleration_path() {
        let mut session = WorkoutSession::default();
        session.start(0);
        let mut strokes = 0;
        for i in 0..300u64 {
            let t = i * 20;
            let z = if i % 100 == 50 { 16.0 } else { 10.0 };
            if session.observe_acceleration([0.0, z, 0.0], t).is_some() {
                strokes += 1;
            }
        }
        assert_eq!(strokes, 3);
    }
}
