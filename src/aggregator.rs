//! Session rate history and method selection.
//!
//! The aggregator keeps a short history of computed rates (two minutes by
//! default) per source, used only to report a session average when the
//! workout ends. Method selection is a plain choice between the two
//! detectors: in `both` mode the rates are shown side by side and never
//! averaged or reconciled.

use tracing::{debug, warn};

use crate::config::AggregatorConfig;
use crate::types::{DetectionMethod, RateRecord, RateSource, SelectedRate};
use crate::window::SlidingWindow;

/// Pick the rate(s) to display for `method`.
pub fn select(method: DetectionMethod, motion_rate: u32, gps_rate: u32) -> SelectedRate {
    match method {
        DetectionMethod::Motion => SelectedRate::Single(motion_rate),
        DetectionMethod::Gps => SelectedRate::Single(gps_rate),
        DetectionMethod::Both => SelectedRate::Both {
            motion: motion_rate,
            gps: gps_rate,
        },
    }
}

/// Like [`select`], for a method name coming straight from settings.
///
/// Unknown names yield `Single(0)` rather than an error.
pub fn select_by_name(method: &str, motion_rate: u32, gps_rate: u32) -> SelectedRate {
    match method.parse::<DetectionMethod>() {
        Ok(method) => select(method, motion_rate, gps_rate),
        Err(err) => {
            debug!(%err, "falling back to rate 0");
            SelectedRate::Single(0)
        }
    }
}

/// Retains recent rate observations per source.
#[derive(Debug, Clone, PartialEq)]
pub struct RateAggregator {
    motion: SlidingWindow<RateRecord>,
    gps: SlidingWindow<RateRecord>,
}

impl RateAggregator {
    pub fn new(config: &AggregatorConfig) -> Self {
        Self {
            motion: SlidingWindow::new(config.history_retention_ms),
            gps: SlidingWindow::new(config.history_retention_ms),
        }
    }

    /// Record a rate computed by `source` at `timestamp_ms`.
    pub fn record(&mut self, source: RateSource, rate_spm: u32, timestamp_ms: u64) {
        let window = match source {
            RateSource::Motion => &mut self.motion,
            RateSource::Gps => &mut self.gps,
        };
        if let Err(err) = window.append(RateRecord::new(rate_spm, timestamp_ms)) {
            warn!(%err, ?source, "rate record dropped");
        }
    }

    /// Rounded mean of every retained record across both sources, 0 when empty.
    pub fn average_rate(&self) -> u32 {
        let (sum, count) = self
            .motion
            .iter()
            .chain(self.gps.iter())
            .fold((0u64, 0u64), |(sum, count), r| (sum + r.rate_spm as u64, count + 1));
        rounded_mean(sum, count)
    }

    /// Rounded mean of the retained records of one source, 0 when empty.
    pub fn average_rate_for(&self, source: RateSource) -> u32 {
        let window = self.window(source);
        window.mean().round() as u32
    }

    /// Number of retained records for `source`.
    pub fn record_count(&self, source: RateSource) -> usize {
        self.window(source).len()
    }

    pub fn is_empty(&self) -> bool {
        self.motion.is_empty() && self.gps.is_empty()
    }

    fn window(&self, source: RateSource) -> &SlidingWindow<RateRecord> {
        match source {
            RateSource::Motion => &self.motion,
            RateSource::Gps => &self.gps,
        }
    }

    pub fn reset(&mut self) {
        self.motion.clear();
        self.gps.clear();
    }
}

impl Default for RateAggregator {
    fn default() -> Self {
        Self::new(&AggregatorConfig::default())
    }
}

fn rounded_mean(sum: u64, count: u64) -> u32 {
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_single_methods() {
        assert_eq!(select(DetectionMethod::Motion, 24, 26), SelectedRate::Single(24));
        assert_eq!(select(DetectionMethod::Gps, 24, 26), SelectedRate::Single(26));
    }

    #[test]
    fn test_select_both_tags_sources() {
        assert_eq!(
            select(DetectionMethod::Both, 24, 26),
            SelectedRate::Both { motion: 24, gps: 26 }
        );
        assert_eq!(
            select_by_name("both", 24, 26),
            SelectedRate::Both { motion: 24, gps: 26 }
        );
    }

    #[test]
    fn test_select_unknown_name_is_zero() {
        assert_eq!(select_by_name("unknown", 24, 26), SelectedRate::Single(0));
        assert_eq!(select_by_name("", 24, 26), SelectedRate::Single(0));
        assert_eq!(select_by_name("motion", 24, 26), SelectedRate::Single(24));
    }

    #[test]
    fn test_empty_average_is_zero() {
        let aggregator = RateAggregator::default();
        assert_eq!(aggregator.average_rate(), 0);
        assert_eq!(aggregator.average_rate_for(RateSource::Gps), 0);
        assert!(aggregator.is_empty());
    }

    #[test]
    fn test_average_rounds() {
        let mut aggregator = RateAggregator::default();
        aggregator.record(RateSource::Motion, 24, 1_000);
        aggregator.record(RateSource::Motion, 25, 2_000);
        aggregator.record(RateSource::Motion, 25, 3_000);
        // 74 / 3 = 24.67
        assert_eq!(aggregator.average_rate(), 25);
        assert_eq!(aggregator.average_rate_for(RateSource::Motion), 25);
    }

    #[test]
    fn test_sources_are_independent_windows() {
        let mut aggregator = RateAggregator::default();
        aggregator.record(RateSource::Motion, 20, 5_000);
        // GPS timestamps may lag the motion stream; no ordering conflict.
        aggregator.record(RateSource::Gps, 30, 4_000);
        assert_eq!(aggregator.record_count(RateSource::Motion), 1);
        assert_eq!(aggregator.record_count(RateSource::Gps), 1);
        assert_eq!(aggregator.average_rate(), 25);
        assert_eq!(aggregator.average_rate_for(RateSource::Gps), 30);
    }

    #[test]
    fn test_history_retention_two_minutes() {
        let mut aggregator = RateAggregator::default();
        aggregator.record(RateSource::Motion, 10, 0);
        aggregator.record(RateSource::Motion, 30, 60_000);
        aggregator.record(RateSource::Motion, 30, 120_000);
        // The record at 0 is exactly at the horizon and is gone.
        assert_eq!(aggregator.record_count(RateSource::Motion), 2);
        assert_eq!(aggregator.average_rate(), 30);
    }

    #[test]
    fn test_out_of_order_record_dropped() {
        let mut aggregator = RateAggregator::default();
        aggregator.record(RateSource::Gps, 20, 10_000);
        aggregator.record(RateSource::Gps, 40, 9_000);
        assert_eq!(aggregator.record_count(RateSource::Gps), 1);
        assert_eq!(aggregator.average_rate(), 20);
    }

    #[test]
    fn test_reset() {
        let mut aggregator = RateAggregator::default();
        aggregator.record(RateSource::Gps, 20, 10_000);
        aggregator.reset();
        aggregator.reset();
        assert_eq!(aggregator, RateAggregator::default());
    }
}
