//! Stroke Sensing Engine Library
//!
//! Estimates a rowing boat's stroke rate in real time from two independent,
//! noisy sources: the handheld device's acceleration magnitude and the speed
//! derived from consecutive GPS fixes.
//!
//! # Design Philosophy
//!
//! - **Online only**: every observation is a single non-blocking call. Nothing
//!   looks ahead, nothing waits on I/O.
//! - **Bounded memory**: all history lives in time-bounded sliding windows with
//!   amortized O(1) eviction.
//! - **Degrade, never fail**: bad samples are dropped and logged. A missing rate
//!   is reported as "unknown", never as NaN or a panic.
//! - **No ambient state**: every detector belongs to one [`WorkoutSession`] and
//!   dies with it.
//!
//! # Example
//!
//! ```
//! use stroke_sensing::{DetectionMethod, SelectedRate, SessionConfig, WorkoutSession};
//!
//! let mut session = WorkoutSession::new(SessionConfig::default());
//! session.set_method(DetectionMethod::Motion);
//! session.start(0);
//!
//! for i in 0..600u64 {
//!     let t = i * 50;
//!     let magnitude = if t % 2000 == 0 { 16.0 } else { 10.0 };
//!     session.observe_motion(magnitude, t);
//! }
//!
//! match session.current_rate() {
//!     SelectedRate::Single(spm) => assert_eq!(spm, 30),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod aggregator;
pub mod config;
pub mod detector;
pub mod error;
pub mod geo;
pub mod gps;
pub mod gps_peaks;
pub mod motion;
pub mod replay;
pub mod session;
pub mod summary;
pub mod types;
pub mod window;

#[cfg(test)]
mod integration_tests;

pub use aggregator::{select, select_by_name, RateAggregator};
pub use config::{
    AggregatorConfig, GpsDetectorConfig, GpsFilterConfig, MotionDetectorConfig, SessionConfig,
};
pub use detector::{
    AdaptiveThresholdDetector, BaselinePolicy, DetectorConfig, DetectorPhase, RateEstimator,
    ThresholdRule,
};
pub use error::{StrokeError, StrokeResult};
pub use geo::{distance, format_split, split_seconds, GeoPoint};
pub use gps::GpsTracker;
pub use gps_peaks::GpsPeakDetector;
pub use motion::MotionStrokeDetector;
pub use replay::{parse_trace, replay, TraceRecord};
pub use session::{SessionState, WorkoutSession};
pub use summary::WorkoutSummary;
pub use types::{
    DetectionEvent, DetectionMethod, GpsFix, RateRecord, RateSource, Sample, SelectedRate,
};
pub use window::{SlidingWindow, Timestamped};

/// Crate version, as reported by the replay tool.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
