//! End-of-workout summary for the storage and display collaborators.
//!
//! The summary is self-contained and serializes to a flat JSON object, so
//! whatever persists workout history can store it as is.

use serde::Serialize;

use crate::error::StrokeResult;
use crate::geo::format_split;
use crate::types::DetectionMethod;

/// Aggregate figures of one workout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSummary {
    /// Detection method active at the end of the workout.
    pub method: DetectionMethod,
    pub started_ms: Option<u64>,
    /// Stop time, or the newest observation if the session is still running.
    pub ended_ms: Option<u64>,
    pub duration_ms: u64,
    /// Distance from accepted GPS fixes (m).
    pub distance_m: f64,
    pub avg_speed_mps: Option<f64>,
    /// Average time per 500 m (s).
    pub avg_split_s: Option<f64>,
    /// Session average over the retained rate history (SPM, 0 if none).
    pub average_rate_spm: u32,
    pub motion_strokes: u64,
    pub gps_peaks: u64,
    /// Samples dropped as non-finite or out of order.
    pub rejected_samples: u64,
}

impl WorkoutSummary {
    /// Average split as `m:ss`, or `--:--` without a speed.
    pub fn avg_split(&self) -> String {
        self.avg_split_s
            .map(format_split)
            .unwrap_or_else(|| "--:--".to_string())
    }

    pub fn to_json(&self) -> StrokeResult<String> {
        Ok(serde_json::to_string(&SummaryJson::from(self))?)
    }

    pub fn to_json_pretty(&self) -> StrokeResult<String> {
        Ok(serde_json::to_string_pretty(&SummaryJson::from(self))?)
    }
}

/// Serialized form: the summary plus its formatted split.
#[derive(Serialize)]
struct SummaryJson<'a> {
    #[serde(flatten)]
    summary: &'a WorkoutSummary,
    avg_split: String,
}

impl<'a> From<&'a WorkoutSummary> for SummaryJson<'a> {
    fn from(summary: &'a WorkoutSummary) -> Self {
        Self {
            avg_split: summary.avg_split(),
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> WorkoutSummary {
        WorkoutSummary {
            method: DetectionMethod::Gps,
            started_ms: Some(0),
            ended_ms: Some(600_000),
            duration_ms: 600_000,
            distance_m: 2_400.0,
            avg_speed_mps: Some(4.0),
            avg_split_s: Some(125.0),
            average_rate_spm: 24,
            motion_strokes: 0,
            gps_peaks: 240,
            rejected_samples: 2,
        }
    }

    #[test]
    fn test_avg_split_formatting() {
        assert_eq!(sample_summary().avg_split(), "2:05");
        let mut summary = sample_summary();
        summary.avg_split_s = None;
        assert_eq!(summary.avg_split(), "--:--");
    }

    #[test]
    fn test_json_fields() {
        let json = sample_summary().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["method"], "gps");
        assert_eq!(value["average_rate_spm"], 24);
        assert_eq!(value["avg_split"], "2:05");
        assert_eq!(value["distance_m"], 2_400.0);
        assert_eq!(value["gps_peaks"], 240);
    }

    #[test]
    fn test_missing_values_serialize_as_null() {
        let mut summary = sample_summary();
        summary.avg_speed_mps = None;
        summary.avg_split_s = None;
        let value: serde_json::Value =
            serde_json::from_str(&summary.to_json_pretty().unwrap()).unwrap();
        assert!(value["avg_speed_mps"].is_null());
        assert_eq!(value["avg_split"], "--:--");
    }
}
