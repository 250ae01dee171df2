//! Recorded sensor traces and their offline replay.
//!
//! A trace is a plain text file with one observation per line:
//!
//! ```text
//! # comment
//! motion,<timestamp_ms>,<magnitude>
//! gps,<timestamp_ms>,<lat>,<lng>
//! ```
//!
//! Replaying a trace through a [`WorkoutSession`] reproduces exactly what the
//! live session computed, since nothing in the core reads a clock.

use std::io::BufRead;

use tracing::debug;

use crate::error::{StrokeError, StrokeResult};
use crate::session::WorkoutSession;
use crate::summary::WorkoutSummary;
use crate::types::GpsFix;

/// One observation from a trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceRecord {
    Motion { timestamp_ms: u64, magnitude: f64 },
    Gps(GpsFix),
}

impl TraceRecord {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            TraceRecord::Motion { timestamp_ms, .. } => *timestamp_ms,
            TraceRecord::Gps(fix) => fix.timestamp_ms,
        }
    }
}

/// Parse a trace. Blank lines and `#` comments are skipped.
pub fn parse_trace<R: BufRead>(reader: R) -> StrokeResult<Vec<TraceRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| StrokeError::TraceParse {
            line: line_no,
            reason: e.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        records.push(parse_line(trimmed, line_no)?);
    }
    Ok(records)
}

fn parse_line(line: &str, line_no: usize) -> StrokeResult<TraceRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let err = |reason: String| StrokeError::TraceParse {
        line: line_no,
        reason,
    };

    match fields.as_slice() {
        ["motion", ts, magnitude] => Ok(TraceRecord::Motion {
            timestamp_ms: parse_field(ts, "timestamp").map_err(err)?,
            magnitude: parse_field(magnitude, "magnitude").map_err(err)?,
        }),
        ["gps", ts, lat, lng] => Ok(TraceRecord::Gps(GpsFix::new(
            parse_field(lat, "latitude").map_err(err)?,
            parse_field(lng, "longitude").map_err(err)?,
            parse_field(ts, "timestamp").map_err(err)?,
        ))),
        [kind, ..] => Err(err(format!(
            "expected `motion,<ts>,<magnitude>` or `gps,<ts>,<lat>,<lng>`, got `{kind}` with {} fields",
            fields.len()
        ))),
        [] => Err(err("empty record".to_string())),
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| format!("invalid {name} `{raw}`: {e}"))
}

/// Run `records` through `session`, starting it at the first record and
/// stopping it at the last. Returns the workout summary.
pub fn replay(session: &mut WorkoutSession, records: &[TraceRecord]) -> WorkoutSummary {
    let Some(first) = records.first() else {
        return session.summary();
    };
    session.start(first.timestamp_ms());

    let mut last_ms = first.timestamp_ms();
    for record in records {
        last_ms = last_ms.max(record.timestamp_ms());
        let event = match *record {
            TraceRecord::Motion {
                timestamp_ms,
                magnitude,
            } => session.observe_motion(magnitude, timestamp_ms),
            TraceRecord::Gps(fix) => session.observe_fix(fix),
        };
        if let Some(event) = event {
            debug!(
                timestamp_ms = event.timestamp_ms,
                rate = event.rate_spm,
                current = ?session.current_rate(),
                "replayed detection"
            );
        }
    }
    session.stop(last_ms)
}
