//! Time-bounded sliding window store.
//!
//! A chronologically ordered deque of timestamped entries that forgets
//! anything older than its retention horizon. The horizon is measured from
//! the newest appended entry, never from the wall clock, so evaluation is
//! deterministic and replayable.
//!
//! Eviction pops from the front only, so each entry is pushed and popped once:
//! amortized O(1) per append even at 60 Hz over long sessions.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::{StrokeError, StrokeResult};

/// An entry that can live in a [`SlidingWindow`].
pub trait Timestamped {
    /// Timestamp in milliseconds.
    fn timestamp_ms(&self) -> u64;
    /// Scalar value used by the window statistics.
    fn value(&self) -> f64;
}

/// Append/evict container bounded by a retention duration.
///
/// Invariant: every retained entry satisfies
/// `timestamp > newest.timestamp - retention_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow<T> {
    entries: VecDeque<T>,
    retention_ms: u64,
}

impl<T: Timestamped> SlidingWindow<T> {
    /// Create an empty window with the given retention.
    pub fn new(retention_ms: u64) -> Self {
        Self {
            entries: VecDeque::new(),
            retention_ms,
        }
    }

    /// Append an entry and evict everything that fell out of the horizon.
    ///
    /// Equal timestamps are accepted. A timestamp earlier than the newest
    /// retained entry is rejected and the window is left untouched.
    pub fn append(&mut self, entry: T) -> StrokeResult<()> {
        let timestamp_ms = entry.timestamp_ms();
        if let Some(newest) = self.entries.back() {
            if timestamp_ms < newest.timestamp_ms() {
                return Err(StrokeError::OutOfOrder {
                    previous_ms: newest.timestamp_ms(),
                    timestamp_ms,
                });
            }
        }

        self.entries.push_back(entry);
        self.evict_until(timestamp_ms);
        Ok(())
    }

    /// Evict every entry at or before `now_ms - retention_ms`.
    ///
    /// `append` does this for its own timestamp. Call it directly to look at
    /// the window from a sample that has not been appended yet.
    pub fn evict_until(&mut self, now_ms: u64) {
        // Nothing can be old enough until `now_ms` is past one full retention.
        let Some(horizon) = now_ms.checked_sub(self.retention_ms) else {
            return;
        };

        let mut evicted = 0usize;
        while self
            .entries
            .front()
            .is_some_and(|e| e.timestamp_ms() <= horizon)
        {
            self.entries.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            trace!(evicted, horizon, remaining = self.entries.len(), "window eviction");
        }
    }

    /// The last `n` entries in chronological order (all of them if fewer exist).
    pub fn recent(&self, n: usize) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    /// Arithmetic mean of all retained values, or 0 when empty.
    pub fn mean(&self) -> f64 {
        self.mean_or(0.0)
    }

    /// Arithmetic mean of all retained values, or `default` when empty.
    pub fn mean_or(&self, default: f64) -> f64 {
        mean_of(self.entries.iter(), default)
    }

    /// Mean of the last `n` values, or 0 when empty.
    pub fn mean_recent(&self, n: usize) -> f64 {
        mean_of(self.recent(n), 0.0)
    }

    /// Count entries within `span_ms` of the newest entry whose value satisfies `pred`.
    ///
    /// An entry is inside the span when `timestamp > newest - span_ms`.
    pub fn count_within<F>(&self, span_ms: u64, pred: F) -> usize
    where
        F: Fn(f64) -> bool,
    {
        let Some(newest) = self.entries.back().map(|e| e.timestamp_ms()) else {
            return 0;
        };
        self.entries
            .iter()
            .rev()
            .take_while(|e| e.timestamp_ms().saturating_add(span_ms) > newest)
            .filter(|e| pred(e.value()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn newest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.entries.iter()
    }

    pub fn retention_ms(&self) -> u64 {
        self.retention_ms
    }

    /// Drop every entry. Retention is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn mean_of<'a, T, I>(entries: I, default: f64) -> f64
where
    T: Timestamped + 'a,
    I: Iterator<Item = &'a T>,
{
    let (sum, count) = entries.fold((0.0, 0usize), |(sum, count), e| (sum + e.value(), count + 1));
    if count == 0 {
        default
    } else {
        sum / count as f64
    }
}
