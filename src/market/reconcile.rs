use crate::market::types::{Candle, Timeframe, SERIES_CAP};
use std::collections::HashMap;

/// What `SeriesBuffer::apply_update` did with an incoming candle.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// A new bar opened; `evicted` reports whether the cap pushed out the
    /// oldest entry.
    Appended { evicted: bool },
    /// In-progress bar: same time as the last entry, replaced in place.
    ReplacedLast,
    /// Older than the last entry; the buffer is untouched.
    Stale { incoming: i64, last: i64 },
}

/// A display-oriented candle series for one (pair, timeframe), capped at
/// [`SERIES_CAP`] entries with FIFO eviction by time.
///
/// Invariant: times are strictly increasing; at most one candle per time.
#[derive(Debug, Clone, Default)]
pub struct SeriesBuffer {
    candles: Vec<Candle>,
}

impl SeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Replaces the whole series with a snapshot. The input is normalized to
    /// the buffer invariant: sorted ascending by time, one candle per time
    /// (last occurrence wins), newest [`SERIES_CAP`] entries kept.
    pub fn replace_with_snapshot(&mut self, mut candles: Vec<Candle>) {
        candles.sort_by_key(|candle| candle.time);
        self.candles.clear();
        for candle in candles {
            match self.candles.last_mut() {
                Some(last) if last.time == candle.time => *last = candle,
                _ => self.candles.push(candle),
            }
        }
        if self.candles.len() > SERIES_CAP {
            self.candles.drain(..self.candles.len() - SERIES_CAP);
        }
    }

    /// Merges one incremental update, the most recent (possibly still-open)
    /// bar. Stale updates are a silent no-op.
    pub fn apply_update(&mut self, candle: Candle) -> ApplyOutcome {
        match self.candles.last() {
            Some(last) if candle.time < last.time => ApplyOutcome::Stale {
                incoming: candle.time,
                last: last.time,
            },
            Some(last) if candle.time == last.time => {
                let index = self.candles.len() - 1;
                self.candles[index] = candle;
                ApplyOutcome::ReplacedLast
            }
            _ => {
                self.candles.push(candle);
                let evicted = self.candles.len() > SERIES_CAP;
                if evicted {
                    self.candles.remove(0);
                }
                ApplyOutcome::Appended { evicted }
            }
        }
    }
}

/// One buffer per (pair, timeframe), retained across timeframe switches so
/// coming back to a timeframe does not refetch already-seen candles.
#[derive(Debug, Default)]
pub struct SeriesCache {
    buffers: HashMap<(String, Timeframe), SeriesBuffer>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer_mut(&mut self, pair: &str, timeframe: Timeframe) -> &mut SeriesBuffer {
        self.buffers
            .entry((pair.to_string(), timeframe))
            .or_default()
    }

    pub fn buffer(&self, pair: &str, timeframe: Timeframe) -> Option<&SeriesBuffer> {
        self.buffers.get(&(pair.to_string(), timeframe))
    }
}
