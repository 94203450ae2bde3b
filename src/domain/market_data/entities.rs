use super::value_objects::{OHLCV, Price, Timestamp, Volume};
use serde::{Deserialize, Serialize};

/// Domain entity - Candle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: Timestamp,
    pub ohlcv: OHLCV,
}

impl Candle {
    pub fn new(timestamp: Timestamp, ohlcv: OHLCV) -> Self {
        Self { timestamp, ohlcv }
    }

    /// Shorthand used by feeds and tests that carry plain numbers.
    pub fn from_values(timestamp: u64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self::new(
            Timestamp::from(timestamp),
            OHLCV::new(
                Price::from(open),
                Price::from(high),
                Price::from(low),
                Price::from(close),
                Volume::from(volume),
            ),
        )
    }

    pub fn close(&self) -> f64 {
        self.ohlcv.close.value()
    }
}

/// How a batch of candles changed a series, used to keep the replay cursor in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeriesChange {
    pub previous_len: usize,
    pub new_len: usize,
    /// Candles that landed before the previously oldest candle.
    pub prepended: usize,
}

/// Candle series kept oldest-first with unique timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new() -> Self {
        Self { candles: Vec::new() }
    }

    /// Build from any ordering; duplicate timestamps keep the last occurrence.
    pub fn from_unordered(candles: impl IntoIterator<Item = Candle>) -> Self {
        let mut series = Self::new();
        series.merge(candles);
        series
    }

    /// Insert or replace candles by timestamp and report what moved.
    pub fn merge(&mut self, candles: impl IntoIterator<Item = Candle>) -> SeriesChange {
        let previous_len = self.candles.len();
        let previous_oldest = self.candles.first().map(|c| c.timestamp);
        let mut prepended = 0;

        for candle in candles {
            if let Some(oldest) = previous_oldest {
                if candle.timestamp < oldest && !self.contains(candle.timestamp) {
                    prepended += 1;
                }
            }
            self.upsert(candle);
        }

        SeriesChange { previous_len, new_len: self.candles.len(), prepended }
    }

    /// Replace the bar with the same timestamp or insert in time order.
    pub fn upsert(&mut self, candle: Candle) {
        if let Some(last) = self.candles.last_mut() {
            if last.timestamp == candle.timestamp {
                *last = candle;
                return;
            }
            if candle.timestamp > last.timestamp {
                self.candles.push(candle);
                return;
            }
        }

        match self.candles.binary_search_by(|c| c.timestamp.cmp(&candle.timestamp)) {
            Ok(pos) => self.candles[pos] = candle,
            Err(pos) => self.candles.insert(pos, candle),
        }
    }

    /// Swap in a fresh batch. When the batch still holds the previous oldest
    /// candle, bars older than it count as prepended; otherwise the series is
    /// treated as brand new.
    pub fn replace(&mut self, candles: impl IntoIterator<Item = Candle>) -> SeriesChange {
        let previous_len = self.candles.len();
        let previous_oldest = self.oldest().map(|c| c.timestamp);
        let next = Self::from_unordered(candles);

        let change = match previous_oldest {
            Some(oldest) if next.contains(oldest) => SeriesChange {
                previous_len,
                new_len: next.len(),
                prepended: next.candles.partition_point(|c| c.timestamp < oldest),
            },
            _ => SeriesChange { previous_len: 0, new_len: next.len(), prepended: 0 },
        };
        *self = next;
        change
    }

    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.candles.binary_search_by(|c| c.timestamp.cmp(&timestamp)).is_ok()
    }

    pub fn clear(&mut self) {
        self.candles.clear();
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn oldest(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: u64, close: f64) -> Candle {
        Candle::from_values(ts, close, close + 1.0, close - 1.0, close, 1.0)
    }

    #[test]
    fn newest_first_input_is_stored_oldest_first() {
        let series = CandleSeries::from_unordered(vec![bar(300, 3.0), bar(200, 2.0), bar(100, 1.0)]);
        let times: Vec<u64> = series.as_slice().iter().map(|c| c.timestamp.value()).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn duplicate_timestamp_keeps_last() {
        let series = CandleSeries::from_unordered(vec![bar(100, 1.0), bar(100, 5.0)]);
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest().unwrap().close(), 5.0);
    }

    #[test]
    fn merge_counts_only_older_bars_as_prepended() {
        let mut series = CandleSeries::from_unordered(vec![bar(300, 3.0), bar(400, 4.0)]);
        let change = series.merge(vec![bar(100, 1.0), bar(200, 2.0), bar(400, 4.5), bar(500, 5.0)]);
        assert_eq!(change, SeriesChange { previous_len: 2, new_len: 5, prepended: 2 });
    }

    #[test]
    fn replace_with_overlapping_reload_keeps_anchor() {
        let mut series = CandleSeries::from_unordered(vec![bar(300, 3.0), bar(400, 4.0)]);
        let change = series.replace(vec![bar(500, 5.0), bar(400, 4.0), bar(300, 3.0), bar(200, 2.0)]);
        assert_eq!(change, SeriesChange { previous_len: 2, new_len: 4, prepended: 1 });
    }

    #[test]
    fn replace_with_unrelated_data_starts_over() {
        let mut series = CandleSeries::from_unordered(vec![bar(300, 3.0)]);
        let change = series.replace(vec![bar(10, 1.0), bar(20, 2.0)]);
        assert_eq!(change, SeriesChange { previous_len: 0, new_len: 2, prepended: 0 });
        assert_eq!(series.oldest().unwrap().timestamp.value(), 10);
    }

    #[test]
    fn merge_into_empty_series_prepends_nothing() {
        let mut series = CandleSeries::new();
        let change = series.merge(vec![bar(100, 1.0), bar(200, 2.0)]);
        assert_eq!(change.prepended, 0);
        assert_eq!(change.new_len, 2);
    }
}
