use super::value_objects::{ChartMode, Color, SeriesKind};
use crate::domain::indicators::{BandPoint, IndicatorPoint};
use crate::domain::market_data::Timestamp;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarPoint {
    pub time: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Close-price point; same shape as a single-line indicator sample.
pub type LinePoint = IndicatorPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramPoint {
    pub time: Timestamp,
    pub value: f64,
    pub color: Color,
}

/// Everything the chart panes render for one set of inputs.
///
/// Absent series are empty vectors so consumers can always iterate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSeriesSet {
    pub mode: ChartMode,
    pub primary_kind: Option<SeriesKind>,
    /// Filled in `ohlc` mode
    pub bars: Vec<BarPoint>,
    /// Filled in `price` mode
    pub line: Vec<LinePoint>,
    pub volume: Vec<HistogramPoint>,
    pub rsi: Vec<IndicatorPoint>,
    pub atr: Vec<IndicatorPoint>,
    pub ema: Vec<IndicatorPoint>,
    pub sma: Vec<IndicatorPoint>,
    pub bollinger: Vec<BandPoint>,
}

impl DerivedSeriesSet {
    pub fn empty(mode: ChartMode) -> Self {
        Self {
            mode,
            primary_kind: mode.primary_series_kind(),
            bars: Vec::new(),
            line: Vec::new(),
            volume: Vec::new(),
            rsi: Vec::new(),
            atr: Vec::new(),
            ema: Vec::new(),
            sma: Vec::new(),
            bollinger: Vec::new(),
        }
    }

    /// Number of candles in the primary window.
    pub fn len(&self) -> usize {
        self.volume.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volume.is_empty()
    }

    /// Time of the last candle in the window.
    pub fn last_time(&self) -> Option<Timestamp> {
        self.volume.last().map(|p| p.time)
    }
}
