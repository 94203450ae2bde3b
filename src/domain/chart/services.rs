use super::entities::{BarPoint, DerivedSeriesSet, HistogramPoint, LinePoint};
use super::value_objects::{ChartMode, Theme, VolumePalette};
use crate::domain::indicators::{IndicatorConfig, IndicatorKind, services as math};
use crate::domain::market_data::{Candle, CandleSeries};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Inputs that fully determine a `DerivedSeriesSet`.
#[derive(Debug, Clone, Copy)]
pub struct DerivationRequest<'a> {
    /// Any ordering; the backend sends newest-first.
    pub candles: &'a [Candle],
    pub mode: ChartMode,
    pub active: &'a BTreeSet<IndicatorKind>,
    pub config: &'a IndicatorConfig,
    pub theme: Theme,
    /// Replay window: keep only the first `n` candles, oldest-first.
    pub window: Option<usize>,
}

/// Domain service turning candles into every series the panes draw.
///
/// Holds no state between calls; the same request always yields the same set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedSeriesBuilder;

impl DerivedSeriesBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, request: &DerivationRequest<'_>) -> DerivedSeriesSet {
        let ordered = Self::oldest_first(request.candles);
        let end = request.window.map_or(ordered.len(), |n| n.min(ordered.len()));
        let candles = &ordered[..end];

        let mut set = DerivedSeriesSet::empty(request.mode);
        if candles.is_empty() {
            return set;
        }

        match request.mode {
            ChartMode::Ohlc => set.bars = candles.iter().map(Self::bar).collect(),
            ChartMode::Price => {
                set.line = candles.iter().map(|c| LinePoint::new(c.timestamp, c.close())).collect()
            }
            ChartMode::Volume => {}
        }
        set.volume = Self::volume_histogram(candles, request.theme);

        let config = request.config;
        let active = |kind: IndicatorKind| request.active.contains(&kind);
        if active(IndicatorKind::Rsi) {
            set.rsi = math::rsi(candles, config.rsi.period);
        }
        if active(IndicatorKind::Atr) {
            set.atr = math::atr(candles, config.atr.period);
        }
        if active(IndicatorKind::Ema) {
            set.ema = math::ema(candles, config.ema.period);
        }
        if active(IndicatorKind::Sma) {
            set.sma = math::sma(candles, config.sma.period);
        }
        if active(IndicatorKind::BollingerBands) {
            set.bollinger =
                math::bollinger_bands(candles, config.bollinger.period, config.bollinger.std_dev_multiplier);
        }

        set
    }

    /// Volume bars tinted up when the close holds or beats the previous close.
    /// The first bar has no predecessor and compares against its own open.
    pub fn volume_histogram(candles: &[Candle], theme: Theme) -> Vec<HistogramPoint> {
        let palette = VolumePalette::for_theme(theme);
        candles
            .iter()
            .enumerate()
            .map(|(i, candle)| {
                let reference = match i.checked_sub(1) {
                    Some(prev) => candles[prev].close(),
                    None => candle.ohlcv.open.value(),
                };
                let color = if candle.close() >= reference { palette.up } else { palette.down };
                HistogramPoint { time: candle.timestamp, value: candle.ohlcv.volume.value(), color }
            })
            .collect()
    }

    fn bar(candle: &Candle) -> BarPoint {
        BarPoint {
            time: candle.timestamp,
            open: candle.ohlcv.open.value(),
            high: candle.ohlcv.high.value(),
            low: candle.ohlcv.low.value(),
            close: candle.close(),
        }
    }

    /// Borrow when already strictly increasing, otherwise sort and dedupe once.
    fn oldest_first(candles: &[Candle]) -> Cow<'_, [Candle]> {
        let ordered = candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp);
        if ordered {
            Cow::Borrowed(candles)
        } else {
            let series = CandleSeries::from_unordered(candles.iter().copied());
            Cow::Owned(series.as_slice().to_vec())
        }
    }
}
