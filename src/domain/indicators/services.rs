//! Indicator math over oldest-first candles.
//!
//! Every function is pure and total: fewer candles than the warm-up window
//! (or a zero period) yields an empty vector, never an error. Output points
//! carry the timestamp of the candle that completes them, so each output is
//! a suffix of the input's time axis.

use super::{BandPoint, IndicatorPoint};
use crate::domain::market_data::Candle;

/// Simple moving average of closes. First point at index `period - 1`.
pub fn sma(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(candles.len() - period + 1);
    let mut sum: f64 = candles[..period].iter().map(Candle::close).sum();
    out.push(IndicatorPoint::new(candles[period - 1].timestamp, sum / period as f64));

    for i in period..candles.len() {
        sum += candles[i].close() - candles[i - period].close();
        out.push(IndicatorPoint::new(candles[i].timestamp, sum / period as f64));
    }
    out
}

/// Exponential moving average seeded with the SMA of the first `period` closes,
/// multiplier `2 / (period + 1)`.
pub fn ema(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = candles[..period].iter().map(Candle::close).sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(candles.len() - period + 1);
    out.push(IndicatorPoint::new(candles[period - 1].timestamp, seed));

    let mut prev = seed;
    for candle in &candles[period..] {
        prev = alpha * candle.close() + (1.0 - alpha) * prev;
        out.push(IndicatorPoint::new(candle.timestamp, prev));
    }
    out
}

/// Wilder's relative strength index.
///
/// Needs `period` close-to-close changes, so the first point sits at index
/// `period`. A window without losses reads 100.
pub fn rsi(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() <= period {
        return Vec::new();
    }

    let changes: Vec<f64> = candles.windows(2).map(|w| w[1].close() - w[0].close()).collect();
    let p = period as f64;

    let mut avg_gain = changes[..period].iter().map(|c| c.max(0.0)).sum::<f64>() / p;
    let mut avg_loss = changes[..period].iter().map(|c| (-c).max(0.0)).sum::<f64>() / p;

    let mut out = Vec::with_capacity(candles.len() - period);
    out.push(IndicatorPoint::new(candles[period].timestamp, rsi_value(avg_gain, avg_loss)));

    for (i, change) in changes.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (p - 1.0) + change.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-change).max(0.0)) / p;
        out.push(IndicatorPoint::new(candles[i + 1].timestamp, rsi_value(avg_gain, avg_loss)));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// `max(high - low, |high - prev close|, |low - prev close|)`; the first bar
/// has no previous close and uses its own range.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let high = c.ohlcv.high.value();
            let low = c.ohlcv.low.value();
            match i.checked_sub(1).map(|j| candles[j].close()) {
                Some(prev_close) => (high - low)
                    .max((high - prev_close).abs())
                    .max((low - prev_close).abs()),
                None => high - low,
            }
        })
        .collect()
}

/// Average true range with Wilder smoothing. First point at index `period - 1`.
pub fn atr(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }

    let tr = true_range(candles);
    let p = period as f64;
    let mut avg = tr[..period].iter().sum::<f64>() / p;

    let mut out = Vec::with_capacity(candles.len() - period + 1);
    out.push(IndicatorPoint::new(candles[period - 1].timestamp, avg));

    for i in period..candles.len() {
        avg = (avg * (p - 1.0) + tr[i]) / p;
        out.push(IndicatorPoint::new(candles[i].timestamp, avg));
    }
    out
}

/// SMA middle band with `multiplier` population standard deviations either side.
pub fn bollinger_bands(candles: &[Candle], period: usize, multiplier: f64) -> Vec<BandPoint> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }

    candles
        .windows(period)
        .map(|window| {
            let middle = window.iter().map(Candle::close).sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|c| {
                    let diff = c.close() - middle;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            let width = multiplier * variance.sqrt();
            BandPoint {
                time: window[period - 1].timestamp,
                upper: middle + width,
                middle,
                lower: middle - width,
            }
        })
        .collect()
}
