use crate::domain::market_data::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Indicator kinds the dashboard knows about.
///
/// `Macd` only carries configuration; nothing derives it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString, AsRefStr, Serialize,
    Deserialize,
)]
pub enum IndicatorKind {
    #[strum(serialize = "RSI")]
    #[serde(rename = "RSI")]
    Rsi,
    #[strum(serialize = "ATR")]
    #[serde(rename = "ATR")]
    Atr,
    #[strum(serialize = "EMA")]
    #[serde(rename = "EMA")]
    Ema,
    #[strum(serialize = "SMA")]
    #[serde(rename = "SMA")]
    Sma,
    #[strum(serialize = "BollingerBands")]
    #[serde(rename = "BollingerBands")]
    BollingerBands,
    #[strum(serialize = "MACD")]
    #[serde(rename = "MACD")]
    Macd,
}

/// One value of a single-line indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: Timestamp,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn new(time: Timestamp, value: f64) -> Self {
        Self { time, value }
    }
}

/// One Bollinger sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPoint {
    pub time: Timestamp,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}
