use derive_more::{Constructor, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{AsRefStr, EnumIter, EnumString};

/// Value Object - price level
#[derive(Debug, Clone, Copy, PartialEq, From, Into, Constructor, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(f64);

impl Price {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

/// Value Object - traded volume. Missing or non-finite input reads as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, From, Into, Constructor, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volume(f64);

impl Volume {
    pub fn value(&self) -> f64 {
        if self.0.is_finite() { self.0 } else { 0.0 }
    }

    pub fn raw(&self) -> f64 {
        self.0
    }
}

/// Value Object - bar open time in Unix seconds (the chart time axis unit)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Constructor, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    pub fn from_secs(value: u64) -> Self {
        Self(value)
    }

    /// Convert from a millisecond epoch, as some feeds deliver it.
    pub fn from_millis(value: u64) -> Self {
        Self(value / 1000)
    }
}

/// Value Object - OHLCV quintuple
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct OHLCV {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    #[serde(default)]
    pub volume: Volume,
}

impl OHLCV {
    /// High bounds the body from above, low from below, prices are finite.
    pub fn is_valid(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.value().is_finite())
            && self.high >= self.open
            && self.high >= self.close
            && self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close
            && self.volume.value() >= 0.0
    }
}

/// Value Object - instrument symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
#[serde(try_from = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: String) -> Result<Self, String> {
        if symbol.trim().is_empty() {
            return Err("Symbol cannot be empty".to_string());
        }
        Ok(Self(symbol.trim().to_uppercase()))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self(value.trim().to_uppercase())
    }
}

/// Value Object - chart timeframe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum TimeInterval {
    #[strum(serialize = "1m")]
    #[serde(rename = "1m")]
    OneMinute,

    #[strum(serialize = "5m")]
    #[serde(rename = "5m")]
    FiveMinutes,

    #[strum(serialize = "15m")]
    #[serde(rename = "15m")]
    FifteenMinutes,

    #[strum(serialize = "30m")]
    #[serde(rename = "30m")]
    ThirtyMinutes,

    #[strum(serialize = "1h")]
    #[serde(rename = "1h")]
    OneHour,

    #[strum(serialize = "4h")]
    #[serde(rename = "4h")]
    FourHours,

    #[strum(serialize = "1d")]
    #[serde(rename = "1d")]
    OneDay,

    #[strum(serialize = "1w")]
    #[serde(rename = "1w")]
    OneWeek,
}

impl TimeInterval {
    pub fn as_query(&self) -> &str {
        self.as_ref()
    }

    pub fn duration_secs(&self) -> u64 {
        match self {
            Self::OneMinute => 60,
            Self::FiveMinutes => 5 * 60,
            Self::FifteenMinutes => 15 * 60,
            Self::ThirtyMinutes => 30 * 60,
            Self::OneHour => 60 * 60,
            Self::FourHours => 4 * 60 * 60,
            Self::OneDay => 24 * 60 * 60,
            Self::OneWeek => 7 * 24 * 60 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn non_finite_volume_reads_as_zero() {
        assert_eq!(Volume::from(f64::NAN).value(), 0.0);
        assert_eq!(Volume::from(f64::INFINITY).value(), 0.0);
        assert_eq!(Volume::from(12.5).value(), 12.5);
    }

    #[test]
    fn ohlcv_rejects_inverted_range() {
        let ok = OHLCV::new(10.0.into(), 12.0.into(), 9.0.into(), 11.0.into(), 1.0.into());
        let bad = OHLCV::new(10.0.into(), 9.5.into(), 9.0.into(), 11.0.into(), 1.0.into());
        assert!(ok.is_valid());
        assert!(!bad.is_valid());
    }

    #[test]
    fn interval_round_trips_through_query_string() {
        assert_eq!(TimeInterval::from_str("4h").unwrap(), TimeInterval::FourHours);
        assert_eq!(TimeInterval::FifteenMinutes.as_query(), "15m");
        assert_eq!(TimeInterval::OneDay.duration_secs(), 86_400);
    }
}
