//! Per-indicator parameters. Created with defaults at start-up, edited from
//! settings dialogs, reset but never removed.

use super::IndicatorKind;
use crate::domain::errors::ValidationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsiConfig {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
    pub color: String,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self { period: 14, overbought: 70.0, oversold: 30.0, color: "#7E57C2".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtrConfig {
    pub period: usize,
    pub color: String,
}

impl Default for AtrConfig {
    fn default() -> Self {
        Self { period: 14, color: "#FF9800".to_string() }
    }
}

/// Shared by EMA and SMA overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingAverageConfig {
    pub period: usize,
    pub color: String,
}

impl MovingAverageConfig {
    pub fn ema_default() -> Self {
        Self { period: 20, color: "#2962FF".to_string() }
    }

    pub fn sma_default() -> Self {
        Self { period: 50, color: "#F23645".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerConfig {
    pub period: usize,
    pub std_dev_multiplier: f64,
    pub upper_color: String,
    pub middle_color: String,
    pub lower_color: String,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
            upper_color: "#089981".to_string(),
            middle_color: "#2962FF".to_string(),
            lower_color: "#F23645".to_string(),
        }
    }
}

/// Stored and editable, not derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    pub macd_color: String,
    pub signal_color: String,
    pub histogram_color: String,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            macd_color: "#2962FF".to_string(),
            signal_color: "#FF6D00".to_string(),
            histogram_color: "#26A69A".to_string(),
        }
    }
}

/// A single settings-dialog update, tagged by indicator kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum IndicatorSettings {
    #[serde(rename = "RSI")]
    Rsi(RsiConfig),
    #[serde(rename = "ATR")]
    Atr(AtrConfig),
    #[serde(rename = "EMA")]
    Ema(MovingAverageConfig),
    #[serde(rename = "SMA")]
    Sma(MovingAverageConfig),
    #[serde(rename = "BollingerBands")]
    BollingerBands(BollingerConfig),
    #[serde(rename = "MACD")]
    Macd(MacdConfig),
}

impl IndicatorSettings {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorSettings::Rsi(_) => IndicatorKind::Rsi,
            IndicatorSettings::Atr(_) => IndicatorKind::Atr,
            IndicatorSettings::Ema(_) => IndicatorKind::Ema,
            IndicatorSettings::Sma(_) => IndicatorKind::Sma,
            IndicatorSettings::BollingerBands(_) => IndicatorKind::BollingerBands,
            IndicatorSettings::Macd(_) => IndicatorKind::Macd,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let kind = self.kind();
        let require_period = |period: usize| {
            if period == 0 {
                Err(invalid(kind, "period must be at least 1"))
            } else {
                Ok(())
            }
        };

        match self {
            IndicatorSettings::Rsi(c) => {
                require_period(c.period)?;
                let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
                if !in_range(c.overbought) || !in_range(c.oversold) {
                    return Err(invalid(kind, "thresholds must lie within [0, 100]"));
                }
                if c.oversold >= c.overbought {
                    return Err(invalid(kind, "oversold must be below overbought"));
                }
                Ok(())
            }
            IndicatorSettings::Atr(c) => require_period(c.period),
            IndicatorSettings::Ema(c) | IndicatorSettings::Sma(c) => require_period(c.period),
            IndicatorSettings::BollingerBands(c) => {
                require_period(c.period)?;
                if !(c.std_dev_multiplier.is_finite() && c.std_dev_multiplier > 0.0) {
                    return Err(invalid(kind, "std-dev multiplier must be positive"));
                }
                Ok(())
            }
            IndicatorSettings::Macd(c) => {
                require_period(c.fast_period)?;
                require_period(c.signal_period)?;
                if c.fast_period >= c.slow_period {
                    return Err(invalid(kind, "fast period must be shorter than slow period"));
                }
                Ok(())
            }
        }
    }
}

fn invalid(kind: IndicatorKind, reason: &str) -> ValidationError {
    ValidationError::InvalidIndicatorConfig(format!("{}: {}", kind, reason))
}

/// Parameter bag keyed by indicator kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorConfig {
    pub rsi: RsiConfig,
    pub atr: AtrConfig,
    pub ema: MovingAverageConfig,
    pub sma: MovingAverageConfig,
    pub bollinger: BollingerConfig,
    pub macd: MacdConfig,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi: RsiConfig::default(),
            atr: AtrConfig::default(),
            ema: MovingAverageConfig::ema_default(),
            sma: MovingAverageConfig::sma_default(),
            bollinger: BollingerConfig::default(),
            macd: MacdConfig::default(),
        }
    }
}

impl IndicatorConfig {
    /// Validate then store one update. A rejected update leaves the bag untouched.
    pub fn apply(&mut self, settings: IndicatorSettings) -> Result<(), ValidationError> {
        settings.validate()?;
        match settings {
            IndicatorSettings::Rsi(c) => self.rsi = c,
            IndicatorSettings::Atr(c) => self.atr = c,
            IndicatorSettings::Ema(c) => self.ema = c,
            IndicatorSettings::Sma(c) => self.sma = c,
            IndicatorSettings::BollingerBands(c) => self.bollinger = c,
            IndicatorSettings::Macd(c) => self.macd = c,
        }
        Ok(())
    }

    pub fn settings(&self, kind: IndicatorKind) -> IndicatorSettings {
        match kind {
            IndicatorKind::Rsi => IndicatorSettings::Rsi(self.rsi.clone()),
            IndicatorKind::Atr => IndicatorSettings::Atr(self.atr.clone()),
            IndicatorKind::Ema => IndicatorSettings::Ema(self.ema.clone()),
            IndicatorKind::Sma => IndicatorSettings::Sma(self.sma.clone()),
            IndicatorKind::BollingerBands => IndicatorSettings::BollingerBands(self.bollinger.clone()),
            IndicatorKind::Macd => IndicatorSettings::Macd(self.macd.clone()),
        }
    }

    pub fn reset(&mut self, kind: IndicatorKind) {
        let defaults = Self::default();
        match kind {
            IndicatorKind::Rsi => self.rsi = defaults.rsi,
            IndicatorKind::Atr => self.atr = defaults.atr,
            IndicatorKind::Ema => self.ema = defaults.ema,
            IndicatorKind::Sma => self.sma = defaults.sma,
            IndicatorKind::BollingerBands => self.bollinger = defaults.bollinger,
            IndicatorKind::Macd => self.macd = defaults.macd,
        }
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_update_keeps_previous_values() {
        let mut config = IndicatorConfig::default();
        let err = config.apply(IndicatorSettings::Rsi(RsiConfig { period: 0, ..RsiConfig::default() }));
        assert!(err.is_err());
        assert_eq!(config.rsi.period, 14);
    }

    #[test]
    fn reset_restores_only_that_kind() {
        let mut config = IndicatorConfig::default();
        config
            .apply(IndicatorSettings::Atr(AtrConfig { period: 7, color: "#000".into() }))
            .unwrap();
        config
            .apply(IndicatorSettings::Ema(MovingAverageConfig { period: 9, color: "#111".into() }))
            .unwrap();
        config.reset(IndicatorKind::Atr);
        assert_eq!(config.atr, AtrConfig::default());
        assert_eq!(config.ema.period, 9);
    }

    #[test]
    fn settings_parse_from_tagged_json() {
        let json = r##"{"kind":"BollingerBands","period":10,"stdDevMultiplier":2.5,
            "upperColor":"#fff","middleColor":"#aaa","lowerColor":"#000"}"##;
        let settings: IndicatorSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.kind(), IndicatorKind::BollingerBands);
        let mut config = IndicatorConfig::default();
        config.apply(settings).unwrap();
        assert_eq!(config.bollinger.std_dev_multiplier, 2.5);
    }

    #[test]
    fn macd_requires_fast_below_slow() {
        let mut config = IndicatorConfig::default();
        let bad = MacdConfig { fast_period: 30, ..MacdConfig::default() };
        assert!(config.apply(IndicatorSettings::Macd(bad)).is_err());
    }
}
