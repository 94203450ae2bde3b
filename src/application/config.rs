use super::time_sync::DEFAULT_SETTLE_DELAY_MS;
use crate::domain::{
    chart::{ChartMode, Theme},
    errors::ValidationError,
    market_data::{Symbol, TimeInterval},
};
use serde::{Deserialize, Serialize};

/// Runtime settings handed in by the host page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    pub base_url: String,
    pub symbol: Symbol,
    pub interval: TimeInterval,
    /// Candles per history page
    pub page_size: usize,
    pub settle_delay_ms: u32,
    pub theme: Theme,
    pub mode: ChartMode,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            base_url: "/api".to_string(),
            symbol: Symbol::from("BTCUSDT"),
            interval: TimeInterval::OneMinute,
            page_size: 500,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            theme: Theme::default(),
            mode: ChartMode::default(),
        }
    }
}

impl ChartConfig {
    pub const MAX_PAGE_SIZE: usize = 5_000;

    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ValidationError::InvalidChartConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::InvalidChartConfig("base URL is empty".to_string()));
        }
        if self.symbol.value().is_empty() {
            return Err(ValidationError::InvalidChartConfig("symbol is empty".to_string()));
        }
        if self.page_size == 0 || self.page_size > Self::MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidChartConfig(format!(
                "page size must be within 1..={}",
                Self::MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }
}
