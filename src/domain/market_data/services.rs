use crate::domain::errors::ValidationError;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::Candle;
use crate::log_warn;

/// Domain service checking candles before they enter a series
#[derive(Debug, Clone, Copy, Default)]
pub struct DataValidationService;

impl DataValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Validate a candle with a descriptive error
    pub fn validate_candle(&self, candle: &Candle) -> Result<(), ValidationError> {
        let o = &candle.ohlcv;
        let prices = [o.open.value(), o.high.value(), o.low.value(), o.close.value()];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(ValidationError::InvalidCandle(format!(
                "non-finite price at {}",
                candle.timestamp.value()
            )));
        }

        if o.high < o.low {
            return Err(ValidationError::InvalidCandle(
                "High price cannot be lower than low price".to_string(),
            ));
        }
        if o.high < o.open || o.high < o.close {
            return Err(ValidationError::InvalidCandle(
                "High price cannot be lower than open or close".to_string(),
            ));
        }
        if o.low > o.open || o.low > o.close {
            return Err(ValidationError::InvalidCandle(
                "Low price cannot be higher than open or close".to_string(),
            ));
        }
        // Non-finite volume is tolerated and read as zero; only a finite negative is wrong.
        if o.volume.raw().is_finite() && o.volume.raw() < 0.0 {
            return Err(ValidationError::InvalidCandle("Volume cannot be negative".to_string()));
        }

        Ok(())
    }

    /// Keep valid candles, log and skip the rest.
    pub fn retain_valid(&self, candles: Vec<Candle>) -> Vec<Candle> {
        let total = candles.len();
        let valid: Vec<Candle> = candles
            .into_iter()
            .filter(|candle| match self.validate_candle(candle) {
                Ok(()) => true,
                Err(e) => {
                    log_warn!(
                        LogComponent::Domain("Validation"),
                        "skipping candle {}: {}",
                        candle.timestamp.value(),
                        e
                    );
                    false
                }
            })
            .collect();

        if valid.len() < total {
            log_warn!(
                LogComponent::Domain("Validation"),
                "dropped {} of {} candles",
                total - valid.len(),
                total
            );
        }
        valid
    }
}
