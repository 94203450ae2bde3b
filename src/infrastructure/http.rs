use crate::domain::{
    errors::{AppResult, InfrastructureError, NetworkError},
    logging::LogComponent,
    market_data::{Candle, CandlePage, CandleRepository, PageRequest, Timestamp},
};
use crate::{log_debug, log_info};
use futures::future::LocalBoxFuture;
use gloo_net::http::Request;
use serde::Deserialize;

/// One candle as the backend sends it. Prices may arrive as numbers or
/// numeric strings; `time` is seconds (values past year 5138 are read as
/// milliseconds).
#[derive(Debug, Clone, Deserialize)]
pub struct CandleDto {
    #[serde(alias = "timestamp")]
    pub time: u64,
    #[serde(deserialize_with = "number_or_string")]
    pub open: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub high: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub low: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub close: f64,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub volume: Option<f64>,
}

impl CandleDto {
    const MILLIS_THRESHOLD: u64 = 100_000_000_000;

    pub fn into_candle(self) -> Candle {
        let timestamp = if self.time >= Self::MILLIS_THRESHOLD {
            Timestamp::from_millis(self.time)
        } else {
            Timestamp::from_secs(self.time)
        };
        Candle::from_values(
            timestamp.value(),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume.unwrap_or(f64::NAN),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandlePageDto {
    pub candles: Vec<CandleDto>,
    #[serde(default)]
    pub has_more: bool,
}

impl CandlePageDto {
    pub fn into_page(self) -> CandlePage {
        CandlePage {
            candles: self.candles.into_iter().map(CandleDto::into_candle).collect(),
            has_more: self.has_more,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

fn number_or_string<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_f64()
}

fn optional_number_or_string<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?.map(NumberOrString::into_f64).transpose()
}

/// REST client for `GET {base}/candles?symbol=&interval=&offset=&limit=`
#[derive(Debug, Clone)]
pub struct RestCandleClient {
    base_url: String,
}

impl RestCandleClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn page_url(&self, request: &PageRequest) -> String {
        format!(
            "{}/candles?symbol={}&interval={}&offset={}&limit={}",
            self.base_url.trim_end_matches('/'),
            request.symbol.value(),
            request.interval.as_query(),
            request.offset,
            request.limit
        )
    }

    pub fn parse_page(body: &str) -> AppResult<CandlePage> {
        let dto: CandlePageDto = serde_json::from_str(body).map_err(|e| {
            InfrastructureError::Network(NetworkError::InvalidPayload(format!("candle page: {}", e)))
        })?;
        Ok(dto.into_page())
    }

    async fn get_page(&self, request: PageRequest) -> AppResult<CandlePage> {
        let url = self.page_url(&request);
        log_debug!(LogComponent::Infrastructure("RestCandleClient"), "GET {}", url);

        let response = Request::get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| InfrastructureError::Network(NetworkError::HttpRequestFailed(e.to_string())))?;

        if !response.ok() {
            return Err(InfrastructureError::Network(NetworkError::UnexpectedStatus {
                status: response.status(),
                text: response.status_text(),
            })
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| InfrastructureError::Network(NetworkError::HttpRequestFailed(e.to_string())))?;
        let page = Self::parse_page(&body)?;

        log_info!(
            LogComponent::Infrastructure("RestCandleClient"),
            "fetched {} candles at offset {} (has_more={})",
            page.candles.len(),
            request.offset,
            page.has_more
        );
        Ok(page)
    }
}

impl CandleRepository for RestCandleClient {
    fn fetch_page(&self, request: PageRequest) -> LocalBoxFuture<'_, AppResult<CandlePage>> {
        Box::pin(self.get_page(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{Symbol, TimeInterval};

    #[test]
    fn builds_query_url() {
        let client = RestCandleClient::new("https://example.test/api/");
        let request = PageRequest {
            symbol: Symbol::from("ethusdt"),
            interval: TimeInterval::FiveMinutes,
            offset: 500,
            limit: 250,
        };
        assert_eq!(
            client.page_url(&request),
            "https://example.test/api/candles?symbol=ETHUSDT&interval=5m&offset=500&limit=250"
        );
    }

    #[test]
    fn parses_mixed_payload() {
        let body = r#"{
            "candles": [
                {"time": 1700000060, "open": "10.5", "high": 12, "low": 10, "close": 11, "volume": 3},
                {"timestamp": 1700000000000, "open": 10, "high": 11, "low": 9, "close": 10.5}
            ],
            "has_more": true
        }"#;
        let page = RestCandleClient::parse_page(body).unwrap();
        assert!(page.has_more);
        assert_eq!(page.candles[0].ohlcv.open.value(), 10.5);
        assert_eq!(page.candles[1].timestamp.value(), 1_700_000_000);
        assert_eq!(page.candles[1].ohlcv.volume.value(), 0.0);
    }

    #[test]
    fn rejects_malformed_payload() {
        let err = RestCandleClient::parse_page(r#"{"candles": [{"time": 1}]}"#).unwrap_err();
        assert!(err.to_string().contains("candle page"));
    }
}
