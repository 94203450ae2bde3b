use crate::domain::errors::AppResult;
use crate::domain::market_data::{Candle, Symbol, TimeInterval};
use futures::future::LocalBoxFuture;

/// One page of history, as the REST backend paginates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub symbol: Symbol,
    pub interval: TimeInterval,
    /// Number of most recent candles to skip.
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandlePage {
    /// Newest-first, as delivered by the backend.
    pub candles: Vec<Candle>,
    pub has_more: bool,
}

/// Source of historical candles. Single-threaded, so futures are not `Send`.
pub trait CandleRepository {
    fn fetch_page(&self, request: PageRequest) -> LocalBoxFuture<'_, AppResult<CandlePage>>;
}
