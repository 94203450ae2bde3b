use crate::application::controller::ChartController;
use crate::domain::{
    errors::AppResult,
    events::{EventDispatcher, MarketDataEvent},
    logging::LogComponent,
    market_data::{CandleRepository, PageRequest, Symbol, TimeInterval},
};
use crate::{log_debug, log_error, log_info};
use std::cell::Cell;

/// Use Case: load history pages into a chart.
///
/// The first page replaces whatever the chart holds; later pages are older
/// candles merged in front. Only one request runs at a time, a second call
/// while one is pending returns `Ok(0)` without fetching. A page that arrives
/// after the chart's history was replaced is discarded.
pub struct HistoryLoader<R: CandleRepository> {
    repository: R,
    controller: ChartController,
    symbol: Symbol,
    interval: TimeInterval,
    page_size: usize,
    in_flight: Cell<bool>,
}

/// Clears the in-flight flag even if the future is dropped mid-request.
struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<R: CandleRepository> HistoryLoader<R> {
    pub fn new(
        repository: R,
        controller: ChartController,
        symbol: Symbol,
        interval: TimeInterval,
        page_size: usize,
    ) -> Self {
        Self { repository, controller, symbol, interval, page_size, in_flight: Cell::new(false) }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.get()
    }

    /// Fetch the newest page and make it the chart's history.
    pub async fn load_initial(&self) -> AppResult<usize> {
        let (generation, result) = {
            let Some(_guard) = self.begin() else { return Ok(0) };
            let generation = self.controller.read(|store| store.history_generation());
            let request = self.request(0);
            log_info!(
                LogComponent::Application("HistoryLoader"),
                "loading {} {} candles for {}",
                request.limit,
                self.interval,
                self.symbol
            );
            (generation, self.repository.fetch_page(request).await)
        };

        // Flag is clear again here, so events raised by the update may trigger the next page.
        match result {
            Ok(page) => {
                let count = page.candles.len();
                let has_more = page.has_more;
                let applied = self.controller.update(|store| {
                    (store.history_generation() == generation).then(|| store.set_history(page.candles, has_more))
                });
                if applied.is_none() {
                    self.discarded();
                    return Ok(0);
                }
                self.loaded(count, has_more);
                Ok(count)
            }
            Err(e) => {
                self.failed(&e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the page right before the oldest loaded candle and prepend it.
    pub async fn load_more(&self) -> AppResult<usize> {
        if !self.controller.read(|store| store.has_more()) {
            log_debug!(LogComponent::Application("HistoryLoader"), "no older history upstream");
            return Ok(0);
        }
        let (generation, result) = {
            let Some(_guard) = self.begin() else { return Ok(0) };
            let (generation, offset) =
                self.controller.read(|store| (store.history_generation(), store.candles().len()));
            let request = self.request(offset);
            log_debug!(
                LogComponent::Application("HistoryLoader"),
                "loading older page at offset {}",
                request.offset
            );
            (generation, self.repository.fetch_page(request).await)
        };

        match result {
            Ok(page) => {
                let count = page.candles.len();
                let has_more = page.has_more;
                let change =
                    self.controller.update(|store| store.prepend_history(generation, page.candles, has_more));
                let Some(change) = change else {
                    self.discarded();
                    return Ok(0);
                };
                self.loaded(count, has_more);
                Ok(change.new_len - change.previous_len)
            }
            Err(e) => {
                self.controller.update(|store| store.history_request_failed(generation));
                self.failed(&e.to_string());
                Err(e)
            }
        }
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        if self.in_flight.replace(true) {
            log_debug!(LogComponent::Application("HistoryLoader"), "request already in flight");
            return None;
        }
        Some(InFlight(&self.in_flight))
    }

    fn request(&self, offset: usize) -> PageRequest {
        PageRequest { symbol: self.symbol.clone(), interval: self.interval, offset, limit: self.page_size }
    }

    fn loaded(&self, candle_count: usize, has_more: bool) {
        self.controller.events().publish_market_data_event(MarketDataEvent::HistoricalDataLoaded {
            symbol: self.symbol.clone(),
            interval: self.interval,
            candle_count,
            has_more,
        });
    }

    fn discarded(&self) {
        log_info!(
            LogComponent::Application("HistoryLoader"),
            "{} {} page arrived after the chart switched, discarded",
            self.symbol,
            self.interval
        );
    }

    fn failed(&self, reason: &str) {
        log_error!(LogComponent::Application("HistoryLoader"), "history load failed: {}", reason);
        self.controller.events().publish_market_data_event(MarketDataEvent::HistoryLoadFailed {
            symbol: self.symbol.clone(),
            reason: reason.to_string(),
        });
    }
}
