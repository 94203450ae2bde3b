use crate::domain::market_data::{Symbol, TimeInterval};
use crate::domain::replay::ReplayState;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

/// Base trait for all domain events
pub trait DomainEvent: Debug + Clone {
    fn event_type(&self) -> &'static str;
    fn timestamp(&self) -> u64 {
        use crate::domain::logging::get_time_provider;
        get_time_provider().current_timestamp()
    }
}

/// Events related to market data
#[derive(Debug, Clone, PartialEq)]
pub enum MarketDataEvent {
    HistoricalDataLoaded {
        symbol: Symbol,
        interval: TimeInterval,
        candle_count: usize,
        has_more: bool,
    },
    HistoryLoadFailed {
        symbol: Symbol,
        reason: String,
    },
}

impl DomainEvent for MarketDataEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MarketDataEvent::HistoricalDataLoaded { .. } => "HistoricalDataLoaded",
            MarketDataEvent::HistoryLoadFailed { .. } => "HistoryLoadFailed",
        }
    }
}

/// Events related to chart
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    /// Any replay field changed.
    ReplayChanged { state: ReplayState },
    /// Cursor reached the oldest loaded candles and the backend has more.
    /// `offset` is the number of candles already loaded.
    HistoryRequested { offset: usize },
    /// A live candle was parked because replay is active.
    LiveRefreshSuppressed { pending: usize },
    /// Derived series must be rebuilt.
    SeriesInvalidated { candle_count: usize },
}

impl DomainEvent for ChartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ChartEvent::ReplayChanged { .. } => "ReplayChanged",
            ChartEvent::HistoryRequested { .. } => "HistoryRequested",
            ChartEvent::LiveRefreshSuppressed { .. } => "LiveRefreshSuppressed",
            ChartEvent::SeriesInvalidated { .. } => "SeriesInvalidated",
        }
    }
}

/// Event dispatcher for publishing events
pub trait EventDispatcher {
    fn publish_market_data_event(&self, event: MarketDataEvent);
    fn publish_chart_event(&self, event: ChartEvent);
}

type Handler<E> = Rc<dyn Fn(&E)>;

/// Simple in-memory event dispatcher.
///
/// Subscribing takes `&self` so the dispatcher can sit behind an `Rc`;
/// handlers may subscribe or publish again while being called.
#[derive(Default)]
pub struct InMemoryEventDispatcher {
    market_data_handlers: RefCell<Vec<Handler<MarketDataEvent>>>,
    chart_handlers: RefCell<Vec<Handler<ChartEvent>>>,
}

impl InMemoryEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_to_market_data_events<F>(&self, handler: F)
    where
        F: Fn(&MarketDataEvent) + 'static,
    {
        self.market_data_handlers.borrow_mut().push(Rc::new(handler));
    }

    pub fn subscribe_to_chart_events<F>(&self, handler: F)
    where
        F: Fn(&ChartEvent) + 'static,
    {
        self.chart_handlers.borrow_mut().push(Rc::new(handler));
    }
}

impl EventDispatcher for InMemoryEventDispatcher {
    fn publish_market_data_event(&self, event: MarketDataEvent) {
        let handlers = self.market_data_handlers.borrow().clone();
        for handler in handlers {
            handler(&event);
        }
    }

    fn publish_chart_event(&self, event: ChartEvent) {
        let handlers = self.chart_handlers.borrow().clone();
        for handler in handlers {
            handler(&event);
        }
    }
}

impl Debug for InMemoryEventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventDispatcher")
            .field("market_data_handlers", &self.market_data_handlers.borrow().len())
            .field("chart_handlers", &self.chart_handlers.borrow().len())
            .finish()
    }
}
