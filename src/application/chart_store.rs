use crate::domain::{
    chart::{ChartMode, DerivationRequest, DerivedSeriesBuilder, DerivedSeriesSet, Theme},
    errors::ValidationError,
    events::ChartEvent,
    indicators::{IndicatorConfig, IndicatorKind, IndicatorSettings},
    logging::LogComponent,
    market_data::{Candle, CandleSeries, SeriesChange, services::DataValidationService},
    replay::{ReplayAction, ReplayState},
};
use crate::{log_debug, log_info, log_warn};
use std::collections::BTreeSet;

/// Single source of truth for one chart: candles, display inputs and replay.
///
/// Every mutation goes through a method here; derived series are rebuilt
/// from these inputs on demand. Events produced by a mutation are queued and
/// handed out by [`ChartStore::take_events`] so callers can publish them
/// after releasing their borrow.
#[derive(Debug, Clone)]
pub struct ChartStore {
    series: CandleSeries,
    mode: ChartMode,
    theme: Theme,
    active: BTreeSet<IndicatorKind>,
    config: IndicatorConfig,
    replay: ReplayState,
    has_more: bool,
    history_outstanding: bool,
    /// Set when an older page added nothing; cleared once the cursor moves.
    history_stalled: bool,
    /// Bumped whenever the loaded history is swapped out, so pages fetched
    /// for an earlier series can be told apart.
    generation: u64,
    pending_live: CandleSeries,
    outbox: Vec<ChartEvent>,
    validator: DataValidationService,
    builder: DerivedSeriesBuilder,
}

impl Default for ChartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartStore {
    pub fn new() -> Self {
        Self {
            series: CandleSeries::new(),
            mode: ChartMode::default(),
            theme: Theme::default(),
            active: BTreeSet::new(),
            config: IndicatorConfig::default(),
            replay: ReplayState::default(),
            has_more: false,
            history_outstanding: false,
            history_stalled: false,
            generation: 0,
            pending_live: CandleSeries::new(),
            outbox: Vec::new(),
            validator: DataValidationService::new(),
            builder: DerivedSeriesBuilder::new(),
        }
    }

    // ---- reads -------------------------------------------------------------

    pub fn candles(&self) -> &[Candle] {
        self.series.as_slice()
    }

    pub fn replay(&self) -> ReplayState {
        self.replay
    }

    pub fn mode(&self) -> ChartMode {
        self.mode
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn active_indicators(&self) -> &BTreeSet<IndicatorKind> {
        &self.active
    }

    pub fn indicator_config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn history_outstanding(&self) -> bool {
        self.history_outstanding
    }

    pub fn history_generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_live_len(&self) -> usize {
        self.pending_live.len()
    }

    /// Live feed may push into the chart only while replay is off.
    pub fn live_refresh_allowed(&self) -> bool {
        !self.replay.enabled
    }

    /// Series for the current inputs, truncated to the replay window.
    pub fn derived(&self) -> DerivedSeriesSet {
        self.builder.build(&DerivationRequest {
            candles: self.series.as_slice(),
            mode: self.mode,
            active: &self.active,
            config: &self.config,
            theme: self.theme,
            window: Some(self.replay.visible_len()),
        })
    }

    pub fn take_events(&mut self) -> Vec<ChartEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ---- display inputs ----------------------------------------------------

    pub fn set_mode(&mut self, mode: ChartMode) {
        if self.mode != mode {
            self.mode = mode;
            self.invalidate();
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.invalidate();
        }
    }

    pub fn set_active_indicators(&mut self, kinds: impl IntoIterator<Item = IndicatorKind>) {
        let next: BTreeSet<_> = kinds.into_iter().collect();
        if next != self.active {
            self.active = next;
            self.invalidate();
        }
    }

    pub fn set_indicator_active(&mut self, kind: IndicatorKind, on: bool) {
        let changed = if on { self.active.insert(kind) } else { self.active.remove(&kind) };
        if changed {
            self.invalidate();
        }
    }

    pub fn update_indicator(&mut self, settings: IndicatorSettings) -> Result<(), ValidationError> {
        let kind = settings.kind();
        self.config.apply(settings)?;
        log_debug!(LogComponent::Application("ChartStore"), "{} settings updated", kind);
        self.invalidate();
        Ok(())
    }

    pub fn reset_indicator(&mut self, kind: IndicatorKind) {
        self.config.reset(kind);
        self.invalidate();
    }

    pub fn reset_indicators(&mut self) {
        self.config.reset_all();
        self.invalidate();
    }

    // ---- candles -----------------------------------------------------------

    /// Replace loaded history (first page, symbol or interval switch).
    pub fn set_history(&mut self, candles: Vec<Candle>, has_more: bool) -> SeriesChange {
        let valid = self.validator.retain_valid(candles);
        let change = self.series.replace(valid);
        self.has_more = has_more;
        self.reset_history_tracking();
        log_info!(
            LogComponent::Application("ChartStore"),
            "history set: {} candles, has_more={}",
            change.new_len,
            has_more
        );
        self.dataset_changed(change);
        change
    }

    /// Drop everything loaded for the previous market.
    pub fn clear_history(&mut self) {
        self.series.clear();
        self.has_more = false;
        self.reset_history_tracking();
        log_info!(LogComponent::Application("ChartStore"), "history cleared");
        self.dataset_changed(SeriesChange::default());
    }

    /// Merge an older page fetched for the near-start request. Returns `None`
    /// when the page belongs to a series that has since been replaced.
    pub fn prepend_history(&mut self, generation: u64, candles: Vec<Candle>, has_more: bool) -> Option<SeriesChange> {
        if generation != self.generation {
            log_debug!(
                LogComponent::Application("ChartStore"),
                "discarding page for replaced history {} (current {})",
                generation,
                self.generation
            );
            return None;
        }
        let valid = self.validator.retain_valid(candles);
        let change = self.series.merge(valid);
        self.has_more = has_more;
        self.history_outstanding = false;
        self.history_stalled = change.new_len == change.previous_len;
        if self.history_stalled && has_more {
            log_warn!(
                LogComponent::Application("ChartStore"),
                "older page at offset {} added no candles",
                change.previous_len
            );
        } else {
            log_info!(
                LogComponent::Application("ChartStore"),
                "prepended {} older candles, has_more={}",
                change.prepended,
                has_more
            );
        }
        self.dataset_changed(change);
        Some(change)
    }

    /// The outstanding history request failed; a later cursor move may retry.
    pub fn history_request_failed(&mut self, generation: u64) {
        if generation == self.generation {
            self.history_outstanding = false;
        }
    }

    fn reset_history_tracking(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.history_outstanding = false;
        self.history_stalled = false;
        self.pending_live = CandleSeries::new();
    }

    /// Upsert one live candle; parked while replay is on. Returns whether the
    /// chart changed.
    pub fn merge_live(&mut self, candle: Candle) -> bool {
        if self.validator.validate_candle(&candle).is_err() {
            return false;
        }
        if !self.live_refresh_allowed() {
            let parked = self.pending_live.len();
            self.pending_live.upsert(candle);
            if self.pending_live.len() != parked {
                self.outbox.push(ChartEvent::LiveRefreshSuppressed { pending: self.pending_live.len() });
            }
            return false;
        }
        let change = self.series.merge([candle]);
        self.dataset_changed(change);
        true
    }

    // ---- replay ------------------------------------------------------------

    pub fn apply(&mut self, action: ReplayAction) {
        let before = self.replay;
        self.replay = before.reduce(action);

        if self.replay != before {
            self.replay_changed(before);
        }

        if before.enabled && !self.replay.enabled && !self.pending_live.is_empty() {
            let pending = std::mem::take(&mut self.pending_live);
            log_debug!(
                LogComponent::Application("ChartStore"),
                "replay off, merging {} parked live candles",
                pending.len()
            );
            let change = self.series.merge(pending.as_slice().iter().copied());
            self.dataset_changed(change);
        }
    }

    fn dataset_changed(&mut self, change: SeriesChange) {
        let before = self.replay;
        self.replay.reconcile(change);
        self.outbox.push(ChartEvent::SeriesInvalidated { candle_count: self.series.len() });
        if self.replay != before {
            self.outbox.push(ChartEvent::ReplayChanged { state: self.replay });
        }
        self.check_history_request();
    }

    fn replay_changed(&mut self, before: ReplayState) {
        if self.replay.current_step != before.current_step {
            self.history_stalled = false;
        }
        self.outbox.push(ChartEvent::ReplayChanged { state: self.replay });
        if self.replay.visible_len() != before.visible_len() {
            self.outbox.push(ChartEvent::SeriesInvalidated { candle_count: self.series.len() });
        }
        self.check_history_request();
    }

    fn check_history_request(&mut self) {
        if self.replay.near_start() && self.has_more && !self.history_outstanding && !self.history_stalled {
            self.history_outstanding = true;
            log_debug!(
                LogComponent::Application("ChartStore"),
                "cursor at step {}, requesting older history",
                self.replay.current_step
            );
            self.outbox.push(ChartEvent::HistoryRequested { offset: self.series.len() });
        }
    }

    fn invalidate(&mut self) {
        self.outbox.push(ChartEvent::SeriesInvalidated { candle_count: self.series.len() });
    }
}
