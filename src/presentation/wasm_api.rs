use super::js_time_scale::JsTimeScale;
use crate::application::{
    ChartConfig, ChartController, HistoryLoader, Scheduler, TimeAxisSynchronizer, TimeScale,
    controller::on_chart_event,
};
use crate::domain::{
    chart::{ChartMode, PaneKind, Theme},
    errors::ValidationError,
    events::{ChartEvent, DomainEvent},
    indicators::{IndicatorKind, IndicatorSettings},
    logging::LogComponent,
    market_data::{Symbol, TimeInterval},
    replay::ReplayAction,
};
use crate::infrastructure::{CandleDto, GlooScheduler, RestCandleClient};
use crate::{log_debug, log_info, log_warn};
use js_sys::{Function, Promise};
use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

type Loader = HistoryLoader<RestCandleClient>;
type LoaderSlot = Rc<RefCell<Option<Rc<Loader>>>>;

fn js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(js_error)
}

/// JS entry point: one chart with replay, indicators and synced panes.
///
/// Getters return JSON strings so the host can hand them straight to its
/// charting library.
#[wasm_bindgen]
pub struct ChartReplayApi {
    controller: ChartController,
    config: ChartConfig,
    loader: LoaderSlot,
    sync: TimeAxisSynchronizer,
}

#[wasm_bindgen]
impl ChartReplayApi {
    /// `config_json` is an optional partial [`ChartConfig`].
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<ChartReplayApi, JsValue> {
        let config = match config_json {
            Some(json) => ChartConfig::from_json(&json).map_err(js_error)?,
            None => ChartConfig::default(),
        };
        let scheduler: Rc<dyn Scheduler> = Rc::new(GlooScheduler::new());
        let controller = ChartController::new(Rc::clone(&scheduler));
        controller.update(|store| {
            store.set_mode(config.mode);
            store.set_theme(config.theme);
        });

        let loader: LoaderSlot = Rc::new(RefCell::new(None));
        let weak_slot = Rc::downgrade(&loader);
        on_chart_event(&controller, move |_, event| {
            if let ChartEvent::HistoryRequested { offset } = event {
                let Some(slot) = weak_slot.upgrade() else { return };
                let Some(loader) = slot.borrow().clone() else { return };
                log_debug!(LogComponent::Presentation("ChartReplayApi"), "history requested at {}", offset);
                spawn_local(async move {
                    // Failures are logged and reported by the loader itself.
                    let _ = loader.load_more().await;
                });
            }
        });

        let sync = TimeAxisSynchronizer::with_settle_delay(scheduler, config.settle_delay_ms);
        let api = Self { controller, config, loader, sync };
        api.install_loader();
        log_info!(LogComponent::Presentation("ChartReplayApi"), "chart created for {}", api.config.symbol);
        Ok(api)
    }

    /// Fetch the newest history page from the backend.
    #[wasm_bindgen(js_name = loadHistory)]
    pub fn load_history(&self) -> Promise {
        let loader = self.loader.borrow().clone();
        future_to_promise(async move {
            let Some(loader) = loader else { return Ok(JsValue::from(0)) };
            let count = loader.load_initial().await.map_err(js_error)?;
            Ok(JsValue::from(count as u32))
        })
    }

    /// Switch instrument or timeframe. The chart is emptied until the next
    /// `loadHistory`; pages still in flight for the old market are dropped.
    #[wasm_bindgen(js_name = setMarket)]
    pub fn set_market(&mut self, symbol: String, interval: String) -> Result<(), JsValue> {
        let symbol = Symbol::new(symbol).map_err(|e| js_error(ValidationError::InvalidChartConfig(e)))?;
        let interval = TimeInterval::from_str(&interval)
            .map_err(|_| js_error(ValidationError::InvalidChartConfig(format!("unknown interval {}", interval))))?;
        self.config.symbol = symbol;
        self.config.interval = interval;
        self.controller.update(|store| store.clear_history());
        self.install_loader();
        Ok(())
    }

    /// Replace history with a JSON array of candles (any order).
    #[wasm_bindgen(js_name = setCandles)]
    pub fn set_candles(&self, candles_json: &str, has_more: bool) -> Result<(), JsValue> {
        let dtos: Vec<CandleDto> = parse_json(candles_json)?;
        let candles = dtos.into_iter().map(CandleDto::into_candle).collect();
        self.controller.update(|store| store.set_history(candles, has_more));
        Ok(())
    }

    /// Live feed update; returns `false` when replay parked it.
    #[wasm_bindgen(js_name = pushLiveCandle)]
    pub fn push_live_candle(&self, candle_json: &str) -> Result<bool, JsValue> {
        let dto: CandleDto = parse_json(candle_json)?;
        Ok(self.controller.update(|store| store.merge_live(dto.into_candle())))
    }

    #[wasm_bindgen(js_name = liveRefreshAllowed)]
    pub fn live_refresh_allowed(&self) -> bool {
        self.controller.read(|store| store.live_refresh_allowed())
    }

    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&self, mode: &str) -> Result<(), JsValue> {
        let mode =
            ChartMode::from_str(mode).map_err(|_| js_error(ValidationError::UnknownChartMode(mode.to_string())))?;
        self.controller.update(|store| store.set_mode(mode));
        Ok(())
    }

    #[wasm_bindgen(js_name = setTheme)]
    pub fn set_theme(&self, theme: &str) -> Result<(), JsValue> {
        let theme = Theme::from_str(theme)
            .map_err(|_| js_error(ValidationError::InvalidChartConfig(format!("unknown theme {}", theme))))?;
        self.controller.update(|store| store.set_theme(theme));
        Ok(())
    }

    /// JSON array of indicator names, e.g. `["RSI","EMA"]`.
    #[wasm_bindgen(js_name = setActiveIndicators)]
    pub fn set_active_indicators(&self, kinds_json: &str) -> Result<(), JsValue> {
        let names: Vec<String> = parse_json(kinds_json)?;
        let kinds = names
            .iter()
            .map(|name| IndicatorKind::from_str(name).map_err(|_| ValidationError::UnknownIndicator(name.clone())))
            .collect::<Result<Vec<_>, _>>()
            .map_err(js_error)?;
        self.controller.update(|store| store.set_active_indicators(kinds));
        Ok(())
    }

    /// Show or hide a single indicator by name.
    #[wasm_bindgen(js_name = setIndicatorActive)]
    pub fn set_indicator_active(&self, name: &str, active: bool) -> Result<(), JsValue> {
        let kind =
            IndicatorKind::from_str(name).map_err(|_| js_error(ValidationError::UnknownIndicator(name.to_string())))?;
        self.controller.update(|store| store.set_indicator_active(kind, active));
        Ok(())
    }

    #[wasm_bindgen(js_name = activeIndicators)]
    pub fn active_indicators(&self) -> Result<String, JsValue> {
        self.controller.read(|store| serde_json::to_string(store.active_indicators())).map_err(js_error)
    }

    /// One `{"kind": "...", ...}` settings object.
    #[wasm_bindgen(js_name = updateIndicatorConfig)]
    pub fn update_indicator_config(&self, settings_json: &str) -> Result<(), JsValue> {
        let settings: IndicatorSettings = parse_json(settings_json)?;
        self.controller.update(|store| store.update_indicator(settings)).map_err(js_error)
    }

    /// Reset one kind, or everything when `kind` is omitted.
    #[wasm_bindgen(js_name = resetIndicatorConfig)]
    pub fn reset_indicator_config(&self, kind: Option<String>) -> Result<(), JsValue> {
        match kind {
            Some(name) => {
                let kind = IndicatorKind::from_str(&name)
                    .map_err(|_| js_error(ValidationError::UnknownIndicator(name.clone())))?;
                self.controller.update(|store| store.reset_indicator(kind));
            }
            None => self.controller.update(|store| store.reset_indicators()),
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = indicatorConfig)]
    pub fn indicator_config(&self) -> Result<String, JsValue> {
        self.controller.read(|store| serde_json::to_string(store.indicator_config())).map_err(js_error)
    }

    #[wasm_bindgen(js_name = derivedSeries)]
    pub fn derived_series(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.controller.derived()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = replayState)]
    pub fn replay_state(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.controller.replay()).map_err(js_error)
    }

    /// Apply a `{"type": "...", "value": ...}` replay action.
    #[wasm_bindgen(js_name = dispatchReplay)]
    pub fn dispatch_replay(&self, action_json: &str) -> Result<(), JsValue> {
        let action: ReplayAction = parse_json(action_json)?;
        self.controller.dispatch(action);
        Ok(())
    }

    #[wasm_bindgen(js_name = toggleReplay)]
    pub fn toggle_replay(&self, enabled: bool) {
        self.controller.dispatch(ReplayAction::Toggle(enabled));
    }

    #[wasm_bindgen(js_name = playPause)]
    pub fn play_pause(&self) {
        self.controller.dispatch(ReplayAction::PlayPause);
    }

    pub fn restart(&self) {
        self.controller.dispatch(ReplayAction::Restart);
    }

    pub fn seek(&self, step: f64) {
        self.controller.dispatch(ReplayAction::Seek(step));
    }

    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed(&self, speed: f64) {
        self.controller.dispatch(ReplayAction::SpeedChange(speed));
    }

    /// Jump to the next speed preset; returns the new speed.
    #[wasm_bindgen(js_name = cycleSpeed)]
    pub fn cycle_speed(&self) -> f64 {
        let next = self.controller.replay().speed.next_preset();
        self.controller.dispatch(ReplayAction::SpeedChange(next.value()));
        next.value()
    }

    #[wasm_bindgen(js_name = stepForward)]
    pub fn step_forward(&self) {
        self.controller.dispatch(ReplayAction::StepForward);
    }

    #[wasm_bindgen(js_name = stepBackward)]
    pub fn step_backward(&self) {
        self.controller.dispatch(ReplayAction::StepBackward);
    }

    /// `callback(eventType)` after every chart change.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Function) {
        on_chart_event(&self.controller, move |_, event| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(event.event_type())) {
                log_warn!(LogComponent::Presentation("ChartReplayApi"), "change callback threw: {:?}", e);
            }
        });
    }

    /// Sync secondary panes to `primary`. Pass `null` for hidden panes.
    #[wasm_bindgen(js_name = attachTimeScales)]
    pub fn attach_time_scales(
        &mut self,
        primary: JsValue,
        volume: JsValue,
        rsi: JsValue,
        atr: JsValue,
    ) -> Result<(), JsValue> {
        let primary = JsTimeScale::from_js(primary).ok_or_else(|| JsValue::from_str("primary time scale required"))?;
        self.sync.attach(Rc::new(primary));
        for (pane, scale) in [(PaneKind::Volume, volume), (PaneKind::Rsi, rsi), (PaneKind::Atr, atr)] {
            self.set_pane(pane, scale);
        }
        Ok(())
    }

    /// Show or hide one secondary pane (`"volume"`, `"rsi"`, `"atr"`).
    #[wasm_bindgen(js_name = setPaneTimeScale)]
    pub fn set_pane_time_scale(&mut self, pane: &str, scale: JsValue) -> Result<(), JsValue> {
        let pane = PaneKind::from_str(pane)
            .ok()
            .filter(|p| *p != PaneKind::Price)
            .ok_or_else(|| JsValue::from_str(&format!("unknown secondary pane {}", pane)))?;
        self.set_pane(pane, scale);
        Ok(())
    }

    #[wasm_bindgen(js_name = detachTimeScales)]
    pub fn detach_time_scales(&mut self) {
        self.sync.detach();
    }

    /// Make this chart the one the Leptos replay controls drive.
    #[wasm_bindgen(js_name = mountReplayControls)]
    pub fn mount_replay_controls(&self) {
        crate::app::mount_replay_controls(self.controller.clone());
    }
}

impl ChartReplayApi {
    fn install_loader(&self) {
        let loader = HistoryLoader::new(
            RestCandleClient::new(self.config.base_url.clone()),
            self.controller.clone(),
            self.config.symbol.clone(),
            self.config.interval,
            self.config.page_size,
        );
        *self.loader.borrow_mut() = Some(Rc::new(loader));
    }

    fn set_pane(&mut self, pane: PaneKind, scale: JsValue) {
        let scale = JsTimeScale::from_js(scale).map(|s| Rc::new(s) as Rc<dyn TimeScale>);
        self.sync.set_pane(pane, scale);
    }

    pub fn controller(&self) -> &ChartController {
        &self.controller
    }
}
