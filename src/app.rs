use leptos::*;

use crate::application::{
    ChartController,
    controller::on_chart_event,
    coordinator::{install_global_controller, with_global_controller},
};
use crate::domain::{
    events::{ChartEvent, MarketDataEvent},
    logging::LogComponent,
    replay::{ReplayAction, ReplayState},
};
use crate::log_info;

global_signals! {
    pub replay_state => replay_state: ReplayState,
    pub candle_count => candle_count: usize,
    pub loading_more => loading_more: bool,
    pub live_refresh => live_refresh: bool,
}

/// Bind `controller` to the global signals and mount the transport bar.
pub fn mount_replay_controls(controller: ChartController) {
    bind_signals(&controller);
    install_global_controller(controller);
    log_info!(LogComponent::Presentation("ReplayControls"), "mounting replay controls");
    mount_to_body(|| view! { <ReplayControls /> });
}

fn refresh_signals(controller: &ChartController) {
    let (state, count, live) =
        controller.read(|store| (store.replay(), store.candles().len(), store.live_refresh_allowed()));
    replay_state().set(state);
    candle_count().set(count);
    live_refresh().set(live);
}

fn bind_signals(controller: &ChartController) {
    refresh_signals(controller);
    on_chart_event(controller, |controller, event| match event {
        ChartEvent::ReplayChanged { .. } | ChartEvent::SeriesInvalidated { .. } => refresh_signals(controller),
        ChartEvent::HistoryRequested { .. } => loading_more().set(true),
        ChartEvent::LiveRefreshSuppressed { .. } => live_refresh().set(false),
    });
    controller.events().subscribe_to_market_data_events(|event| {
        if matches!(event, MarketDataEvent::HistoricalDataLoaded { .. } | MarketDataEvent::HistoryLoadFailed { .. }) {
            loading_more().set(false);
        }
    });
}

fn dispatch(action: ReplayAction) {
    let _ = with_global_controller(|controller| controller.dispatch(action));
}

/// Transport bar: replay switch, step, play/pause, restart, speed and scrubber.
#[component]
pub fn ReplayControls() -> impl IntoView {
    let state = replay_state();
    let disabled = move || !state.get().enabled;

    view! {
        <style>
            {r#"
            .replay-controls {
                display: flex;
                align-items: center;
                gap: 8px;
                padding: 6px 10px;
                font-family: -apple-system, BlinkMacSystemFont, sans-serif;
                font-size: 13px;
            }
            .replay-controls button {
                min-width: 32px;
                padding: 4px 8px;
                border: 1px solid #4a5d73;
                border-radius: 4px;
                background: transparent;
                cursor: pointer;
            }
            .replay-controls button:disabled {
                opacity: 0.4;
                cursor: default;
            }
            .replay-controls input[type=range] {
                flex: 1;
            }
            .replay-status {
                font-family: 'Courier New', monospace;
                white-space: nowrap;
            }
            "#}
        </style>
        <div class="replay-controls">
            <label>
                <input
                    type="checkbox"
                    prop:checked=move || state.get().enabled
                    on:change=move |ev| dispatch(ReplayAction::Toggle(event_target_checked(&ev)))
                />
                " Replay"
            </label>
            <button title="Restart" disabled=disabled on:click=move |_| dispatch(ReplayAction::Restart)>
                "⏮"
            </button>
            <button title="Step back" disabled=disabled on:click=move |_| dispatch(ReplayAction::StepBackward)>
                "◀"
            </button>
            <button title="Play / pause" disabled=disabled on:click=move |_| dispatch(ReplayAction::PlayPause)>
                {move || if state.get().playing { "⏸" } else { "▶" }}
            </button>
            <button title="Step forward" disabled=disabled on:click=move |_| dispatch(ReplayAction::StepForward)>
                "▶|"
            </button>
            <button
                title="Speed"
                on:click=move |_| {
                    let next = state.get_untracked().speed.next_preset();
                    dispatch(ReplayAction::SpeedChange(next.value()));
                }
            >
                {move || format!("{}x", state.get().speed.value())}
            </button>
            <input
                type="range"
                min="1"
                max=move || state.get().total_steps.max(1).to_string()
                prop:value=move || state.get().current_step.to_string()
                disabled=disabled
                on:input=move |ev| {
                    if let Ok(step) = event_target_value(&ev).parse::<f64>() {
                        dispatch(ReplayAction::Seek(step));
                    }
                }
            />
            <span class="replay-status">
                {move || {
                    let s = state.get();
                    format!("{} / {}", s.current_step, s.total_steps)
                }}
                {move || if loading_more().get() { " · loading…" } else { "" }}
                {move || if live_refresh().get() { "" } else { " · live paused" }}
            </span>
        </div>
    }
}
