use crate::domain::replay::ReplayState;
use leptos::*;
use once_cell::sync::OnceCell;

pub struct Globals {
    pub replay_state: RwSignal<ReplayState>,
    pub candle_count: RwSignal<usize>,
    pub loading_more: RwSignal<bool>,
    pub live_refresh: RwSignal<bool>,
}

static GLOBALS: OnceCell<Globals> = OnceCell::new();

pub fn globals() -> &'static Globals {
    GLOBALS.get_or_init(|| Globals {
        replay_state: create_rw_signal(ReplayState::default()),
        candle_count: create_rw_signal(0),
        loading_more: create_rw_signal(false),
        live_refresh: create_rw_signal(true),
    })
}
