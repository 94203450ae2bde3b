use chart_replay_wasm::application::ChartController;
use chart_replay_wasm::domain::events::ChartEvent;
use chart_replay_wasm::domain::market_data::Candle;
use chart_replay_wasm::domain::replay::{ReplayAction, ReplayState};
use chart_replay_wasm::infrastructure::ManualScheduler;
use quickcheck_macros::quickcheck;
use std::cell::Cell;
use std::rc::Rc;

fn candles(count: u64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = 100.0 + i as f64;
            Candle::from_values(1_700_000_000 + i * 60, close - 0.5, close + 1.0, close - 1.0, close, 5.0)
        })
        .collect()
}

fn chart_with(count: u64) -> (ChartController, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let controller = ChartController::new(Rc::new(scheduler.clone()));
    controller.update(|store| store.set_history(candles(count), false));
    (controller, scheduler)
}

fn playing_from(controller: &ChartController, step: f64) {
    controller.dispatch(ReplayAction::Toggle(true));
    controller.dispatch(ReplayAction::Seek(step));
    controller.dispatch(ReplayAction::PlayPause);
}

#[test]
fn seek_clamps_and_rounds() {
    let (controller, _) = chart_with(10);
    controller.dispatch(ReplayAction::Toggle(true));
    controller.dispatch(ReplayAction::Seek(5.0));
    assert_eq!(controller.replay().current_step, 5);

    controller.dispatch(ReplayAction::Seek(-3.0));
    assert_eq!(controller.replay().current_step, 1);
    controller.dispatch(ReplayAction::Seek(999.0));
    assert_eq!(controller.replay().current_step, 10);
    controller.dispatch(ReplayAction::Seek(7.6));
    assert_eq!(controller.replay().current_step, 8);
}

#[test]
fn autoplay_advances_once_per_interval() {
    let (controller, scheduler) = chart_with(10);
    playing_from(&controller, 3.0);
    assert!(controller.is_autoplay_running());

    scheduler.advance(799);
    assert_eq!(controller.replay().current_step, 3);
    scheduler.advance(1);
    assert_eq!(controller.replay().current_step, 4);
    scheduler.advance(1_600);
    assert_eq!(controller.replay().current_step, 6);
    assert_eq!(controller.derived().len(), 6);
}

#[test]
fn last_tick_stops_playback() {
    let (controller, scheduler) = chart_with(10);
    playing_from(&controller, 9.0);

    scheduler.advance(800);
    let state = controller.replay();
    assert_eq!(state.current_step, 10);
    assert!(!state.playing);
    assert!(!controller.is_autoplay_running());
    assert_eq!(scheduler.pending_tasks(), 0);

    scheduler.advance(5_000);
    assert_eq!(controller.replay().current_step, 10);
}

#[test]
fn speed_change_reschedules_timer() {
    let (controller, scheduler) = chart_with(50);
    playing_from(&controller, 1.0);
    controller.dispatch(ReplayAction::SpeedChange(4.0));

    scheduler.advance(200);
    assert_eq!(controller.replay().current_step, 2);
    scheduler.advance(400);
    assert_eq!(controller.replay().current_step, 4);

    controller.dispatch(ReplayAction::SpeedChange(100.0));
    scheduler.advance(119);
    assert_eq!(controller.replay().current_step, 4);
    scheduler.advance(1);
    assert_eq!(controller.replay().current_step, 5);
    assert_eq!(scheduler.pending_tasks(), 1);
}

#[test]
fn pause_and_disable_cancel_timer() {
    let (controller, scheduler) = chart_with(10);
    playing_from(&controller, 2.0);
    controller.dispatch(ReplayAction::PlayPause);
    assert!(!controller.is_autoplay_running());
    scheduler.advance(2_000);
    assert_eq!(controller.replay().current_step, 2);

    controller.dispatch(ReplayAction::PlayPause);
    assert!(controller.is_autoplay_running());
    controller.dispatch(ReplayAction::Toggle(false));
    let state = controller.replay();
    assert!(!state.enabled && !state.playing);
    assert_eq!(state.current_step, 10);
    assert_eq!(scheduler.pending_tasks(), 0);
}

#[test]
fn manual_step_pauses_playback() {
    let (controller, scheduler) = chart_with(10);
    playing_from(&controller, 4.0);
    controller.dispatch(ReplayAction::StepForward);
    assert_eq!(controller.replay().current_step, 5);
    assert!(!controller.replay().playing);
    assert_eq!(scheduler.pending_tasks(), 0);
}

#[test]
fn dropping_controller_cancels_timer() {
    let (controller, scheduler) = chart_with(10);
    playing_from(&controller, 2.0);
    assert_eq!(scheduler.pending_tasks(), 1);

    drop(controller);
    assert_eq!(scheduler.pending_tasks(), 0);
    scheduler.advance(10_000);
}

#[test]
fn every_tick_publishes_replay_state() {
    let (controller, scheduler) = chart_with(10);
    let seen = Rc::new(Cell::new(0));
    let counter = seen.clone();
    controller.events().subscribe_to_chart_events(move |event| {
        if let ChartEvent::ReplayChanged { .. } = event {
            counter.set(counter.get() + 1);
        }
    });

    playing_from(&controller, 5.0);
    let before = seen.get();
    scheduler.advance(800 * 3);
    assert_eq!(seen.get() - before, 3);
}

#[test]
fn live_candles_wait_for_replay_to_end() {
    let (controller, _) = chart_with(10);
    controller.dispatch(ReplayAction::Toggle(true));
    assert!(!controller.read(|store| store.live_refresh_allowed()));

    let live = Candle::from_values(1_700_000_000 + 10 * 60, 110.0, 111.0, 109.0, 110.5, 2.0);
    let merged = controller.update(|store| store.merge_live(live));
    assert!(!merged);
    assert_eq!(controller.replay().total_steps, 10);

    controller.dispatch(ReplayAction::Toggle(false));
    let state = controller.replay();
    assert_eq!(state.total_steps, 11);
    assert_eq!(state.current_step, 11);
    assert!(controller.read(|store| store.live_refresh_allowed()));
}

#[quickcheck]
fn seek_always_lands_inside_series(total: u16, target: f64) -> bool {
    let total = usize::from(total % 500) + 1;
    let state = ReplayState::new(total).reduce(ReplayAction::Toggle(true)).reduce(ReplayAction::Seek(target));
    (1..=total).contains(&state.current_step)
}

fn action_from(code: u8, arg: i16) -> ReplayAction {
    match code % 8 {
        0 => ReplayAction::Toggle(arg % 2 == 0),
        1 => ReplayAction::PlayPause,
        2 => ReplayAction::Restart,
        3 => ReplayAction::Seek(f64::from(arg) / 3.0),
        4 => ReplayAction::SpeedChange(f64::from(arg) / 10.0),
        5 => ReplayAction::StepForward,
        6 => ReplayAction::StepBackward,
        _ => ReplayAction::Tick,
    }
}

#[quickcheck]
fn reducer_keeps_state_consistent(total: u8, actions: Vec<(u8, i16)>) -> bool {
    let total = usize::from(total);
    let mut state = ReplayState::new(total);
    actions.into_iter().all(|(code, arg)| {
        state = state.reduce(action_from(code, arg));
        let cursor_ok = state.current_step <= state.total_steps;
        let playing_ok = !state.playing || state.enabled;
        let speed_ok = state.speed.value().is_finite() && state.speed.value() > 0.0;
        let inactive_ok = state.enabled || state.current_step == state.total_steps;
        cursor_ok && playing_ok && speed_ok && inactive_ok
    })
}
