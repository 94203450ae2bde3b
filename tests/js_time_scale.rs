#![cfg(target_arch = "wasm32")]

use chart_replay_wasm::application::TimeScale;
use chart_replay_wasm::domain::chart::TimeRange;
use chart_replay_wasm::domain::market_data::Timestamp;
use chart_replay_wasm::presentation::js_time_scale::JsTimeScale;
use js_sys::{Array, Function, Object, Reflect};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const FAKE_SCALE: &str = r#"
    const listeners = [];
    let range = null;
    return {
        listeners,
        reject: false,
        getVisibleRange() { return range; },
        setVisibleRange(next) {
            if (this.reject) { throw new Error('no data'); }
            range = next;
        },
        subscribeVisibleTimeRangeChange(cb) { listeners.push(cb); },
        unsubscribeVisibleTimeRangeChange(cb) {
            const i = listeners.indexOf(cb);
            if (i >= 0) { listeners.splice(i, 1); }
        },
        emit(next) { range = next; listeners.slice().forEach((cb) => cb(next)); },
    };
"#;

fn fake_scale() -> JsValue {
    Function::new_no_args(FAKE_SCALE).call0(&JsValue::NULL).expect("fake time scale")
}

fn js_range(from: f64, to: f64) -> JsValue {
    let object = Object::new();
    Reflect::set(&object, &"from".into(), &from.into()).expect("from");
    Reflect::set(&object, &"to".into(), &to.into()).expect("to");
    object.into()
}

fn listener_count(target: &JsValue) -> u32 {
    Reflect::get(target, &"listeners".into()).expect("listeners").unchecked_into::<Array>().length()
}

fn emit(target: &JsValue, range: JsValue) {
    let emit: Function = Reflect::get(target, &"emit".into()).expect("emit").unchecked_into();
    emit.call1(target, &range).expect("emit call");
}

fn range(from: u64, to: u64) -> TimeRange {
    TimeRange::new(Timestamp::from(from), Timestamp::from(to))
}

#[wasm_bindgen_test]
fn hidden_pane_has_no_scale() {
    assert!(JsTimeScale::from_js(JsValue::NULL).is_none());
    assert!(JsTimeScale::from_js(JsValue::UNDEFINED).is_none());
}

#[wasm_bindgen_test]
fn reads_back_applied_range() {
    let target = fake_scale();
    let scale = JsTimeScale::from_js(target).expect("scale");
    assert_eq!(scale.visible_range(), None);

    scale.set_visible_range(range(100, 200)).expect("accepted");
    assert_eq!(scale.visible_range(), Some(range(100, 200)));
}

#[wasm_bindgen_test]
fn thrown_error_becomes_rejection() {
    let target = fake_scale();
    Reflect::set(&target, &"reject".into(), &JsValue::TRUE).expect("reject flag");
    let scale = JsTimeScale::from_js(target).expect("scale");
    assert!(scale.set_visible_range(range(1, 2)).is_err());
}

#[wasm_bindgen_test]
fn subscription_delivers_ranges_until_unsubscribed() {
    let target = fake_scale();
    let scale = JsTimeScale::from_js(target.clone()).expect("scale");
    let seen: Rc<RefCell<Vec<Option<TimeRange>>>> = Rc::default();
    let sink = seen.clone();

    let id = scale.subscribe_visible_range_change(Box::new(move |r| sink.borrow_mut().push(r)));
    assert_eq!(listener_count(&target), 1);

    emit(&target, js_range(10.0, 20.0));
    emit(&target, JsValue::NULL);
    assert_eq!(*seen.borrow(), vec![Some(range(10, 20)), None]);

    scale.unsubscribe(id);
    assert_eq!(listener_count(&target), 0);
    emit(&target, js_range(30.0, 40.0));
    assert_eq!(seen.borrow().len(), 2);
}

#[wasm_bindgen_test]
fn drop_releases_listeners() {
    let target = fake_scale();
    let scale = JsTimeScale::from_js(target.clone()).expect("scale");
    let _first = scale.subscribe_visible_range_change(Box::new(|_| {}));
    let _second = scale.subscribe_visible_range_change(Box::new(|_| {}));
    assert_eq!(listener_count(&target), 2);

    drop(scale);
    assert_eq!(listener_count(&target), 0);
}
