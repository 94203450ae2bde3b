use crate::application::time_sync::{SubscriptionId, TimeScale};
use crate::domain::{
    chart::TimeRange,
    errors::TimeScaleError,
    logging::LogComponent,
    market_data::Timestamp,
};
use crate::log_warn;
use js_sys::{Function, Object, Reflect};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

type RangeClosure = Closure<dyn Fn(JsValue)>;

/// A charting-library time scale object (`chart.timeScale()`), called through
/// `getVisibleRange`, `setVisibleRange` and the visible-time-range
/// subscription pair.
pub struct JsTimeScale {
    target: JsValue,
    next_id: Cell<u64>,
    handlers: RefCell<HashMap<u64, RangeClosure>>,
}

impl JsTimeScale {
    /// `None` for `null` / `undefined`, i.e. a hidden pane.
    pub fn from_js(target: JsValue) -> Option<Self> {
        if target.is_null() || target.is_undefined() {
            return None;
        }
        Some(Self { target, next_id: Cell::new(0), handlers: RefCell::new(HashMap::new()) })
    }

    fn method(&self, name: &str) -> Result<Function, JsValue> {
        Reflect::get(&self.target, &JsValue::from_str(name))?
            .dyn_into::<Function>()
            .map_err(|_| JsValue::from_str(&format!("{} is not a function", name)))
    }

    fn range_from_js(value: &JsValue) -> Option<TimeRange> {
        if value.is_null() || value.is_undefined() {
            return None;
        }
        let from = Reflect::get(value, &JsValue::from_str("from")).ok()?.as_f64()?;
        let to = Reflect::get(value, &JsValue::from_str("to")).ok()?.as_f64()?;
        if !from.is_finite() || !to.is_finite() || from < 0.0 || to < 0.0 {
            return None;
        }
        Some(TimeRange::new(Timestamp::from(from as u64), Timestamp::from(to as u64)))
    }

    fn range_to_js(range: TimeRange) -> Result<JsValue, JsValue> {
        let object = Object::new();
        Reflect::set(&object, &JsValue::from_str("from"), &JsValue::from_f64(range.from.as_f64()))?;
        Reflect::set(&object, &JsValue::from_str("to"), &JsValue::from_f64(range.to.as_f64()))?;
        Ok(object.into())
    }
}

fn describe(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

impl TimeScale for JsTimeScale {
    fn visible_range(&self) -> Option<TimeRange> {
        let value = self.method("getVisibleRange").and_then(|f| f.call0(&self.target)).ok()?;
        Self::range_from_js(&value)
    }

    fn set_visible_range(&self, range: TimeRange) -> Result<(), TimeScaleError> {
        let apply = || -> Result<JsValue, JsValue> {
            let arg = Self::range_to_js(range)?;
            self.method("setVisibleRange")?.call1(&self.target, &arg)
        };
        apply().map(|_| ()).map_err(|e| TimeScaleError::RangeRejected(describe(e)))
    }

    fn subscribe_visible_range_change(&self, callback: Box<dyn Fn(Option<TimeRange>)>) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let closure = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| callback(Self::range_from_js(&value)));
        let subscribed = self
            .method("subscribeVisibleTimeRangeChange")
            .and_then(|f| f.call1(&self.target, closure.as_ref().unchecked_ref()));
        match subscribed {
            Ok(_) => {
                self.handlers.borrow_mut().insert(id, closure);
            }
            Err(e) => {
                log_warn!(
                    LogComponent::Presentation("JsTimeScale"),
                    "{}",
                    TimeScaleError::SubscriptionFailed(describe(e))
                );
            }
        }
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let Some(closure) = self.handlers.borrow_mut().remove(&id.0) else { return };
        if let Ok(f) = self.method("unsubscribeVisibleTimeRangeChange") {
            let _ = f.call1(&self.target, closure.as_ref().unchecked_ref());
        }
    }
}

impl Drop for JsTimeScale {
    fn drop(&mut self) {
        let ids: Vec<u64> = self.handlers.borrow().keys().copied().collect();
        for id in ids {
            self.unsubscribe(SubscriptionId(id));
        }
    }
}
