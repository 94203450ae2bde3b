use super::chart_store::ChartStore;
use super::scheduler::{Scheduler, TaskHandle};
use crate::domain::{
    chart::DerivedSeriesSet,
    events::{ChartEvent, EventDispatcher, InMemoryEventDispatcher},
    logging::LogComponent,
    replay::{ReplayAction, ReplayState},
};
use crate::log_debug;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

struct Autoplay {
    interval_ms: u32,
    _task: TaskHandle,
}

struct Inner {
    store: RefCell<ChartStore>,
    scheduler: Rc<dyn Scheduler>,
    events: Rc<InMemoryEventDispatcher>,
    autoplay: RefCell<Option<Autoplay>>,
}

/// Owns a [`ChartStore`] and drives its autoplay timer.
///
/// Cloning yields another handle to the same chart. The timer runs exactly
/// while the replay state says it is ticking, at the speed-derived period;
/// dropping the last handle cancels it.
#[derive(Clone)]
pub struct ChartController {
    inner: Rc<Inner>,
}

impl ChartController {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_dispatcher(scheduler, Rc::new(InMemoryEventDispatcher::new()))
    }

    pub fn with_dispatcher(scheduler: Rc<dyn Scheduler>, events: Rc<InMemoryEventDispatcher>) -> Self {
        Self {
            inner: Rc::new(Inner {
                store: RefCell::new(ChartStore::new()),
                scheduler,
                events,
                autoplay: RefCell::new(None),
            }),
        }
    }

    pub fn events(&self) -> &Rc<InMemoryEventDispatcher> {
        &self.inner.events
    }

    pub fn replay(&self) -> ReplayState {
        self.inner.store.borrow().replay()
    }

    pub fn derived(&self) -> DerivedSeriesSet {
        self.inner.store.borrow().derived()
    }

    pub fn read<R>(&self, f: impl FnOnce(&ChartStore) -> R) -> R {
        f(&self.inner.store.borrow())
    }

    /// Mutate the store, then publish its events and resync the timer.
    pub fn update<R>(&self, f: impl FnOnce(&mut ChartStore) -> R) -> R {
        let (result, events) = {
            let mut store = self.inner.store.borrow_mut();
            let result = f(&mut store);
            (result, store.take_events())
        };
        self.sync_autoplay();
        for event in events {
            self.inner.events.publish_chart_event(event);
        }
        result
    }

    pub fn dispatch(&self, action: ReplayAction) {
        self.update(|store| store.apply(action));
    }

    pub fn is_autoplay_running(&self) -> bool {
        self.inner.autoplay.borrow().is_some()
    }

    fn sync_autoplay(&self) {
        let wanted = self.inner.store.borrow().replay().tick_interval_ms();
        let current = self.inner.autoplay.borrow().as_ref().map(|a| a.interval_ms);
        if wanted == current {
            return;
        }

        // Drop the old task outside the borrow; its canceller may run user code.
        let previous = self.inner.autoplay.borrow_mut().take();
        drop(previous);

        if let Some(interval_ms) = wanted {
            log_debug!(LogComponent::Application("ChartController"), "autoplay every {}ms", interval_ms);
            let weak: Weak<Inner> = Rc::downgrade(&self.inner);
            let task = self.inner.scheduler.schedule_interval(
                interval_ms,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        ChartController { inner }.dispatch(ReplayAction::Tick);
                    }
                }),
            );
            *self.inner.autoplay.borrow_mut() = Some(Autoplay { interval_ms, _task: task });
        } else {
            log_debug!(LogComponent::Application("ChartController"), "autoplay stopped");
        }
    }
}

impl std::fmt::Debug for ChartController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartController")
            .field("replay", &self.replay())
            .field("autoplay", &self.is_autoplay_running())
            .finish()
    }
}

/// Subscribe `f` to chart events without keeping the controller alive.
pub fn on_chart_event(controller: &ChartController, f: impl Fn(&ChartController, &ChartEvent) + 'static) {
    let weak = Rc::downgrade(&controller.inner);
    controller.inner.events.subscribe_to_chart_events(move |event| {
        if let Some(inner) = weak.upgrade() {
            f(&ChartController { inner }, event);
        }
    });
}
