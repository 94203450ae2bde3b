use super::scheduler::{Scheduler, TaskHandle};
use crate::domain::{
    chart::{PaneKind, TimeRange},
    errors::TimeScaleError,
    logging::LogComponent,
};
use crate::{log_debug, log_trace};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Horizontal axis of one chart pane, as exposed by the charting library.
pub trait TimeScale {
    fn visible_range(&self) -> Option<TimeRange>;
    fn set_visible_range(&self, range: TimeRange) -> Result<(), TimeScaleError>;
    fn subscribe_visible_range_change(&self, callback: Box<dyn Fn(Option<TimeRange>)>) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}

pub const DEFAULT_SETTLE_DELAY_MS: u32 = 50;

struct Shared {
    secondaries: RefCell<BTreeMap<PaneKind, Rc<dyn TimeScale>>>,
}

impl Shared {
    fn propagate(&self, range: Option<TimeRange>) {
        let Some(range) = range else { return };
        let targets: Vec<(PaneKind, Rc<dyn TimeScale>)> =
            self.secondaries.borrow().iter().map(|(k, s)| (*k, Rc::clone(s))).collect();
        for (pane, scale) in targets {
            if let Err(e) = scale.set_visible_range(range) {
                log_debug!(LogComponent::Application("TimeSync"), "{} pane skipped: {}", pane, e);
            }
        }
    }
}

/// Keeps secondary panes (volume, RSI, ATR) scrolled with the price pane.
///
/// The primary subscription starts after a short settle delay so the
/// library can finish its first layout. [`detach`](Self::detach) and drop
/// both cancel a pending settle and unsubscribe.
pub struct TimeAxisSynchronizer {
    scheduler: Rc<dyn Scheduler>,
    settle_delay_ms: u32,
    shared: Rc<Shared>,
    primary: Rc<RefCell<Option<Rc<dyn TimeScale>>>>,
    subscription: Rc<Cell<Option<SubscriptionId>>>,
    settle: Option<TaskHandle>,
}

impl TimeAxisSynchronizer {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_settle_delay(scheduler, DEFAULT_SETTLE_DELAY_MS)
    }

    pub fn with_settle_delay(scheduler: Rc<dyn Scheduler>, settle_delay_ms: u32) -> Self {
        Self {
            scheduler,
            settle_delay_ms,
            shared: Rc::new(Shared { secondaries: RefCell::new(BTreeMap::new()) }),
            primary: Rc::new(RefCell::new(None)),
            subscription: Rc::new(Cell::new(None)),
            settle: None,
        }
    }

    /// Follow `primary`; replaces any previous primary.
    pub fn attach(&mut self, primary: Rc<dyn TimeScale>) {
        self.unsubscribe();
        *self.primary.borrow_mut() = Some(primary);

        let slot = Rc::downgrade(&self.primary);
        let shared: Weak<Shared> = Rc::downgrade(&self.shared);
        let subscription = Rc::clone(&self.subscription);
        let task = self.scheduler.schedule_timeout(
            self.settle_delay_ms,
            Box::new(move || {
                let Some(slot) = slot.upgrade() else { return };
                let Some(primary) = slot.borrow().clone() else { return };
                let id = primary.subscribe_visible_range_change(Box::new(move |range| {
                    if let Some(shared) = shared.upgrade() {
                        shared.propagate(range);
                    }
                }));
                subscription.set(Some(id));
                log_trace!(LogComponent::Application("TimeSync"), "primary subscribed");
            }),
        );
        self.settle = Some(task);
    }

    /// Show (`Some`) or remove (`None`) a secondary pane. A newly shown pane
    /// takes the primary's current range if the sync is already live.
    pub fn set_pane(&mut self, pane: PaneKind, scale: Option<Rc<dyn TimeScale>>) {
        match scale {
            Some(scale) => {
                if self.is_subscribed() {
                    if let Some(range) = self.primary_range() {
                        if let Err(e) = scale.set_visible_range(range) {
                            log_debug!(LogComponent::Application("TimeSync"), "{} pane skipped: {}", pane, e);
                        }
                    }
                }
                self.shared.secondaries.borrow_mut().insert(pane, scale);
            }
            None => {
                self.shared.secondaries.borrow_mut().remove(&pane);
            }
        }
    }

    pub fn panes(&self) -> Vec<PaneKind> {
        self.shared.secondaries.borrow().keys().copied().collect()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.get().is_some()
    }

    /// Stop following: cancel the settle task, unsubscribe, forget all panes.
    pub fn detach(&mut self) {
        self.unsubscribe();
        self.primary.borrow_mut().take();
        self.shared.secondaries.borrow_mut().clear();
    }

    fn primary_range(&self) -> Option<TimeRange> {
        self.primary.borrow().as_ref().and_then(|p| p.visible_range())
    }

    fn unsubscribe(&mut self) {
        if let Some(task) = self.settle.take() {
            task.cancel();
        }
        if let Some(id) = self.subscription.take() {
            if let Some(primary) = self.primary.borrow().as_ref() {
                primary.unsubscribe(id);
            }
        }
    }
}

impl Drop for TimeAxisSynchronizer {
    fn drop(&mut self) {
        self.detach();
    }
}
