use chart_replay_wasm::application::{SubscriptionId, TimeAxisSynchronizer, TimeScale};
use chart_replay_wasm::domain::chart::{PaneKind, TimeRange};
use chart_replay_wasm::domain::errors::TimeScaleError;
use chart_replay_wasm::domain::market_data::Timestamp;
use chart_replay_wasm::infrastructure::ManualScheduler;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

type RangeCallback = Rc<dyn Fn(Option<TimeRange>)>;

#[derive(Default)]
struct FakeTimeScale {
    range: Cell<Option<TimeRange>>,
    rejecting: Cell<bool>,
    applied: RefCell<Vec<TimeRange>>,
    next_id: Cell<u64>,
    listeners: RefCell<BTreeMap<u64, RangeCallback>>,
}

impl FakeTimeScale {
    fn rejecting() -> Self {
        let scale = Self::default();
        scale.rejecting.set(true);
        scale
    }

    /// User scrolled this pane.
    fn scroll_to(&self, range: TimeRange) {
        self.range.set(Some(range));
        let listeners: Vec<RangeCallback> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(Some(range));
        }
    }

    fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn applied(&self) -> Vec<TimeRange> {
        self.applied.borrow().clone()
    }
}

impl TimeScale for FakeTimeScale {
    fn visible_range(&self) -> Option<TimeRange> {
        self.range.get()
    }

    fn set_visible_range(&self, range: TimeRange) -> Result<(), TimeScaleError> {
        if self.rejecting.get() {
            return Err(TimeScaleError::RangeRejected("no data loaded".to_string()));
        }
        self.range.set(Some(range));
        self.applied.borrow_mut().push(range);
        Ok(())
    }

    fn subscribe_visible_range_change(&self, callback: Box<dyn Fn(Option<TimeRange>)>) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().insert(id, Rc::from(callback));
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().remove(&id.0);
    }
}

fn range(from: u64, to: u64) -> TimeRange {
    TimeRange::new(Timestamp::from(from), Timestamp::from(to))
}

fn as_scale(scale: &Rc<FakeTimeScale>) -> Rc<dyn TimeScale> {
    scale.clone()
}

#[test]
fn subscribes_only_after_settle_delay() {
    let scheduler = ManualScheduler::new();
    let mut sync = TimeAxisSynchronizer::new(Rc::new(scheduler.clone()));
    let primary = Rc::new(FakeTimeScale::default());
    sync.attach(as_scale(&primary));

    assert!(!sync.is_subscribed());
    assert_eq!(primary.listener_count(), 0);

    scheduler.advance(49);
    assert_eq!(primary.listener_count(), 0);
    scheduler.advance(1);
    assert!(sync.is_subscribed());
    assert_eq!(primary.listener_count(), 1);
}

#[test]
fn layout_ranges_before_settle_are_not_propagated() {
    let scheduler = ManualScheduler::new();
    let mut sync = TimeAxisSynchronizer::new(Rc::new(scheduler.clone()));
    let primary = Rc::new(FakeTimeScale::default());
    let volume = Rc::new(FakeTimeScale::default());
    sync.attach(as_scale(&primary));
    sync.set_pane(PaneKind::Volume, Some(as_scale(&volume)));

    primary.scroll_to(range(0, 10));
    assert!(volume.applied().is_empty());
}

#[test]
fn primary_range_reaches_every_secondary() {
    let scheduler = ManualScheduler::new();
    let mut sync = TimeAxisSynchronizer::new(Rc::new(scheduler.clone()));
    let primary = Rc::new(FakeTimeScale::default());
    let volume = Rc::new(FakeTimeScale::default());
    let rsi = Rc::new(FakeTimeScale::default());
    sync.attach(as_scale(&primary));
    sync.set_pane(PaneKind::Volume, Some(as_scale(&volume)));
    sync.set_pane(PaneKind::Rsi, Some(as_scale(&rsi)));
    scheduler.advance(50);

    primary.scroll_to(range(1_700_000_000, 1_700_003_600));
    assert_eq!(volume.applied(), vec![range(1_700_000_000, 1_700_003_600)]);
    assert_eq!(rsi.applied(), vec![range(1_700_000_000, 1_700_003_600)]);
}

#[test]
fn rejecting_pane_does_not_block_others() {
    let scheduler = ManualScheduler::new();
    let mut sync = TimeAxisSynchronizer::new(Rc::new(scheduler.clone()));
    let primary = Rc::new(FakeTimeScale::default());
    let atr = Rc::new(FakeTimeScale::rejecting());
    let volume = Rc::new(FakeTimeScale::default());
    sync.attach(as_scale(&primary));
    sync.set_pane(PaneKind::Atr, Some(as_scale(&atr)));
    sync.set_pane(PaneKind::Volume, Some(as_scale(&volume)));
    scheduler.advance(50);

    primary.scroll_to(range(100, 200));
    assert!(atr.applied().is_empty());
    assert_eq!(volume.applied(), vec![range(100, 200)]);

    atr.rejecting.set(false);
    primary.scroll_to(range(150, 250));
    assert_eq!(atr.applied(), vec![range(150, 250)]);
}

#[test]
fn removed_pane_stops_receiving_ranges() {
    let scheduler = ManualScheduler::new();
    let mut sync = TimeAxisSynchronizer::new(Rc::new(scheduler.clone()));
    let primary = Rc::new(FakeTimeScale::default());
    let rsi = Rc::new(FakeTimeScale::default());
    sync.attach(as_scale(&primary));
    sync.set_pane(PaneKind::Rsi, Some(as_scale(&rsi)));
    scheduler.advance(50);

    sync.set_pane(PaneKind::Rsi, None);
    assert!(sync.panes().is_empty());
    primary.scroll_to(range(10, 20));
    assert!(rsi.applied().is_empty());
    assert_eq!(Rc::strong_count(&rsi), 1);
}

#[test]
fn pane_added_later_takes_current_range() {
    let scheduler = ManualScheduler::new();
    let mut sync = TimeAxisSynchronizer::new(Rc::new(scheduler.clone()));
    let primary = Rc::new(FakeTimeScale::default());
    sync.attach(as_scale(&primary));
    scheduler.advance(50);
    primary.scroll_to(range(500, 900));

    let atr = Rc::new(FakeTimeScale::default());
    sync.set_pane(PaneKind::Atr, Some(as_scale(&atr)));
    assert_eq!(atr.applied(), vec![range(500, 900)]);
}

#[test]
fn detach_unsubscribes_from_primary() {
    let scheduler = ManualScheduler::new();
    let mut sync = TimeAxisSynchronizer::new(Rc::new(scheduler.clone()));
    let primary = Rc::new(FakeTimeScale::default());
    let volume = Rc::new(FakeTimeScale::default());
    sync.attach(as_scale(&primary));
    sync.set_pane(PaneKind::Volume, Some(as_scale(&volume)));
    scheduler.advance(50);

    sync.detach();
    assert!(!sync.is_subscribed());
    assert_eq!(primary.listener_count(), 0);
    primary.scroll_to(range(1, 2));
    assert!(volume.applied().is_empty());
}

#[test]
fn dropping_before_settle_never_subscribes() {
    let scheduler = ManualScheduler::new();
    let primary = Rc::new(FakeTimeScale::default());
    {
        let mut sync = TimeAxisSynchronizer::new(Rc::new(scheduler.clone()));
        sync.attach(as_scale(&primary));
    }
    assert_eq!(scheduler.pending_tasks(), 0);
    scheduler.advance(100);
    assert_eq!(primary.listener_count(), 0);
}

#[test]
fn reattach_moves_subscription_to_new_primary() {
    let scheduler = ManualScheduler::new();
    let mut sync = TimeAxisSynchronizer::with_settle_delay(Rc::new(scheduler.clone()), 10);
    let first = Rc::new(FakeTimeScale::default());
    let second = Rc::new(FakeTimeScale::default());
    sync.attach(as_scale(&first));
    scheduler.advance(10);
    sync.attach(as_scale(&second));
    scheduler.advance(10);

    assert_eq!(first.listener_count(), 0);
    assert_eq!(second.listener_count(), 1);
}
