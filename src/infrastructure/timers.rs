//! `Scheduler` implementations: browser timers and a manual clock.

use crate::application::scheduler::{Scheduler, TaskCancel, TaskHandle};
use gloo_timers::callback::{Interval, Timeout};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use wasm_bindgen_futures::spawn_local;

/// `setInterval` / `setTimeout` through gloo-timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooScheduler;

impl GlooScheduler {
    pub fn new() -> Self {
        Self
    }
}

struct IntervalCancel(Option<Interval>);

impl TaskCancel for IntervalCancel {
    fn cancel(&mut self) {
        if let Some(interval) = self.0.take() {
            // The JS closure may be running right now; free it on the next turn.
            let closure = interval.cancel();
            spawn_local(async move { drop(closure) });
        }
    }
}

struct TimeoutCancel(Option<Timeout>);

impl TaskCancel for TimeoutCancel {
    fn cancel(&mut self) {
        if let Some(timeout) = self.0.take() {
            let closure = timeout.cancel();
            spawn_local(async move { drop(closure) });
        }
    }
}

impl Scheduler for GlooScheduler {
    fn schedule_interval(&self, period_ms: u32, mut callback: Box<dyn FnMut()>) -> TaskHandle {
        TaskHandle::new(IntervalCancel(Some(Interval::new(period_ms, move || callback()))))
    }

    fn schedule_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TaskHandle {
        TaskHandle::new(TimeoutCancel(Some(Timeout::new(delay_ms, callback))))
    }
}

enum Job {
    Repeat { period_ms: u64, callback: Option<Box<dyn FnMut()>> },
    Once(Option<Box<dyn FnOnce()>>),
}

struct Task {
    due_ms: u64,
    job: Job,
}

#[derive(Default)]
struct Clock {
    now_ms: u64,
    next_id: u64,
    tasks: BTreeMap<u64, Task>,
}

impl Clock {
    fn insert(&mut self, delay_ms: u32, job: Job) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.insert(id, Task { due_ms: self.now_ms + u64::from(delay_ms), job });
        id
    }

    fn next_due(&self, until_ms: u64) -> Option<(u64, u64)> {
        self.tasks
            .iter()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .map(|(id, t)| (t.due_ms, *id))
            .min()
    }
}

/// Deterministic clock for headless hosts and tests; time only moves on
/// [`advance`](ManualScheduler::advance).
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Rc<RefCell<Clock>>,
}

struct ManualCancel {
    clock: Weak<RefCell<Clock>>,
    id: u64,
}

impl TaskCancel for ManualCancel {
    fn cancel(&mut self) {
        if let Some(clock) = self.clock.upgrade() {
            let removed = clock.borrow_mut().tasks.remove(&self.id);
            drop(removed);
        }
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.borrow().now_ms
    }

    pub fn pending_tasks(&self) -> usize {
        self.clock.borrow().tasks.len()
    }

    /// Move time forward, firing due tasks in order. Callbacks may schedule
    /// or cancel tasks, themselves included.
    pub fn advance(&self, ms: u64) {
        let until = self.clock.borrow().now_ms + ms;
        loop {
            let Some((due, id)) = self.clock.borrow().next_due(until) else { break };

            let job = {
                let mut clock = self.clock.borrow_mut();
                clock.now_ms = due;
                match clock.tasks.get_mut(&id).map(|t| &mut t.job) {
                    Some(Job::Repeat { callback, .. }) => callback.take().map(Fired::Repeat),
                    Some(Job::Once(callback)) => callback.take().map(Fired::Once),
                    None => None,
                }
            };

            match job {
                Some(Fired::Repeat(mut callback)) => {
                    callback();
                    let cancelled = {
                        let mut clock = self.clock.borrow_mut();
                        match clock.tasks.get_mut(&id) {
                            Some(Task { due_ms, job: Job::Repeat { period_ms, callback: slot } }) => {
                                *due_ms += *period_ms;
                                *slot = Some(callback);
                                None
                            }
                            _ => Some(callback),
                        }
                    };
                    drop(cancelled);
                }
                Some(Fired::Once(callback)) => {
                    self.clock.borrow_mut().tasks.remove(&id);
                    callback();
                }
                None => {
                    self.clock.borrow_mut().tasks.remove(&id);
                }
            }
        }
        self.clock.borrow_mut().now_ms = until;
    }
}

enum Fired {
    Repeat(Box<dyn FnMut()>),
    Once(Box<dyn FnOnce()>),
}

impl Scheduler for ManualScheduler {
    fn schedule_interval(&self, period_ms: u32, callback: Box<dyn FnMut()>) -> TaskHandle {
        let period = period_ms.max(1);
        let id = self
            .clock
            .borrow_mut()
            .insert(period, Job::Repeat { period_ms: u64::from(period), callback: Some(callback) });
        TaskHandle::new(ManualCancel { clock: Rc::downgrade(&self.clock), id })
    }

    fn schedule_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TaskHandle {
        let id = self.clock.borrow_mut().insert(delay_ms, Job::Once(Some(callback)));
        TaskHandle::new(ManualCancel { clock: Rc::downgrade(&self.clock), id })
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now_ms", &self.now_ms())
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn interval_fires_each_period() {
        let scheduler = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _handle = scheduler.schedule_interval(100, Box::new(move || counter.set(counter.get() + 1)));
        scheduler.advance(350);
        assert_eq!(hits.get(), 3);
        assert_eq!(scheduler.now_ms(), 350);
    }

    #[test]
    fn dropping_handle_cancels() {
        let scheduler = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let handle = scheduler.schedule_timeout(50, Box::new(move || counter.set(1)));
        drop(handle);
        scheduler.advance(100);
        assert_eq!(hits.get(), 0);
        assert_eq!(scheduler.pending_tasks(), 0);
    }

    #[test]
    fn interval_can_cancel_itself() {
        let scheduler = ManualScheduler::new();
        let slot: Rc<RefCell<Option<TaskHandle>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));
        let (inner_slot, counter) = (slot.clone(), hits.clone());
        let handle = scheduler.schedule_interval(
            10,
            Box::new(move || {
                counter.set(counter.get() + 1);
                if counter.get() == 2 {
                    let handle = inner_slot.borrow_mut().take();
                    drop(handle);
                }
            }),
        );
        *slot.borrow_mut() = Some(handle);
        scheduler.advance(100);
        assert_eq!(hits.get(), 2);
        assert_eq!(scheduler.pending_tasks(), 0);
    }

    #[test]
    fn timeout_fires_once() {
        let scheduler = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _handle = scheduler.schedule_timeout(50, Box::new(move || counter.set(counter.get() + 1)));
        scheduler.advance(49);
        assert_eq!(hits.get(), 0);
        scheduler.advance(200);
        assert_eq!(hits.get(), 1);
    }
}
