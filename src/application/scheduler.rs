//! Timer port. The browser implementation lives in infrastructure; tests and
//! headless hosts drive a manual clock instead.

use std::fmt;

/// Cancellation hook a scheduler hands back for every task.
pub trait TaskCancel {
    fn cancel(&mut self);
}

/// Owning handle to a scheduled task. Dropping it cancels the task.
///
/// Cancelling from inside the task's own callback is allowed.
#[must_use = "dropping a TaskHandle cancels the task"]
pub struct TaskHandle {
    canceller: Option<Box<dyn TaskCancel>>,
}

impl TaskHandle {
    pub fn new(canceller: impl TaskCancel + 'static) -> Self {
        Self { canceller: Some(Box::new(canceller)) }
    }

    pub fn cancel(mut self) {
        self.cancel_inner();
    }

    fn cancel_inner(&mut self) {
        if let Some(mut canceller) = self.canceller.take() {
            canceller.cancel();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel_inner();
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").field("active", &self.canceller.is_some()).finish()
    }
}

/// Single-threaded timer source.
pub trait Scheduler {
    /// Run `callback` every `period_ms` until the handle is dropped.
    fn schedule_interval(&self, period_ms: u32, callback: Box<dyn FnMut()>) -> TaskHandle;

    /// Run `callback` once after `delay_ms` unless the handle is dropped first.
    fn schedule_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TaskHandle;
}
