//! Trailing-edge debounce built on droppable tasks

use crate::dataflow::{Task, TaskHandle, Timer};
use std::cell::RefCell;
use std::rc::Rc;

/// Runs its action once the triggers have been quiet for `delay_ms`.
///
/// Every `trigger()` drops the pending task and arms a fresh one, so a burst
/// of triggers collapses into a single run after the last of them.
pub struct Debouncer {
    delay_ms: u32,
    action: Rc<dyn Fn()>,
    pending: Rc<RefCell<Option<TaskHandle>>>,
}

impl Debouncer {
    pub fn new(delay_ms: u32, action: impl Fn() + 'static) -> Self {
        Self {
            delay_ms,
            action: Rc::new(action),
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn trigger(&self) {
        let action = self.action.clone();
        let pending = Rc::downgrade(&self.pending);
        let delay_ms = self.delay_ms;

        let handle = Task::start_droppable(async move {
            Timer::sleep(delay_ms).await;
            // Empty the slot first so the action may re-arm this debouncer
            let _finished = pending.upgrade().and_then(|pending| pending.borrow_mut().take());
            action();
        });

        // Replacing the handle aborts the previous window
        *self.pending.borrow_mut() = Some(handle);
    }

    pub fn cancel(&self) {
        self.pending.borrow_mut().take();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }
}
