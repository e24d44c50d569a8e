//! Local tasks with droppable handles
//!
//! Everything in the content script runs on one thread, so tasks are spawned
//! onto the local executor: `spawn_local` from wasm-bindgen-futures in the
//! browser, a tokio `LocalSet` on native targets.

use futures::future::{AbortHandle, Abortable};
use std::future::Future;

pub struct Task;

impl Task {
    /// Start a task that runs to completion on its own.
    pub fn start(future: impl Future<Output = ()> + 'static) {
        spawn_local(future);
    }

    /// Start a task that is aborted as soon as the returned handle is dropped.
    ///
    /// Debounce windows, polling loops, delayed re-checks and element lookups
    /// are all started this way, so whoever owns the handle owns the timer.
    #[must_use = "dropping the handle aborts the task"]
    pub fn start_droppable(future: impl Future<Output = ()> + 'static) -> TaskHandle {
        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        spawn_local(async move {
            let _ = Abortable::new(future, abort_registration).await;
        });
        TaskHandle { abort_handle }
    }
}

/// Aborts its task on drop.
#[derive(Debug)]
pub struct TaskHandle {
    abort_handle: AbortHandle,
}

impl TaskHandle {
    pub fn is_aborted(&self) -> bool {
        self.abort_handle.is_aborted()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

#[cfg(target_arch = "wasm32")]
fn spawn_local(future: impl Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(future);
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_local(future: impl Future<Output = ()> + 'static) {
    tokio::task::spawn_local(future);
}
