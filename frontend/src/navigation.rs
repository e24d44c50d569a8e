//! Navigation Detector
//!
//! The host is a single-page app, so an address change rarely comes with a
//! reload. Three producers watch for it independently and feed one consumer:
//!
//! - a poll comparing the address with the last known fingerprint
//! - the `popstate` event for back/forward
//! - hooks on `pushState`/`replaceState` that re-check shortly after the call
//!
//! They race on purpose. Whoever receives the callback debounces it.

use crate::config::Timing;
use crate::dataflow::{Relay, Task, TaskHandle, Timer, relay};
use crate::platform::{Page, Subscription};
use futures::StreamExt;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSignal {
    Poll,
    Popstate,
    HistoryMutation,
}

/// Last address seen by any producer.
#[derive(Debug, Default)]
struct Fingerprint(RefCell<String>);

impl Fingerprint {
    /// Stores `href` and reports whether it differs from the previous value.
    fn update(&self, href: String) -> bool {
        let mut current = self.0.borrow_mut();
        if *current == href {
            return false;
        }
        *current = href;
        true
    }
}

pub struct NavigationDetector {
    fingerprint: Rc<Fingerprint>,
    _consumer_task: TaskHandle,
    _poll_task: TaskHandle,
    _popstate_listener: Subscription,
    _history_hook: Subscription,
    _pending_recheck: Rc<RefCell<Option<TaskHandle>>>,
}

impl NavigationDetector {
    pub fn start(page: Rc<dyn Page>, timing: Timing, on_navigation: impl Fn() + 'static) -> Self {
        let fingerprint = Rc::new(Fingerprint(RefCell::new(page.address().href)));
        let (address_changed_relay, mut address_changed_stream) = relay::<NavigationSignal>();

        let consumer_task = Task::start_droppable({
            let page = page.clone();
            async move {
                while let Some(signal) = address_changed_stream.next().await {
                    log::debug!("Navigation detected ({signal:?}): {}", page.address().href);
                    on_navigation();
                }
            }
        });

        let poll_task = Task::start_droppable({
            let page = page.clone();
            let fingerprint = fingerprint.clone();
            let address_changed_relay = address_changed_relay.clone();
            async move {
                loop {
                    Timer::sleep(timing.poll_interval_ms).await;
                    if fingerprint.update(page.address().href) {
                        address_changed_relay.send(NavigationSignal::Poll);
                    }
                }
            }
        });

        let popstate_listener = page.on_popstate(Box::new({
            let page = page.clone();
            let fingerprint = fingerprint.clone();
            let address_changed_relay = address_changed_relay.clone();
            move || {
                fingerprint.update(page.address().href);
                address_changed_relay.send(NavigationSignal::Popstate);
            }
        }));

        let pending_recheck = Rc::new(RefCell::new(None));
        let history_hook = page.intercept_history(Box::new({
            let page = page.clone();
            let fingerprint = fingerprint.clone();
            let pending_recheck = pending_recheck.clone();
            move || {
                let recheck = schedule_recheck(
                    page.clone(),
                    fingerprint.clone(),
                    address_changed_relay.clone(),
                    timing.history_recheck_ms,
                );
                pending_recheck.replace(Some(recheck));
            }
        }));

        Self {
            fingerprint,
            _consumer_task: consumer_task,
            _poll_task: poll_task,
            _popstate_listener: popstate_listener,
            _history_hook: history_hook,
            _pending_recheck: pending_recheck,
        }
    }

    pub fn fingerprint(&self) -> String {
        self.fingerprint.0.borrow().clone()
    }
}

fn schedule_recheck(
    page: Rc<dyn Page>,
    fingerprint: Rc<Fingerprint>,
    address_changed_relay: Relay<NavigationSignal>,
    delay_ms: u32,
) -> TaskHandle {
    Task::start_droppable(async move {
        Timer::sleep(delay_ms).await;
        if fingerprint.update(page.address().href) {
            address_changed_relay.send(NavigationSignal::HistoryMutation);
        }
    })
}
