//! Element Locator
//!
//! Resolves a selector to a live element on a page that renders
//! asynchronously. A synchronous query runs first; otherwise every mutation
//! batch of the body subtree re-runs the query until it matches or the
//! timeout fires, whichever comes first.

use crate::dataflow::{Timer, relay};
use crate::error::{PipError, Result};
use crate::platform::{Element, Page};
use futures::{FutureExt, StreamExt, pin_mut, select};
use std::rc::Rc;

pub async fn locate(page: &dyn Page, selector: &str, timeout_ms: u32) -> Result<Rc<dyn Element>> {
    if let Some(element) = page.query_selector(selector) {
        return Ok(element);
    }

    let (body_mutated_relay, mut body_mutated_stream) = relay::<()>();
    let _observer = page.observe_mutations(Box::new(move || body_mutated_relay.send(())));

    let timeout = Timer::sleep(timeout_ms).fuse();
    pin_mut!(timeout);

    // The observer and the timer both drop on return, so exactly one outcome wins
    loop {
        select! {
            batch = body_mutated_stream.next() => {
                if batch.is_some()
                    && let Some(element) = page.query_selector(selector)
                {
                    log::debug!("Found {selector}");
                    return Ok(element);
                }
            }
            () = timeout => {
                return Err(PipError::NotFound {
                    selector: selector.to_string(),
                    timeout_ms,
                });
            }
        }
    }
}
