//! Platform abstraction layer
//!
//! The core never touches the DOM directly. It talks to these traits, which
//! the browser build implements with web-sys (`web`) and the tests implement
//! with an in-memory page (`testing`).

use crate::error::HostError;
use futures::future::LocalBoxFuture;
use shared::{PageAddress, Settings};
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub mod testing;

pub type HostFuture<T> = LocalBoxFuture<'static, Result<T, HostError>>;

/// A registered listener, observer or method hook.
///
/// The subscription owns the exact handler it registered and unregisters
/// that same handler when dropped, so detaching can never miss.
#[must_use = "dropping a subscription detaches it"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release, for hosts that could not attach.
    pub fn detached() -> Self {
        Self { release: None }
    }

    pub fn is_attached(&self) -> bool {
        self.release.is_some()
    }

    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Native picture-in-picture notifications raised by the media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeEvent {
    Entered,
    Left,
}

impl ModeEvent {
    pub fn dom_name(self) -> &'static str {
        match self {
            Self::Entered => "enterpictureinpicture",
            Self::Left => "leavepictureinpicture",
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Entered)
    }
}

/// The document and window of the host page.
pub trait Page {
    fn address(&self) -> PageAddress;

    /// True while the document is still being parsed.
    fn is_loading(&self) -> bool;

    /// Run `handler` once the document has been parsed.
    fn on_ready(&self, handler: Box<dyn FnOnce()>) -> Subscription;

    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>>;

    /// Structural mutations of the body subtree, one call per batch.
    fn observe_mutations(&self, handler: Box<dyn FnMut()>) -> Subscription;

    fn media_element(&self, selector: &str) -> Option<Rc<dyn MediaElement>>;

    /// Back/forward navigation.
    fn on_popstate(&self, handler: Box<dyn FnMut()>) -> Subscription;

    /// Hook `pushState`/`replaceState`; `handler` runs after the original call.
    fn intercept_history(&self, handler: Box<dyn FnMut()>) -> Subscription;

    fn exit_picture_in_picture(&self) -> HostFuture<()>;
}

/// A located host element.
pub trait Element {
    fn remove_attribute(&self, name: &str);

    fn set_inner_html(&self, html: &str);

    /// Click listener that also suppresses the host's default action.
    fn on_click(&self, handler: Box<dyn FnMut()>) -> Subscription;
}

pub trait MediaElement {
    fn request_picture_in_picture(&self) -> HostFuture<()>;

    fn on_mode_event(&self, event: ModeEvent, handler: Box<dyn FnMut()>) -> Subscription;
}

/// Persisted settings, owned outside the content script.
pub trait SettingsStore {
    fn load(&self) -> HostFuture<Settings>;

    fn save(&self, settings: Settings) -> HostFuture<()>;
}

pub trait NotificationSink {
    fn show(&self, title: &str, message: &str);
}
