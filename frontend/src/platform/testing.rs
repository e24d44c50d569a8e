//! In-memory page used by the native test suite
//!
//! Mirrors the browser closely enough for the core: observers fire after
//! structural changes, history hooks fire after the address changed, and
//! every registration can be counted to prove it was released.

use super::{Element, HostFuture, MediaElement, ModeEvent, NotificationSink, Page, SettingsStore, Subscription};
use crate::error::HostError;
use futures::FutureExt;
use futures::future;
use shared::{PageAddress, Settings};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const OTHER_WATCH_URL: &str = "https://www.youtube.com/watch?v=9bZkp7q19f0";
pub const HOME_URL: &str = "https://www.youtube.com/";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Splits an href the way `window.location` does.
pub fn parse_address(href: &str) -> PageAddress {
    let without_fragment = href.split('#').next().unwrap_or_default();
    let after_scheme = match without_fragment.find("://") {
        Some(index) => &without_fragment[index + 3..],
        None => without_fragment,
    };

    let authority_end = after_scheme
        .find(|c| c == '/' || c == '?')
        .unwrap_or(after_scheme.len());
    let (authority, rest) = after_scheme.split_at(authority_end);

    // Drop userinfo and port, keep the bare hostname
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default().to_lowercase();

    let (path, search) = match rest.find('?') {
        Some(index) => (&rest[..index], &rest[index..]),
        None => (rest, ""),
    };
    let path = if path.is_empty() { "/" } else { path };

    PageAddress {
        href: href.to_string(),
        host,
        path: path.to_string(),
        search: search.to_string(),
    }
}

type Handler = Rc<RefCell<Box<dyn FnMut()>>>;

/// Id-keyed handler registry shared by every fake event source.
#[derive(Default)]
pub struct Listeners {
    next_id: Cell<u64>,
    handlers: Rc<RefCell<Vec<(u64, Handler)>>>,
}

impl Listeners {
    pub fn add(&self, handler: Box<dyn FnMut()>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers.borrow_mut().push((id, Rc::new(RefCell::new(handler))));

        let handlers = Rc::downgrade(&self.handlers);
        Subscription::new(move || {
            if let Some(handlers) = handlers.upgrade() {
                handlers.borrow_mut().retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    /// Calls every handler registered at the time of the call, skipping any
    /// that an earlier handler removed.
    pub fn fire(&self) {
        let snapshot: Vec<(u64, Handler)> = self.handlers.borrow().clone();
        for (id, handler) in snapshot {
            let still_registered = self.handlers.borrow().iter().any(|(handler_id, _)| *handler_id == id);
            if still_registered {
                let mut handler = handler.borrow_mut();
                (*handler)();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }
}

// ===== PAGE =====

pub struct FakePage {
    href: RefCell<String>,
    loading: Cell<bool>,
    elements: RefCell<HashMap<String, Rc<FakeElement>>>,
    media: RefCell<Option<Rc<FakeMedia>>>,
    mutation_observers: Listeners,
    popstate_listeners: Listeners,
    history_hooks: Listeners,
    ready_listeners: Listeners,
    queries: Cell<u32>,
    exit_requests: Cell<u32>,
    reject_exit: Cell<bool>,
}

impl FakePage {
    /// A fully parsed page with nothing rendered yet.
    pub fn new(href: &str) -> Rc<Self> {
        Rc::new(Self {
            href: RefCell::new(href.to_string()),
            loading: Cell::new(false),
            elements: RefCell::new(HashMap::new()),
            media: RefCell::new(None),
            mutation_observers: Listeners::default(),
            popstate_listeners: Listeners::default(),
            history_hooks: Listeners::default(),
            ready_listeners: Listeners::default(),
            queries: Cell::new(0),
            exit_requests: Cell::new(0),
            reject_exit: Cell::new(false),
        })
    }

    pub fn loading(href: &str) -> Rc<Self> {
        let page = Self::new(href);
        page.loading.set(true);
        page
    }

    /// A parsed page with the player, its control and a media element.
    pub fn with_player(href: &str) -> Rc<Self> {
        let page = Self::new(href);
        page.render_player();
        page
    }

    /// Renders the player container, the control and the media element in one batch.
    pub fn render_player(&self) -> Rc<FakeElement> {
        self.media.replace(Some(Rc::new(FakeMedia::default())));
        {
            let mut elements = self.elements.borrow_mut();
            elements.insert(
                crate::config::PLAYER_SELECTOR.to_string(),
                Rc::new(FakeElement::default()),
            );
            elements.insert(
                crate::config::PIP_BUTTON_SELECTOR.to_string(),
                Rc::new(FakeElement::default()),
            );
        }
        self.mutation_observers.fire();
        self.button().expect("control was just rendered")
    }

    pub fn insert(&self, selector: &str) -> Rc<FakeElement> {
        let element = Rc::new(FakeElement::default());
        self.elements.borrow_mut().insert(selector.to_string(), element.clone());
        self.mutation_observers.fire();
        element
    }

    pub fn remove_media(&self) {
        self.media.replace(None);
        self.mutation_observers.fire();
    }

    pub fn element(&self, selector: &str) -> Option<Rc<FakeElement>> {
        self.elements.borrow().get(selector).cloned()
    }

    pub fn button(&self) -> Option<Rc<FakeElement>> {
        self.element(crate::config::PIP_BUTTON_SELECTOR)
    }

    pub fn media(&self) -> Option<Rc<FakeMedia>> {
        self.media.borrow().clone()
    }

    /// Address change that no history hook or event reports.
    pub fn navigate(&self, href: &str) {
        self.href.replace(href.to_string());
    }

    /// `history.pushState` as the host's router calls it.
    pub fn push_state(&self, href: &str) {
        self.href.replace(href.to_string());
        self.history_hooks.fire();
    }

    /// Back/forward button.
    pub fn pop_state(&self, href: &str) {
        self.href.replace(href.to_string());
        self.popstate_listeners.fire();
    }

    pub fn finish_loading(&self) {
        self.loading.set(false);
        self.ready_listeners.fire();
    }

    pub fn reject_exit(&self, reject: bool) {
        self.reject_exit.set(reject);
    }

    pub fn mutation_observer_count(&self) -> usize {
        self.mutation_observers.len()
    }

    pub fn popstate_listener_count(&self) -> usize {
        self.popstate_listeners.len()
    }

    pub fn history_hook_count(&self) -> usize {
        self.history_hooks.len()
    }

    pub fn query_count(&self) -> u32 {
        self.queries.get()
    }

    pub fn exit_requests(&self) -> u32 {
        self.exit_requests.get()
    }
}

impl Page for FakePage {
    fn address(&self) -> PageAddress {
        parse_address(&self.href.borrow())
    }

    fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn on_ready(&self, handler: Box<dyn FnOnce()>) -> Subscription {
        let mut handler = Some(handler);
        self.ready_listeners.add(Box::new(move || {
            if let Some(handler) = handler.take() {
                handler();
            }
        }))
    }

    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>> {
        self.queries.set(self.queries.get() + 1);
        self.element(selector).map(|element| element as Rc<dyn Element>)
    }

    fn observe_mutations(&self, handler: Box<dyn FnMut()>) -> Subscription {
        self.mutation_observers.add(handler)
    }

    fn media_element(&self, _selector: &str) -> Option<Rc<dyn MediaElement>> {
        self.media().map(|media| media as Rc<dyn MediaElement>)
    }

    fn on_popstate(&self, handler: Box<dyn FnMut()>) -> Subscription {
        self.popstate_listeners.add(handler)
    }

    fn intercept_history(&self, handler: Box<dyn FnMut()>) -> Subscription {
        self.history_hooks.add(handler)
    }

    fn exit_picture_in_picture(&self) -> HostFuture<()> {
        self.exit_requests.set(self.exit_requests.get() + 1);
        let result = if self.reject_exit.get() {
            Err(HostError::new("InvalidStateError: no picture-in-picture element"))
        } else {
            Ok(())
        };
        future::ready(result).boxed_local()
    }
}

// ===== ELEMENTS =====

#[derive(Default)]
pub struct FakeElement {
    attributes: RefCell<HashMap<String, String>>,
    inner_html: RefCell<String>,
    click_listeners: Listeners,
}

impl FakeElement {
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.attributes.borrow_mut().insert(name.to_string(), value.to_string());
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn inner_html(&self) -> String {
        self.inner_html.borrow().clone()
    }

    pub fn click(&self) {
        self.click_listeners.fire();
    }

    pub fn click_listener_count(&self) -> usize {
        self.click_listeners.len()
    }
}

impl Element for FakeElement {
    fn remove_attribute(&self, name: &str) {
        self.attributes.borrow_mut().remove(name);
    }

    fn set_inner_html(&self, html: &str) {
        self.inner_html.replace(html.to_string());
    }

    fn on_click(&self, handler: Box<dyn FnMut()>) -> Subscription {
        self.click_listeners.add(handler)
    }
}

#[derive(Default)]
pub struct FakeMedia {
    requests: Cell<u32>,
    reject: Cell<bool>,
    entered_listeners: Listeners,
    left_listeners: Listeners,
}

impl FakeMedia {
    /// Raise a native mode event, as the browser does once a request settled.
    pub fn fire(&self, event: ModeEvent) {
        self.listeners(event).fire();
    }

    pub fn reject_requests(&self, reject: bool) {
        self.reject.set(reject);
    }

    pub fn requests(&self) -> u32 {
        self.requests.get()
    }

    pub fn listener_count(&self, event: ModeEvent) -> usize {
        self.listeners(event).len()
    }

    fn listeners(&self, event: ModeEvent) -> &Listeners {
        match event {
            ModeEvent::Entered => &self.entered_listeners,
            ModeEvent::Left => &self.left_listeners,
        }
    }
}

impl MediaElement for FakeMedia {
    fn request_picture_in_picture(&self) -> HostFuture<()> {
        self.requests.set(self.requests.get() + 1);
        let result = if self.reject.get() {
            Err(HostError::new("NotAllowedError: must be handling a user gesture"))
        } else {
            Ok(())
        };
        future::ready(result).boxed_local()
    }

    fn on_mode_event(&self, event: ModeEvent, handler: Box<dyn FnMut()>) -> Subscription {
        self.listeners(event).add(handler)
    }
}

// ===== STORE & SINK =====

#[derive(Default)]
pub struct FakeSettingsStore {
    stored: RefCell<Option<Settings>>,
    fail: Cell<bool>,
    loads: Cell<u32>,
}

impl FakeSettingsStore {
    pub fn with(settings: Settings) -> Rc<Self> {
        let store = Self::default();
        store.stored.replace(Some(settings));
        Rc::new(store)
    }

    pub fn set_stored(&self, settings: Settings) {
        self.stored.replace(Some(settings));
    }

    pub fn fail(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn loads(&self) -> u32 {
        self.loads.get()
    }
}

impl SettingsStore for FakeSettingsStore {
    fn load(&self) -> HostFuture<Settings> {
        self.loads.set(self.loads.get() + 1);
        let result = if self.fail.get() {
            Err(HostError::new("storage quota exceeded"))
        } else {
            Ok((*self.stored.borrow()).unwrap_or_default())
        };
        future::ready(result).boxed_local()
    }

    fn save(&self, settings: Settings) -> HostFuture<()> {
        let result = if self.fail.get() {
            Err(HostError::new("storage quota exceeded"))
        } else {
            self.stored.replace(Some(settings));
            Ok(())
        };
        future::ready(result).boxed_local()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    shown: RefCell<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.shown.borrow().iter().map(|(_, message)| message.clone()).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn show(&self, title: &str, message: &str) {
        self.shown.borrow_mut().push((title.to_string(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_address() {
        let address = parse_address("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42#comments");
        assert_eq!(address.host, "www.youtube.com");
        assert_eq!(address.path, "/watch");
        assert_eq!(address.search, "?v=dQw4w9WgXcQ&t=42");
    }

    #[test]
    fn test_parse_bare_host() {
        let address = parse_address("https://user@WWW.YouTube.com:443");
        assert_eq!(address.host, "www.youtube.com");
        assert_eq!(address.path, "/");
        assert_eq!(address.search, "");
    }
}
