//! Browser platform implementation using web-sys
//!
//! Page access goes through the DOM of the hosting tab; settings, messaging
//! and notifications go through the `chrome.*` extension APIs, reached with
//! `js_sys::Reflect` because web-sys has no bindings for them.

use super::{Element, HostFuture, MediaElement, ModeEvent, NotificationSink, Page, SettingsStore, Subscription};
use crate::connection::ControlRequest;
use crate::dataflow::{Relay, Task};
use crate::error::{HostError, PipError};
use futures::FutureExt;
use js_sys::{Array, Function, Promise, Reflect};
use shared::{ContentMsg, ControlMsg, PageAddress, SETTINGS_STORAGE_KEY, Settings};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Event, EventTarget, HtmlVideoElement, MutationObserver, MutationObserverInit, Window};

fn js_error(value: JsValue) -> HostError {
    let message = value
        .as_string()
        .or_else(|| Reflect::get(&value, &"message".into()).ok().and_then(|message| message.as_string()))
        .unwrap_or_else(|| format!("{value:?}"));
    HostError::new(message)
}

/// Event listener removed together with the closure it registered.
fn listen(target: &EventTarget, event: &'static str, handler: impl FnMut(Event) + 'static) -> Subscription {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    if let Err(error) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
        log::error!("Failed to listen for {event}: {}", js_error(error));
        return Subscription::detached();
    }

    let target = target.clone();
    Subscription::new(move || {
        let _ = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    })
}

/// Calls `target[method](...args)` and returns the promise it produced.
fn call_method(target: &JsValue, method: &str, args: &Array) -> Result<Promise, HostError> {
    let function: Function = Reflect::get(target, &JsValue::from_str(method))
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| HostError::new(format!("{method} is not a function")))?;
    function
        .apply(target, args)
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| HostError::new(format!("{method} did not return a promise")))
}

fn settle(promise: Result<Promise, HostError>) -> HostFuture<()> {
    async move {
        JsFuture::from(promise?).await.map_err(js_error)?;
        Ok(())
    }
    .boxed_local()
}

// ===== PAGE =====

pub struct WebPage {
    window: Window,
    document: Document,
}

impl WebPage {
    pub fn new() -> Result<Self, HostError> {
        let window = web_sys::window().ok_or_else(|| HostError::new("no window"))?;
        let document = window.document().ok_or_else(|| HostError::new("no document"))?;
        Ok(Self { window, document })
    }
}

impl Page for WebPage {
    fn address(&self) -> PageAddress {
        let location = self.window.location();
        PageAddress {
            href: location.href().unwrap_or_default(),
            host: location.hostname().unwrap_or_default(),
            path: location.pathname().unwrap_or_default(),
            search: location.search().unwrap_or_default(),
        }
    }

    fn is_loading(&self) -> bool {
        self.document.ready_state() == "loading"
    }

    fn on_ready(&self, handler: Box<dyn FnOnce()>) -> Subscription {
        let mut handler = Some(handler);
        listen(&self.document, "DOMContentLoaded", move |_| {
            if let Some(handler) = handler.take() {
                handler();
            }
        })
    }

    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>> {
        match self.document.query_selector(selector) {
            Ok(element) => element.map(|element| Rc::new(WebElement(element)) as Rc<dyn Element>),
            Err(error) => {
                log::error!("Invalid selector {selector}: {}", js_error(error));
                None
            }
        }
    }

    fn observe_mutations(&self, mut handler: Box<dyn FnMut()>) -> Subscription {
        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(move |_records: Array, _observer: MutationObserver| {
            handler();
        });
        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(error) => {
                log::error!("Failed to create MutationObserver: {}", js_error(error));
                return Subscription::detached();
            }
        };

        let root: web_sys::Node = match (self.document.body(), self.document.document_element()) {
            (Some(body), _) => body.into(),
            (None, Some(root)) => root.into(),
            (None, None) => return Subscription::detached(),
        };
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        if let Err(error) = observer.observe_with_options(&root, &options) {
            log::error!("Failed to observe the document: {}", js_error(error));
            return Subscription::detached();
        }

        Subscription::new(move || {
            observer.disconnect();
            drop(callback);
        })
    }

    fn media_element(&self, selector: &str) -> Option<Rc<dyn MediaElement>> {
        let video = self
            .document
            .query_selector(selector)
            .ok()
            .flatten()?
            .dyn_into::<HtmlVideoElement>()
            .ok()?;
        Some(Rc::new(WebMedia { video }))
    }

    fn on_popstate(&self, mut handler: Box<dyn FnMut()>) -> Subscription {
        listen(&self.window, "popstate", move |_| handler())
    }

    fn intercept_history(&self, handler: Box<dyn FnMut()>) -> Subscription {
        let history = match self.window.history() {
            Ok(history) => history,
            Err(error) => {
                log::error!("History unavailable: {}", js_error(error));
                return Subscription::detached();
            }
        };

        let handler = Rc::new(RefCell::new(handler));
        let hooks: Vec<Subscription> = ["pushState", "replaceState"]
            .into_iter()
            .filter_map(|method| match wrap_history_method(&history, method, handler.clone()) {
                Ok(hook) => Some(hook),
                Err(error) => {
                    log::error!("Failed to hook history.{method}: {error}");
                    None
                }
            })
            .collect();

        Subscription::new(move || drop(hooks))
    }

    fn exit_picture_in_picture(&self) -> HostFuture<()> {
        settle(call_method(&self.document, "exitPictureInPicture", &Array::new()))
    }
}

/// Replaces `history[method]` with a wrapper that runs `handler` after the
/// original call. Releasing the hook puts the original back.
fn wrap_history_method(
    history: &web_sys::History,
    method: &'static str,
    handler: Rc<RefCell<Box<dyn FnMut()>>>,
) -> Result<Subscription, HostError> {
    let original: Function = Reflect::get(history, &method.into())
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| HostError::new(format!("history.{method} is not a function")))?;

    let wrapper = Closure::<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>::new({
        let history = history.clone();
        let original = original.clone();
        move |state: JsValue, title: JsValue, url: JsValue| {
            let result = original.call3(&history, &state, &title, &url)?;
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (*handler)();
            }
            Ok(result)
        }
    });
    Reflect::set(history, &method.into(), wrapper.as_ref()).map_err(js_error)?;

    let history = history.clone();
    Ok(Subscription::new(move || {
        let _ = Reflect::set(&history, &method.into(), &original);
        drop(wrapper);
    }))
}

// ===== ELEMENTS =====

struct WebElement(web_sys::Element);

impl Element for WebElement {
    fn remove_attribute(&self, name: &str) {
        let _ = self.0.remove_attribute(name);
    }

    fn set_inner_html(&self, html: &str) {
        self.0.set_inner_html(html);
    }

    fn on_click(&self, mut handler: Box<dyn FnMut()>) -> Subscription {
        listen(&self.0, "click", move |event: Event| {
            event.prevent_default();
            handler();
        })
    }
}

struct WebMedia {
    video: HtmlVideoElement,
}

impl MediaElement for WebMedia {
    fn request_picture_in_picture(&self) -> HostFuture<()> {
        settle(call_method(&self.video, "requestPictureInPicture", &Array::new()))
    }

    fn on_mode_event(&self, event: ModeEvent, mut handler: Box<dyn FnMut()>) -> Subscription {
        listen(&self.video, event.dom_name(), move |_| handler())
    }
}

// ===== EXTENSION APIS =====

/// Looks up `chrome.<path>`, failing when any segment is missing.
fn chrome_api(path: &[&str]) -> Result<JsValue, HostError> {
    let mut value = Reflect::get(&js_sys::global(), &"chrome".into()).map_err(js_error)?;
    for key in path {
        if value.is_undefined() || value.is_null() {
            break;
        }
        value = Reflect::get(&value, &JsValue::from_str(key)).map_err(js_error)?;
    }
    if value.is_undefined() || value.is_null() {
        return Err(HostError::new(format!("chrome.{} is unavailable", path.join("."))));
    }
    Ok(value)
}

async fn send_runtime_message(msg: &ContentMsg) -> Result<JsValue, HostError> {
    let runtime = chrome_api(&["runtime"])?;
    let value = serde_wasm_bindgen::to_value(msg).map_err(|error| HostError::new(error.to_string()))?;
    let promise = call_method(&runtime, "sendMessage", &Array::of1(&value))?;
    JsFuture::from(promise).await.map_err(js_error)
}

/// `chrome.storage.sync`, record under [`SETTINGS_STORAGE_KEY`].
pub struct ChromeSettingsStore;

impl SettingsStore for ChromeSettingsStore {
    fn load(&self) -> HostFuture<Settings> {
        async {
            let area = chrome_api(&["storage", "sync"])?;
            let key = JsValue::from_str(SETTINGS_STORAGE_KEY);
            let promise = call_method(&area, "get", &Array::of1(&key))?;
            let items = JsFuture::from(promise).await.map_err(js_error)?;

            let stored = Reflect::get(&items, &key).map_err(js_error)?;
            if stored.is_undefined() || stored.is_null() {
                return Ok(Settings::default());
            }
            serde_wasm_bindgen::from_value(stored).map_err(|error| HostError::new(error.to_string()))
        }
        .boxed_local()
    }

    fn save(&self, settings: Settings) -> HostFuture<()> {
        async move {
            let area = chrome_api(&["storage", "sync"])?;
            let value = serde_wasm_bindgen::to_value(&settings).map_err(|error| HostError::new(error.to_string()))?;
            let items = js_sys::Object::new();
            Reflect::set(&items, &JsValue::from_str(SETTINGS_STORAGE_KEY), &value).map_err(js_error)?;
            settle(call_method(&area, "set", &Array::of1(&items))).await
        }
        .boxed_local()
    }
}

/// Hands notifications to the background worker, which owns `chrome.notifications`.
pub struct ChromeNotificationSink;

impl NotificationSink for ChromeNotificationSink {
    fn show(&self, title: &str, message: &str) {
        let msg = ContentMsg::ShowNotification {
            title: title.to_string(),
            message: message.to_string(),
        };
        Task::start(async move {
            if let Err(error) = send_runtime_message(&msg).await {
                log::debug!("Notification not delivered: {error}");
            }
        });
    }
}

/// Registers the `chrome.runtime.onMessage` listener for the lifetime of the page.
pub fn listen_for_control_messages(control_msg_relay: Relay<ControlRequest>) -> Result<(), HostError> {
    let on_message = chrome_api(&["runtime", "onMessage"])?;

    let listener = Closure::<dyn FnMut(JsValue, JsValue, Function) -> bool>::new(
        move |message: JsValue, _sender: JsValue, send_response: Function| {
            let msg = match serde_wasm_bindgen::from_value::<ControlMsg>(message) {
                Ok(msg) => msg,
                Err(error) => {
                    log::warn!("Unknown message type: {}", PipError::Message(error.to_string()));
                    return false;
                }
            };

            if msg != ControlMsg::GetStatus {
                control_msg_relay.send(ControlRequest::new(msg));
                return false;
            }
            control_msg_relay.send(ControlRequest::with_reply(msg, move |reply| {
                match serde_wasm_bindgen::to_value(&reply) {
                    Ok(value) => {
                        let _ = send_response.call1(&JsValue::NULL, &value);
                    }
                    Err(error) => log::error!("Failed to encode status: {error}"),
                }
            }));
            // Keeps the response channel open for the deferred reply
            true
        },
    );

    let add_listener: Function = Reflect::get(&on_message, &"addListener".into())
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| HostError::new("onMessage.addListener is not a function"))?;
    add_listener.call1(&on_message, listener.as_ref()).map_err(js_error)?;
    listener.forget();
    Ok(())
}
