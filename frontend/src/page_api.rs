//! `window.YouTubePipExtension`, the page-level handle used for debugging
//! from the DevTools console.

use crate::app::ContentScript;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

thread_local! {
    static CONTENT_SCRIPT: RefCell<Option<ContentScript>> = const { RefCell::new(None) };
}

pub fn store_content_script(script: ContentScript) {
    CONTENT_SCRIPT.with(|cell| {
        if let Some(previous) = cell.borrow_mut().replace(script) {
            previous.destroy();
        }
    });
}

fn with_content_script<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&ContentScript) -> R,
{
    CONTENT_SCRIPT.with(|cell| cell.borrow().as_ref().map(f))
}

pub fn expose_page_api() {
    let Some(window) = web_sys::window() else {
        return;
    };

    let api = js_sys::Object::new();
    let methods: [(&str, Closure<dyn Fn() -> JsValue>); 5] = [
        ("getStatus", Closure::wrap(Box::new(get_status_impl) as Box<dyn Fn() -> JsValue>)),
        ("startPipManager", Closure::wrap(Box::new(start_impl) as Box<dyn Fn() -> JsValue>)),
        ("stopPipManager", Closure::wrap(Box::new(stop_impl) as Box<dyn Fn() -> JsValue>)),
        ("reinitialize", Closure::wrap(Box::new(reinitialize_impl) as Box<dyn Fn() -> JsValue>)),
        ("togglePip", Closure::wrap(Box::new(toggle_impl) as Box<dyn Fn() -> JsValue>)),
    ];
    for (name, closure) in methods {
        js_sys::Reflect::set(&api, &name.into(), closure.as_ref().unchecked_ref()).ok();
        closure.forget();
    }

    js_sys::Reflect::set(&window, &"YouTubePipExtension".into(), &api).ok();
    log::debug!("Page API exposed on window.YouTubePipExtension");
}

fn get_status_impl() -> JsValue {
    with_content_script(|script| serde_wasm_bindgen::to_value(&script.controller.status()).ok())
        .flatten()
        .unwrap_or(JsValue::NULL)
}

fn start_impl() -> JsValue {
    with_content_script(|script| script.controller.start());
    JsValue::UNDEFINED
}

fn stop_impl() -> JsValue {
    with_content_script(|script| script.controller.stop());
    JsValue::UNDEFINED
}

fn reinitialize_impl() -> JsValue {
    match with_content_script(|script| script.controller.reinitialize()) {
        Some(reinitialize) => future_to_promise(async move {
            reinitialize.await;
            Ok(JsValue::UNDEFINED)
        })
        .into(),
        None => JsValue::UNDEFINED,
    }
}

fn toggle_impl() -> JsValue {
    match with_content_script(|script| script.controller.toggle()) {
        Some(toggle) => future_to_promise(async move {
            toggle
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|error| JsValue::from_str(&error.to_string()))
        })
        .into(),
        None => JsValue::UNDEFINED,
    }
}
