//! Content script keeping a custom picture-in-picture control in sync with
//! the YouTube player across single-page navigations.
//!
//! The core ([`locator`], [`navigation`], [`lifecycle`], [`mode_sync`]) only
//! talks to the [`platform`] traits. The browser build wires them to web-sys
//! and the extension APIs; the native test suite wires them to an in-memory page.

pub mod app;
pub mod config;
pub mod connection;
pub mod context;
pub mod dataflow;
pub mod error;
pub mod icons;
pub mod lifecycle;
pub mod locator;
pub mod mode_sync;
pub mod navigation;
pub mod notifications;
pub mod platform;

#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod page_api;

#[cfg(target_arch = "wasm32")]
mod browser {
    use crate::app::ContentScript;
    use crate::config::ContentConfig;
    use crate::dataflow::Task;
    use crate::error::HostError;
    use crate::platform::web::{ChromeNotificationSink, ChromeSettingsStore, WebPage, listen_for_control_messages};
    use crate::{logging, page_api};
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        logging::init(log::LevelFilter::Info);
        Task::start(async {
            if let Err(error) = boot().await {
                log::error!("Failed to start: {error}");
            }
        });
    }

    async fn boot() -> Result<(), HostError> {
        let page = Rc::new(WebPage::new()?);
        let script = ContentScript::new(
            page,
            Rc::new(ChromeSettingsStore),
            Rc::new(ChromeNotificationSink),
            ContentConfig::default(),
        )
        .await;

        if let Err(error) = listen_for_control_messages(script.control_msg_relay.clone()) {
            log::error!("Messaging unavailable: {error}");
        }
        script.launch();

        page_api::store_content_script(script);
        page_api::expose_page_api();
        log::info!("Content script loaded");
        Ok(())
    }
}
