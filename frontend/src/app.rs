//! ContentScript - composition root of the content script
//!
//! Owns the single [`LifecycleController`] of the page and the processor
//! that feeds it messages from the popup and the background worker.

use crate::config::ContentConfig;
use crate::connection::{ControlRequest, create_control_message_handler};
use crate::context::ContentContext;
use crate::dataflow::{Relay, TaskHandle};
use crate::lifecycle::LifecycleController;
use crate::platform::{NotificationSink, Page, SettingsStore};
use shared::Settings;
use std::rc::Rc;

pub struct ContentScript {
    pub controller: Rc<LifecycleController>,

    /// Inbound control message (popup, background worker, page API)
    pub control_msg_relay: Relay<ControlRequest>,

    _message_handler: TaskHandle,
}

impl ContentScript {
    /// Loads the stored settings and wires the components together.
    ///
    /// Nothing observes the page until [`launch`](Self::launch).
    pub async fn new(
        page: Rc<dyn Page>,
        settings_store: Rc<dyn SettingsStore>,
        sink: Rc<dyn NotificationSink>,
        config: ContentConfig,
    ) -> Self {
        let context = ContentContext::new(page, settings_store, sink, Settings::default(), config);
        context.reload_settings().await;

        let controller = Rc::new(LifecycleController::new(context));
        let (control_msg_relay, message_handler) = create_control_message_handler(controller.clone());

        Self {
            controller,
            control_msg_relay,
            _message_handler: message_handler,
        }
    }

    pub fn launch(&self) {
        log::info!("YouTube PiP Extension starting...");
        self.controller.launch();
    }

    pub fn send(&self, request: ControlRequest) {
        self.control_msg_relay.send(request);
    }

    pub fn destroy(&self) {
        self.controller.destroy();
    }
}
