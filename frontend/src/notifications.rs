use crate::platform::NotificationSink;
use futures_signals::signal::Mutable;
use shared::Settings;
use std::rc::Rc;

pub const MANAGER_TITLE: &str = "PiP Manager";
pub const MODE_TITLE: &str = "Picture-in-Picture";

/// Notification sink gated by the cached `showNotifications` setting.
#[derive(Clone)]
pub struct Notifier {
    sink: Rc<dyn NotificationSink>,
    settings: Mutable<Settings>,
}

impl Notifier {
    pub fn new(sink: Rc<dyn NotificationSink>, settings: Mutable<Settings>) -> Self {
        Self { sink, settings }
    }

    pub fn show(&self, title: &str, message: &str) {
        if !self.settings.get().show_notifications {
            return;
        }
        log::info!("{title}: {message}");
        self.sink.show(title, message);
    }
}
