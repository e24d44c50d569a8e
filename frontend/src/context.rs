use crate::config::ContentConfig;
use crate::error::PipError;
use crate::notifications::Notifier;
use crate::platform::{NotificationSink, Page, SettingsStore};
use futures_signals::signal::Mutable;
use shared::Settings;
use std::rc::Rc;

/// Everything the content script shares between its components.
///
/// Built once by the composition root and handed down by reference; the
/// settings cache is the only piece that changes afterwards.
#[derive(Clone)]
pub struct ContentContext {
    pub page: Rc<dyn Page>,
    pub settings_store: Rc<dyn SettingsStore>,
    pub notifier: Notifier,
    pub settings: Mutable<Settings>,
    pub config: ContentConfig,
}

impl ContentContext {
    pub fn new(
        page: Rc<dyn Page>,
        settings_store: Rc<dyn SettingsStore>,
        sink: Rc<dyn NotificationSink>,
        settings: Settings,
        config: ContentConfig,
    ) -> Self {
        let settings = Mutable::new(settings);
        Self {
            page,
            settings_store,
            notifier: Notifier::new(sink, settings.clone()),
            settings,
            config,
        }
    }

    pub fn is_video_page(&self) -> bool {
        self.config.page.matches(&self.page.address())
    }

    /// Replaces the cached settings with the stored record, or with the
    /// defaults when the store cannot be read.
    pub async fn reload_settings(&self) -> Settings {
        let settings = match self.settings_store.load().await {
            Ok(settings) => {
                log::info!("Settings loaded: {settings:?}");
                settings
            }
            Err(error) => {
                log::error!("{}, using defaults", PipError::Settings(error));
                Settings::default()
            }
        };
        self.settings.set(settings);
        settings
    }
}
