//! Mode Synchronizer
//!
//! Binds the located control to the page's media element. The cached mode
//! flag follows the native `enterpictureinpicture`/`leavepictureinpicture`
//! events only; clicks and `toggle()` merely ask the host to switch.

use crate::dataflow::Task;
use crate::error::{PipError, Result};
use crate::icons::{IconPalette, render_icon};
use crate::notifications::{MODE_TITLE, Notifier};
use crate::platform::{Element, ModeEvent, Page, Subscription};
use futures_signals::signal::{Mutable, Signal};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

struct SyncState {
    anchor: RefCell<Option<Rc<dyn Element>>>,
    page: Rc<dyn Page>,
    media_selector: String,
    active: Mutable<bool>,
    palette: RefCell<IconPalette>,
    notifier: Notifier,
    destroyed: Cell<bool>,
}

impl SyncState {
    fn render(&self) {
        if let Some(anchor) = self.anchor.borrow().as_ref() {
            anchor.set_inner_html(&render_icon(self.active.get(), &self.palette.borrow()));
        }
    }

    fn apply_mode_event(&self, event: ModeEvent) {
        if self.destroyed.get() {
            return;
        }
        self.active.set_neq(event.is_active());
        self.render();

        let message = match event {
            ModeEvent::Entered => "Entered PiP mode",
            ModeEvent::Left => "Left PiP mode",
        };
        log::info!("{message}");
        self.notifier.show(MODE_TITLE, message);
    }

    async fn request_toggle(&self) -> Result<()> {
        let media = self
            .page
            .media_element(&self.media_selector)
            .ok_or(PipError::MediaUnavailable)?;

        let request = if self.active.get() {
            self.page.exit_picture_in_picture()
        } else {
            media.request_picture_in_picture()
        };
        request.await.map_err(PipError::ModeRequest)
    }
}

pub struct ModeSynchronizer {
    state: Rc<SyncState>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl ModeSynchronizer {
    pub fn attach(
        anchor: Rc<dyn Element>,
        page: Rc<dyn Page>,
        media_selector: &str,
        palette: IconPalette,
        notifier: Notifier,
    ) -> Self {
        anchor.remove_attribute("style");

        let state = Rc::new(SyncState {
            anchor: RefCell::new(Some(anchor.clone())),
            page: page.clone(),
            media_selector: media_selector.to_string(),
            active: Mutable::new(false),
            palette: RefCell::new(palette),
            notifier,
            destroyed: Cell::new(false),
        });
        state.render();

        let mut subscriptions = vec![anchor.on_click(Box::new({
            let state = Rc::downgrade(&state);
            move || toggle_from_click(&state)
        }))];

        match page.media_element(media_selector) {
            Some(media) => {
                for event in [ModeEvent::Entered, ModeEvent::Left] {
                    let state = Rc::downgrade(&state);
                    subscriptions.push(media.on_mode_event(
                        event,
                        Box::new(move || {
                            if let Some(state) = state.upgrade() {
                                state.apply_mode_event(event);
                            }
                        }),
                    ));
                }
            }
            None => log::warn!("No media element yet, native mode events are not tracked"),
        }

        log::debug!("Mode synchronizer attached");
        Self {
            state,
            subscriptions: RefCell::new(subscriptions),
        }
    }

    /// Asks the host to enter or leave picture-in-picture.
    ///
    /// Resolves once the host accepted or refused; the flag changes later,
    /// when the matching native event arrives.
    pub fn toggle(&self) -> impl Future<Output = Result<()>> + use<> {
        let state = self.state.clone();
        async move { state.request_toggle().await }
    }

    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    pub fn active_signal(&self) -> impl Signal<Item = bool> + use<> {
        self.state.active.signal()
    }

    pub fn update_palette(&self, palette: IconPalette) {
        self.state.palette.replace(palette);
        self.state.render();
        log::debug!("Control palette updated");
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.destroyed.get()
    }

    /// Detaches the click and mode handlers and forgets the anchor.
    pub fn destroy(&self) {
        if self.state.destroyed.replace(true) {
            return;
        }
        self.subscriptions.borrow_mut().clear();
        self.state.anchor.replace(None);
        self.state.active.set_neq(false);
        log::debug!("Mode synchronizer destroyed");
    }
}

impl Drop for ModeSynchronizer {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn toggle_from_click(state: &Weak<SyncState>) {
    let Some(state) = state.upgrade() else {
        return;
    };
    if state.destroyed.get() {
        return;
    }
    Task::start(async move {
        if let Err(error) = state.request_toggle().await {
            log::error!("{error}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MEDIA_SELECTOR;
    use crate::dataflow::Timer;
    use crate::icons::{ENTER_PATH, EXIT_PATH};
    use crate::platform::testing::{FakeElement, FakeMedia, FakePage, RecordingSink, WATCH_URL, init_logging};
    use shared::Settings;
    use tokio::task::LocalSet;

    struct Harness {
        page: Rc<FakePage>,
        button: Rc<FakeElement>,
        media: Rc<FakeMedia>,
        sink: Rc<RecordingSink>,
        settings: Mutable<Settings>,
        sync: ModeSynchronizer,
    }

    fn harness() -> Harness {
        init_logging();
        let page = FakePage::with_player(WATCH_URL);
        let button = page.button().unwrap();
        button.set_attribute("style", "display: none");
        let media = page.media().unwrap();
        let sink = Rc::new(RecordingSink::default());
        let settings = Mutable::new(Settings::default());

        let sync = ModeSynchronizer::attach(
            button.clone(),
            page.clone(),
            MEDIA_SELECTOR,
            IconPalette::default(),
            Notifier::new(sink.clone(), settings.clone()),
        );
        Harness { page, button, media, sink, settings, sync }
    }

    #[test]
    fn test_attach_prepares_control() {
        let h = harness();

        assert_eq!(h.button.attribute("style"), None);
        assert!(h.button.inner_html().contains(ENTER_PATH));
        assert!(h.button.inner_html().contains(r##"fill="#fff""##));
        assert_eq!(h.button.click_listener_count(), 1);
        assert_eq!(h.media.listener_count(ModeEvent::Entered), 1);
        assert_eq!(h.media.listener_count(ModeEvent::Left), 1);
        assert!(!h.sync.is_active());
    }

    #[tokio::test]
    async fn test_toggle_follows_native_events() {
        let h = harness();

        h.sync.toggle().await.unwrap();
        assert_eq!(h.media.requests(), 1);
        assert!(!h.sync.is_active());

        h.media.fire(ModeEvent::Entered);
        assert!(h.sync.is_active());
        assert!(h.button.inner_html().contains(EXIT_PATH));
        assert!(h.button.inner_html().contains(r##"fill="#ff0000""##));

        h.sync.toggle().await.unwrap();
        assert_eq!(h.page.exit_requests(), 1);
        assert_eq!(h.media.requests(), 1);

        h.media.fire(ModeEvent::Left);
        assert!(!h.sync.is_active());
        assert!(h.button.inner_html().contains(ENTER_PATH));
        assert!(h.button.inner_html().contains(r##"fill="#fff""##));

        assert_eq!(
            h.sink.shown(),
            vec![
                (MODE_TITLE.to_string(), "Entered PiP mode".to_string()),
                (MODE_TITLE.to_string(), "Left PiP mode".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_without_media_fails() {
        let h = harness();
        h.page.remove_media();

        assert_eq!(h.sync.toggle().await, Err(PipError::MediaUnavailable));
        assert_eq!(h.media.requests(), 0);
    }

    #[tokio::test]
    async fn test_rejected_request_keeps_state() {
        let h = harness();
        h.media.reject_requests(true);

        let result = h.sync.toggle().await;

        assert!(matches!(result, Err(PipError::ModeRequest(_))));
        assert!(!h.sync.is_active());
        assert!(h.button.inner_html().contains(ENTER_PATH));
    }

    #[tokio::test]
    async fn test_rejected_exit_stays_active() {
        let h = harness();
        h.media.fire(ModeEvent::Entered);
        h.page.reject_exit(true);

        let result = h.sync.toggle().await;

        assert!(matches!(result, Err(PipError::ModeRequest(_))));
        assert_eq!(h.page.exit_requests(), 1);
        assert!(h.sync.is_active());
        assert!(h.button.inner_html().contains(EXIT_PATH));
    }

    #[tokio::test]
    async fn test_click_requests_mode() {
        LocalSet::new()
            .run_until(async {
                let h = harness();

                h.button.click();
                Timer::sleep(1).await;

                assert_eq!(h.media.requests(), 1);
                assert!(!h.sync.is_active());
            })
            .await;
    }

    #[test]
    fn test_destroy_detaches_everything() {
        let h = harness();
        h.media.fire(ModeEvent::Entered);
        let rendered = h.button.inner_html();

        h.sync.destroy();
        h.sync.destroy();

        assert!(h.sync.is_destroyed());
        assert!(!h.sync.is_active());
        assert_eq!(h.button.click_listener_count(), 0);
        assert_eq!(h.media.listener_count(ModeEvent::Entered), 0);
        assert_eq!(h.media.listener_count(ModeEvent::Left), 0);

        h.media.fire(ModeEvent::Entered);
        h.button.click();
        assert!(!h.sync.is_active());
        assert_eq!(h.button.inner_html(), rendered);
        assert_eq!(h.media.requests(), 0);
    }

    #[test]
    fn test_drop_detaches() {
        let h = harness();
        let Harness { button, media, sync, .. } = h;

        drop(sync);

        assert_eq!(button.click_listener_count(), 0);
        assert_eq!(media.listener_count(ModeEvent::Left), 0);
    }

    #[test]
    fn test_update_palette_rerenders() {
        let h = harness();

        h.sync.update_palette(IconPalette {
            active: "#00ff00".to_string(),
            inactive: "#333".to_string(),
        });
        assert!(h.button.inner_html().contains(r##"fill="#333""##));

        h.media.fire(ModeEvent::Entered);
        assert!(h.button.inner_html().contains(r##"fill="#00ff00""##));
    }

    #[test]
    fn test_muted_notifications() {
        let h = harness();
        h.settings.set(Settings { show_notifications: false, ..Settings::default() });

        h.media.fire(ModeEvent::Entered);

        assert!(h.sync.is_active());
        assert!(h.sink.shown().is_empty());
    }
}
