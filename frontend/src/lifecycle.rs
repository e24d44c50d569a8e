//! Lifecycle Controller
//!
//! Owns the `Idle → Initializing → Active → Idle` cycle of the control and
//! the terminal `Destroyed` state. Every start trigger (page ready, navigation,
//! manual start, settings change) goes through one trailing-edge debounce, so
//! a burst of triggers yields a single initialization attempt. Teardown always
//! destroys the synchronizer before the state leaves `Active`.

use crate::config::ContentConfig;
use crate::context::ContentContext;
use crate::dataflow::{Debouncer, Task, TaskHandle};
use crate::error::{PipError, Result};
use crate::icons::IconPalette;
use crate::locator::locate;
use crate::mode_sync::ModeSynchronizer;
use crate::navigation::NavigationDetector;
use crate::notifications::MANAGER_TITLE;
use crate::platform::{Element, Page, Subscription};
use futures_signals::signal::{Mutable, Signal};
use shared::{PipStatus, Settings};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Initializing,
    Active,
    Destroyed,
}

impl LifecycleState {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Initializing | Self::Active)
    }
}

struct Inner {
    context: ContentContext,
    state: Mutable<LifecycleState>,
    palette: RefCell<IconPalette>,
    synchronizer: RefCell<Option<ModeSynchronizer>>,
    /// Address the running controller was started for
    target_href: RefCell<Option<String>>,
    init_task: RefCell<Option<TaskHandle>>,
    prepare_task: RefCell<Option<TaskHandle>>,
    init_debouncer: Debouncer,
    page_check_debouncer: Debouncer,
    navigation: RefCell<Option<NavigationDetector>>,
    ready_listener: RefCell<Option<Subscription>>,
    init_attempts: Cell<u32>,
}

pub struct LifecycleController {
    inner: Rc<Inner>,
}

impl LifecycleController {
    /// Builds an idle controller. Nothing is observed or scheduled until [`launch`](Self::launch).
    pub fn new(context: ContentContext) -> Self {
        let timing = context.config.timing;
        let palette = context.config.palette.clone();

        let inner = Rc::new_cyclic(|weak: &Weak<Inner>| Inner {
            context,
            state: Mutable::new(LifecycleState::Idle),
            palette: RefCell::new(palette),
            synchronizer: RefCell::new(None),
            target_href: RefCell::new(None),
            init_task: RefCell::new(None),
            prepare_task: RefCell::new(None),
            init_debouncer: Debouncer::new(timing.init_debounce_ms, {
                let weak = weak.clone();
                move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.initialize();
                    }
                }
            }),
            page_check_debouncer: Debouncer::new(timing.page_check_debounce_ms, {
                let weak = weak.clone();
                move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.check_page();
                    }
                }
            }),
            navigation: RefCell::new(None),
            ready_listener: RefCell::new(None),
            init_attempts: Cell::new(0),
        });

        Self { inner }
    }

    /// Waits for the document, runs the first eligibility check and starts
    /// watching for navigation.
    pub fn launch(&self) {
        let inner = &self.inner;
        if inner.state.get() == LifecycleState::Destroyed {
            log::warn!("Cannot launch a destroyed PiP Manager");
            return;
        }
        if inner.navigation.borrow().is_some() {
            log::debug!("PiP Manager already launched");
            return;
        }

        let page = inner.context.page.clone();
        if page.is_loading() {
            let weak = Rc::downgrade(inner);
            let listener = page.on_ready(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.check_and_init();
                }
            }));
            inner.ready_listener.replace(Some(listener));
        } else {
            inner.check_and_init();
        }

        let weak = Rc::downgrade(inner);
        let detector = NavigationDetector::start(page, inner.context.config.timing, move || {
            if let Some(inner) = weak.upgrade() {
                inner.page_check_debouncer.trigger();
            }
        });
        inner.navigation.replace(Some(detector));
    }

    /// Re-runs the eligibility and settings gate, as on first load.
    pub fn check_and_init(&self) {
        self.inner.check_and_init();
    }

    /// Manual start. Debounced like every other trigger.
    pub fn start(&self) {
        let inner = &self.inner;
        match inner.state.get() {
            LifecycleState::Destroyed => {
                log::warn!("PiP Manager destroyed, start ignored");
                return;
            }
            LifecycleState::Initializing | LifecycleState::Active => {
                log::info!("PiP Manager already running");
                return;
            }
            LifecycleState::Idle => {}
        }
        if !inner.context.settings.get().enabled {
            log::warn!("Extension is disabled");
            return;
        }
        if !inner.context.is_video_page() {
            log::warn!("Not on a YouTube video page");
            return;
        }
        inner.request_init();
    }

    pub fn stop(&self) {
        if !self.inner.state.get().is_running() {
            log::info!("PiP Manager not running");
            return;
        }
        self.inner.teardown();
    }

    /// Tears down, reloads the settings record and starts over.
    pub fn reinitialize(&self) -> impl Future<Output = ()> + use<> {
        let inner = self.inner.clone();
        async move {
            log::info!("Manual reinitialization requested");
            if inner.state.get() == LifecycleState::Destroyed {
                return;
            }
            inner.teardown();
            inner.context.reload_settings().await;
            inner.check_and_init();
        }
    }

    /// Replaces the cached settings record as a whole and reacts to it.
    pub fn apply_settings(&self, settings: Settings) {
        let inner = &self.inner;
        log::info!("Settings changed: {settings:?}");
        inner.context.settings.set(settings);

        let state = inner.state.get();
        if state == LifecycleState::Destroyed {
            return;
        }
        if !settings.enabled {
            if state.is_running() {
                inner.teardown();
            }
        } else if state == LifecycleState::Idle && settings.auto_start && inner.context.is_video_page() {
            inner.request_init();
        }
    }

    /// Forwards to the active synchronizer; a logged no-op otherwise.
    pub fn toggle(&self) -> impl Future<Output = Result<()>> + use<> {
        let pending = self.inner.synchronizer.borrow().as_ref().map(ModeSynchronizer::toggle);
        async move {
            match pending {
                Some(toggle) => toggle.await,
                None => {
                    log::info!("PiP Manager not running, toggle ignored");
                    Ok(())
                }
            }
        }
    }

    pub fn update_palette(&self, palette: IconPalette) {
        if let Some(synchronizer) = self.inner.synchronizer.borrow().as_ref() {
            synchronizer.update_palette(palette.clone());
        }
        self.inner.palette.replace(palette);
    }

    pub fn status(&self) -> PipStatus {
        let inner = &self.inner;
        PipStatus {
            is_initialized: inner.state.get() == LifecycleState::Active,
            is_pip_active: inner
                .synchronizer
                .borrow()
                .as_ref()
                .is_some_and(ModeSynchronizer::is_active),
            settings: inner.context.settings.get(),
            is_video_page: inner.context.is_video_page(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.state.get()
    }

    pub fn state_signal(&self) -> impl Signal<Item = LifecycleState> + use<> {
        self.inner.state.signal()
    }

    pub fn settings(&self) -> Settings {
        self.inner.context.settings.get()
    }

    pub fn initialization_attempts(&self) -> u32 {
        self.inner.init_attempts.get()
    }

    /// Terminal teardown for when the hosting page goes away.
    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.state.get() == LifecycleState::Destroyed {
            return;
        }
        inner.page_check_debouncer.cancel();
        inner.navigation.take();
        inner.ready_listener.take();
        inner.teardown();
        inner.state.set(LifecycleState::Destroyed);
        log::info!("PiP Manager destroyed");
    }
}

impl Inner {
    fn check_and_init(self: &Rc<Self>) {
        if self.state.get() == LifecycleState::Destroyed {
            return;
        }
        if !self.context.is_video_page() {
            log::info!("Not on a YouTube video page, skipping initialization");
            return;
        }
        let settings = self.context.settings.get();
        if !settings.enabled {
            log::info!("Extension is disabled, skipping initialization");
            return;
        }

        if settings.auto_start {
            self.request_init();
        } else {
            log::info!("Auto start disabled, PiP Manager available but not started");
            self.prepare();
        }
    }

    /// Waits for the player so a manual start finds it rendered.
    fn prepare(self: &Rc<Self>) {
        let page = self.context.page.clone();
        let player = self.context.config.selectors.player.clone();
        let timeout_ms = self.context.config.timing.locate_timeout_ms;

        let task = Task::start_droppable(async move {
            match locate(&*page, &player, timeout_ms).await {
                Ok(_) => log::info!("YouTube player ready, PiP Manager can be manually started"),
                Err(error) => log::error!("Failed to prepare PiP Manager: {error}"),
            }
        });
        self.prepare_task.replace(Some(task));
    }

    fn request_init(&self) {
        if self.state.get() == LifecycleState::Destroyed {
            return;
        }
        self.init_debouncer.trigger();
    }

    /// Debounced entry point of every start trigger.
    fn initialize(self: &Rc<Self>) {
        match self.state.get() {
            LifecycleState::Destroyed => return,
            LifecycleState::Initializing | LifecycleState::Active => {
                log::info!("PiP Manager already initialized");
                return;
            }
            LifecycleState::Idle => {}
        }
        if !self.context.is_video_page() {
            log::info!("Not on a YouTube video page, skipping initialization");
            return;
        }
        if !self.context.settings.get().enabled {
            log::info!("Extension is disabled, skipping initialization");
            return;
        }

        self.init_attempts.set(self.init_attempts.get() + 1);
        self.target_href.replace(Some(self.context.page.address().href));
        self.state.set(LifecycleState::Initializing);
        log::info!("Initializing PiP Manager...");

        let weak = Rc::downgrade(self);
        let page = self.context.page.clone();
        let config = self.context.config.clone();
        let task = Task::start_droppable(async move {
            let outcome = acquire_anchor(&*page, &config).await;
            if let Some(inner) = weak.upgrade() {
                inner.finish_initialization(outcome);
            }
        });
        self.init_task.replace(Some(task));
    }

    fn finish_initialization(&self, outcome: Result<Rc<dyn Element>>) {
        // Our own handle; dropping it here only marks the finishing task aborted
        self.init_task.take();
        if self.state.get() != LifecycleState::Initializing {
            return;
        }

        let outcome = outcome.and_then(|anchor| {
            if !self.context.is_video_page() {
                return Err(PipError::Initialization("left the video page while waiting for the player".to_string()));
            }
            if !self.context.settings.get().enabled {
                return Err(PipError::Initialization("disabled while waiting for the player".to_string()));
            }
            Ok(anchor)
        });

        match outcome {
            Ok(anchor) => {
                let synchronizer = ModeSynchronizer::attach(
                    anchor,
                    self.context.page.clone(),
                    &self.context.config.selectors.media,
                    self.palette.borrow().clone(),
                    self.context.notifier.clone(),
                );
                self.synchronizer.replace(Some(synchronizer));
                self.state.set(LifecycleState::Active);
                log::info!("PiP Manager initialized successfully");
                self.context.notifier.show(MANAGER_TITLE, "Initialized successfully");
            }
            Err(error) => {
                self.target_href.take();
                self.state.set(LifecycleState::Idle);
                log::error!("Failed to initialize PiP Manager: {error}");
                self.context.notifier.show(MANAGER_TITLE, "Failed to initialize");
            }
        }
    }

    /// Debounced reaction to a detected navigation.
    fn check_page(self: &Rc<Self>) {
        let state = self.state.get();
        if state == LifecycleState::Destroyed {
            return;
        }

        if !self.context.is_video_page() {
            if state.is_running() {
                log::info!("Left video page, cleaning up...");
                self.teardown();
            }
            return;
        }

        let href = self.context.page.address().href;
        let started_elsewhere = self
            .target_href
            .borrow()
            .as_ref()
            .is_some_and(|target| *target != href);
        if state.is_running() && started_elsewhere {
            log::info!("Navigated to another video, restarting...");
            self.teardown();
            self.request_init();
            return;
        }

        let settings = self.context.settings.get();
        if state == LifecycleState::Idle && settings.enabled && settings.auto_start {
            log::info!("Navigated to video page, initializing...");
            self.request_init();
        }
    }

    fn teardown(&self) {
        self.init_debouncer.cancel();
        self.init_task.take();
        self.prepare_task.take();
        if let Some(synchronizer) = self.synchronizer.take() {
            synchronizer.destroy();
        }
        self.target_href.take();

        if self.state.get().is_running() {
            self.state.set(LifecycleState::Idle);
            log::info!("Extension cleaned up");
        }
    }
}

async fn acquire_anchor(page: &dyn Page, config: &ContentConfig) -> Result<Rc<dyn Element>> {
    let timeout_ms = config.timing.locate_timeout_ms;
    locate(page, &config.selectors.player, timeout_ms).await?;
    locate(page, &config.selectors.button, timeout_ms).await
}
