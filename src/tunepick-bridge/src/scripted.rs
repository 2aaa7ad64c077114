//! A scripted stand-in for the OS side of the bridge.
//!
//! Every collaborator answers from a fixed [`Script`]: the consent decision,
//! whether a UI root exists, and what the user does once the picker is on
//! screen. The platform records what the bridge asked of it, and on which
//! thread, in a shared [`PlatformLog`].

use crate::endpoint::{BridgeSettings, PickerBridge};
use crate::executor::UiExecutor;
use crate::native::NativeMediaItem;
use crate::platform::{
    AuthorizationStatus, MediaLibraryAuthorizer, PickerDelegate, PickerOptions, PickerSurface,
    UiRoot, UiRootResolver,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// What the simulated user does with a presented picker.
#[derive(Debug, Clone)]
pub enum UserAction {
    Pick(Vec<NativeMediaItem>),
    Cancel,
    /// Leave the picker on screen forever.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct Script {
    pub authorization: AuthorizationStatus,
    pub ui_root: bool,
    pub action: UserAction,
}

impl Script {
    pub fn authorized(action: UserAction) -> Self {
        Self {
            authorization: AuthorizationStatus::Authorized,
            ui_root: true,
            action,
        }
    }

    pub fn denied() -> Self {
        Self {
            authorization: AuthorizationStatus::Denied,
            ui_root: true,
            action: UserAction::Cancel,
        }
    }
}

/// Something the bridge did to the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    RootResolved { found: bool },
    AuthorizationRequested,
    PickerCreated(PickerOptions),
    Presented { animated: bool },
    DelegateInvoked,
    DelegateReleased,
    SurfaceReleased,
    Dismissed { animated: bool },
}

/// Shared record of platform activity.
pub struct PlatformLog {
    ui: Arc<dyn UiExecutor>,
    events: Mutex<Vec<PlatformEvent>>,
    off_ui_thread: Mutex<Vec<PlatformEvent>>,
}

impl PlatformLog {
    fn new(ui: Arc<dyn UiExecutor>) -> Self {
        Self {
            ui,
            events: Mutex::new(Vec::new()),
            off_ui_thread: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, event: PlatformEvent) {
        lock(&self.events).push(event.clone());
        tracing::trace!(?event, "platform event");
    }

    /// Record a UI operation, noting it if it ran off the UI thread.
    fn record_ui(&self, event: PlatformEvent) {
        if !self.ui.is_ui_thread() {
            tracing::error!(?event, "UI operation outside the UI thread");
            lock(&self.off_ui_thread).push(event.clone());
        }
        self.record(event);
    }

    pub fn events(&self) -> Vec<PlatformEvent> {
        lock(&self.events).clone()
    }

    pub fn count(&self, matches: impl Fn(&PlatformEvent) -> bool) -> usize {
        lock(&self.events).iter().filter(|e| matches(e)).count()
    }

    pub fn authorization_requests(&self) -> usize {
        self.count(|e| matches!(e, PlatformEvent::AuthorizationRequested))
    }

    pub fn presentations(&self) -> usize {
        self.count(|e| matches!(e, PlatformEvent::Presented { .. }))
    }

    pub fn dismissals(&self) -> usize {
        self.count(|e| matches!(e, PlatformEvent::Dismissed { .. }))
    }

    /// UI operations that were performed from the wrong thread.
    pub fn off_ui_thread(&self) -> Vec<PlatformEvent> {
        lock(&self.off_ui_thread).clone()
    }
}

impl fmt::Debug for PlatformLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformLog")
            .field("events", &*lock(&self.events))
            .finish()
    }
}

pub struct ScriptedAuthorizer {
    status: Mutex<AuthorizationStatus>,
    log: Arc<PlatformLog>,
}

#[async_trait]
impl MediaLibraryAuthorizer for ScriptedAuthorizer {
    async fn request_authorization(&self) -> AuthorizationStatus {
        self.log.record(PlatformEvent::AuthorizationRequested);
        *lock(&self.status)
    }
}

pub struct ScriptedSurface {
    log: Arc<PlatformLog>,
    delegate: Mutex<Option<Weak<dyn PickerDelegate>>>,
}

impl ScriptedSurface {
    /// Simulate the user finishing with the picker.
    fn complete(&self, action: UserAction) {
        let delegate = lock(&self.delegate).as_ref().and_then(Weak::upgrade);
        let Some(delegate) = delegate else {
            self.log.record(PlatformEvent::DelegateReleased);
            tracing::warn!("picker delegate was released before the user finished");
            return;
        };
        match action {
            UserAction::Pick(items) => {
                self.log.record_ui(PlatformEvent::DelegateInvoked);
                delegate.did_pick_items(self, items);
            }
            UserAction::Cancel => {
                self.log.record_ui(PlatformEvent::DelegateInvoked);
                delegate.did_cancel(self);
            }
            UserAction::Ignore => {}
        }
    }
}

impl PickerSurface for ScriptedSurface {
    fn set_delegate(&self, delegate: Weak<dyn PickerDelegate>) {
        *lock(&self.delegate) = Some(delegate);
    }

    fn dismiss(&self, animated: bool) {
        self.log.record_ui(PlatformEvent::Dismissed { animated });
    }
}

pub struct ScriptedRoot {
    ui: Arc<dyn UiExecutor>,
    log: Arc<PlatformLog>,
    action: Mutex<UserAction>,
    created: Mutex<Vec<Weak<ScriptedSurface>>>,
}

impl ScriptedRoot {
    /// Find the scripted surface behind a presented trait object.
    fn created_surface(&self, surface: &Arc<dyn PickerSurface>) -> Option<Weak<ScriptedSurface>> {
        let wanted = Arc::as_ptr(surface) as *const ();
        let mut created = lock(&self.created);
        created.retain(|weak| weak.strong_count() > 0);
        created
            .iter()
            .find(|weak| weak.as_ptr() as *const () == wanted)
            .cloned()
    }
}

impl UiRoot for ScriptedRoot {
    fn create_picker(&self, options: &PickerOptions) -> Arc<dyn PickerSurface> {
        self.log
            .record_ui(PlatformEvent::PickerCreated(options.clone()));
        let surface = Arc::new(ScriptedSurface {
            log: Arc::clone(&self.log),
            delegate: Mutex::new(None),
        });
        lock(&self.created).push(Arc::downgrade(&surface));
        surface
    }

    fn present(&self, surface: Arc<dyn PickerSurface>, animated: bool) {
        self.log.record_ui(PlatformEvent::Presented { animated });
        let Some(scripted) = self.created_surface(&surface) else {
            tracing::error!("asked to present a surface this root did not create");
            return;
        };
        drop(surface);

        // The user acts on a later turn of the UI loop, never inside present.
        let action = lock(&self.action).clone();
        let log = Arc::clone(&self.log);
        self.ui.dispatch(Box::new(move || match scripted.upgrade() {
            Some(surface) => surface.complete(action),
            None => log.record(PlatformEvent::SurfaceReleased),
        }));
    }
}

pub struct ScriptedResolver {
    root: Option<Arc<ScriptedRoot>>,
    log: Arc<PlatformLog>,
}

impl UiRootResolver for ScriptedResolver {
    fn resolve(&self) -> Option<Arc<dyn UiRoot>> {
        self.log.record_ui(PlatformEvent::RootResolved {
            found: self.root.is_some(),
        });
        self.root.clone().map(|root| root as Arc<dyn UiRoot>)
    }
}

/// All scripted collaborators wired to one UI executor and log.
pub struct ScriptedPlatform {
    pub authorizer: Arc<ScriptedAuthorizer>,
    pub resolver: Arc<ScriptedResolver>,
    pub log: Arc<PlatformLog>,
}

impl ScriptedPlatform {
    pub fn new(script: Script, ui: Arc<dyn UiExecutor>) -> Self {
        let log = Arc::new(PlatformLog::new(Arc::clone(&ui)));
        let root = script.ui_root.then(|| {
            Arc::new(ScriptedRoot {
                ui,
                log: Arc::clone(&log),
                action: Mutex::new(script.action),
                created: Mutex::new(Vec::new()),
            })
        });
        Self {
            authorizer: Arc::new(ScriptedAuthorizer {
                status: Mutex::new(script.authorization),
                log: Arc::clone(&log),
            }),
            resolver: Arc::new(ScriptedResolver {
                root,
                log: Arc::clone(&log),
            }),
            log,
        }
    }

    /// A bridge driving these collaborators.
    pub fn bridge(&self, ui: Arc<dyn UiExecutor>, settings: BridgeSettings) -> PickerBridge {
        PickerBridge::new(
            Arc::clone(&self.authorizer) as Arc<dyn MediaLibraryAuthorizer>,
            ui,
            Arc::clone(&self.resolver) as Arc<dyn UiRootResolver>,
            settings,
        )
    }

    /// Change the consent decision for later requests.
    pub fn set_authorization(&self, status: AuthorizationStatus) {
        *lock(&self.authorizer.status) = status;
    }

    /// Change what the user does with the next presented picker.
    pub fn set_action(&self, action: UserAction) {
        if let Some(root) = &self.resolver.root {
            *lock(&root.action) = action;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
