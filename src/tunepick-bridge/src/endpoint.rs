//! The method channel endpoint.
//!
//! `pick` runs as: resolve the UI root on the UI thread → authorization
//! (awaited on the runtime) → hop back to the UI thread → create and present
//! the picker with a fresh collector → the collector answers. Unsupported
//! commands are answered before anything else happens, and a missing UI
//! root is settled before consent is requested, so neither can trigger a
//! consent prompt.

use crate::artwork::ArtworkEncoder;
use crate::collector::SelectionOutcomeCollector;
use crate::executor::UiExecutor;
use crate::platform::{
    MediaLibraryAuthorizer, MediaTypes, PickerDelegate, PickerOptions, UiRoot, UiRootResolver,
};
use crate::protocol::{BridgeCommand, BridgeError, MethodCall, MethodResponse, CHANNEL_NAME};
use crate::response::{ReplyError, ResponseCell, ResponseReceiver};
use crate::session::{PickerSession, SessionId, SessionRegistry};
use crate::strings::LocalizedStrings;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use tunepick_core::config::{NoUiHostPolicy, PickerConfig};
use tunepick_core::models::ArtworkSize;

/// Behavior knobs of the bridge, usually built from [`PickerConfig`].
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub channel: String,
    pub strings: LocalizedStrings,
    pub allows_multiple: bool,
    pub artwork_size: ArtworkSize,
    pub no_ui_host: NoUiHostPolicy,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            channel: CHANNEL_NAME.to_string(),
            strings: LocalizedStrings::default(),
            allows_multiple: true,
            artwork_size: ArtworkSize::default(),
            no_ui_host: NoUiHostPolicy::default(),
        }
    }
}

impl BridgeSettings {
    pub fn from_config(config: &PickerConfig) -> Self {
        Self {
            channel: config.channel.clone(),
            strings: LocalizedStrings::from_config(config),
            allows_multiple: config.allows_multiple,
            artwork_size: config.artwork_size(),
            no_ui_host: config.no_ui_host,
        }
    }

    fn picker_options(&self) -> PickerOptions {
        PickerOptions {
            media_types: MediaTypes::Music,
            allows_multiple: self.allows_multiple,
            prompt: self.strings.prompt.clone(),
        }
    }
}

/// Answers method calls on the picker channel.
#[derive(Clone)]
pub struct PickerBridge {
    inner: Arc<Inner>,
}

struct Inner {
    authorizer: Arc<dyn MediaLibraryAuthorizer>,
    ui: Arc<dyn UiExecutor>,
    roots: Arc<dyn UiRootResolver>,
    settings: BridgeSettings,
    sessions: Arc<SessionRegistry>,
    next_session: AtomicU64,
}

impl PickerBridge {
    pub fn new(
        authorizer: Arc<dyn MediaLibraryAuthorizer>,
        ui: Arc<dyn UiExecutor>,
        roots: Arc<dyn UiRootResolver>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                authorizer,
                ui,
                roots,
                settings,
                sessions: Arc::new(SessionRegistry::new()),
                next_session: AtomicU64::new(1),
            }),
        }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.inner.settings
    }

    /// Pickers currently on screen.
    pub fn active_sessions(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Start handling `call` and return the receiver for its single answer.
    ///
    /// # Panics
    ///
    /// `pick` spawns onto the current Tokio runtime and panics outside one.
    pub fn handle(&self, call: &MethodCall) -> ResponseReceiver {
        let (cell, rx) = ResponseCell::new();
        let Some(command) = BridgeCommand::parse(&call.method) else {
            debug!(method = %call.method, "method not implemented");
            cell.fulfill(MethodResponse::NotImplemented);
            return rx;
        };

        debug!(command = %command, id = call.id, "handling method call");
        match command {
            BridgeCommand::Pick => self.pick(cell),
        }
        rx
    }

    /// `handle` and wait for the answer.
    pub async fn call(&self, call: &MethodCall) -> Result<MethodResponse, ReplyError> {
        self.handle(call).recv().await
    }

    fn pick(&self, cell: ResponseCell) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let Some(root) = inner.resolve_root().await else {
                inner.report_missing_root(cell);
                return;
            };

            let status = inner.authorizer.request_authorization().await;
            if !status.is_authorized() {
                info!(?status, "media library access refused");
                cell.fulfill(MethodResponse::Error(BridgeError::no_permission(
                    inner.settings.strings.access_denied.clone(),
                )));
                return;
            }

            let on_ui = Arc::clone(&inner);
            inner
                .ui
                .dispatch(Box::new(move || on_ui.present_picker(root, cell)));
        });
    }
}

impl Inner {
    /// Look up the UI root from the UI thread. A UI thread that has gone
    /// away counts as no root.
    async fn resolve_root(&self) -> Option<Arc<dyn UiRoot>> {
        let (tx, rx) = oneshot::channel();
        let roots = Arc::clone(&self.roots);
        self.ui.dispatch(Box::new(move || {
            let _ = tx.send(roots.resolve());
        }));
        rx.await.ok().flatten()
    }

    /// Runs on the UI thread.
    fn present_picker(&self, root: Arc<dyn UiRoot>, cell: ResponseCell) {
        debug_assert!(self.ui.is_ui_thread(), "picker presented off the UI thread");

        let surface = root.create_picker(&self.settings.picker_options());
        let session = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        let collector = Arc::new(SelectionOutcomeCollector::new(
            session,
            cell,
            ArtworkEncoder::new(self.settings.artwork_size),
            Arc::downgrade(&self.sessions),
        ));
        let delegate: Arc<dyn PickerDelegate> = collector.clone();
        surface.set_delegate(Arc::downgrade(&delegate));
        self.sessions.insert(
            session,
            PickerSession {
                surface: Arc::clone(&surface),
                collector,
            },
        );

        info!(session = %session, "presenting media picker");
        root.present(surface, true);
    }

    fn report_missing_root(&self, cell: ResponseCell) {
        match self.settings.no_ui_host {
            NoUiHostPolicy::Error => {
                warn!("no UI root available, rejecting pick before requesting consent");
                cell.fulfill(MethodResponse::Error(BridgeError::no_ui_host(
                    self.settings.strings.no_ui_host.clone(),
                )));
            }
            NoUiHostPolicy::Silent => {
                warn!("no UI root available, dropping pick without a response");
                drop(cell);
            }
        }
    }
}
