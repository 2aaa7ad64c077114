//! One-shot observer of a presented picker.
//!
//! The collector owns the response cell for its session. Whichever of the
//! two delegate callbacks fires first answers the caller, then the surface
//! is dismissed and the session released.

use crate::artwork::ArtworkEncoder;
use crate::native::NativeMediaItem;
use crate::platform::{PickerDelegate, PickerSurface};
use crate::protocol::MethodResponse;
use crate::response::ResponseCell;
use crate::session::{SessionId, SessionRegistry};
use std::sync::Weak;
use tunepick_core::models::MediaItem;

pub struct SelectionOutcomeCollector {
    session: SessionId,
    response: ResponseCell,
    artwork: ArtworkEncoder,
    registry: Weak<SessionRegistry>,
}

impl SelectionOutcomeCollector {
    pub fn new(
        session: SessionId,
        response: ResponseCell,
        artwork: ArtworkEncoder,
        registry: Weak<SessionRegistry>,
    ) -> Self {
        Self {
            session,
            response,
            artwork,
            registry,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn is_finished(&self) -> bool {
        self.response.is_fulfilled()
    }

    /// The picker only answers once; a callback after that is dropped
    /// before any item mapping or artwork rendering happens.
    fn ignore_late_callback(&self, callback: &'static str) -> bool {
        if !self.is_finished() {
            return false;
        }
        tracing::warn!(
            session = %self.session,
            callback,
            "ignoring callback after the session finished"
        );
        true
    }

    fn finish(&self, surface: &dyn PickerSurface, response: MethodResponse) {
        if !self.response.fulfill(response) {
            return;
        }
        surface.dismiss(true);
        if let Some(registry) = self.registry.upgrade() {
            registry.release(self.session);
        }
    }
}

impl PickerDelegate for SelectionOutcomeCollector {
    fn did_pick_items(&self, surface: &dyn PickerSurface, items: Vec<NativeMediaItem>) {
        if self.ignore_late_callback("did_pick_items") {
            return;
        }
        let picked = collect_items(&items, &self.artwork);
        tracing::info!(
            session = %self.session,
            selected = items.len(),
            returned = picked.len(),
            "picker returned items"
        );
        self.finish(surface, MethodResponse::Success(picked));
    }

    fn did_cancel(&self, surface: &dyn PickerSurface) {
        if self.ignore_late_callback("did_cancel") {
            return;
        }
        tracing::info!(session = %self.session, "picker cancelled");
        self.finish(surface, MethodResponse::Success(Vec::new()));
    }
}

/// Map native items to transport records, keeping library order and
/// dropping items that have no local asset.
pub fn collect_items(items: &[NativeMediaItem], artwork: &ArtworkEncoder) -> Vec<MediaItem> {
    items
        .iter()
        .filter_map(|item| to_media_item(item, artwork))
        .collect()
}

fn to_media_item(item: &NativeMediaItem, artwork: &ArtworkEncoder) -> Option<MediaItem> {
    let Some(url) = item.asset_url.as_ref() else {
        tracing::debug!(
            title = item.title.as_deref().unwrap_or_default(),
            "skipping item without a local asset"
        );
        return None;
    };
    Some(MediaItem {
        title: item.title.clone().unwrap_or_default(),
        artist: item.artist.clone().unwrap_or_default(),
        album: item.album_title.clone().unwrap_or_default(),
        duration: item.playback_duration,
        url: url.clone(),
        artwork: item
            .artwork
            .as_deref()
            .and_then(|source| artwork.try_encode(source)),
    })
}
