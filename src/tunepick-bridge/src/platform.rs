//! Contracts the host platform implements for the bridge.
//!
//! The authorization subsystem and the picker UI belong to the operating
//! environment. The bridge only drives them through these traits.

use crate::native::NativeMediaItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

/// Media library consent as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
}

impl AuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// OS consent prompt for media library access.
#[async_trait]
pub trait MediaLibraryAuthorizer: Send + Sync {
    /// Ask for access. May wait indefinitely for the user; there is no
    /// timeout.
    async fn request_authorization(&self) -> AuthorizationStatus;
}

/// Media domain the picker is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaTypes {
    Music,
}

/// How the picker surface is configured before presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOptions {
    pub media_types: MediaTypes,
    pub allows_multiple: bool,
    pub prompt: String,
}

/// Completion protocol of the picker surface. Called on the UI thread.
pub trait PickerDelegate: Send + Sync {
    fn did_pick_items(&self, surface: &dyn PickerSurface, items: Vec<NativeMediaItem>);

    fn did_cancel(&self, surface: &dyn PickerSurface);
}

/// A native modal picker.
pub trait PickerSurface: Send + Sync {
    /// Attach the completion delegate. The surface does not own it.
    fn set_delegate(&self, delegate: Weak<dyn PickerDelegate>);

    fn dismiss(&self, animated: bool);
}

/// The UI-owning controller that pickers are presented on.
pub trait UiRoot: Send + Sync {
    fn create_picker(&self, options: &PickerOptions) -> Arc<dyn PickerSurface>;

    fn present(&self, surface: Arc<dyn PickerSurface>, animated: bool);
}

/// Finds the current UI root, if the host has one.
pub trait UiRootResolver: Send + Sync {
    fn resolve(&self) -> Option<Arc<dyn UiRoot>>;
}
