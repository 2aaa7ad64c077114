//! Bridge between a calling application layer and the device's native media
//! picker.
//!
//! This crate provides:
//! - The [`PickerBridge`] endpoint answering `pick` calls on a method channel
//! - A one-shot [`SelectionOutcomeCollector`] that turns the picker's
//!   completion callbacks into exactly one [`MethodResponse`]
//! - The collaborator traits a host platform implements (authorization,
//!   UI root, picker surface) and a [`ScriptedPlatform`] that fakes them
//!
//! # Protocol
//!
//! A call names a command; only `"pick"` is supported. The answer is one of:
//!
//! ```text
//! {"status":"success","result":[{"title":"...","artist":"...","album":"...",
//!                                "duration":210.5,"url":"file:///...","artwork":"<base64>"}]}
//! {"status":"error","result":{"code":"no_permission","message":"Apple Music access denied"}}
//! {"status":"not_implemented"}
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tunepick_bridge::{MethodCall, PickerBridge, BridgeSettings, UiThread};
//!
//! let ui = UiThread::spawn("ui-main")?;
//! let bridge = PickerBridge::new(authorizer, ui, roots, BridgeSettings::default());
//! let response = bridge.call(&MethodCall::new(1, "pick")).await?;
//! ```

pub mod artwork;
mod collector;
mod endpoint;
mod executor;
pub mod native;
pub mod platform;
pub mod protocol;
mod response;
pub mod scripted;
mod session;
pub mod strings;

pub use artwork::{ArtworkEncoder, ArtworkError};
pub use collector::{collect_items, SelectionOutcomeCollector};
pub use endpoint::{BridgeSettings, PickerBridge};
pub use executor::{UiExecutor, UiJob, UiThread};
pub use native::{ArtworkSource, EncodedArtwork, NativeMediaItem};
pub use platform::{
    AuthorizationStatus, MediaLibraryAuthorizer, MediaTypes, PickerDelegate, PickerOptions,
    PickerSurface, UiRoot, UiRootResolver,
};
pub use protocol::{
    BridgeCommand, BridgeError, ErrorCode, MethodCall, MethodReply, MethodResponse, CHANNEL_NAME,
};
pub use response::{ReplyError, ResponseCell, ResponseReceiver};
pub use scripted::{PlatformEvent, PlatformLog, Script, ScriptedPlatform, UserAction};
pub use session::{PickerSession, SessionId, SessionRegistry};
pub use strings::LocalizedStrings;
