//! Scripted device fixtures.
//!
//! A fixture describes what the simulated OS and user do:
//!
//! ```json
//! {
//!   "authorization": "authorized",
//!   "ui_root": true,
//!   "action": {"pick": [
//!     {"title": "Song A", "artist": "X", "album": "Y", "duration": 210.5,
//!      "url": "file:///a.m4a", "artwork": "covers/a.jpg"},
//!     {"title": "Song B"}
//!   ]}
//! }
//! ```
//!
//! `action` may also be `"cancel"` or `"ignore"`. Artwork paths are relative
//! to the fixture file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tunepick_bridge::{AuthorizationStatus, EncodedArtwork, NativeMediaItem, Script, UserAction};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse fixture {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to read artwork {path}: {source}")]
    Artwork {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default = "default_authorization")]
    authorization: AuthorizationStatus,
    #[serde(default = "default_ui_root")]
    ui_root: bool,
    action: FixtureAction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FixtureAction {
    Pick(Vec<FixtureItem>),
    Cancel,
    Ignore,
}

#[derive(Debug, Deserialize)]
struct FixtureItem {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    #[serde(default)]
    duration: f64,
    /// Absent for stream-only tracks.
    url: Option<String>,
    artwork: Option<PathBuf>,
}

fn default_authorization() -> AuthorizationStatus {
    AuthorizationStatus::Authorized
}

fn default_ui_root() -> bool {
    true
}

pub fn load_script(path: &Path) -> Result<Script, FixtureError> {
    let contents = fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let fixture: Fixture =
        serde_json::from_str(&contents).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let action = match fixture.action {
        FixtureAction::Pick(items) => UserAction::Pick(
            items
                .into_iter()
                .map(|item| item.into_native(base))
                .collect::<Result<_, _>>()?,
        ),
        FixtureAction::Cancel => UserAction::Cancel,
        FixtureAction::Ignore => UserAction::Ignore,
    };

    Ok(Script {
        authorization: fixture.authorization,
        ui_root: fixture.ui_root,
        action,
    })
}

impl FixtureItem {
    fn into_native(self, base: &Path) -> Result<NativeMediaItem, FixtureError> {
        let artwork = match self.artwork {
            Some(relative) => {
                let path = base.join(relative);
                let bytes = fs::read(&path).map_err(|source| FixtureError::Artwork {
                    path: path.clone(),
                    source,
                })?;
                Some(EncodedArtwork::new(bytes))
            }
            None => None,
        };

        let mut item = NativeMediaItem {
            title: self.title,
            artist: self.artist,
            album_title: self.album,
            playback_duration: self.duration,
            asset_url: self.url,
            artwork: None,
        };
        if let Some(artwork) = artwork {
            item = item.with_artwork(artwork);
        }
        Ok(item)
    }
}
