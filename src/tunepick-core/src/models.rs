use serde::{Deserialize, Serialize};

/// A picked track as delivered to the calling layer.
///
/// Text fields are never absent on the wire: missing native values become an
/// empty string. `artwork` is omitted entirely when no art could be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Playback duration in seconds, exactly as reported by the library.
    pub duration: f64,
    /// Absolute locator of the playable asset.
    pub url: String,
    /// Base64 text of the re-encoded artwork image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
}

/// Logical pixel box that artwork is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkSize {
    pub width: u32,
    pub height: u32,
}

impl ArtworkSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

impl Default for ArtworkSize {
    fn default() -> Self {
        Self::square(300)
    }
}
