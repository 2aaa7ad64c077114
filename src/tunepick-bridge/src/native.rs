//! Items as the native media library hands them over.

use image::imageops::FilterType;
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;
use tunepick_core::models::ArtworkSize;

/// Artwork attached to a library item that can be rendered on request.
pub trait ArtworkSource: fmt::Debug + Send + Sync {
    /// Render the art to fit within `size`. `None` when nothing renderable
    /// is available.
    fn image_at(&self, size: ArtworkSize) -> Option<DynamicImage>;
}

/// One item from the native picker's selection.
#[derive(Debug, Clone, Default)]
pub struct NativeMediaItem {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_title: Option<String>,
    /// Seconds.
    pub playback_duration: f64,
    /// Locator of the local asset. Cloud-only and stream-only tracks have none.
    pub asset_url: Option<String>,
    pub artwork: Option<Arc<dyn ArtworkSource>>,
}

impl NativeMediaItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album_title = Some(album.into());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.playback_duration = seconds;
        self
    }

    pub fn with_asset_url(mut self, url: impl Into<String>) -> Self {
        self.asset_url = Some(url.into());
        self
    }

    pub fn with_artwork(mut self, artwork: impl ArtworkSource + 'static) -> Self {
        self.artwork = Some(Arc::new(artwork));
        self
    }
}

/// Artwork backed by encoded image bytes (JPEG, PNG).
#[derive(Clone)]
pub struct EncodedArtwork {
    bytes: Arc<[u8]>,
}

impl EncodedArtwork {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            bytes: Arc::from(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for EncodedArtwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedArtwork")
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ArtworkSource for EncodedArtwork {
    fn image_at(&self, size: ArtworkSize) -> Option<DynamicImage> {
        if size.width == 0 || size.height == 0 {
            return None;
        }
        let image = match image::load_from_memory(&self.bytes) {
            Ok(image) => image,
            Err(err) => {
                tracing::debug!(error = %err, "artwork bytes are not a decodable image");
                return None;
            }
        };
        if image.width() == size.width && image.height() == size.height {
            return Some(image);
        }
        Some(image.resize(size.width, size.height, FilterType::Triangle))
    }
}
