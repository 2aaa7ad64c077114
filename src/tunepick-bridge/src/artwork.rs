//! Artwork rendering and transport encoding.

use crate::native::ArtworkSource;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::ImageFormat;
use std::io::Cursor;
use thiserror::Error;
use tunepick_core::models::ArtworkSize;

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("artwork could not be rendered at {width}x{height}")]
    NotRenderable { width: u32, height: u32 },
    #[error("failed to encode artwork: {0}")]
    Encode(#[from] image::ImageError),
}

/// Renders artwork at a fixed size and turns it into base64 text.
#[derive(Debug, Clone, Copy)]
pub struct ArtworkEncoder {
    size: ArtworkSize,
    format: ImageFormat,
}

impl Default for ArtworkEncoder {
    fn default() -> Self {
        Self::new(ArtworkSize::default())
    }
}

impl ArtworkEncoder {
    pub fn new(size: ArtworkSize) -> Self {
        Self {
            size,
            format: ImageFormat::Png,
        }
    }

    pub fn size(&self) -> ArtworkSize {
        self.size
    }

    /// Render, re-encode and base64 the artwork.
    pub fn encode(&self, source: &dyn ArtworkSource) -> Result<String, ArtworkError> {
        let image = source
            .image_at(self.size)
            .ok_or(ArtworkError::NotRenderable {
                width: self.size.width,
                height: self.size.height,
            })?;
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), self.format)?;
        Ok(BASE64_STANDARD.encode(buf))
    }

    /// Like [`encode`](Self::encode), but a failure just means "no artwork".
    pub fn try_encode(&self, source: &dyn ArtworkSource) -> Option<String> {
        match self.encode(source) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::debug!(error = %err, "omitting artwork");
                None
            }
        }
    }
}
