// Encoders for the normalized avatar canvas.
//
// `CanvasCodec` is the injected capability: the pipeline asks for a format
// and treats "no blob" or "a different format" as that format being
// unavailable, then falls back to JPEG.

use super::avatar_models::{EncodedImageBlob, OutputFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

pub trait CanvasCodec: Send + Sync {
    /// Encode `canvas` as `format` at `quality`. `None` when the format is
    /// unsupported or encoding failed.
    fn encode(
        &self,
        canvas: &RgbaImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Option<EncodedImageBlob>;
}

/// Default codec: lossy WebP through libwebp (when built with the `webp`
/// feature) and baseline JPEG through `image`.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    webp: bool,
}

impl ImageCodec {
    pub fn new() -> Self {
        Self {
            webp: cfg!(feature = "webp"),
        }
    }

    /// A codec without a lossy WebP encoder; every avatar comes out as JPEG.
    pub fn jpeg_only() -> Self {
        Self { webp: false }
    }

    pub fn supports_webp(&self) -> bool {
        self.webp
    }

    #[cfg(feature = "webp")]
    fn encode_webp(&self, canvas: &RgbaImage, quality: Quality) -> Option<Vec<u8>> {
        if !self.webp {
            return None;
        }

        let encoder = webp::Encoder::from_rgba(canvas.as_raw(), canvas.width(), canvas.height());
        match encoder.encode_simple(false, f32::from(quality.percent())) {
            Ok(memory) => Some(memory.to_vec()),
            Err(e) => {
                tracing::warn!("WebP encoding failed: {:?}", e);
                None
            }
        }
    }

    #[cfg(not(feature = "webp"))]
    fn encode_webp(&self, _canvas: &RgbaImage, _quality: Quality) -> Option<Vec<u8>> {
        None
    }

    fn encode_jpeg(&self, canvas: &RgbaImage, quality: Quality) -> Option<Vec<u8>> {
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgba8(canvas.clone()).into_rgb8();

        let mut bytes = Vec::new();
        let result = {
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.percent());
            encoder.encode_image(&rgb)
        };

        match result {
            Ok(()) => Some(bytes),
            Err(e) => {
                tracing::warn!("JPEG encoding failed: {}", e);
                None
            }
        }
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasCodec for ImageCodec {
    fn encode(
        &self,
        canvas: &RgbaImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Option<EncodedImageBlob> {
        let bytes = match format {
            OutputFormat::Webp => self.encode_webp(canvas, quality)?,
            OutputFormat::Jpeg => self.encode_jpeg(canvas, quality)?,
        };

        if bytes.is_empty() {
            return None;
        }

        Some(EncodedImageBlob::new(bytes, format, quality))
    }
}
