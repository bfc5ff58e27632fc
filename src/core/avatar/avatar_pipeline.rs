// Avatar image pipeline - arbitrary upload in, bounded square thumbnail out.
//
// Steps:
// 1. Reject oversized input, then non-image MIME types (no decode attempted)
// 2. Decode and crop the centered square of side min(W, H)
// 3. Resample to 200x200 with a bicubic filter
// 4. Encode WebP at 0.7, falling back to JPEG when WebP is unavailable
// 5. Step quality down by 0.1 while over 50 KiB and above 0.3
//
// The size budget is best effort: at the quality floor the blob is returned
// even if it is still too large.

use super::avatar_codec::{CanvasCodec, ImageCodec};
use super::avatar_models::{
    AvatarError, EncodedImageBlob, OutputFormat, PreviewUrl, Quality, MAX_INPUT_BYTES,
    MAX_OUTPUT_BYTES, OUTPUT_SIZE,
};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

pub struct AvatarPipeline<C: CanvasCodec = ImageCodec> {
    codec: C,
}

impl AvatarPipeline<ImageCodec> {
    /// Pipeline with the default codec.
    pub fn with_default_codec() -> Self {
        Self::new(ImageCodec::new())
    }
}

impl<C: CanvasCodec> AvatarPipeline<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Turn an uploaded file into a 200x200 avatar blob.
    ///
    /// `byte_len` is the size the caller declared for the upload; it is
    /// checked before anything else.
    pub fn process_image(
        &self,
        bytes: &[u8],
        declared_mime: &str,
        byte_len: u64,
    ) -> Result<EncodedImageBlob, AvatarError> {
        if byte_len > MAX_INPUT_BYTES {
            return Err(AvatarError::InputTooLarge {
                size: byte_len,
                max: MAX_INPUT_BYTES,
            });
        }

        if !declared_mime.starts_with("image/") {
            return Err(AvatarError::NotAnImage {
                mime: declared_mime.to_string(),
            });
        }

        let source =
            image::load_from_memory(bytes).map_err(|e| AvatarError::Decode(e.to_string()))?;
        if source.width() == 0 || source.height() == 0 {
            return Err(AvatarError::Decode("image has no pixels".to_string()));
        }

        let canvas = normalize(&source);
        self.process_cropped_canvas(&canvas)
    }

    /// Encode an already-cropped canvas (e.g. from an interactive cropper).
    /// No decode, crop or resize happens here.
    pub fn process_cropped_canvas(
        &self,
        canvas: &RgbaImage,
    ) -> Result<EncodedImageBlob, AvatarError> {
        let mut quality = Quality::INITIAL;

        let (format, first) = match self.encode_as(canvas, OutputFormat::Webp, quality) {
            Some(blob) => (OutputFormat::Webp, Some(blob)),
            None => {
                tracing::warn!("WebP unavailable, falling back to JPEG");
                (
                    OutputFormat::Jpeg,
                    self.encode_as(canvas, OutputFormat::Jpeg, quality),
                )
            }
        };
        let mut blob = first.ok_or(AvatarError::Encode)?;

        while blob.size_bytes() > MAX_OUTPUT_BYTES && quality > Quality::FLOOR {
            quality = quality.step_down();
            match self.encode_as(canvas, format, quality) {
                Some(next) => {
                    tracing::debug!(
                        quality = quality.percent(),
                        size = next.size_bytes(),
                        "Re-encoded avatar"
                    );
                    blob = next;
                }
                None => {
                    tracing::warn!(
                        quality = quality.percent(),
                        "Re-encode failed, keeping previous blob"
                    );
                    break;
                }
            }
        }

        if !blob.within_budget() {
            tracing::warn!(
                size = blob.size_bytes(),
                "Avatar still over size budget"
            );
        }

        Ok(blob)
    }

    /// Process an upload and wrap the result as a display-only `data:` URL.
    pub fn create_preview(
        &self,
        bytes: &[u8],
        declared_mime: &str,
        byte_len: u64,
    ) -> Result<PreviewUrl, AvatarError> {
        let blob = self.process_image(bytes, declared_mime, byte_len)?;
        Ok(PreviewUrl::from_blob(&blob))
    }

    /// Ask the codec for `format`; a substituted format or empty blob counts
    /// as unavailable.
    fn encode_as(
        &self,
        canvas: &RgbaImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Option<EncodedImageBlob> {
        self.codec
            .encode(canvas, format, quality)
            .filter(|blob| blob.format == format && !blob.bytes.is_empty())
    }
}

/// The centered square of an image: `(x, y, side)`.
pub fn center_square(width: u32, height: u32) -> (u32, u32, u32) {
    let size = width.min(height);
    ((width - size) / 2, (height - size) / 2, size)
}

/// Crop the centered square and resample it to the output canvas.
pub fn normalize(source: &DynamicImage) -> RgbaImage {
    let (x, y, size) = center_square(source.width(), source.height());
    source
        .crop_imm(x, y, size, size)
        .resize_exact(OUTPUT_SIZE, OUTPUT_SIZE, FilterType::CatmullRom)
        .to_rgba8()
}
