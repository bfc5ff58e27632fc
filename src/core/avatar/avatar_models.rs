// Avatar domain models - encoded blobs, quality steps, and pipeline errors.

use crate::core::identity::BackendError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

/// Largest upload accepted before decoding: 5 MiB.
pub const MAX_INPUT_BYTES: u64 = 5 * 1024 * 1024;
/// Edge length of the square output canvas.
pub const OUTPUT_SIZE: u32 = 200;
/// Soft ceiling for the encoded avatar: 50 KiB.
pub const MAX_OUTPUT_BYTES: usize = 50 * 1024;

/// Lossy output formats the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Webp,
    Jpeg,
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// File extension used for the stored object.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Lossy encoder quality in whole percent.
///
/// Kept as an integer so stepping 0.7 → 0.3 in tenths lands exactly on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const INITIAL: Quality = Quality(70);
    pub const FLOOR: Quality = Quality(30);
    const STEP: u8 = 10;

    pub fn from_percent(percent: u8) -> Self {
        Quality(percent.min(100))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    /// Quality as a 0.0–1.0 factor.
    pub fn as_factor(&self) -> f32 {
        f32::from(self.0) / 100.0
    }

    /// One step lower, never below the floor.
    pub fn step_down(self) -> Quality {
        Quality(self.0.saturating_sub(Self::STEP).max(Self::FLOOR.0))
    }
}

/// Output of the pipeline. Ownership passes to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImageBlob {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub quality: Quality,
}

impl EncodedImageBlob {
    pub fn new(bytes: Vec<u8>, format: OutputFormat, quality: Quality) -> Self {
        Self {
            bytes,
            format,
            quality,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn within_budget(&self) -> bool {
        self.size_bytes() <= MAX_OUTPUT_BYTES
    }
}

/// A `data:` URL for showing a processed avatar before upload.
///
/// Display only: it is not serializable and must not be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn from_blob(blob: &EncodedImageBlob) -> Self {
        PreviewUrl(format!(
            "data:{};base64,{}",
            blob.mime_type(),
            BASE64.encode(&blob.bytes)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("画像サイズが大きすぎます（5MB以下にしてください）")]
    InputTooLarge { size: u64, max: u64 },

    #[error("画像ファイルを選択してください")]
    NotAnImage { mime: String },

    #[error("画像の読み込みに失敗しました")]
    Decode(String),

    #[error("画像の変換に失敗しました")]
    Encode,

    #[error("ログインが必要です")]
    AuthRequired,

    #[error("アイコンのアップロードに失敗しました")]
    Upload(#[source] BackendError),

    #[error("プロフィールの更新に失敗しました")]
    ProfileUpdate(#[source] BackendError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
