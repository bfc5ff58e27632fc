// Avatar module - image normalization plus the upload glue around it.

pub mod avatar_codec;
pub mod avatar_models;
pub mod avatar_pipeline;
pub mod avatar_service;

pub use avatar_codec::{CanvasCodec, ImageCodec};
pub use avatar_models::*;
pub use avatar_pipeline::AvatarPipeline;
pub use avatar_service::{AvatarService, ObjectStore};
