// Avatar service - processes an upload and stores it for the current user.
//
// The pipeline never touches storage; this service hands the finished blob
// to the object store, records the public URL on the profile, and drops the
// cached profile.

use super::avatar_codec::{CanvasCodec, ImageCodec};
use super::avatar_models::{AvatarError, EncodedImageBlob, OutputFormat};
use super::avatar_pipeline::AvatarPipeline;
use crate::core::identity::{BackendError, IdentityProvider};
use crate::core::profile::{ProfileCache, ProfileStore, ProfileUpdate};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

pub const DEFAULT_BUCKET: &str = "avatars";

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BackendError>;

    /// Remove objects. Paths that do not exist are ignored.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BackendError> {
        (**self)
            .upload(bucket, path, bytes, content_type, upsert)
            .await
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        (**self).remove(bucket, paths).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        (**self).public_url(bucket, path)
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct AvatarService<I, O, P, C = ImageCodec>
where
    I: IdentityProvider,
    O: ObjectStore,
    P: ProfileStore,
    C: CanvasCodec,
{
    identity: I,
    objects: O,
    profiles: P,
    pipeline: AvatarPipeline<C>,
    cache: Arc<ProfileCache>,
    bucket: String,
}

impl<I, O, P, C> AvatarService<I, O, P, C>
where
    I: IdentityProvider,
    O: ObjectStore,
    P: ProfileStore,
    C: CanvasCodec,
{
    pub fn new(
        identity: I,
        objects: O,
        profiles: P,
        pipeline: AvatarPipeline<C>,
        cache: Arc<ProfileCache>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            objects,
            profiles,
            pipeline,
            cache,
            bucket: bucket.into(),
        }
    }

    pub fn pipeline(&self) -> &AvatarPipeline<C> {
        &self.pipeline
    }

    /// Object path for a user's avatar in the given format.
    pub fn object_path(user_id: &str, format: OutputFormat) -> String {
        format!("{}/avatar.{}", user_id, format.extension())
    }

    /// Public URL of a user's WebP avatar.
    pub fn avatar_url(&self, user_id: &str) -> String {
        self.objects
            .public_url(&self.bucket, &Self::object_path(user_id, OutputFormat::Webp))
    }

    /// Store `blob` as the current user's avatar. Returns its public URL.
    pub async fn upload_avatar(&self, blob: EncodedImageBlob) -> Result<String, AvatarError> {
        let user = self
            .identity
            .current_user()
            .await?
            .ok_or(AvatarError::AuthRequired)?;

        let path = Self::object_path(&user.id, blob.format);

        // Replace rather than rely on upsert alone; a missing object is fine.
        if let Err(e) = self
            .objects
            .remove(&self.bucket, std::slice::from_ref(&path))
            .await
        {
            tracing::warn!("Failed to remove previous avatar {}: {}", path, e);
        }

        let size = blob.size_bytes();
        let content_type = blob.mime_type();
        self.objects
            .upload(&self.bucket, &path, blob.bytes, content_type, true)
            .await
            .map_err(|e| {
                tracing::error!("Avatar upload failed: {}", e);
                AvatarError::Upload(e)
            })?;

        let public_url = self.objects.public_url(&self.bucket, &path);

        // Timestamp query defeats CDN and browser caches for the new image.
        let busted = format!("{}?t={}", public_url, Utc::now().timestamp_millis());
        self.profiles
            .update_profile(&user.id, &ProfileUpdate::avatar_url(Some(busted)))
            .await
            .map_err(|e| {
                tracing::error!("Avatar URL update failed: {}", e);
                AvatarError::ProfileUpdate(e)
            })?;

        self.cache.invalidate().await;
        tracing::info!(user_id = %user.id, path = %path, size, "Avatar uploaded");
        Ok(public_url)
    }

    /// Process a raw upload and store it in one go.
    pub async fn process_and_upload(
        &self,
        bytes: &[u8],
        declared_mime: &str,
        byte_len: u64,
    ) -> Result<String, AvatarError> {
        let blob = self.pipeline.process_image(bytes, declared_mime, byte_len)?;
        self.upload_avatar(blob).await
    }

    /// Remove the current user's avatar in either format and clear the URL.
    pub async fn delete_avatar(&self) -> Result<(), AvatarError> {
        let user = self
            .identity
            .current_user()
            .await?
            .ok_or(AvatarError::AuthRequired)?;

        let paths = [
            Self::object_path(&user.id, OutputFormat::Webp),
            Self::object_path(&user.id, OutputFormat::Jpeg),
        ];
        self.objects.remove(&self.bucket, &paths).await?;

        self.profiles
            .update_profile(&user.id, &ProfileUpdate::avatar_url(None))
            .await
            .map_err(AvatarError::ProfileUpdate)?;

        self.cache.invalidate().await;
        tracing::info!(user_id = %user.id, "Avatar deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::avatar::Quality;
    use crate::core::identity::User;
    use crate::core::profile::Profile;
    use dashmap::DashMap;

    struct FixedIdentity(Option<User>);

    #[async_trait]
    impl IdentityProvider for FixedIdentity {
        async fn current_user(&self) -> Result<Option<User>, BackendError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct MockObjects {
        objects: DashMap<String, (Vec<u8>, String)>,
        reject_uploads: bool,
    }

    #[async_trait]
    impl ObjectStore for MockObjects {
        async fn upload(
            &self,
            bucket: &str,
            path: &str,
            bytes: Vec<u8>,
            content_type: &str,
            _upsert: bool,
        ) -> Result<(), BackendError> {
            if self.reject_uploads {
                return Err(BackendError::Storage("quota exceeded".to_string()));
            }
            self.objects.insert(
                format!("{}/{}", bucket, path),
                (bytes, content_type.to_string()),
            );
            Ok(())
        }

        async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
            for path in paths {
                self.objects.remove(&format!("{}/{}", bucket, path));
            }
            Ok(())
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            format!("https://cdn.test/{}/{}", bucket, path)
        }
    }

    #[derive(Default)]
    struct MockProfiles {
        rows: DashMap<String, Profile>,
    }

    #[async_trait]
    impl ProfileStore for MockProfiles {
        async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
            Ok(self.rows.get(user_id).map(|p| p.clone()))
        }

        async fn create_profile(&self, user_id: &str) -> Result<(), BackendError> {
            self.rows.insert(user_id.to_string(), Profile::new(user_id));
            Ok(())
        }

        async fn update_profile(
            &self,
            user_id: &str,
            update: &ProfileUpdate,
        ) -> Result<Profile, BackendError> {
            let mut row = self.rows.get_mut(user_id).ok_or(BackendError::NotFound)?;
            row.apply(update);
            Ok(row.clone())
        }
    }

    type TestService = AvatarService<FixedIdentity, MockObjects, MockProfiles, ImageCodec>;

    fn service(user: Option<&str>, objects: MockObjects) -> TestService {
        let profiles = MockProfiles::default();
        profiles.rows.insert("u1".to_string(), Profile::new("u1"));
        AvatarService::new(
            FixedIdentity(user.map(User::new)),
            objects,
            profiles,
            AvatarPipeline::new(ImageCodec::jpeg_only()),
            Arc::new(ProfileCache::new()),
            DEFAULT_BUCKET,
        )
    }

    fn blob(format: OutputFormat) -> EncodedImageBlob {
        EncodedImageBlob::new(vec![7; 128], format, Quality::INITIAL)
    }

    #[tokio::test]
    async fn test_upload_stores_blob_and_updates_profile() {
        let service = service(Some("u1"), MockObjects::default());
        service.cache.set(Profile::new("u1")).await;

        let url = service.upload_avatar(blob(OutputFormat::Webp)).await.unwrap();

        assert_eq!(url, "https://cdn.test/avatars/u1/avatar.webp");
        let stored = service.objects.objects.get("avatars/u1/avatar.webp").unwrap();
        assert_eq!(stored.1, "image/webp");
        let row = service.profiles.rows.get("u1").unwrap();
        let avatar_url = row.avatar_url.clone().unwrap();
        assert!(avatar_url.starts_with("https://cdn.test/avatars/u1/avatar.webp?t="));
        assert!(service.cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_jpeg_blob_uses_jpg_path() {
        let service = service(Some("u1"), MockObjects::default());

        let url = service.upload_avatar(blob(OutputFormat::Jpeg)).await.unwrap();

        assert!(url.ends_with("u1/avatar.jpg"));
    }

    #[tokio::test]
    async fn test_upload_requires_auth() {
        let service = service(None, MockObjects::default());

        let result = service.upload_avatar(blob(OutputFormat::Webp)).await;

        assert!(matches!(result, Err(AvatarError::AuthRequired)));
        assert!(service.objects.objects.is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported() {
        let objects = MockObjects {
            reject_uploads: true,
            ..Default::default()
        };
        let service = service(Some("u1"), objects);

        let result = service.upload_avatar(blob(OutputFormat::Webp)).await;

        assert!(matches!(result, Err(AvatarError::Upload(_))));
        assert!(service.profiles.rows.get("u1").unwrap().avatar_url.is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_both_formats() {
        let service = service(Some("u1"), MockObjects::default());
        service.upload_avatar(blob(OutputFormat::Webp)).await.unwrap();
        service.upload_avatar(blob(OutputFormat::Jpeg)).await.unwrap();

        service.delete_avatar().await.unwrap();

        assert!(service.objects.objects.is_empty());
        assert!(service.profiles.rows.get("u1").unwrap().avatar_url.is_none());
    }

    #[tokio::test]
    async fn test_process_and_upload_rejects_non_images() {
        let service = service(Some("u1"), MockObjects::default());

        let result = service
            .process_and_upload(b"hello", "text/plain", 5)
            .await;

        assert!(matches!(result, Err(AvatarError::NotAnImage { .. })));
    }

    #[test]
    fn test_avatar_url_points_at_webp() {
        let service = service(None, MockObjects::default());
        assert_eq!(
            service.avatar_url("abc"),
            "https://cdn.test/avatars/abc/avatar.webp"
        );
    }
}
