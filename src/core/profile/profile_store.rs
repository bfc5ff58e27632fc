use super::profile_models::{Profile, ProfileUpdate};
use crate::core::identity::BackendError;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError>;

    /// Create the bare row for a new account. `Conflict` when it already exists.
    async fn create_profile(&self, user_id: &str) -> Result<(), BackendError>;

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, BackendError>;
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        (**self).get_profile(user_id).await
    }

    async fn create_profile(&self, user_id: &str) -> Result<(), BackendError> {
        (**self).create_profile(user_id).await
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        (**self).update_profile(user_id, update).await
    }
}
