// Profile service - reads and edits the signed-in user's `users` row.
//
// The cache is explicit: every mutating call invalidates it, and
// `on_identity_changed` is the hook for sign-in/sign-out events.

use super::profile_cache::ProfileCache;
use super::profile_models::{Profile, ProfileUpdate};
use super::profile_store::ProfileStore;
use crate::core::identity::{BackendError, IdentityProvider};
use crate::core::moderation::{trim_text, truncate_utf16};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

pub const MAX_NICKNAME_CHARS: usize = 20;
pub const MAX_BIO_CHARS: usize = 100;
pub const MAX_HOBBIES: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 20;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("ログインが必要です")]
    AuthRequired,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct ProfileService<I: IdentityProvider, P: ProfileStore> {
    identity: I,
    store: P,
    cache: Arc<ProfileCache>,
}

impl<I: IdentityProvider, P: ProfileStore> ProfileService<I, P> {
    pub fn new(identity: I, store: P, cache: Arc<ProfileCache>) -> Self {
        Self {
            identity,
            store,
            cache,
        }
    }

    /// The current user's profile. Served from the cache unless
    /// `force_refresh` is set; `None` when nobody is signed in.
    pub async fn get_my_profile(&self, force_refresh: bool) -> Result<Option<Profile>, ProfileError> {
        if !force_refresh {
            if let Some(cached) = self.cache.get().await {
                return Ok(Some(cached));
            }
        }

        let Some(user) = self.identity.current_user().await? else {
            return Ok(None);
        };

        let profile = self.store.get_profile(&user.id).await?;
        if let Some(profile) = &profile {
            self.cache.set(profile.clone()).await;
        }
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, ProfileError> {
        Ok(self.store.get_profile(user_id).await?)
    }

    pub async fn update_my_profile(&self, update: ProfileUpdate) -> Result<Profile, ProfileError> {
        let user = self
            .identity
            .current_user()
            .await?
            .ok_or(ProfileError::AuthRequired)?;

        let profile = self.store.update_profile(&user.id, &update).await?;
        self.cache.invalidate().await;
        Ok(profile)
    }

    /// Save the editable profile fields from the setup/edit form.
    ///
    /// `username` can only be set once, so `None` leaves it untouched.
    pub async fn save_profile(
        &self,
        nickname: &str,
        bio: Option<&str>,
        hobbies: &[String],
        username: Option<&str>,
    ) -> Result<Profile, ProfileError> {
        let update = ProfileUpdate {
            nickname: Some(truncate_utf16(trim_text(nickname), MAX_NICKNAME_CHARS)),
            bio: Some(
                bio.map(trim_text)
                    .filter(|b| !b.is_empty())
                    .map(|b| truncate_utf16(b, MAX_BIO_CHARS)),
            ),
            hobbies: Some(hobbies.iter().take(MAX_HOBBIES).cloned().collect()),
            username: username
                .filter(|u| !u.is_empty())
                .map(|u| truncate_utf16(&u.to_lowercase(), MAX_USERNAME_CHARS)),
            profile_completed_at: Some(Utc::now()),
            ..Default::default()
        };

        self.update_my_profile(update).await
    }

    /// Drop cached state after a sign-in, sign-out or account switch.
    pub async fn on_identity_changed(&self) {
        self.cache.invalidate().await;
    }
}
