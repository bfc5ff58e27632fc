// Auth service - password sign-up/sign-in on top of the auth provider.
//
// Identity changes always drop the cached profile so the next read goes
// back to the store.

use crate::core::identity::{AuthProvider, BackendError, Session, User};
use crate::core::profile::{ProfileCache, ProfileStore};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("メールアドレスとパスワードを入力してください")]
    MissingCredentials,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct AuthService<A: AuthProvider, P: ProfileStore> {
    provider: A,
    profiles: P,
    cache: Arc<ProfileCache>,
}

impl<A: AuthProvider, P: ProfileStore> AuthService<A, P> {
    pub fn new(provider: A, profiles: P, cache: Arc<ProfileCache>) -> Self {
        Self {
            provider,
            profiles,
            cache,
        }
    }

    /// Register an account and make sure its `users` row exists.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let (email, password) = credentials(email, password)?;
        let user = self.provider.sign_up(email, password).await?;

        if let Some(user) = &user {
            match self.profiles.create_profile(&user.id).await {
                Ok(()) => tracing::info!(user_id = %user.id, "Profile row created"),
                // Row already exists.
                Err(e) if e.is_conflict() => {
                    tracing::debug!(user_id = %user.id, "Profile row already present")
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.cache.invalidate().await;
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let (email, password) = credentials(email, password)?;
        let session = self.provider.sign_in_with_password(email, password).await?;
        self.cache.invalidate().await;
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.cache.invalidate().await;
        self.provider.sign_out().await?;
        Ok(())
    }

    pub async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        self.provider.reset_password(email, redirect_to).await?;
        Ok(())
    }
}

fn credentials<'a>(email: &'a str, password: &'a str) -> Result<(&'a str, &'a str), AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok((email, password))
}
