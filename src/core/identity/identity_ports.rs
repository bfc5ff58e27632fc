// Identity ports.
//
// `IdentityProvider` answers "who is calling?" and is all the moderation,
// avatar and board services need. `AuthProvider` is the password-login
// surface used by the auth service.

use super::identity_models::{BackendError, Session, User};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when there is no session.
    async fn current_user(&self) -> Result<Option<User>, BackendError>;
}

#[async_trait]
pub trait AuthProvider: IdentityProvider {
    /// Register a new account. Returns the user when the provider created one.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<User>, BackendError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), BackendError>;
}

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        (**self).current_user().await
    }
}

#[async_trait]
impl<T: AuthProvider + ?Sized> AuthProvider for Arc<T> {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<User>, BackendError> {
        (**self).sign_up(email, password).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        (**self).sign_in_with_password(email, password).await
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        (**self).sign_out().await
    }

    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), BackendError> {
        (**self).reset_password(email, redirect_to).await
    }
}
