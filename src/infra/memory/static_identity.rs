use crate::core::identity::{BackendError, IdentityProvider, User};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Identity that is whatever the caller last set. Used by the offline
/// backend, where there is no auth server.
pub struct StaticIdentity {
    user: RwLock<Option<User>>,
}

impl StaticIdentity {
    pub fn new(user: Option<User>) -> Self {
        Self {
            user: RwLock::new(user),
        }
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self::new(Some(User::new(user_id)))
    }

    pub async fn set(&self, user: Option<User>) {
        *self.user.write().await = user;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        Ok(self.user.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identity_can_switch() {
        let identity = StaticIdentity::signed_in("local");
        assert_eq!(identity.current_user().await.unwrap().unwrap().id, "local");

        identity.set(None).await;
        assert!(identity.current_user().await.unwrap().is_none());
    }
}
