// The signed-in user's profile, cached per client context.
//
// One instance is created in the composition root and shared (via Arc) with
// every service that reads the profile, mutates it, or changes identity.
// Those services call `invalidate` after each such operation.

use super::profile_models::Profile;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct ProfileCache {
    current: RwLock<Option<Profile>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Profile> {
        self.current.read().await.clone()
    }

    pub async fn set(&self, profile: Profile) {
        *self.current.write().await = Some(profile);
    }

    pub async fn invalidate(&self) {
        let mut current = self.current.write().await;
        if current.take().is_some() {
            tracing::debug!("Profile cache invalidated");
        }
    }
}
