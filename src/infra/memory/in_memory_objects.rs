use crate::core::avatar::ObjectStore;
use crate::core::identity::BackendError;
use async_trait::async_trait;
use dashmap::DashMap;

/// A stored object and its content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object store held in a `DashMap` keyed by `bucket/path`.
pub struct InMemoryObjectStore {
    objects: DashMap<String, StoredObject>,
    base_url: String,
}

impl InMemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects.get(&key(bucket, path)).map(|o| o.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn key(bucket: &str, path: &str) -> String {
    format!("{}/{}", bucket, path)
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BackendError> {
        let key = key(bucket, path);
        if !upsert && self.objects.contains_key(&key) {
            return Err(BackendError::Conflict { constraint: None });
        }
        self.objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        for path in paths {
            self.objects.remove(&key(bucket, path));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_without_upsert_conflicts() {
        let store = InMemoryObjectStore::new("memory://");

        store
            .upload("avatars", "u1/avatar.webp", vec![1, 2], "image/webp", false)
            .await
            .unwrap();
        let again = store
            .upload("avatars", "u1/avatar.webp", vec![3], "image/webp", false)
            .await;
        assert!(matches!(again, Err(ref e) if e.is_conflict()));

        store
            .upload("avatars", "u1/avatar.webp", vec![3], "image/webp", true)
            .await
            .unwrap();
        assert_eq!(store.get("avatars", "u1/avatar.webp").unwrap().bytes, vec![3]);
    }

    #[tokio::test]
    async fn test_remove_ignores_missing_paths() {
        let store = InMemoryObjectStore::new("memory://");
        store
            .upload("avatars", "u1/avatar.jpg", vec![1], "image/jpeg", true)
            .await
            .unwrap();

        store
            .remove(
                "avatars",
                &["u1/avatar.webp".to_string(), "u1/avatar.jpg".to_string()],
            )
            .await
            .unwrap();

        assert!(store.is_empty());
    }

    #[test]
    fn test_public_url() {
        let store = InMemoryObjectStore::new("memory://objects/");
        assert_eq!(
            store.public_url("avatars", "u1/avatar.webp"),
            "memory://objects/avatars/u1/avatar.webp"
        );
    }
}
