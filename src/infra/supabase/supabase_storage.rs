use super::supabase_client::SupabaseClient;
use crate::core::avatar::ObjectStore;
use crate::core::identity::BackendError;
use async_trait::async_trait;
use serde_json::json;

#[async_trait]
impl ObjectStore for SupabaseClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BackendError> {
        let request = self
            .http()
            .post(self.storage_url(&format!("object/{}/{}", bucket, path)))
            .header("Content-Type", content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes);
        self.send(request).await?;
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        let request = self
            .http()
            .delete(self.storage_url(&format!("object/{}", bucket)))
            .json(&json!({ "prefixes": paths }));
        self.send(request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.storage_url(&format!("object/public/{}/{}", bucket, path))
    }
}
