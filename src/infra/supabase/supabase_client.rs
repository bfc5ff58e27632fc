use crate::core::identity::{BackendError, Session};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tokio::sync::RwLock;

/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Thin client for a hosted Supabase project.
///
/// Requests carry the anon key as `apikey`; the bearer token is the signed-in
/// session's access token when there is one, otherwise the anon key.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    pub(crate) session: RwLock<Option<Session>>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(anon_key).map_err(|e| BackendError::Transport(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    pub(crate) fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        }
    }

    /// Attach the bearer token, send, and turn non-2xx responses into errors.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.bearer_auth(self.bearer().await).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = map_error(status.as_u16(), &body);
        tracing::debug!(status = status.as_u16(), error = %err, "Backend request failed");
        Err(err)
    }
}

/// Map an error response to `BackendError`.
///
/// PostgREST, GoTrue and Storage each shape their error bodies differently,
/// so the code and message are looked up under every key they use.
pub(crate) fn map_error(status: u16, body: &str) -> BackendError {
    let json: Value = serde_json::from_str(body).unwrap_or(Value::Null);

    let code = json.get("code").and_then(Value::as_str);
    // Storage reports its own status inside a 400 body.
    let inner_status = json.get("statusCode").and_then(Value::as_str);
    let message = ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());

    // Only a uniqueness failure is a conflict; a foreign-key 409 (23503) is not.
    if code == Some(UNIQUE_VIOLATION) || inner_status == Some("409") {
        return BackendError::Conflict {
            constraint: quoted_name(&message),
        };
    }

    match status {
        401 | 403 => BackendError::Unauthorized,
        _ => BackendError::Api { status, message },
    }
}

/// The first double-quoted identifier in a Postgres error message.
fn quoted_name(message: &str) -> Option<String> {
    let start = message.find('"')? + 1;
    let len = message[start..].find('"')?;
    Some(message[start..start + len].to_string())
}

/// Total row count from a `Content-Range` header such as `0-19/57` or `*/0`.
pub(crate) fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_is_conflict() {
        let body = r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value violates unique constraint \"reports_reporter_id_post_id_key\""}"#;

        match map_error(409, body) {
            BackendError::Conflict { constraint } => {
                assert_eq!(constraint.as_deref(), Some("reports_reporter_id_post_id_key"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        // The code alone is enough even when the status is not 409.
        assert!(map_error(400, body).is_conflict());
    }

    #[test]
    fn test_foreign_key_violation_is_not_conflict() {
        let body = r#"{"code":"23503","details":"Key (post_id)=(999) is not present in table \"posts\".","hint":null,"message":"insert or update on table \"reports\" violates foreign key constraint \"reports_post_id_fkey\""}"#;

        let err = map_error(409, body);
        assert!(!err.is_conflict());
        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 409);
                assert!(message.contains("reports_post_id_fkey"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn test_storage_duplicate_is_conflict() {
        let body = r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#;
        assert!(map_error(400, body).is_conflict());
    }

    #[test]
    fn test_auth_failures_are_unauthorized() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert!(matches!(map_error(400, body), BackendError::Api { status: 400, .. }));
        assert!(matches!(map_error(401, body), BackendError::Unauthorized));
        assert!(matches!(map_error(403, "{}"), BackendError::Unauthorized));
    }

    #[test]
    fn test_other_errors_keep_message() {
        match map_error(500, r#"{"msg":"database is down"}"#) {
            BackendError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database is down");
            }
            other => panic!("unexpected {other:?}"),
        }

        match map_error(502, "Bad Gateway\n") {
            BackendError::Api { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range("0-19/57"), Some(57));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-19/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let client = SupabaseClient::new("https://abc.supabase.co/", "anon").unwrap();
        assert_eq!(client.rest_url("posts"), "https://abc.supabase.co/rest/v1/posts");
        assert_eq!(
            client.auth_url("token"),
            "https://abc.supabase.co/auth/v1/token"
        );
        assert_eq!(
            client.storage_url("object/avatars/u/avatar.webp"),
            "https://abc.supabase.co/storage/v1/object/avatars/u/avatar.webp"
        );
    }
}
