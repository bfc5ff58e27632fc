// GoTrue endpoints: password sign-up/sign-in, logout, recovery and the
// current-user lookup.

use super::supabase_client::SupabaseClient;
use crate::core::identity::{AuthProvider, BackendError, IdentityProvider, Session, User};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: User,
}

/// Sign-up answers with a session when e-mail confirmation is off, and with
/// the bare user when it is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(User),
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user: token.user,
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        if self.session.read().await.is_none() {
            return Ok(None);
        }

        let request = self.http().get(self.auth_url("user"));
        match self.send(request).await {
            Ok(response) => Ok(Some(response.json::<User>().await?)),
            Err(BackendError::Unauthorized) => {
                tracing::info!("Session expired; treating caller as signed out");
                self.set_session(None).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<User>, BackendError> {
        let request = self
            .http()
            .post(self.auth_url("signup"))
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(request).await?;

        match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(token) => {
                let session = Session::from(token);
                let user = session.user.clone();
                self.set_session(Some(session)).await;
                Ok(Some(user))
            }
            SignUpResponse::User(user) => Ok(Some(user)),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let request = self
            .http()
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = self.send(request).await?.json().await?;

        let session = Session::from(token);
        self.set_session(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.session.read().await.is_none() {
            return Ok(());
        }
        let result = self.send(self.http().post(self.auth_url("logout"))).await;
        // The local session goes away even if the server call fails.
        self.set_session(None).await;
        result.map(|_| ())
    }

    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), BackendError> {
        let request = self
            .http()
            .post(self.auth_url("recover"))
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }));
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_response_shapes() {
        let with_session = r#"{"access_token":"at","token_type":"bearer","refresh_token":"rt","user":{"id":"u1","email":"a@b.jp"}}"#;
        match serde_json::from_str::<SignUpResponse>(with_session).unwrap() {
            SignUpResponse::Session(token) => {
                assert_eq!(token.access_token, "at");
                assert_eq!(token.user.id, "u1");
            }
            SignUpResponse::User(_) => panic!("expected a session"),
        }

        let bare_user = r#"{"id":"u2","email":"c@d.jp","aud":"authenticated"}"#;
        match serde_json::from_str::<SignUpResponse>(bare_user).unwrap() {
            SignUpResponse::User(user) => assert_eq!(user.id, "u2"),
            SignUpResponse::Session(_) => panic!("expected a bare user"),
        }
    }

    #[tokio::test]
    async fn test_signed_out_client_has_no_user() {
        let client = SupabaseClient::new("http://127.0.0.1:9", "anon").unwrap();

        // No session means no network round trip.
        assert!(client.current_user().await.unwrap().is_none());
        client.sign_out().await.unwrap();
    }
}
