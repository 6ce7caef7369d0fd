use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::base::{ApiEnvelope, AuthResponse, IdentityProvider, RefreshResponse};
use crate::config::ClientConfig;
use crate::error::IdentityError;
use crate::models::user::Identity;

/// Identity provider backed by the application's REST API (`/auth/*` endpoints).
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
}

impl HttpIdentityProvider {
    pub fn new(config: &ClientConfig) -> Self {
        info!("Creating HTTP identity provider for '{}'", config.api_url);
        Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, IdentityError> {
        let res = request
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        // Error bodies follow `{ "message": ..., "statusCode": ... }`; fall back to raw text.
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["message"].as_str().map(str::to_string))
            .unwrap_or(body);
        Err(IdentityError::Rejected { status, message })
    }

    async fn envelope<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, IdentityError> {
        let res = self.send(request).await?;
        let envelope = res
            .json::<ApiEnvelope<T>>()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    fn get_name(&self) -> &str {
        "http"
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, IdentityError> {
        debug!("Logging in '{}'", email);
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        self.envelope(request).await
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, IdentityError> {
        debug!("Registering '{}'", email);
        let request = self.client.post(self.url("/auth/register")).json(&json!({
            "name": name,
            "email": email,
            "password": password,
        }));
        self.envelope(request).await
    }

    async fn logout(&self, access_credential: Option<&str>) -> Result<(), IdentityError> {
        let mut request = self.client.post(self.url("/auth/logout"));
        if let Some(token) = access_credential {
            request = request.bearer_auth(token);
        }
        self.send(request).await.map(|_| ())
    }

    async fn refresh(&self, rotation_credential: &str) -> Result<RefreshResponse, IdentityError> {
        debug!("Refreshing access credential");
        let request = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&json!({ "refreshToken": rotation_credential }));
        self.envelope(request).await
    }

    async fn current_profile(&self, access_credential: &str) -> Result<Identity, IdentityError> {
        let request = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(access_credential);
        self.envelope(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use mockito::{Matcher, Server};

    fn provider(url: String) -> HttpIdentityProvider {
        HttpIdentityProvider::new(&ClientConfig {
            api_url: url,
            ..ClientConfig::default()
        })
    }

    /// Test that a successful login unwraps the envelope.
    #[tokio::test]
    async fn test_login_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(json!({"email": "ada@example.com", "password": "hunter22"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": {"user": {"id": "1", "name": "Ada", "email": "ada@example.com", "roles": ["ADMIN"]},
                    "accessToken": "access-1", "refreshToken": "rotate-1"},
                    "message": "ok", "success": true}"#,
            )
            .create_async()
            .await;

        let res = provider(server.url())
            .login("ada@example.com", "hunter22")
            .await
            .expect("login should succeed");
        m.assert_async().await;

        assert_eq!(res.user.roles, vec!["ADMIN"]);
        assert_eq!(res.access_token, "access-1");
        assert_eq!(res.refresh_token.as_deref(), Some("rotate-1"));
    }

    /// Test that a rejected login surfaces the backend message.
    #[tokio::test]
    async fn test_login_rejected() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"message": "Invalid credentials", "statusCode": 401}"#)
            .create_async()
            .await;

        let err = provider(server.url())
            .login("ada@example.com", "wrong")
            .await
            .expect_err("login should fail");
        m.assert_async().await;

        assert_eq!(
            err,
            IdentityError::Rejected {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid credentials".to_string()
            }
        );
    }

    /// Test that refresh sends the rotation credential and reads the new access credential.
    #[tokio::test]
    async fn test_refresh() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/refresh")
            .match_body(Matcher::Json(json!({"refreshToken": "rotate-1"})))
            .with_status(200)
            .with_body(r#"{"data": {"accessToken": "access-2"}, "message": "", "success": true}"#)
            .create_async()
            .await;

        let res = provider(server.url()).refresh("rotate-1").await.unwrap();
        m.assert_async().await;
        assert_eq!(res.access_token, "access-2");
        assert_eq!(res.refresh_token, None);
    }

    /// Test that the profile call carries the bearer credential.
    #[tokio::test]
    async fn test_current_profile() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer access-1")
            .with_status(200)
            .with_body(r#"{"data": {"id": "1", "name": "Ada", "email": "ada@example.com", "roles": []}}"#)
            .create_async()
            .await;

        let user = provider(format!("{}/", server.url()))
            .current_profile("access-1")
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(user.name, "Ada");
    }

    /// Test that a malformed body is a decode error, not a rejection.
    #[tokio::test]
    async fn test_current_profile_bad_body() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/auth/me")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let err = provider(server.url()).current_profile("t").await.unwrap_err();
        m.assert_async().await;
        assert!(matches!(err, IdentityError::Decode(_)));
    }

    /// Test that an unreachable backend is a network error.
    #[tokio::test]
    async fn test_unreachable_backend() {
        let err = provider("http://127.0.0.1:1".to_string())
            .refresh("rotate-1")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Network(_)));
    }

    /// Test that logout tolerates an empty success body.
    #[tokio::test]
    async fn test_logout() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/logout")
            .match_header("authorization", "Bearer access-1")
            .with_status(204)
            .create_async()
            .await;

        provider(server.url()).logout(Some("access-1")).await.unwrap();
        m.assert_async().await;
    }
}
