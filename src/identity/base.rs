use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::models::user::Identity;

/// The response envelope every backend endpoint wraps its payload in.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiEnvelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub success: bool,
}

/// Payload returned by login and registration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: Identity,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Payload returned by a refresh. Providers that rotate the rotation
/// credential hand the new one back as `refresh_token`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// The identity provider issues, rotates and describes credentials.
/// It is the only component that talks to the backend's auth endpoints.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn get_name(&self) -> &str;

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, IdentityError>;

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, IdentityError>;

    /// Invalidates the server-side session. Best effort.
    async fn logout(&self, access_credential: Option<&str>) -> Result<(), IdentityError>;

    async fn refresh(&self, rotation_credential: &str) -> Result<RefreshResponse, IdentityError>;

    async fn current_profile(&self, access_credential: &str) -> Result<Identity, IdentityError>;
}
