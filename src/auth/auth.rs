use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::identity::{AuthResponse, IdentityProvider, LoginCredentials, RegisterCredentials};
use crate::models::user::Identity;
use crate::redirect::{Redirect, RedirectSignal};
use crate::store::CredentialStore;

const MIN_PASSWORD_LEN: usize = 8;

/// Sign-in, registration and sign-out flows. Failures of the first two are
/// returned for inline display; sign-out always ends signed out.
pub struct AuthClient {
    store: Arc<CredentialStore>,
    identity: Arc<dyn IdentityProvider>,
    redirects: RedirectSignal,
}

impl AuthClient {
    pub fn new(
        store: Arc<CredentialStore>,
        identity: Arc<dyn IdentityProvider>,
        redirects: RedirectSignal,
    ) -> Self {
        AuthClient {
            store,
            identity,
            redirects,
        }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Identity, AuthError> {
        let response = self
            .identity
            .login(&credentials.email, &credentials.password)
            .await
            .inspect_err(|e| {
                debug!("Login failed for '{}'", credentials.email);
                warn!("Login failed: {}", e)
            })?;
        Ok(self.establish(response))
    }

    pub async fn register(&self, credentials: &RegisterCredentials) -> Result<Identity, AuthError> {
        validate_registration(credentials)?;
        let response = self
            .identity
            .register(&credentials.name, &credentials.email, &credentials.password)
            .await
            .inspect_err(|e| {
                debug!("Registration failed for '{}'", credentials.email);
                warn!("Registration failed: {}", e)
            })?;
        Ok(self.establish(response))
    }

    /// Best-effort server-side logout; the local session is cleared whatever happens.
    pub async fn logout(&self) {
        let token = self.store.access_credential();
        if let Err(e) = self.identity.logout(token.as_deref()).await {
            warn!("Server-side logout failed, clearing local session anyway: {}", e);
        }
        self.store.clear_auth();
        self.redirects.emit(Redirect::Login { callback: None });
    }

    fn establish(&self, response: AuthResponse) -> Identity {
        let AuthResponse {
            user,
            access_token,
            refresh_token,
        } = response;
        info!(
            "Signed in user '{}' via identity provider '{}'",
            user.id,
            self.identity.get_name()
        );
        self.store.set_auth(user.clone(), access_token);
        if refresh_token.is_some() {
            self.store.set_rotation_credential(refresh_token.as_deref());
        }
        self.redirects.emit(Redirect::Dashboard);
        user
    }
}

/// Local checks run before a registration reaches the backend.
pub fn validate_registration(credentials: &RegisterCredentials) -> Result<(), AuthError> {
    if credentials.name.trim().is_empty() {
        return Err(AuthError::Validation("name is required".to_string()));
    }
    let email = credentials.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(AuthError::Validation("email address is invalid".to_string())),
    }
    if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if credentials.password != credentials.confirm_password {
        return Err(AuthError::Validation("passwords do not match".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, RelayConfig};
    use crate::error::IdentityError;
    use crate::identity::HttpIdentityProvider;
    use crate::relay::{MemoryRelay, Relay};
    use crate::store::MemoryStorage;
    use http::StatusCode;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    const AUTH_BODY: &str = r#"{"data": {"user": {"id": "1", "name": "Ada", "email": "ada@example.com", "roles": ["USER"]},
        "accessToken": "access-1", "refreshToken": "rotate-1"}, "message": "ok", "success": true}"#;

    fn client(url: String) -> (AuthClient, Arc<CredentialStore>, Arc<MemoryRelay>, UnboundedReceiver<Redirect>) {
        let relay = Arc::new(MemoryRelay::new());
        let store = Arc::new(CredentialStore::new(
            relay.clone(),
            Arc::new(MemoryStorage::new()),
            RelayConfig::default(),
        ));
        let identity = Arc::new(HttpIdentityProvider::new(&ClientConfig {
            api_url: url,
            ..ClientConfig::default()
        }));
        let (signal, rx) = RedirectSignal::channel();
        (AuthClient::new(store.clone(), identity, signal), store, relay, rx)
    }

    fn registration(password: &str, confirm: &str) -> RegisterCredentials {
        RegisterCredentials {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_establishes_session() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(AUTH_BODY)
            .create_async()
            .await;
        let (auth, store, relay, mut redirects) = client(server.url());

        let user = auth
            .login(&LoginCredentials {
                email: "ada@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .expect("login should succeed");
        m.assert_async().await;

        assert_eq!(user.name, "Ada");
        assert!(store.is_authenticated());
        assert_eq!(relay.get("access_token").as_deref(), Some("access-1"));
        assert_eq!(relay.get("refresh_token").as_deref(), Some("rotate-1"));
        assert_eq!(redirects.try_recv(), Ok(Redirect::Dashboard));
    }

    #[tokio::test]
    async fn test_login_failure_is_inline() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"message": "Invalid credentials"}"#)
            .create_async()
            .await;
        let (auth, store, _, mut redirects) = client(server.url());

        let err = auth
            .login(&LoginCredentials {
                email: "ada@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        m.assert_async().await;

        assert_eq!(
            err,
            AuthError::Identity(IdentityError::Rejected {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid credentials".to_string()
            })
        );
        assert!(!store.is_authenticated());
        assert!(redirects.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_register_validates_before_calling_backend() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/register")
            .expect(0)
            .create_async()
            .await;
        let (auth, _, _, _) = client(server.url());

        let err = auth
            .register(&registration("longenough", "different1"))
            .await
            .unwrap_err();
        m.assert_async().await;
        assert_eq!(err, AuthError::Validation("passwords do not match".to_string()));
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/register")
            .with_status(201)
            .with_body(AUTH_BODY)
            .create_async()
            .await;
        let (auth, store, _, _) = client(server.url());

        auth.register(&registration("longenough", "longenough"))
            .await
            .expect("registration should succeed");
        m.assert_async().await;
        assert!(store.has_any_role(&["USER".to_string()]));
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(AUTH_BODY)
            .create_async()
            .await;
        let logout = server
            .mock("POST", "/auth/logout")
            .with_status(500)
            .create_async()
            .await;
        let (auth, store, relay, mut redirects) = client(server.url());
        auth.login(&LoginCredentials {
            email: "ada@example.com".to_string(),
            password: "hunter22".to_string(),
        })
        .await
        .unwrap();

        auth.logout().await;
        login.assert_async().await;
        logout.assert_async().await;

        assert!(!store.is_authenticated());
        assert_eq!(relay.get("access_token"), None);
        assert_eq!(relay.get("refresh_token"), None);
        assert_eq!(redirects.try_recv(), Ok(Redirect::Dashboard));
        assert_eq!(redirects.try_recv(), Ok(Redirect::Login { callback: None }));
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration(&registration("longenough", "longenough")).is_ok());
        assert!(validate_registration(&registration("short", "short")).is_err());

        let mut bad_email = registration("longenough", "longenough");
        bad_email.email = "not-an-email".to_string();
        assert!(validate_registration(&bad_email).is_err());

        let mut no_name = registration("longenough", "longenough");
        no_name.name = "  ".to_string();
        assert!(validate_registration(&no_name).is_err());
    }

    /// Collects formatted log output for inspection.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_email_is_kept_out_of_info_logs() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .match_body(Matcher::PartialJson(json!({"password": "hunter22"})))
            .with_status(200)
            .with_body(AUTH_BODY)
            .create_async()
            .await;
        server
            .mock("POST", "/auth/login")
            .match_body(Matcher::PartialJson(json!({"password": "wrong"})))
            .with_status(401)
            .with_body(r#"{"message": "Invalid credentials"}"#)
            .create_async()
            .await;
        let (auth, _, _, _) = client(server.url());

        for password in ["wrong", "hunter22"] {
            let _ = auth
                .login(&LoginCredentials {
                    email: "ada@example.com".to_string(),
                    password: password.to_string(),
                })
                .await;
        }

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Login failed"), "{}", output);
        assert!(output.contains("Signed in user '1'"), "{}", output);
        assert!(!output.contains("ada@example.com"), "{}", output);
    }
}
