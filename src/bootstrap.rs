//! Start-up reconciliation of the relay credential with the credential store.

use tracing::{debug, info, warn};

use crate::identity::IdentityProvider;
use crate::store::CredentialStore;

/// How bootstrap left the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The relay credential was paired with a freshly fetched profile.
    Restored,
    /// The store already held an authenticated session.
    AlreadyAuthenticated,
    /// No usable credential; the session was cleared.
    Cleared,
}

/// Runs once when the application starts. Makes a single profile request at
/// most and never redirects: if the session turns out to be stale it is
/// cleared quietly and the route guard redirects on the next navigation.
pub async fn bootstrap(store: &CredentialStore, identity: &dyn IdentityProvider) -> BootstrapOutcome {
    let token = match store.relay_access_credential() {
        Some(token) => token,
        None => {
            debug!("No access credential in the relay; starting signed out.");
            store.clear_auth();
            return BootstrapOutcome::Cleared;
        }
    };

    if store.is_authenticated() {
        return BootstrapOutcome::AlreadyAuthenticated;
    }

    match identity.current_profile(&token).await {
        Ok(user) => {
            info!("Rehydrated session for user '{}'", user.id);
            store.set_auth(user, token);
            BootstrapOutcome::Restored
        }
        Err(e) => {
            warn!("Could not restore session from relay credential: {}", e);
            store.clear_auth();
            BootstrapOutcome::Cleared
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, RelayConfig};
    use crate::identity::HttpIdentityProvider;
    use crate::models::session::PersistedSession;
    use crate::models::user::Identity;
    use crate::relay::{MemoryRelay, Relay};
    use crate::store::MemoryStorage;
    use mockito::Server;
    use std::sync::Arc;

    fn store_with(relay: Arc<MemoryRelay>, persisted: Option<PersistedSession>) -> CredentialStore {
        let storage = match persisted {
            Some(doc) => MemoryStorage::with_document(doc),
            None => MemoryStorage::new(),
        };
        CredentialStore::restore(relay, Arc::new(storage), RelayConfig::default())
    }

    fn provider(url: String) -> HttpIdentityProvider {
        HttpIdentityProvider::new(&ClientConfig {
            api_url: url,
            ..ClientConfig::default()
        })
    }

    const PROFILE: &str =
        r#"{"data": {"id": "1", "name": "Ada", "email": "ada@example.com", "roles": ["ADMIN"]}}"#;

    #[tokio::test]
    async fn test_no_relay_credential_clears() {
        let relay = Arc::new(MemoryRelay::new());
        relay.set("refresh_token", "stale-rotation");
        let store = store_with(
            relay.clone(),
            Some(PersistedSession {
                user: Some(Identity::new("1", "Ada", "ada@example.com", None)),
                roles: vec![],
                is_authenticated: true,
            }),
        );

        // Never reaches the network.
        let outcome = bootstrap(&store, &provider("http://127.0.0.1:1".to_string())).await;

        assert_eq!(outcome, BootstrapOutcome::Cleared);
        assert!(store.snapshot().user.is_none());
        assert_eq!(relay.get("refresh_token"), None);
    }

    #[tokio::test]
    async fn test_relay_credential_is_rehydrated() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer access-1")
            .with_status(200)
            .with_body(PROFILE)
            .create_async()
            .await;

        let relay = Arc::new(MemoryRelay::new());
        relay.set("access_token", "access-1");
        let store = store_with(relay, None);

        let outcome = bootstrap(&store, &provider(server.url())).await;
        m.assert_async().await;

        assert_eq!(outcome, BootstrapOutcome::Restored);
        let session = store.snapshot();
        assert!(session.is_authenticated);
        assert_eq!(session.access_credential.as_deref(), Some("access-1"));
        assert!(session.roles.contains("ADMIN"));
    }

    #[tokio::test]
    async fn test_profile_failure_clears_silently() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/auth/me")
            .with_status(401)
            .with_body(r#"{"message": "jwt expired"}"#)
            .expect(1)
            .create_async()
            .await;

        let relay = Arc::new(MemoryRelay::new());
        relay.set("access_token", "access-1");
        let store = store_with(relay.clone(), None);

        let outcome = bootstrap(&store, &provider(server.url())).await;
        m.assert_async().await;

        assert_eq!(outcome, BootstrapOutcome::Cleared);
        assert!(!store.is_authenticated());
        assert_eq!(relay.get("access_token"), None);
    }

    #[tokio::test]
    async fn test_already_authenticated_skips_profile() {
        let relay = Arc::new(MemoryRelay::new());
        let store = store_with(relay, None);
        store.set_auth(Identity::new("1", "Ada", "ada@example.com", None), "access-1".to_string());

        let outcome = bootstrap(&store, &provider("http://127.0.0.1:1".to_string())).await;

        assert_eq!(outcome, BootstrapOutcome::AlreadyAuthenticated);
        assert!(store.is_authenticated());
    }
}
