//! Wiring of the in-process session core.
//!
//! One `SessionClient` is built per process: it owns the credential store,
//! the refresh coordinator and the sign-in flows, all sharing one relay and
//! one redirect channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::auth::AuthClient;
use crate::bootstrap::{bootstrap, BootstrapOutcome};
use crate::config::ConfigV1;
use crate::coordinator::{ApiRequest, ApiResponse, HttpTransport, RefreshCoordinator, Transport};
use crate::error::ApiError;
use crate::identity::{HttpIdentityProvider, IdentityProvider};
use crate::metrics::Metrics;
use crate::models::session::Session;
use crate::redirect::{Redirect, RedirectSignal};
use crate::relay::Relay;
use crate::store::{create_storage, CredentialStore, SessionStorage};

pub struct SessionClient {
    pub store: Arc<CredentialStore>,
    pub auth: AuthClient,
    pub coordinator: Arc<RefreshCoordinator>,
    identity: Arc<dyn IdentityProvider>,
}

impl SessionClient {
    /// Builds a client from explicit collaborators. Returns the receiving end
    /// of the redirect channel for the UI to follow.
    pub fn new(
        config: &ConfigV1,
        relay: Arc<dyn Relay>,
        storage: Arc<dyn SessionStorage>,
        identity: Arc<dyn IdentityProvider>,
        transport: Arc<dyn Transport>,
        metrics: Metrics,
    ) -> (Self, UnboundedReceiver<Redirect>) {
        let (redirects, rx) = RedirectSignal::channel();
        let store = Arc::new(CredentialStore::restore(
            relay,
            storage,
            config.relay.clone(),
        ));
        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            identity.clone(),
            transport,
            redirects.clone(),
            metrics,
            Duration::from_millis(config.client.refresh_timeout_in_ms),
        ));
        let auth = AuthClient::new(store.clone(), identity.clone(), redirects);

        (
            SessionClient {
                store,
                auth,
                coordinator,
                identity,
            },
            rx,
        )
    }

    /// Builds a client talking HTTP to `client.api_url`.
    pub fn from_config(
        config: &ConfigV1,
        relay: Arc<dyn Relay>,
    ) -> (Self, UnboundedReceiver<Redirect>) {
        Self::new(
            config,
            relay,
            create_storage(&config.client),
            Arc::new(HttpIdentityProvider::new(&config.client)),
            Arc::new(HttpTransport::new(&config.client)),
            Metrics::new(),
        )
    }

    /// Reconciles the relay with the store. Call once at start-up.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        bootstrap(&self.store, self.identity.as_ref()).await
    }

    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.coordinator.execute(request).await
    }

    pub fn session(&self) -> Session {
        self.store.snapshot()
    }
}
