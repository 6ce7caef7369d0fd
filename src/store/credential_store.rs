//! The credential store: single owner of the in-memory session.
//!
//! Every mutator updates the session, mirrors the access credential into the
//! relay and persists the long-lived subset while holding one lock, so the
//! relay always reflects the store and there is never a second writer.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use super::storage::SessionStorage;
use crate::config::RelayConfig;
use crate::models::session::{PersistedSession, Session};
use crate::models::user::{Identity, Role};
use crate::relay::Relay;

#[derive(Default)]
struct StoreState {
    session: Session,
    /// Bumped whenever the session is replaced wholesale (sign-in, sign-out).
    generation: u64,
}

pub struct CredentialStore {
    state: RwLock<StoreState>,
    relay: Arc<dyn Relay>,
    storage: Arc<dyn SessionStorage>,
    entries: RelayConfig,
}

impl CredentialStore {
    /// Creates a store with an empty session.
    pub fn new(
        relay: Arc<dyn Relay>,
        storage: Arc<dyn SessionStorage>,
        entries: RelayConfig,
    ) -> Self {
        CredentialStore {
            state: RwLock::new(StoreState::default()),
            relay,
            storage,
            entries,
        }
    }

    /// Creates a store from whatever a previous process persisted.
    ///
    /// Only the identity comes back; the access credential never touches
    /// long-lived storage, so the restored session stays unauthenticated until
    /// bootstrap pairs it with the relay credential.
    pub fn restore(
        relay: Arc<dyn Relay>,
        storage: Arc<dyn SessionStorage>,
        entries: RelayConfig,
    ) -> Self {
        let store = Self::new(relay, storage, entries);
        match store.storage.load() {
            Ok(Some(persisted)) => {
                debug!(
                    "Restored persisted session (authenticated hint: {})",
                    persisted.is_authenticated
                );
                store.write().session = Session::new(persisted.user, None);
            }
            Ok(None) if !store.storage.is_persistent() => {
                debug!("Session storage is not persistent; starting empty.")
            }
            Ok(None) => debug!("No persisted session found."),
            Err(e) => warn!("Failed to load persisted session, starting empty: {}", e),
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.storage.save(&PersistedSession::from(session)) {
            warn!("Failed to persist session: {}", e);
        }
    }

    /// Atomically installs a signed-in user and their access credential.
    pub fn set_auth(&self, user: Identity, access_credential: String) {
        let mut state = self.write();
        info!("Session established for user '{}'", user.id);
        self.relay.set(&self.entries.access_entry, &access_credential);
        state.session = Session::new(Some(user), Some(access_credential));
        state.generation += 1;
        self.persist(&state.session);
    }

    /// Replaces only the access credential, e.g. after a refresh.
    pub fn set_access_credential(&self, token: String) {
        let mut state = self.write();
        self.install_credential(&mut state, token);
    }

    /// Installs the result of a refresh, but only if the session has not been
    /// replaced since `generation` was observed. A rotated rotation credential
    /// is written in the same step. Returns false (and writes nothing) when the
    /// session moved on, so a late refresh can never resurrect a signed-out session.
    pub fn set_access_credential_if_current(
        &self,
        generation: u64,
        token: String,
        rotation: Option<&str>,
    ) -> bool {
        let mut state = self.write();
        if state.generation != generation || state.session.user.is_none() {
            debug!(
                "Discarding credential for generation {} (current {})",
                generation, state.generation
            );
            return false;
        }
        self.install_credential(&mut state, token);
        if let Some(rotation) = rotation {
            self.relay.set(&self.entries.rotation_entry, rotation);
        }
        true
    }

    fn install_credential(&self, state: &mut StoreState, token: String) {
        self.relay.set(&self.entries.access_entry, &token);
        let user = state.session.user.take();
        state.session = Session::new(user, Some(token));
    }

    /// Writes (or removes, for `None`) the rotation credential entry.
    pub fn set_rotation_credential(&self, token: Option<&str>) {
        let _state = self.write();
        match token {
            Some(token) => self.relay.set(&self.entries.rotation_entry, token),
            None => self.relay.remove(&self.entries.rotation_entry),
        }
    }

    /// Resets the session and removes every relay entry and the persisted document.
    /// Calling it on an already empty store changes nothing observable.
    pub fn clear_auth(&self) {
        let mut state = self.write();
        if state.session != Session::default() {
            info!("Session cleared");
        }
        state.session = Session::default();
        state.generation += 1;
        self.relay.remove(&self.entries.access_entry);
        self.relay.remove(&self.entries.rotation_entry);
        if let Err(e) = self.storage.clear() {
            warn!("Failed to clear persisted session: {}", e);
        }
    }

    /// The current session, by value.
    pub fn snapshot(&self) -> Session {
        self.read().session.clone()
    }

    pub fn access_credential(&self) -> Option<String> {
        self.read().session.access_credential.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().session.is_authenticated
    }

    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// True if `required` is empty or the session holds one of its roles.
    pub fn has_any_role(&self, required: &[Role]) -> bool {
        self.read().session.has_any_role(required)
    }

    /// The access credential as currently visible in the relay.
    pub fn relay_access_credential(&self) -> Option<String> {
        self.relay.get(&self.entries.access_entry)
    }

    pub fn rotation_credential(&self) -> Option<String> {
        self.relay.get(&self.entries.rotation_entry)
    }
}
