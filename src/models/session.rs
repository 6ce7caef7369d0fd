use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::user::{Identity, Role};

/// The in-memory session owned by the credential store.
///
/// Readers only ever receive clones of it via `CredentialStore::snapshot`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: Option<Identity>,
    pub access_credential: Option<String>,
    pub roles: BTreeSet<Role>,
    pub is_authenticated: bool,
}

impl Session {
    /// Build a session from its parts, deriving roles and the authenticated flag.
    pub fn new(user: Option<Identity>, access_credential: Option<String>) -> Self {
        let roles = user
            .as_ref()
            .map(|u| u.roles.iter().cloned().collect())
            .unwrap_or_default();
        let is_authenticated = user.is_some() && access_credential.is_some();
        Session {
            user,
            access_credential,
            roles,
            is_authenticated,
        }
    }

    /// True if `required` is empty or shares at least one role with the session.
    pub fn has_any_role(&self, required: &[Role]) -> bool {
        required.is_empty() || required.iter().any(|role| self.roles.contains(role))
    }
}

/// The subset of a [`Session`] that survives a restart.
///
/// The access credential is deliberately absent: it only lives in memory and
/// in the short-lived side channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub user: Option<Identity>,
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Only a hint; a restored session is authenticated once bootstrap has a credential.
    #[serde(default)]
    pub is_authenticated: bool,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        PersistedSession {
            user: session.user.clone(),
            roles: session.roles.iter().cloned().collect(),
            is_authenticated: session.is_authenticated,
        }
    }
}
