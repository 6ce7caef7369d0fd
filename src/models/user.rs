use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A role name as issued by the identity provider (e.g. `ADMIN`, `USER`).
pub type Role = String;

/// The Identity struct represents the signed-in user as returned by the identity provider.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Identity {
    /// Construct a new Identity with optional roles.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        roles: Option<Vec<Role>>,
    ) -> Self {
        Identity {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            roles: roles.unwrap_or_default(),
            avatar: None,
            created_at: None,
        }
    }
}
