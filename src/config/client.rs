use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Names of the side-channel entries shared by the UI process and the route guard.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct RelayConfig {
    /// Entry mirroring the access credential (a cookie in a browser).
    pub access_entry: String,
    /// Entry holding the rotation credential used by refresh.
    pub rotation_entry: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            access_entry: "access_token".to_string(),
            rotation_entry: "refresh_token".to_string(),
        }
    }
}

/// Settings for the in-process session client: backend location, refresh
/// timeout and where the persisted session document lives.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub refresh_timeout_in_ms: u64,
    /// JSON file for the persisted session subset; in-memory when unset.
    pub storage_path: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: "http://localhost:8000/api".to_string(),
            refresh_timeout_in_ms: 10_000,
            storage_path: None,
        }
    }
}
