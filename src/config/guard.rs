use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::user::Role;

/// A protected route prefix and the roles allowed to visit it.
/// An empty role list admits any authenticated caller.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct ProtectedRoute {
    pub prefix: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl ProtectedRoute {
    pub fn new(prefix: &str, roles: &[&str]) -> Self {
        ProtectedRoute {
            prefix: prefix.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// The route policy table plus the redirect targets used by the guard.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct GuardConfig {
    pub login_path: String,
    pub dashboard_path: String,
    pub unauthorized_path: String,
    /// Query parameter carrying the original destination on login redirects.
    pub callback_param: String,
    /// Sign-in style pages that authenticated users are bounced away from.
    pub public_routes: Vec<String>,
    pub protected_routes: Vec<ProtectedRoute>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            login_path: "/login".to_string(),
            dashboard_path: "/dashboard".to_string(),
            unauthorized_path: "/unauthorized".to_string(),
            callback_param: "callbackUrl".to_string(),
            public_routes: vec!["/login".to_string(), "/register".to_string()],
            protected_routes: vec![
                ProtectedRoute::new("/dashboard", &[]),
                ProtectedRoute::new("/profile", &[]),
                ProtectedRoute::new("/settings", &[]),
                ProtectedRoute::new("/admin", &["ADMIN"]),
            ],
        }
    }
}
