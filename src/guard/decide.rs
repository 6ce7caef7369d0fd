//! The per-navigation authorization decision.
//!
//! `decide` sees only the target path, the side-channel credential and the
//! current time. It never touches the in-memory session, so it can run in a
//! separate, stateless process before any page renders.

use tracing::debug;

use super::policy::{normalize_path, RouteClass};
use crate::config::GuardConfig;
use crate::models::token::validate_claims;
use crate::redirect::Redirect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Redirect(Redirect),
}

impl Verdict {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::Redirect(Redirect::Dashboard) => "dashboard",
            Verdict::Redirect(Redirect::Login { .. }) => "login",
            Verdict::Redirect(Redirect::Unauthorized) => "unauthorized",
        }
    }
}

/// Decide whether a navigation to `target` may proceed.
///
/// Same `(target, token, now, policy)` always gives the same verdict.
pub fn decide(target: &str, token: Option<&str>, now: i64, policy: &GuardConfig) -> Verdict {
    let normalized = normalize_path(target);
    let path = normalized.as_str();
    let class = policy.classify(path);
    if class == RouteClass::Unclassified {
        return Verdict::Allow;
    }

    let claims = match token.map(|t| validate_claims(t, now)) {
        Some(Ok(claims)) => Some(claims),
        Some(Err(e)) => {
            debug!("Side-channel credential rejected for '{}': {}", path, e);
            None
        }
        None => None,
    };

    match (class, claims) {
        (RouteClass::Public, Some(_)) => Verdict::Redirect(Redirect::Dashboard),
        (RouteClass::Protected, None) => Verdict::Redirect(Redirect::Login {
            callback: Some(path.to_string()),
        }),
        (RouteClass::Protected, Some(claims)) => {
            let required = policy.required_roles(path);
            if claims.has_any_role(required) {
                Verdict::Allow
            } else {
                debug!("Roles {:?} do not satisfy {:?} for '{}'", claims.roles, required, path);
                Verdict::Redirect(Redirect::Unauthorized)
            }
        }
        _ => Verdict::Allow,
    }
}
