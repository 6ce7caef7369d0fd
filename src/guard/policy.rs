//! Route classification against the configured policy table.

use crate::config::GuardConfig;
use crate::models::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Sign-in style pages.
    Public,
    Protected,
    /// Not governed by the guard at all.
    Unclassified,
}

/// The path part of a navigation target, without query or fragment.
pub fn path_only(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

/// The path an upstream server would route `target` to: query and fragment
/// dropped, percent-escapes decoded once, empty and `.` segments removed and
/// `..` applied. Invalid UTF-8 escapes leave the raw path in place.
pub fn normalize_path(target: &str) -> String {
    let raw = path_only(target);
    let decoded = urlencoding::decode(raw).unwrap_or(std::borrow::Cow::Borrowed(raw));

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Segment-aware prefix match: `/admin` covers `/admin` and `/admin/users`,
/// not `/administrator`.
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

impl GuardConfig {
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.public_routes.iter().any(|p| matches_prefix(path, p)) {
            RouteClass::Public
        } else if self
            .protected_routes
            .iter()
            .any(|r| matches_prefix(path, &r.prefix))
        {
            RouteClass::Protected
        } else {
            RouteClass::Unclassified
        }
    }

    /// Roles required for `path`, taken from the longest matching protected prefix.
    pub fn required_roles(&self, path: &str) -> &[Role] {
        self.protected_routes
            .iter()
            .filter(|r| matches_prefix(path, &r.prefix))
            .max_by_key(|r| r.prefix.len())
            .map(|r| r.roles.as_slice())
            .unwrap_or(&[])
    }
}
