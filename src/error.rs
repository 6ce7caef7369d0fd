//! Error types shared across the session core.
//!
//! Credential-lifecycle failures stay inside the coordinator and bootstrap;
//! callers only ever see an [`ApiError`] or an [`AuthError`].

use http::StatusCode;
use thiserror::Error;

/// Why a side-channel credential cannot be trusted for a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The payload segment could not be decoded into claims, or `exp` is missing.
    #[error("malformed credential: {0}")]
    Malformed(String),
    /// Claims decoded but `exp <= now`.
    #[error("credential expired at {exp} (now {now})")]
    Expired { exp: i64, now: i64 },
}

/// Failures reported by the identity provider client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity provider rejected the request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("identity provider unreachable: {0}")]
    Network(String),
    #[error("unexpected identity provider response: {0}")]
    Decode(String),
    #[error("identity provider timed out")]
    Timeout,
    #[error("no rotation credential available")]
    MissingRotationCredential,
}

/// What a caller of the refresh coordinator sees when an API call fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request failed with status {status}")]
    Status { status: StatusCode, body: String },
    /// Authorization failed again after the call was already replayed once.
    #[error("request unauthorized")]
    Unauthorized,
    #[error("request forbidden")]
    Forbidden,
    #[error("credential refresh failed: {0}")]
    RefreshFailed(String),
}

/// Sign-in and registration failures, rendered inline by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Persistence failures of the session document.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
