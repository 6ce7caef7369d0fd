//! Bearer credentials and their decoded claims.
//!
//! Claims are read straight out of the payload segment. Nothing here checks a
//! signature: the backend re-verifies every credential, so client-side decoding
//! only decides where to send the user, never what they may access.

use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CredentialError;
use crate::models::user::Role;

/// Claims carried in the payload segment of an access credential.
///
/// Decoding is lenient about shapes the guard does not depend on: a
/// non-string `sub`, a missing or non-array `roles`, and fractional
/// NumericDate values are all accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_roles")]
    pub roles: Vec<Role>,
    #[serde(default, deserialize_with = "numeric_date")]
    pub iat: Option<i64>,
    /// Absent `exp` makes the credential malformed, see [`decode_claims`].
    #[serde(default, deserialize_with = "numeric_date")]
    pub exp: Option<i64>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Anything other than an array reads as no roles; non-string entries are skipped.
fn lenient_roles<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Role>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(role) => Some(role),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Seconds since the epoch, integral or fractional. Fractions round up so
/// that `exp > now` keeps its meaning for whole-second clocks.
fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.ceil() as i64)),
        _ => None,
    })
}

impl Claims {
    /// Expiry in seconds since the epoch. Only `None` for claims built by hand.
    pub fn expires_at(&self) -> Option<i64> {
        self.exp
    }

    pub fn has_any_role(&self, required: &[Role]) -> bool {
        required.is_empty() || required.iter().any(|role| self.roles.contains(role))
    }
}

/// Source of "now" for expiry checks, injected so decisions are reproducible.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Decode the payload segment of `token` without verifying its integrity.
///
/// Accepts base64url and standard base64, with or without padding. A token
/// without an `exp` claim is rejected as malformed.
pub fn decode_claims(token: &str) -> Result<Claims, CredentialError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| CredentialError::Malformed("missing payload segment".to_string()))?;

    let trimmed = payload.trim_end_matches('=');
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| CredentialError::Malformed(format!("payload is not base64: {}", e)))?;

    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| CredentialError::Malformed(format!("payload is not a claims object: {}", e)))?;

    if claims.exp.is_none() {
        return Err(CredentialError::Malformed("missing 'exp' claim".to_string()));
    }
    Ok(claims)
}

/// Decode `token` and check it has not expired at `now`.
pub fn validate_claims(token: &str, now: i64) -> Result<Claims, CredentialError> {
    let claims = decode_claims(token)?;
    match claims.exp {
        Some(exp) if exp > now => Ok(claims),
        Some(exp) => Err(CredentialError::Expired { exp, now }),
        None => Err(CredentialError::Malformed("missing 'exp' claim".to_string())),
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::Value;

    /// Build an unsigned `header.payload.signature` token around `claims`.
    pub fn unsigned(claims: &Value) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.signature", header, payload)
    }
}
