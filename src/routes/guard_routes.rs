//! Forward-auth endpoint for reverse proxies.
//!
//! The proxy calls `GET /authorize` before serving a page and either lets the
//! request through (200) or sends the browser to the returned `Location`.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::{debug, info};

use crate::guard::{decide, Verdict};
use crate::metrics::MetricsRecorder;
use crate::relay::read_cookie;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

const FORWARDED_URI_HEADERS: [&str; 2] = ["x-forwarded-uri", "x-original-uri"];

/// Registers the forward-auth route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/authorize", get(authorize))
}

/// Target path from `?path=`, else from the proxy's forwarded URI header.
fn target_path(query: &HashMap<String, String>, headers: &HeaderMap) -> Option<String> {
    if let Some(path) = query.get("path").filter(|p| !p.is_empty()) {
        return Some(path.clone());
    }
    FORWARDED_URI_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, HTTPError> {
    let target = target_path(&query, &headers).ok_or_else(|| {
        HTTPError::new(
            StatusCode::BAD_REQUEST,
            "Missing target path: pass ?path= or X-Forwarded-Uri",
        )
    })?;

    let token = read_cookie(&headers, &state.config.relay.access_entry);
    let verdict = decide(
        &target,
        token.as_deref(),
        state.clock.now(),
        &state.config.guard,
    );
    state.metrics.record_verdict(verdict.label());

    match verdict {
        Verdict::Allow => {
            debug!("Allowing navigation to '{}'", target);
            Ok((StatusCode::OK, "OK").into_response())
        }
        Verdict::Redirect(redirect) => {
            let location = redirect.location(&state.config.guard);
            info!("Redirecting navigation to '{}' -> '{}'", target, location);
            Ok((
                StatusCode::TEMPORARY_REDIRECT,
                [(header::LOCATION, location)],
            )
                .into_response())
        }
    }
}
