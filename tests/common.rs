#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use sessionguard::config::{load_config_from, ConfigV1};
use sessionguard::metrics::Metrics;
use sessionguard::models::FixedClock;
use sessionguard::routes::create_router;
use sessionguard::state::AppState;

pub const NOW: i64 = 1_700_000_000;
pub const SECRET: &str = "integration-secret";

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: "127.0.0.1:0"
logging:
  level: "debug"
  format: "json"
guard:
  public_routes:
    - /login
    - /register
  protected_routes:
    - prefix: /dashboard
      roles: []
    - prefix: /profile
      roles: []
    - prefix: /admin
      roles: [ADMIN]
    - prefix: /admin/audit
      roles: [AUDITOR]
relay:
  access_entry: access_token
  rotation_entry: refresh_token
"#;

pub fn test_config() -> ConfigV1 {
    load_config_from(Figment::new().merge(Yaml::string(TEST_CONFIG)))
        .expect("test config should parse")
}

/// Router with a clock frozen at [`NOW`].
pub fn build_app(config: ConfigV1) -> (Router, Metrics) {
    let metrics = Metrics::new();
    let state = AppState {
        config: Arc::new(config),
        metrics: metrics.clone(),
        clock: Arc::new(FixedClock(NOW)),
    };
    (create_router(state), metrics)
}

/// A signed access credential as the backend would issue it.
pub fn mint(roles: &[&str], exp: i64) -> String {
    let claims = json!({
        "sub": "42",
        "email": "ada@example.com",
        "roles": roles,
        "iat": NOW - 60,
        "exp": exp,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_ref()),
    )
    .expect("token should encode")
}

pub fn authorize_request(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(format!("/authorize?path={}", urlencoding::encode(path)));
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    builder.body(Body::empty()).expect("failed to build request")
}
