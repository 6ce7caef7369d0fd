use http::header::{HeaderMap, COOKIE};

/// Read a single cookie from the `Cookie` headers of a request.
///
/// This is the read side of the relay as seen by the stateless route guard,
/// which never shares memory with the UI process.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
