// ABOUTME: Static bearer token check for the resolve endpoint
// ABOUTME: Open access when no secret is configured

use axum::http::{header, HeaderMap};

const BEARER_PREFIX: &str = "bearer ";

/// Returns true when the request may proceed.
///
/// The scheme is matched case-insensitively, the token itself must equal the
/// configured secret exactly.
pub fn is_authorized(headers: &HeaderMap, api_key: Option<&str>) -> bool {
    let expected = match api_key {
        Some(key) if !key.is_empty() => key,
        _ => return true,
    };

    let auth_header = match headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(value) => value.trim(),
        None => return false,
    };

    match auth_header.get(..BEARER_PREFIX.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER_PREFIX) => {
            auth_header[BEARER_PREFIX.len()..].trim() == expected
        }
        _ => false,
    }
}
