//! Bearer credential guard for administrative routes.

use crate::server::error::ApiError;
use crate::server::AppState;
use crate::LicenseGateError;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};

/// Reject requests that do not carry `Authorization: Bearer <admin token>`.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !is_authorized(request.headers(), &state.admin_token) {
        return Err(LicenseGateError::Unauthorized.into());
    }
    Ok(next.run(request).await)
}

/// Whether `headers` carry the expected bearer token.
///
/// The scheme name is matched case-insensitively.
pub fn is_authorized(headers: &HeaderMap, expected: &str) -> bool {
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    match presented {
        Some(token) if !token.is_empty() => same_secret(token, expected),
        _ => false,
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("Bearer")
        .then(|| token.trim())
}

/// Compare SHA-256 digests without short-circuiting.
fn same_secret(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
