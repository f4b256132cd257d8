//! Admin Gate — HTTP Basic credentials checked against configuration.
//!
//! The username is fixed; the password comes from `ADMIN_PASS` (with a
//! development fallback, see `Config`). Any mismatch or malformed header
//! yields `AppError::Unauthorized` with a fixed message, no detail.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::config::Config;
use crate::errors::AppError;

const ADMIN_USERNAME: &str = "admin";

/// Checks the `Authorization: Basic …` header against the configured
/// admin credentials. Returns `Ok(())` as the capability to proceed.
pub fn authorize(headers: &HeaderMap, config: &Config) -> Result<(), AppError> {
    let (username, password) = parse_basic_auth(headers).ok_or(AppError::Unauthorized)?;

    let user_ok = ct_eq(username.as_bytes(), ADMIN_USERNAME.as_bytes());
    let pass_ok = ct_eq(password.as_bytes(), config.admin_password.as_bytes());

    // Evaluate both before branching so a username mismatch costs the
    // same as a password mismatch.
    if user_ok && pass_ok {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Decodes the Basic scheme into (username, password).
fn parse_basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ").or_else(|| header.strip_prefix("basic "))?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Constant-time byte comparison. Length differences still short-circuit,
/// which only reveals what the `WWW-Authenticate` scheme reveals anyway.
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
