//! JWT access-token issuance and verification.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::Alphanumeric;
use rand::{rng, Rng};
use tracing::info;

use super::AuthError;
use crate::models::auth::Claims;

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Issue a signed JWT access token (HS256) bound to `username`.
///
/// Pure function of its inputs plus the current clock; expiry is
/// now + [`ACCESS_TOKEN_TTL_SECS`].
pub fn issue_access_token(
    username: &str,
    roles: &[String],
    secret: &[u8],
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        roles: roles.to_vec(),
        exp: (now + Duration::seconds(ACCESS_TOKEN_TTL_SECS)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify a JWT access token, returning the claims on success.
///
/// Signature, payload decode and expiry must all pass; any failure yields
/// `None` so callers cannot distinguish the cause.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Option<Claims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Resolve the JWT signing secret: env var `JWT_SECRET` → persisted file.
///
/// Resolved once at startup and passed through the configuration; never
/// rotated at runtime.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    // Generate and persist
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path)
        && !existing.trim().is_empty()
    {
        return existing.trim().to_string();
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orderdesk")
        .join("jwt-secret")
}
