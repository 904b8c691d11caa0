//! Refresh-token lifecycle.
//!
//! Each record moves through `Active` (expiry in the future) → `Expired`
//! (expiry passed, still stored) → deleted on the lookup that discovers the
//! expiry. There is no background sweep and no transition back to `Active`.

use chrono::{Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{rng, Rng};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::AuthError;
use crate::models::auth::RefreshTokenRecord;
use crate::store::Store;

/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Generate a cryptographically random refresh token (64 alphanumeric chars).
fn generate_refresh_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// SHA-256 hash a refresh token for storage; lookups are exact-match on the
/// digest, never on the plaintext.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Create and persist a refresh token for `username`, returning the
/// plaintext token alongside the stored record.
///
/// Earlier tokens for the same subject stay valid — a subject may hold one
/// refresh token per concurrent session.
pub async fn create(
    store: &dyn Store,
    username: &str,
) -> Result<(String, RefreshTokenRecord), AuthError> {
    let plaintext = generate_refresh_token();
    let record = RefreshTokenRecord {
        token_hash: hash_refresh_token(&plaintext),
        username: username.to_string(),
        expires_at: Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS),
    };
    store.insert_refresh_token(&record).await?;
    Ok((plaintext, record))
}

/// Exact-match lookup by presented token string. No side effects; expired
/// records are returned too, so callers can distinguish absent from expired.
pub async fn find_by_token(
    store: &dyn Store,
    token: &str,
) -> Result<Option<RefreshTokenRecord>, AuthError> {
    let record = store.find_refresh_token(&hash_refresh_token(token)).await?;
    Ok(record)
}

/// Expiry check with lazy eviction.
///
/// An expired record is deleted from the store as a side effect of being
/// checked and the call fails with [`AuthError::TokenExpired`]. Deletion is
/// idempotent, so concurrent checks on the same expired record all fail
/// without error.
pub async fn verify_not_expired(
    store: &dyn Store,
    record: RefreshTokenRecord,
) -> Result<RefreshTokenRecord, AuthError> {
    if record.expires_at <= Utc::now() {
        store.delete_refresh_token(&record.token_hash).await?;
        debug!(username = %record.username, "expired refresh token removed");
        return Err(AuthError::TokenExpired);
    }
    Ok(record)
}
